pub mod record;
pub mod revision;
pub mod stat;
