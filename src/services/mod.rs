pub mod file_stat;
pub mod version_control;

pub use file_stat::FileStatService;
pub use version_control::{StatSource, VersionControlService};
