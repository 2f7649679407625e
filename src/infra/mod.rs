pub mod csv_report;
pub mod fs;
pub mod git;
