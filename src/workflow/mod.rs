pub mod diff_report;
