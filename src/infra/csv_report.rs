use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset};
use csv::WriterBuilder;
use serde::Serialize;

use crate::domain::record::{DiffReport, FileState};
use crate::domain::revision::Revision;
use crate::error::AppResult;

const DATE_FORMAT: &str = "%d %b %Y";
const ABSENT_SIZE: &str = "-";

const COLUMN_TITLES: [&str; 11] = [
    "No",
    "File Name",
    "File Type",
    "Date Modified",
    "File Size (KB)",
    "No",
    "File Name",
    "File Type",
    "Date Modified",
    "File Size (KB)",
    "Remark",
];

pub struct CsvReportWriter {
    output_dir: PathBuf,
}

impl CsvReportWriter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn report_path(&self, from: &Revision, to: &Revision) -> PathBuf {
        self.output_dir.join(report_file_name(from, to))
    }

    /// Writes the report, replacing any previous file of the same name.
    /// A failure partway leaves a truncated file behind.
    pub fn write(
        &self,
        report: &DiffReport,
        from: &Revision,
        to: &Revision,
        remark: Option<&str>,
    ) -> AppResult<PathBuf> {
        let path = self.report_path(from, to);
        write_report(&path, report, from, to, remark.unwrap_or_default())?;
        Ok(path)
    }
}

pub fn report_file_name(from: &Revision, to: &Revision) -> String {
    format!("diff_{}_{}.csv", from.short(), to.short())
}

#[derive(Serialize)]
struct ReportRow<'a> {
    before_no: usize,
    before_path: &'a str,
    before_type: &'a str,
    before_date: String,
    before_size: String,
    after_no: usize,
    after_path: &'a str,
    after_type: &'a str,
    after_date: String,
    after_size: String,
    remark: &'a str,
}

fn write_report(
    path: &Path,
    report: &DiffReport,
    from: &Revision,
    to: &Revision,
    remark: &str,
) -> AppResult<()> {
    // The revision banner is shorter than the data rows.
    let mut writer = WriterBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_path(path)?;

    writer.write_record(["", "from", from.short(), "", "", "", "to", to.short()])?;
    writer.write_record(COLUMN_TITLES)?;

    for (idx, record) in report.records.iter().enumerate() {
        writer.serialize(ReportRow {
            before_no: idx + 1,
            before_path: &record.path,
            before_type: &record.before.file_type,
            before_date: format_date(record.before.modified),
            before_size: format_size(&record.before),
            after_no: idx + 1,
            after_path: &record.path,
            after_type: &record.after.file_type,
            after_date: format_date(record.after.modified),
            after_size: format_size(&record.after),
            remark,
        })?;
    }

    writer.flush()?;
    Ok(())
}

fn format_date(date: Option<DateTime<FixedOffset>>) -> String {
    date.map(|date| date.format(DATE_FORMAT).to_string())
        .unwrap_or_default()
}

fn format_size(state: &FileState) -> String {
    match state.size_bytes {
        Some(bytes) => format!("{:.2}", bytes as f64 / 1024.0),
        None => ABSENT_SIZE.to_string(),
    }
}
