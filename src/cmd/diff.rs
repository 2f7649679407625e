use std::path::PathBuf;

use tracing::info;

use crate::context::AppContext;
use crate::domain::record::DiffReport;
use crate::domain::revision::Revision;
use crate::error::AppResult;
use crate::infra::csv_report::CsvReportWriter;
use crate::workflow::diff_report::{DiffRequest, build_report};

#[derive(Debug, Clone)]
pub struct DiffCommandArgs {
    pub from: Revision,
    pub to: Revision,
    pub remark: Option<String>,
}

pub struct DiffCommandOutcome {
    pub report_path: PathBuf,
    pub report: DiffReport,
}

pub async fn run(ctx: &AppContext, args: DiffCommandArgs) -> AppResult<DiffCommandOutcome> {
    let request = DiffRequest {
        from: args.from,
        to: args.to,
    };
    let report = build_report(ctx, &request).await?;
    if report.is_empty() {
        info!(from = %request.from, to = %request.to, "no files changed between revisions");
    }

    let added = report
        .records
        .iter()
        .filter(|record| !record.before.is_present() && record.after.is_present())
        .count();
    let deleted = report
        .records
        .iter()
        .filter(|record| record.before.is_present() && !record.after.is_present())
        .count();
    info!(files = report.len(), added, deleted, "report assembled");

    let writer = CsvReportWriter::new(ctx.config.output_dir.clone());
    let report_path = writer.write(&report, &request.from, &request.to, args.remark.as_deref())?;
    info!(path = %report_path.display(), "successfully written to csv");

    Ok(DiffCommandOutcome {
        report_path,
        report,
    })
}
