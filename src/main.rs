mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod infra;
mod logging;
mod services;
mod workflow;

use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::{debug, info};

use crate::cmd::diff::{self, DiffCommandArgs};
use crate::config::AppConfig;
use crate::context::AppContext;
use crate::domain::revision::Revision;
use crate::error::AppResult;
use crate::infra::fs::LocalFileStats;
use crate::infra::git::GitCli;
use crate::services::StatSource;

/// Flags that are also accepted with a single dash (`-from abc`).
const LONG_FLAGS: [&str; 3] = ["from", "to", "remark"];

#[derive(Parser, Debug)]
#[command(
    name = "revdiff",
    author,
    version,
    about = "Report size and date of files changed between two revisions"
)]
struct Cli {
    /// Revision to compare with (the "before" side).
    #[arg(long, value_name = "REVISION")]
    from: String,
    /// Latest revision (the "after" side).
    #[arg(long, value_name = "REVISION")]
    to: String,
    /// Free text written into the Remark column of every row.
    #[arg(long)]
    remark: Option<String>,
    /// Read sizes from git's object store instead of checking out each
    /// revision. Leaves the working tree untouched.
    #[arg(long)]
    no_checkout: bool,
    /// Directory for the CSV report (default: current directory).
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,
    /// Log every git call and file stat.
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse_from(normalize_args(std::env::args_os()));
    logging::init(cli.verbose);

    if let Err(error) = run(cli).await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> AppResult<()> {
    let from = Revision::parse("from", &cli.from)?;
    let to = Revision::parse("to", &cli.to)?;

    let stat_source = if cli.no_checkout {
        StatSource::ObjectStore
    } else {
        StatSource::WorkingTree
    };

    let cwd = std::env::current_dir()?;
    let config = AppConfig::load(&cwd)?
        .with_output_dir(cli.output_dir)
        .with_stat_source(stat_source);

    let git = GitCli::discover(&config.workspace_root, config.git_program.clone()).await?;
    debug!(root = %git.workspace_root().display(), "repository located");

    let context = AppContext::new(config, Arc::new(git), Arc::new(LocalFileStats::new()));

    let outcome = diff::run(
        &context,
        DiffCommandArgs {
            from,
            to,
            remark: cli.remark,
        },
    )
    .await?;

    if outcome.report.unreadable > 0 {
        info!(
            unreadable = outcome.report.unreadable,
            "report written with unreadable files marked absent"
        );
    }
    println!("{}", outcome.report_path.display());

    Ok(())
}

/// Rewrites `-from`, `-to`, `-remark` (and their `=value` forms) to the
/// double-dash spelling clap understands.
fn normalize_args(args: impl IntoIterator<Item = OsString>) -> Vec<OsString> {
    args.into_iter()
        .map(|arg| {
            let Some(text) = arg.to_str() else {
                return arg;
            };
            let Some(rest) = text.strip_prefix('-') else {
                return arg;
            };
            if rest.starts_with('-') {
                return arg;
            }
            let name = rest.split('=').next().unwrap_or(rest);
            if LONG_FLAGS.contains(&name) {
                OsString::from(format!("-{text}"))
            } else {
                arg
            }
        })
        .collect()
}
