use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use tokio::process::Command;
use tracing::debug;

use crate::domain::revision::{CheckedOutTree, Revision};
use crate::error::{AppError, AppResult};
use crate::services::VersionControlService;

const COMMIT_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

pub struct GitCli {
    workspace_root: PathBuf,
    program: String,
}

impl GitCli {
    pub fn new(workspace_root: PathBuf, program: String) -> Self {
        Self {
            workspace_root,
            program,
        }
    }

    /// Anchors the client at the top of the repository containing `start`,
    /// so listed paths and stat paths share the same base.
    pub async fn discover(start: &Path, program: String) -> AppResult<Self> {
        let probe = Self::new(start.to_path_buf(), program);
        let toplevel = probe.run(&["rev-parse", "--show-toplevel"]).await?;
        let toplevel = toplevel.trim();
        if toplevel.is_empty() {
            return Err(AppError::VersionControl(format!(
                "{} is not inside a git work tree",
                start.display()
            )));
        }
        Ok(Self::new(PathBuf::from(toplevel), probe.program))
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    async fn run(&self, args: &[&str]) -> AppResult<String> {
        let rendered = format!("{} {}", self.program, args.join(" "));
        debug!(command = %rendered, "running git");

        let output = Command::new(&self.program)
            .args(args)
            .current_dir(&self.workspace_root)
            .output()
            .await
            .map_err(|err| AppError::VersionControl(format!("failed to run `{rendered}`: {err}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::VersionControl(format!(
                "`{rendered}` failed ({}): {}",
                output.status,
                stderr.trim()
            )));
        }

        String::from_utf8(output.stdout)
            .map_err(|err| AppError::Parse(format!("`{rendered}` printed non UTF-8 output: {err}")))
    }
}

#[async_trait]
impl VersionControlService for GitCli {
    async fn list_changed_files(&self, from: &Revision, to: &Revision) -> AppResult<Vec<String>> {
        let output = self
            .run(&[
                "diff",
                "--name-only",
                "-z",
                from.as_str(),
                to.as_str(),
                "--",
            ])
            .await?;
        Ok(parse_name_only(&output))
    }

    async fn checkout(&self, revision: &Revision) -> AppResult<CheckedOutTree> {
        self.run(&["checkout", "--quiet", revision.as_str(), "--"])
            .await?;
        Ok(CheckedOutTree::new(
            revision.clone(),
            self.workspace_root.clone(),
        ))
    }

    async fn commit_date(&self, revision: &Revision) -> AppResult<DateTime<FixedOffset>> {
        let output = self
            .run(&["show", "-s", "--format=%ci", revision.as_str()])
            .await?;
        parse_commit_date(&output)
    }

    async fn tree_entry_size(&self, revision: &Revision, path: &str) -> AppResult<Option<u64>> {
        let output = self
            .run(&[
                "ls-tree",
                "-l",
                "--full-tree",
                revision.as_str(),
                "--",
                path,
            ])
            .await?;
        parse_ls_tree_size(&output)
    }
}

// `-z` output: raw, unquoted paths terminated by NUL.
fn parse_name_only(output: &str) -> Vec<String> {
    output
        .split('\0')
        .filter(|path| !path.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_commit_date(output: &str) -> AppResult<DateTime<FixedOffset>> {
    let raw = output.trim();
    DateTime::parse_from_str(raw, COMMIT_DATE_FORMAT)
        .map_err(|err| AppError::Parse(format!("unexpected commit date '{raw}': {err}")))
}

// `<mode> <type> <object> <size>\t<path>`; anything but a blob (e.g. a
// submodule commit) has no size and is treated as absent.
fn parse_ls_tree_size(output: &str) -> AppResult<Option<u64>> {
    let Some(line) = output.lines().find(|line| !line.trim().is_empty()) else {
        return Ok(None);
    };
    let meta = line.split('\t').next().unwrap_or_default();
    let fields: Vec<&str> = meta.split_whitespace().collect();
    match fields.as_slice() {
        [_, "blob", _, size] => size
            .parse::<u64>()
            .map(Some)
            .map_err(|err| AppError::Parse(format!("bad ls-tree size '{size}': {err}"))),
        [_, _, _, _] => Ok(None),
        _ => Err(AppError::Parse(format!("unexpected ls-tree entry '{line}'"))),
    }
}
