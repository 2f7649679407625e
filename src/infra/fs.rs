use std::io::ErrorKind;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::revision::CheckedOutTree;
use crate::domain::stat::{FileStat, StatOutcome, extension_of};
use crate::services::FileStatService;

#[derive(Debug, Default)]
pub struct LocalFileStats;

impl LocalFileStats {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileStatService for LocalFileStats {
    async fn stat(&self, tree: &CheckedOutTree, path: &str) -> StatOutcome {
        let full_path = tree.root().join(path);
        let outcome = match tokio::fs::metadata(&full_path).await {
            // Git tracks files only; a directory here is a submodule or a
            // path that became a directory at this revision.
            Ok(metadata) if metadata.is_dir() => StatOutcome::Absent,
            Ok(metadata) => StatOutcome::Present(FileStat {
                size_bytes: metadata.len(),
                modified: metadata.modified().ok(),
                extension: extension_of(path),
            }),
            // NotADirectory: a parent component is a file at this revision.
            Err(err) if matches!(err.kind(), ErrorKind::NotFound | ErrorKind::NotADirectory) => {
                StatOutcome::Absent
            }
            Err(err) => StatOutcome::Unreadable(err.to_string()),
        };
        debug!(path, revision = %tree.revision(), ?outcome, "stat");
        outcome
    }
}
