use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};

use crate::domain::revision::{CheckedOutTree, Revision};
use crate::error::AppResult;

/// Where per-revision file sizes are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatSource {
    /// Check out each revision and stat the files on disk. Leaves the
    /// working tree at the `from` revision.
    #[default]
    WorkingTree,
    /// Ask git's object store for blob sizes without touching the tree.
    ObjectStore,
}

#[async_trait]
pub trait VersionControlService: Send + Sync {
    /// Paths whose content differs between `from` and `to`, in listing order.
    async fn list_changed_files(&self, from: &Revision, to: &Revision) -> AppResult<Vec<String>>;
    /// Overwrites the working tree with `revision`.
    async fn checkout(&self, revision: &Revision) -> AppResult<CheckedOutTree>;
    async fn commit_date(&self, revision: &Revision) -> AppResult<DateTime<FixedOffset>>;
    /// Blob size of `path` at `revision`, or `None` if the path is not in that tree.
    async fn tree_entry_size(&self, revision: &Revision, path: &str) -> AppResult<Option<u64>>;
}
