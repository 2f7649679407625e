use async_trait::async_trait;

use crate::domain::revision::CheckedOutTree;
use crate::domain::stat::StatOutcome;

#[async_trait]
pub trait FileStatService: Send + Sync {
    /// Never fails: absence and unreadable files are outcomes, not errors.
    async fn stat(&self, tree: &CheckedOutTree, path: &str) -> StatOutcome;
}
