use chrono::{DateTime, FixedOffset};
use tracing::{debug, info, warn};

use crate::context::AppContext;
use crate::domain::record::{ChangedFileRecord, DiffReport, FileState};
use crate::domain::revision::Revision;
use crate::domain::stat::{FileStat, StatOutcome, extension_of};
use crate::error::AppResult;
use crate::services::StatSource;

#[derive(Debug, Clone)]
pub struct DiffRequest {
    pub from: Revision,
    pub to: Revision,
}

/// Collects before/after metadata for every path that differs between
/// `from` and `to`.
///
/// With [`StatSource::WorkingTree`] this checks out `to`, then `from`, and
/// returns with the working tree still at `from`.
pub async fn build_report(ctx: &AppContext, request: &DiffRequest) -> AppResult<DiffReport> {
    let DiffRequest { from, to } = request;

    let paths = ctx.version_control.list_changed_files(from, to).await?;
    info!(%from, %to, count = paths.len(), "listed changed files");

    let mut report = DiffReport {
        records: paths.into_iter().map(ChangedFileRecord::new).collect(),
        unreadable: 0,
    };

    // Resolved up front so an unknown revision fails before the tree moves.
    let to_date = ctx.version_control.commit_date(to).await?;
    let from_date = ctx.version_control.commit_date(from).await?;

    match ctx.config.stat_source {
        StatSource::WorkingTree => {
            let tree = ctx.version_control.checkout(to).await?;
            info!(revision = %tree.revision(), "checked out");
            for record in &mut report.records {
                let outcome = ctx.file_stats.stat(&tree, &record.path).await;
                record.after = side_state(&record.path, outcome, to_date, "", &mut report.unreadable);
            }

            let tree = ctx.version_control.checkout(from).await?;
            info!(revision = %tree.revision(), "checked out");
            for record in &mut report.records {
                let outcome = ctx.file_stats.stat(&tree, &record.path).await;
                let fallback = record.after.file_type.clone();
                record.before = side_state(
                    &record.path,
                    outcome,
                    from_date,
                    &fallback,
                    &mut report.unreadable,
                );
            }

            info!(revision = %tree.revision(), "working tree left at revision");
        }
        StatSource::ObjectStore => {
            for record in &mut report.records {
                let outcome = object_store_outcome(ctx, to, &record.path).await?;
                record.after = side_state(&record.path, outcome, to_date, "", &mut report.unreadable);
            }
            for record in &mut report.records {
                let outcome = object_store_outcome(ctx, from, &record.path).await?;
                let fallback = record.after.file_type.clone();
                record.before = side_state(
                    &record.path,
                    outcome,
                    from_date,
                    &fallback,
                    &mut report.unreadable,
                );
            }
        }
    }

    if report.unreadable > 0 {
        warn!(
            unreadable = report.unreadable,
            "some files could not be read and are reported as absent"
        );
    }

    Ok(report)
}

async fn object_store_outcome(
    ctx: &AppContext,
    revision: &Revision,
    path: &str,
) -> AppResult<StatOutcome> {
    let outcome = match ctx.version_control.tree_entry_size(revision, path).await? {
        Some(size_bytes) => StatOutcome::Present(FileStat {
            size_bytes,
            modified: None,
            extension: extension_of(path),
        }),
        None => StatOutcome::Absent,
    };
    Ok(outcome)
}

fn side_state(
    path: &str,
    outcome: StatOutcome,
    commit_date: DateTime<FixedOffset>,
    fallback_type: &str,
    unreadable: &mut usize,
) -> FileState {
    match outcome {
        StatOutcome::Present(stat) => {
            debug!(path, file_modified = ?stat.modified, %commit_date, "dating file by commit");
            FileState {
                file_type: stat.extension,
                size_bytes: Some(stat.size_bytes),
                modified: Some(commit_date),
            }
        }
        StatOutcome::Absent => FileState {
            file_type: fallback_type.to_string(),
            size_bytes: None,
            modified: Some(commit_date),
        },
        StatOutcome::Unreadable(reason) => {
            warn!(path, %reason, "skipping file info");
            *unreadable += 1;
            FileState {
                file_type: fallback_type.to_string(),
                size_bytes: None,
                modified: Some(commit_date),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};
    use std::path::PathBuf;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::AppConfig;
    use crate::domain::revision::CheckedOutTree;
    use crate::error::AppError;
    use crate::services::{FileStatService, VersionControlService};

    /// In-memory repository: per revision, the files and their sizes.
    #[derive(Default)]
    struct FakeRepo {
        changed: Vec<String>,
        trees: HashMap<String, HashMap<String, u64>>,
        dates: HashMap<String, String>,
        unreadable: HashSet<String>,
        conflicting: HashSet<String>,
        calls: Mutex<Vec<String>>,
        checked_out: Mutex<Option<String>>,
    }

    impl FakeRepo {
        fn with_file(mut self, revision: &str, path: &str, size: u64) -> Self {
            self.trees
                .entry(revision.to_string())
                .or_default()
                .insert(path.to_string(), size);
            self
        }

        fn with_commit(mut self, revision: &str, date: &str) -> Self {
            self.trees.entry(revision.to_string()).or_default();
            self.dates.insert(revision.to_string(), date.to_string());
            self
        }

        fn changed(mut self, paths: &[&str]) -> Self {
            self.changed = paths.iter().map(|p| p.to_string()).collect();
            self
        }

        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }

        fn known(&self, revision: &Revision) -> AppResult<&HashMap<String, u64>> {
            self.trees.get(revision.as_str()).ok_or_else(|| {
                AppError::VersionControl(format!("unknown revision {revision}"))
            })
        }
    }

    #[async_trait]
    impl VersionControlService for FakeRepo {
        async fn list_changed_files(
            &self,
            from: &Revision,
            to: &Revision,
        ) -> AppResult<Vec<String>> {
            self.record(format!("diff {from} {to}"));
            self.known(from)?;
            self.known(to)?;
            Ok(self.changed.clone())
        }

        async fn checkout(&self, revision: &Revision) -> AppResult<CheckedOutTree> {
            self.record(format!("checkout {revision}"));
            self.known(revision)?;
            if self.conflicting.contains(revision.as_str()) {
                return Err(AppError::VersionControl(format!(
                    "local changes would be overwritten by checkout of {revision}"
                )));
            }
            *self.checked_out.lock().unwrap() = Some(revision.to_string());
            Ok(CheckedOutTree::new(revision.clone(), PathBuf::from("/repo")))
        }

        async fn commit_date(&self, revision: &Revision) -> AppResult<DateTime<FixedOffset>> {
            self.record(format!("date {revision}"));
            let raw = self
                .dates
                .get(revision.as_str())
                .ok_or_else(|| AppError::VersionControl(format!("unknown revision {revision}")))?;
            Ok(DateTime::parse_from_rfc3339(raw).unwrap())
        }

        async fn tree_entry_size(&self, revision: &Revision, path: &str) -> AppResult<Option<u64>> {
            self.record(format!("ls-tree {revision} {path}"));
            Ok(self.known(revision)?.get(path).copied())
        }
    }

    #[async_trait]
    impl FileStatService for FakeRepo {
        async fn stat(&self, tree: &CheckedOutTree, path: &str) -> StatOutcome {
            self.record(format!("stat {} {path}", tree.revision()));
            assert_eq!(
                self.checked_out.lock().unwrap().as_deref(),
                Some(tree.revision().as_str()),
                "stat must run against the revision that is checked out"
            );
            if self.unreadable.contains(path) {
                return StatOutcome::Unreadable("permission denied".to_string());
            }
            match self.trees[tree.revision().as_str()].get(path) {
                Some(size) => StatOutcome::Present(FileStat {
                    size_bytes: *size,
                    modified: None,
                    extension: extension_of(path),
                }),
                None => StatOutcome::Absent,
            }
        }
    }

    fn context(repo: Arc<FakeRepo>, stat_source: StatSource) -> AppContext {
        let config = AppConfig {
            workspace_root: PathBuf::from("/repo"),
            git_program: "git".to_string(),
            output_dir: PathBuf::from("/repo"),
            stat_source,
        };
        AppContext::new(config, repo.clone(), repo)
    }

    fn request(from: &str, to: &str) -> DiffRequest {
        DiffRequest {
            from: Revision::parse("from", from).unwrap(),
            to: Revision::parse("to", to).unwrap(),
        }
    }

    fn date(raw: &str) -> Option<DateTime<FixedOffset>> {
        Some(DateTime::parse_from_rfc3339(raw).unwrap())
    }

    fn base_repo() -> FakeRepo {
        FakeRepo::default()
            .with_commit("old", "2024-01-10T08:00:00+00:00")
            .with_commit("new", "2024-02-20T17:30:00+01:00")
            .with_file("old", "src/lib.rs", 1024)
            .with_file("new", "src/lib.rs", 1536)
            .with_file("new", "docs/added.md", 300)
            .with_file("old", "scripts/removed.sh", 50)
            .changed(&["src/lib.rs", "docs/added.md", "scripts/removed.sh"])
    }

    #[tokio::test]
    async fn populates_both_halves_in_listing_order() {
        let repo = Arc::new(base_repo());
        let ctx = context(repo.clone(), StatSource::WorkingTree);

        let report = build_report(&ctx, &request("old", "new")).await.unwrap();

        let paths: Vec<&str> = report.records.iter().map(|r| r.path.as_str()).collect();
        assert_eq!(paths, vec!["src/lib.rs", "docs/added.md", "scripts/removed.sh"]);

        let modified = &report.records[0];
        assert_eq!(
            modified.before,
            FileState {
                file_type: ".rs".to_string(),
                size_bytes: Some(1024),
                modified: date("2024-01-10T08:00:00+00:00"),
            }
        );
        assert_eq!(
            modified.after,
            FileState {
                file_type: ".rs".to_string(),
                size_bytes: Some(1536),
                modified: date("2024-02-20T17:30:00+01:00"),
            }
        );
        assert_eq!(report.unreadable, 0);
    }

    #[tokio::test]
    async fn added_file_is_absent_before_and_borrows_type() {
        let repo = Arc::new(base_repo());
        let ctx = context(repo, StatSource::WorkingTree);

        let report = build_report(&ctx, &request("old", "new")).await.unwrap();
        let added = &report.records[1];

        assert!(!added.before.is_present());
        assert_eq!(added.before.file_type, ".md");
        assert_eq!(added.before.modified, date("2024-01-10T08:00:00+00:00"));
        assert_eq!(added.after.size_bytes, Some(300));
    }

    #[tokio::test]
    async fn deleted_file_is_absent_after() {
        let repo = Arc::new(base_repo());
        let ctx = context(repo, StatSource::WorkingTree);

        let report = build_report(&ctx, &request("old", "new")).await.unwrap();
        let removed = &report.records[2];

        assert!(!removed.after.is_present());
        assert_eq!(removed.after.file_type, "");
        assert_eq!(removed.before.size_bytes, Some(50));
        assert_eq!(removed.before.file_type, ".sh");
    }

    #[tokio::test]
    async fn checks_out_to_then_from_and_stays_at_from() {
        let repo = Arc::new(base_repo().changed(&["src/lib.rs"]));
        let ctx = context(repo.clone(), StatSource::WorkingTree);

        build_report(&ctx, &request("old", "new")).await.unwrap();

        assert_eq!(
            repo.calls(),
            vec![
                "diff old new",
                "date new",
                "date old",
                "checkout new",
                "stat new src/lib.rs",
                "checkout old",
                "stat old src/lib.rs",
            ]
        );
        assert_eq!(repo.checked_out.lock().unwrap().as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn no_changes_yields_empty_report() {
        let repo = Arc::new(base_repo().changed(&[]));
        let ctx = context(repo, StatSource::WorkingTree);

        let report = build_report(&ctx, &request("new", "new")).await.unwrap();
        assert!(report.is_empty());
    }

    #[tokio::test]
    async fn unknown_revision_fails_before_checkout() {
        let repo = Arc::new(base_repo().changed(&[]));
        let ctx = context(repo.clone(), StatSource::WorkingTree);

        let err = build_report(&ctx, &request("old", "missing")).await.unwrap_err();

        assert!(matches!(err, AppError::VersionControl(_)));
        assert!(repo.calls().iter().all(|call| !call.starts_with("checkout")));
    }

    #[tokio::test]
    async fn failed_checkout_aborts_before_any_stat() {
        let mut repo = base_repo();
        repo.conflicting.insert("new".to_string());
        let repo = Arc::new(repo);
        let ctx = context(repo.clone(), StatSource::WorkingTree);

        let err = build_report(&ctx, &request("old", "new")).await.unwrap_err();

        assert!(matches!(err, AppError::VersionControl(_)));
        assert!(repo.calls().iter().all(|call| !call.starts_with("stat")));
        assert_eq!(repo.checked_out.lock().unwrap().as_deref(), None);
    }

    #[tokio::test]
    async fn failed_second_checkout_is_fatal() {
        let mut repo = base_repo();
        repo.conflicting.insert("old".to_string());
        let repo = Arc::new(repo);
        let ctx = context(repo.clone(), StatSource::WorkingTree);

        let err = build_report(&ctx, &request("old", "new")).await.unwrap_err();

        assert!(matches!(err, AppError::VersionControl(_)));
        let calls = repo.calls();
        let failed_at = calls.iter().position(|call| call == "checkout old").unwrap();
        assert!(calls[failed_at + 1..].iter().all(|call| !call.starts_with("stat")));
        assert_eq!(calls.last().map(String::as_str), Some("checkout old"));
    }

    #[tokio::test]
    async fn unreadable_files_are_counted_not_fatal() {
        let mut repo = base_repo();
        repo.unreadable.insert("src/lib.rs".to_string());
        let repo = Arc::new(repo);
        let ctx = context(repo, StatSource::WorkingTree);

        let report = build_report(&ctx, &request("old", "new")).await.unwrap();

        assert_eq!(report.len(), 3);
        assert_eq!(report.unreadable, 2);
        assert!(!report.records[0].before.is_present());
        assert!(!report.records[0].after.is_present());
    }

    #[tokio::test]
    async fn object_store_never_touches_working_tree() {
        let repo = Arc::new(base_repo());
        let ctx = context(repo.clone(), StatSource::ObjectStore);

        let report = build_report(&ctx, &request("old", "new")).await.unwrap();

        assert!(repo.calls().iter().all(|call| !call.starts_with("checkout")));
        assert_eq!(repo.checked_out.lock().unwrap().as_deref(), None);
        assert_eq!(report.records[0].before.size_bytes, Some(1024));
        assert_eq!(report.records[0].after.size_bytes, Some(1536));
        assert!(!report.records[1].before.is_present());
        assert_eq!(report.records[1].before.file_type, ".md");
        assert!(!report.records[2].after.is_present());
    }
}
