use chrono::{DateTime, FixedOffset};

/// Metadata for one side (before or after) of a changed file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileState {
    pub file_type: String,
    /// `None` when the file does not exist at that revision.
    pub size_bytes: Option<u64>,
    pub modified: Option<DateTime<FixedOffset>>,
}

impl FileState {
    pub fn is_present(&self) -> bool {
        self.size_bytes.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFileRecord {
    pub path: String,
    pub before: FileState,
    pub after: FileState,
}

impl ChangedFileRecord {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            before: FileState::default(),
            after: FileState::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct DiffReport {
    pub records: Vec<ChangedFileRecord>,
    /// Stats that failed for a reason other than absence.
    pub unreadable: usize,
}

impl DiffReport {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
