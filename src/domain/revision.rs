use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

const SHORT_LEN: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision(String);

impl Revision {
    pub fn parse(flag: &str, value: &str) -> AppResult<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(AppError::Usage(format!("-{flag} must name a revision")));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First five characters, used to name the report file.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(SHORT_LEN) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Proof that `revision` is what the working tree at `root` currently holds.
///
/// Only a checkout hands these out, so a file stat can never silently read
/// whatever revision happened to be left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckedOutTree {
    revision: Revision,
    root: PathBuf,
}

impl CheckedOutTree {
    pub fn new(revision: Revision, root: PathBuf) -> Self {
        Self { revision, root }
    }

    pub fn revision(&self) -> &Revision {
        &self.revision
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}
