use std::path::Path;
use std::time::SystemTime;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileStat {
    pub size_bytes: u64,
    pub modified: Option<SystemTime>,
    pub extension: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatOutcome {
    Present(FileStat),
    /// The path does not exist at this revision.
    Absent,
    /// Stat failed for a reason other than absence.
    Unreadable(String),
}

/// Extension of the final path component including the leading dot, or an
/// empty string. Dotfiles keep their whole name (`.gitignore`).
pub fn extension_of(path: &str) -> String {
    let name = Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(path);
    match name.rfind('.') {
        Some(idx) => name[idx..].to_string(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_includes_dot() {
        assert_eq!(extension_of("src/main.rs"), ".rs");
        assert_eq!(extension_of("archive.tar.gz"), ".gz");
    }

    #[test]
    fn extension_empty_without_dot() {
        assert_eq!(extension_of("Makefile"), "");
        assert_eq!(extension_of("dir.d/Makefile"), "");
    }

    #[test]
    fn dotfile_is_its_own_extension() {
        assert_eq!(extension_of(".gitignore"), ".gitignore");
    }
}
