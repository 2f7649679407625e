use std::env;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::services::StatSource;

const GIT_PROGRAM_VAR: &str = "REVDIFF_GIT";
const OUTPUT_DIR_VAR: &str = "REVDIFF_OUTPUT_DIR";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub workspace_root: PathBuf,
    pub git_program: String,
    pub output_dir: PathBuf,
    pub stat_source: StatSource,
}

impl AppConfig {
    pub fn load(workspace_hint: &Path) -> AppResult<Self> {
        Self::from_lookup(workspace_hint, |key| env::var(key).ok())
    }

    fn from_lookup(
        workspace_hint: &Path,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> AppResult<Self> {
        let git_program = match lookup(GIT_PROGRAM_VAR) {
            Some(program) if program.trim().is_empty() => {
                return Err(AppError::Configuration(format!(
                    "{GIT_PROGRAM_VAR} is set but empty"
                )));
            }
            Some(program) => program.trim().to_string(),
            None => "git".to_string(),
        };

        let output_dir = match lookup(OUTPUT_DIR_VAR) {
            Some(dir) if dir.trim().is_empty() => {
                return Err(AppError::Configuration(format!(
                    "{OUTPUT_DIR_VAR} is set but empty"
                )));
            }
            Some(dir) => workspace_hint.join(dir.trim()),
            None => workspace_hint.to_path_buf(),
        };

        Ok(Self {
            workspace_root: workspace_hint.to_path_buf(),
            git_program,
            output_dir,
            stat_source: StatSource::default(),
        })
    }

    pub fn with_output_dir(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(dir) = dir {
            self.output_dir = self.workspace_root.join(dir);
        }
        self
    }

    pub fn with_stat_source(mut self, stat_source: StatSource) -> Self {
        self.stat_source = stat_source;
        self
    }
}
