use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::{FileStatService, VersionControlService};

#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub version_control: Arc<dyn VersionControlService>,
    pub file_stats: Arc<dyn FileStatService>,
}

impl AppContext {
    pub fn new(
        config: AppConfig,
        version_control: Arc<dyn VersionControlService>,
        file_stats: Arc<dyn FileStatService>,
    ) -> Self {
        Self {
            config,
            version_control,
            file_stats,
        }
    }
}
