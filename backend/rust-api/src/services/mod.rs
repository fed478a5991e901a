use std::sync::Arc;

use crate::config::Config;
use crate::storage::{AssessmentCatalog, AttemptStore};

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn AttemptStore>,
    pub catalog: Arc<dyn AssessmentCatalog>,
}

impl AppState {
    pub fn new(
        config: Config,
        store: Arc<dyn AttemptStore>,
        catalog: Arc<dyn AssessmentCatalog>,
    ) -> Self {
        Self {
            config,
            store,
            catalog,
        }
    }
}

pub mod attempt_service;
pub mod grading;
