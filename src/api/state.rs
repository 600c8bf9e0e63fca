use std::sync::Arc;

use crate::agents::backend::AiBackend;
use crate::calculate::AnalysisParams;
use crate::storage::StorageConfig;

#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<StorageConfig>,
    pub params: Arc<AnalysisParams>,
    pub ai_backend: Arc<dyn AiBackend>,
    pub cors_origin: String,
}
