use std::sync::Arc;

use crate::application::{
    DirectoryUseCase, ExportUseCase, FieldCoercer, ImportGuard, ImportPipeline, StatisticsUseCase,
};
use crate::infrastructure::config::ImportConfig;
use crate::infrastructure::db::RecordStore;

/// Use cases shared by every request handler.
pub struct AppState {
    pub directory_use_case: DirectoryUseCase,
    pub import_pipeline: ImportPipeline,
    pub export_use_case: ExportUseCase,
    pub statistics_use_case: StatisticsUseCase,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(store: Arc<dyn RecordStore>, import: &ImportConfig) -> Self {
        let coercer = FieldCoercer::new(import.enum_max_chars);
        Self {
            directory_use_case: DirectoryUseCase::new(store.clone(), coercer.clone()),
            import_pipeline: ImportPipeline::new(store.clone(), coercer, ImportGuard::new()),
            export_use_case: ExportUseCase::new(store.clone()),
            statistics_use_case: StatisticsUseCase::new(store),
            max_upload_bytes: import.max_upload_bytes,
        }
    }
}
