pub mod use_cases;

pub use use_cases::directory::DirectoryUseCase;
pub use use_cases::export::{ExportFile, ExportUseCase};
pub use use_cases::import_guard::ImportGuard;
pub use use_cases::import_pipeline::{FieldCoercer, ImportPipeline};
pub use use_cases::statistics::{Statistics, StatisticsUseCase};
