pub mod directory;
pub mod export;
pub mod import_guard;
pub mod import_pipeline;
pub mod statistics;
