pub mod entity;
pub mod error;
pub mod record;

// Bulk import module
pub mod import;
