// ============================================================
// IMPORT DOMAIN LAYER
// ============================================================
// Row types, per-entity schemas and reports for bulk spreadsheet import
// No I/O, no async

mod import_row;
mod report;
mod schema;
mod schemas;

pub use import_row::{ImportRow, RawRow};
pub use report::ImportReport;
pub use schema::{normalize_header, EntitySchema, FieldSpec};
pub use schemas::{schema_for, EMPLOYEE_SCHEMA, OFFICE_CONTACT_SCHEMA, TASK_SCHEMA, TRANSACTION_SCHEMA};
