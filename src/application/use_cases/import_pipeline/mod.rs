// ============================================================
// IMPORT PIPELINE
// ============================================================
// Reader -> Normalizer -> Validator -> Deduplicator -> Coercer -> Dispatcher.
// One generic implementation parameterized by EntitySchema.

mod coercer;
mod deduplicator;
mod dispatcher;
mod normalizer;
mod validator;

pub use coercer::{Coerced, CoercedRow, FieldCoercer, DEFAULT_ENUM_MAX_CHARS};
pub use deduplicator::{dedupe_rows, DedupedRows};
pub use dispatcher::UpsertDispatcher;
pub use normalizer::normalize_rows;
pub use validator::{validate_rows, ValidatedRows};

use std::sync::{Arc, Mutex};

use tracing::{info, warn};

use crate::application::use_cases::import_guard::ImportGuard;
use crate::domain::entity::EntityKind;
use crate::domain::error::{AppError, Result};
use crate::domain::import::{schema_for, EntitySchema, ImportReport, RawRow};
use crate::domain::record::Record;
use crate::infrastructure::db::RecordStore;
use crate::infrastructure::spreadsheet::{SpreadsheetReader, SpreadsheetSource};
use crate::interfaces::http::{add_log, LogEntry};

const LOG_SOURCE: &str = "Import";

/// Rows ready for storage plus the counters gathered on the way.
#[derive(Debug)]
pub struct PreparedBatch {
    pub records: Vec<Record>,
    pub total_rows: usize,
    pub rejected: usize,
    pub duplicates_removed: usize,
    pub invalid_fields: usize,
}

pub struct ImportPipeline {
    dispatcher: UpsertDispatcher,
    coercer: FieldCoercer,
    guard: ImportGuard,
}

impl ImportPipeline {
    pub fn new(store: Arc<dyn RecordStore>, coercer: FieldCoercer, guard: ImportGuard) -> Self {
        Self {
            dispatcher: UpsertDispatcher::new(store),
            coercer,
            guard,
        }
    }

    /// Import one spreadsheet into `kind`'s collection. Every failure is
    /// terminal and reported once to the activity log.
    pub async fn run(
        &self,
        kind: EntityKind,
        source: SpreadsheetSource,
        logs: &Mutex<Vec<LogEntry>>,
    ) -> Result<ImportReport> {
        match self.execute(kind, source).await {
            Ok(report) => {
                let level = if report.invalid_fields > 0 { "WARN" } else { "INFO" };
                add_log(logs, level, LOG_SOURCE, &format!("{}: {}", kind, report.summary()));
                Ok(report)
            }
            Err(e) => {
                warn!(entity = %kind, error = %e, "Import failed");
                add_log(logs, "ERROR", LOG_SOURCE, &format!("{}: {}", kind, e));
                Err(e)
            }
        }
    }

    async fn execute(&self, kind: EntityKind, source: SpreadsheetSource) -> Result<ImportReport> {
        let _permit = self.guard.try_acquire(kind)?;
        let schema = schema_for(kind);

        let raw_rows = tokio::task::spawn_blocking(move || SpreadsheetReader::read(source))
            .await
            .map_err(|e| AppError::Internal(format!("Spreadsheet reader task failed: {}", e)))??;

        let batch = self.prepare(schema, &raw_rows)?;
        info!(
            entity = %kind,
            total = batch.total_rows,
            accepted = batch.records.len(),
            rejected = batch.rejected,
            duplicates = batch.duplicates_removed,
            "Rows prepared"
        );
        if batch.invalid_fields > 0 {
            warn!(entity = %kind, count = batch.invalid_fields, "Oversized values cleared");
        }

        let records = self.dispatcher.dispatch(schema, &batch.records).await?;

        Ok(ImportReport {
            entity: kind,
            total_rows: batch.total_rows,
            imported: batch.records.len(),
            rejected: batch.rejected,
            duplicates_removed: batch.duplicates_removed,
            invalid_fields: batch.invalid_fields,
            records,
        })
    }

    /// The storage-free part of an import: normalize, validate, dedupe and
    /// coerce already-decoded rows.
    pub fn prepare(&self, schema: &EntitySchema, raw_rows: &[RawRow]) -> Result<PreparedBatch> {
        let rows = normalize_rows(schema, raw_rows)?;

        let validated = validate_rows(schema, rows);
        if validated.rows.is_empty() {
            return Err(AppError::NoValidData {
                rejected: validated.rejected,
            });
        }

        let deduped = dedupe_rows(schema, validated.rows);

        let mut invalid_fields = 0;
        let records = deduped
            .rows
            .iter()
            .map(|row| {
                let coerced = self.coercer.coerce_row(schema, row);
                invalid_fields += coerced.invalid_fields;
                coerced.record
            })
            .collect();

        Ok(PreparedBatch {
            records,
            total_rows: raw_rows.len(),
            rejected: validated.rejected,
            duplicates_removed: deduped.duplicates_removed,
            invalid_fields,
        })
    }
}
