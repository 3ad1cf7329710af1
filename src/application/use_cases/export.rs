use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, NaiveTime, SecondsFormat, Utc};
use tracing::info;

use crate::domain::entity::EntityKind;
use crate::domain::error::Result;
use crate::domain::import::{schema_for, EntitySchema};
use crate::domain::record::{FieldValue, Record};
use crate::infrastructure::db::RecordStore;
use crate::infrastructure::spreadsheet::{write_workbook, SheetCell};

#[derive(Debug)]
pub struct ExportFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// `<slug>_<YYYY-MM-DD>.xlsx`
pub fn export_file_name(kind: EntityKind, date: NaiveDate) -> String {
    format!("{}_{}.xlsx", kind.slug(), date.format("%Y-%m-%d"))
}

pub struct ExportUseCase {
    store: Arc<dyn RecordStore>,
}

impl ExportUseCase {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Write the current collection to a workbook whose headers are the
    /// canonical field names, so the file can be imported back unchanged.
    pub async fn export(&self, kind: EntityKind) -> Result<ExportFile> {
        let schema = schema_for(kind);
        let records = self.store.fetch_all(schema).await?;

        let headers: Vec<&str> = schema.exported_fields().map(|f| f.name).collect();
        let rows: Vec<Vec<SheetCell>> = records.iter().map(|r| export_row(schema, r)).collect();
        let bytes = write_workbook(kind.slug(), &headers, &rows)?;

        info!(entity = %kind, rows = rows.len(), "Collection exported");
        Ok(ExportFile {
            file_name: export_file_name(kind, Local::now().date_naive()),
            bytes,
        })
    }
}

fn export_row(schema: &EntitySchema, record: &Record) -> Vec<SheetCell> {
    schema
        .exported_fields()
        .map(|field| match record.get(field.name) {
            Some(FieldValue::Text(text)) => SheetCell::Text(text.clone()),
            Some(FieldValue::Date(date)) => SheetCell::Text(date_text(date)),
            Some(FieldValue::Bool(flag)) => SheetCell::Bool(*flag),
            Some(FieldValue::Null) | None => SheetCell::Blank,
        })
        .collect()
}

/// Plain `YYYY-MM-DD` at midnight, full RFC 3339 otherwise so the time of
/// day survives a re-import.
fn date_text(date: &DateTime<Utc>) -> String {
    if date.time() == NaiveTime::MIN {
        date.format("%Y-%m-%d").to_string()
    } else {
        date.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    }
}
