pub mod rest;
pub mod sqlite;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::error::Result;
use crate::domain::import::EntitySchema;
use crate::domain::record::{FieldKind, FieldValue, Record};
use crate::shared::dates::parse_date_text;

pub use rest::RestStore;
pub use sqlite::SqliteStore;

/// Table-level persistence for every entity. Batch writes are
/// all-or-nothing: either every row is written or none is.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All rows ordered by surrogate id.
    async fn fetch_all(&self, schema: &EntitySchema) -> Result<Vec<Record>>;

    async fn fetch_one(&self, schema: &EntitySchema, id: i64) -> Result<Option<Record>>;

    /// Insert one row and return it with its assigned id.
    async fn insert(&self, schema: &EntitySchema, record: &Record) -> Result<Record>;

    /// Overwrite the fields present in `record` on the row `record.id`.
    async fn update(&self, schema: &EntitySchema, record: &Record) -> Result<Record>;

    /// Returns whether a row was removed.
    async fn delete(&self, schema: &EntitySchema, id: i64) -> Result<bool>;

    async fn insert_batch(&self, schema: &EntitySchema, records: &[Record]) -> Result<()>;

    /// Insert, or update the existing row sharing `conflict_key`.
    async fn upsert_batch(
        &self,
        schema: &EntitySchema,
        records: &[Record],
        conflict_key: &str,
    ) -> Result<()>;
}

/// JSON object with one key per schema field, absent fields as null.
pub fn record_to_json(schema: &EntitySchema, record: &Record) -> Map<String, Value> {
    let mut object = Map::new();
    for field in schema.fields {
        let value = match record.get(field.name) {
            Some(FieldValue::Text(text)) => Value::String(text.clone()),
            Some(FieldValue::Date(date)) => Value::String(date.to_rfc3339()),
            Some(FieldValue::Bool(flag)) => Value::Bool(*flag),
            Some(FieldValue::Null) | None => Value::Null,
        };
        object.insert(field.name.to_string(), value);
    }
    object
}

/// Decode a stored row. Unknown columns are ignored; values that do not fit
/// the field kind decode as null.
pub fn record_from_json(schema: &EntitySchema, object: &Map<String, Value>) -> Record {
    let mut record = Record::new();
    record.id = object.get("id").and_then(Value::as_i64);

    for field in schema.fields {
        let value = object.get(field.name).unwrap_or(&Value::Null);
        let decoded = match (field.kind, value) {
            (_, Value::Null) => FieldValue::Null,
            (FieldKind::Bool, Value::Bool(flag)) => FieldValue::Bool(*flag),
            (FieldKind::Date, Value::String(text)) => parse_date_text(text)
                .map(FieldValue::Date)
                .unwrap_or(FieldValue::Null),
            (FieldKind::Text | FieldKind::Enum, Value::String(text)) => FieldValue::Text(text.clone()),
            (FieldKind::Text | FieldKind::Enum, Value::Number(number)) => {
                FieldValue::Text(number.to_string())
            }
            _ => FieldValue::Null,
        };
        record.set(field.name, decoded);
    }
    record
}
