use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::info;

use crate::application::use_cases::import_pipeline::{Coerced, FieldCoercer};
use crate::domain::entity::EntityKind;
use crate::domain::error::{AppError, Result};
use crate::domain::import::{schema_for, EntitySchema};
use crate::domain::record::{FieldKind, FieldValue, Record};
use crate::infrastructure::db::RecordStore;

/// Single-record management behind the dashboard forms.
pub struct DirectoryUseCase {
    store: Arc<dyn RecordStore>,
    coercer: FieldCoercer,
}

impl DirectoryUseCase {
    pub fn new(store: Arc<dyn RecordStore>, coercer: FieldCoercer) -> Self {
        Self { store, coercer }
    }

    pub async fn list(&self, kind: EntityKind) -> Result<Vec<Record>> {
        self.store.fetch_all(schema_for(kind)).await
    }

    pub async fn get(&self, kind: EntityKind, id: i64) -> Result<Record> {
        self.store
            .fetch_one(schema_for(kind), id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} {}", kind, id)))
    }

    /// Insert when `input` has no `id`, otherwise update the fields it names.
    pub async fn save(&self, kind: EntityKind, input: &Map<String, Value>) -> Result<Record> {
        let schema = schema_for(kind);
        let mut record = self.record_from_input(schema, input)?;

        let saved = match record.id {
            Some(_) => {
                ensure_required_not_cleared(schema, &record)?;
                self.store.update(schema, &record).await?
            }
            None => {
                for field in schema.fields {
                    if record.get(field.name).is_none() {
                        let empty = match field.kind {
                            FieldKind::Bool => FieldValue::Bool(false),
                            _ => FieldValue::Null,
                        };
                        record.set(field.name, empty);
                    }
                }
                ensure_required_not_cleared(schema, &record)?;
                self.store.insert(schema, &record).await?
            }
        };

        info!(entity = %kind, id = ?saved.id, "Record saved");
        Ok(saved)
    }

    pub async fn delete(&self, kind: EntityKind, id: i64) -> Result<()> {
        if !self.store.delete(schema_for(kind), id).await? {
            return Err(AppError::NotFound(format!("{} {}", kind, id)));
        }
        info!(entity = %kind, id, "Record deleted");
        Ok(())
    }

    fn record_from_input(&self, schema: &EntitySchema, input: &Map<String, Value>) -> Result<Record> {
        let mut record = Record::new();

        for (key, value) in input {
            if key == "id" {
                record.id = parse_id(value)?;
                continue;
            }
            let field = schema.field(key).ok_or_else(|| {
                AppError::ValidationError(format!("Unknown field '{}' for {}", key, schema.kind))
            })?;

            let raw = match value {
                Value::Null => String::new(),
                Value::String(s) => s.clone(),
                Value::Bool(b) => b.to_string(),
                Value::Number(n) => n.to_string(),
                Value::Array(_) | Value::Object(_) => {
                    return Err(AppError::ValidationError(format!(
                        "Field '{}' must be a scalar value",
                        key
                    )))
                }
            };

            match self.coercer.coerce_value(field.kind, &raw) {
                Coerced::Value(value) => record.set(field.name, value),
                Coerced::Invalid => {
                    return Err(AppError::ValidationError(format!(
                        "Value for '{}' is too long",
                        key
                    )))
                }
            }
        }

        Ok(record)
    }
}

fn parse_id(value: &Value) -> Result<Option<i64>> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n
            .as_i64()
            .map(Some)
            .ok_or_else(|| AppError::ValidationError(format!("Invalid id: {}", n))),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AppError::ValidationError(format!("Invalid id: {}", s))),
        other => Err(AppError::ValidationError(format!("Invalid id: {}", other))),
    }
}

/// Required fields present in `record` must hold a value.
fn ensure_required_not_cleared(schema: &EntitySchema, record: &Record) -> Result<()> {
    let empty: Vec<&str> = schema
        .required
        .iter()
        .copied()
        .filter(|field| record.get(field).map(FieldValue::is_null).unwrap_or(false))
        .collect();

    if empty.is_empty() {
        Ok(())
    } else {
        Err(AppError::ValidationError(format!(
            "Required fields are empty: {}",
            empty.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::db::SqliteStore;
    use serde_json::json;

    async fn directory() -> DirectoryUseCase {
        let store = Arc::new(SqliteStore::in_memory().await.unwrap());
        DirectoryUseCase::new(store, FieldCoercer::default())
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected a JSON object"),
        }
    }

    #[tokio::test]
    async fn test_insert_then_update_by_id() {
        let directory = directory().await;

        let saved = directory
            .save(
                EntityKind::Task,
                &object(json!({"title": "Renew permits", "due_date": "2024-06-01"})),
            )
            .await
            .unwrap();
        let id = saved.id.unwrap();
        assert_eq!(saved.get("completed"), Some(&FieldValue::Bool(false)));

        let updated = directory
            .save(EntityKind::Task, &object(json!({"id": id, "completed": "done"})))
            .await
            .unwrap();
        assert_eq!(updated.get("completed"), Some(&FieldValue::Bool(true)));
        assert_eq!(updated.text("title"), Some("Renew permits"));

        assert_eq!(directory.list(EntityKind::Task).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_field_rejected() {
        let directory = directory().await;
        let err = directory
            .save(
                EntityKind::OfficeContact,
                &object(json!({"name": "IT", "extension": "204", "salary": 10})),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_insert_requires_required_fields() {
        let directory = directory().await;
        let err = directory
            .save(EntityKind::OfficeContact, &object(json!({"name": "IT"})))
            .await
            .unwrap_err();
        match err {
            AppError::ValidationError(msg) => assert!(msg.contains("extension")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_oversized_enum_rejected_on_save() {
        let directory = directory().await;
        let err = directory
            .save(
                EntityKind::Employee,
                &object(json!({"employee_id": "001", "gender": "x".repeat(25)})),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_missing_ids_are_not_found() {
        let directory = directory().await;
        assert!(matches!(
            directory.get(EntityKind::Employee, 42).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            directory.delete(EntityKind::Employee, 42).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            directory
                .save(EntityKind::Employee, &object(json!({"id": 42, "nationality": "SA"})))
                .await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_removes_record() {
        let directory = directory().await;
        let saved = directory
            .save(
                EntityKind::Employee,
                &object(json!({"employee_id": "001", "full_name_ar": "علي"})),
            )
            .await
            .unwrap();
        let id = saved.id.unwrap();

        assert_eq!(directory.get(EntityKind::Employee, id).await.unwrap().id, Some(id));
        directory.delete(EntityKind::Employee, id).await.unwrap();
        assert!(directory.list(EntityKind::Employee).await.unwrap().is_empty());
    }
}
