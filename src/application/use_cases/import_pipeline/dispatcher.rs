use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::error::{AppError, Result};
use crate::domain::import::EntitySchema;
use crate::domain::record::Record;
use crate::infrastructure::db::RecordStore;

/// Writes a prepared batch in one all-or-nothing call, then re-reads the
/// whole collection so callers never patch their view row by row.
pub struct UpsertDispatcher {
    store: Arc<dyn RecordStore>,
}

impl UpsertDispatcher {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn dispatch(&self, schema: &EntitySchema, records: &[Record]) -> Result<Vec<Record>> {
        let written = match schema.conflict_key {
            Some(key) => self.store.upsert_batch(schema, records, key).await,
            None => self.store.insert_batch(schema, records).await,
        };

        if let Err(e) = written {
            warn!(table = schema.kind.table(), error = %e, "Batch write rejected");
            return Err(match e {
                AppError::DatabaseError(msg) | AppError::Upsert(msg) => AppError::Upsert(msg),
                other => AppError::Upsert(other.to_string()),
            });
        }

        info!(table = schema.kind.table(), rows = records.len(), "Batch written");
        self.store.fetch_all(schema).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::import::{OFFICE_CONTACT_SCHEMA, TASK_SCHEMA};
    use crate::domain::record::FieldValue;
    use crate::infrastructure::db::SqliteStore;

    fn contact(name: &str, extension: &str) -> Record {
        let mut record = Record::new();
        record.set("name", FieldValue::Text(name.to_string()));
        record.set("extension", FieldValue::Text(extension.to_string()));
        record
    }

    fn task(title: &str) -> Record {
        let mut record = Record::new();
        record.set("title", FieldValue::Text(title.to_string()));
        record.set("completed", FieldValue::Bool(false));
        record
    }

    #[tokio::test]
    async fn test_conflict_key_upserts() {
        let store = Arc::new(SqliteStore::in_memory().await.unwrap());
        let dispatcher = UpsertDispatcher::new(store);

        dispatcher
            .dispatch(&OFFICE_CONTACT_SCHEMA, &[contact("Reception", "100")])
            .await
            .unwrap();
        let records = dispatcher
            .dispatch(&OFFICE_CONTACT_SCHEMA, &[contact("Reception", "101")])
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].text("extension"), Some("101"));
    }

    #[tokio::test]
    async fn test_no_conflict_key_appends() {
        let store = Arc::new(SqliteStore::in_memory().await.unwrap());
        let dispatcher = UpsertDispatcher::new(store);

        dispatcher.dispatch(&TASK_SCHEMA, &[task("Audit")]).await.unwrap();
        let records = dispatcher.dispatch(&TASK_SCHEMA, &[task("Audit")]).await.unwrap();

        assert_eq!(records.len(), 2);
    }

    struct RejectingStore;

    #[async_trait::async_trait]
    impl RecordStore for RejectingStore {
        async fn fetch_all(&self, _schema: &EntitySchema) -> Result<Vec<Record>> {
            Ok(Vec::new())
        }
        async fn fetch_one(&self, _schema: &EntitySchema, _id: i64) -> Result<Option<Record>> {
            Ok(None)
        }
        async fn insert(&self, _schema: &EntitySchema, record: &Record) -> Result<Record> {
            Ok(record.clone())
        }
        async fn update(&self, _schema: &EntitySchema, record: &Record) -> Result<Record> {
            Ok(record.clone())
        }
        async fn delete(&self, _schema: &EntitySchema, _id: i64) -> Result<bool> {
            Ok(false)
        }
        async fn insert_batch(&self, _schema: &EntitySchema, _records: &[Record]) -> Result<()> {
            Err(AppError::DatabaseError("permission denied for table".to_string()))
        }
        async fn upsert_batch(
            &self,
            _schema: &EntitySchema,
            _records: &[Record],
            _conflict_key: &str,
        ) -> Result<()> {
            Err(AppError::DatabaseError("duplicate key value".to_string()))
        }
    }

    #[tokio::test]
    async fn test_store_failure_is_upsert_error() {
        let dispatcher = UpsertDispatcher::new(Arc::new(RejectingStore));

        let err = dispatcher
            .dispatch(&OFFICE_CONTACT_SCHEMA, &[contact("Archive", "300")])
            .await
            .unwrap_err();
        match err {
            AppError::Upsert(msg) => assert_eq!(msg, "duplicate key value"),
            other => panic!("unexpected error: {other}"),
        }

        let err = dispatcher.dispatch(&TASK_SCHEMA, &[task("Audit")]).await.unwrap_err();
        assert!(matches!(err, AppError::Upsert(_)));
    }
}
