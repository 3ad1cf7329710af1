use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, Sqlite};
use tracing::{debug, info};

use super::RecordStore;
use crate::domain::entity::EntityKind;
use crate::domain::error::{AppError, Result};
use crate::domain::import::{schema_for, EntitySchema};
use crate::domain::record::{FieldKind, FieldValue, Record};
use crate::shared::dates::parse_date_text;

type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

/// Local SQLite storage with one table per entity.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn init(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to parse connection string: {}", e))
            })?
            .create_if_missing(true);

        // An in-memory database lives and dies with its single connection.
        let pool_options = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to connect: {}", e)))?;

        let store = Self { pool };
        for kind in EntityKind::ALL {
            store.ensure_table(schema_for(kind)).await?;
        }

        info!(url = %database_url, "SQLite store ready");
        Ok(store)
    }

    pub async fn in_memory() -> Result<Self> {
        Self::init("sqlite::memory:").await
    }

    async fn ensure_table(&self, schema: &EntitySchema) -> Result<()> {
        let columns = schema
            .fields
            .iter()
            .map(|field| {
                let sql_type = match field.kind {
                    FieldKind::Bool => "INTEGER",
                    FieldKind::Text | FieldKind::Enum | FieldKind::Date => "TEXT",
                };
                format!("\"{}\" {}", field.name, sql_type)
            })
            .collect::<Vec<_>>()
            .join(",\n                ");

        let create = format!(
            "CREATE TABLE IF NOT EXISTS \"{}\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                {},
                created_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            schema.kind.table(),
            columns
        );
        sqlx::query(&create)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to create table: {}", e)))?;

        if let Some(key) = schema.conflict_key {
            let index = format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS \"idx_{table}_{key}\" ON \"{table}\" (\"{key}\")",
                table = schema.kind.table(),
                key = key
            );
            sqlx::query(&index)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::DatabaseError(format!("Failed to create index: {}", e)))?;
        }
        Ok(())
    }

    async fn write_batch(&self, sql: &str, schema: &EntitySchema, records: &[Record]) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to begin transaction: {}", e)))?;

        for record in records {
            bind_fields(sqlx::query(sql), schema, record)
                .execute(&mut *tx)
                .await
                .map_err(|e| AppError::DatabaseError(format!("Failed to write row: {}", e)))?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to commit: {}", e)))?;

        debug!(table = schema.kind.table(), rows = records.len(), "Batch written");
        Ok(())
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn fetch_all(&self, schema: &EntitySchema) -> Result<Vec<Record>> {
        let sql = format!("SELECT * FROM \"{}\" ORDER BY id ASC", schema.kind.table());
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to fetch rows: {}", e)))?;

        rows.iter().map(|row| row_to_record(schema, row)).collect()
    }

    async fn fetch_one(&self, schema: &EntitySchema, id: i64) -> Result<Option<Record>> {
        let sql = format!("SELECT * FROM \"{}\" WHERE id = ?", schema.kind.table());
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to fetch row: {}", e)))?;

        row.map(|row| row_to_record(schema, &row)).transpose()
    }

    async fn insert(&self, schema: &EntitySchema, record: &Record) -> Result<Record> {
        let sql = insert_sql(schema);
        let result = bind_fields(sqlx::query(&sql), schema, record)
            .execute(&self.pool)
            .await
            .map_err(|e| write_error("insert", e))?;

        let id = result.last_insert_rowid();
        self.fetch_one(schema, id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("Inserted row {} not found", id)))
    }

    async fn update(&self, schema: &EntitySchema, record: &Record) -> Result<Record> {
        let id = record
            .id
            .ok_or_else(|| AppError::ValidationError("Cannot update a row without id".to_string()))?;

        let fields: Vec<_> = schema
            .fields
            .iter()
            .filter(|field| record.get(field.name).is_some())
            .collect();

        if !fields.is_empty() {
            let assignments = fields
                .iter()
                .map(|field| format!("\"{}\" = ?", field.name))
                .collect::<Vec<_>>()
                .join(", ");
            let sql = format!(
                "UPDATE \"{}\" SET {} WHERE id = ?",
                schema.kind.table(),
                assignments
            );

            let mut query = sqlx::query(&sql);
            for field in &fields {
                query = bind_value(query, record.get(field.name));
            }
            let result = query
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(|e| write_error("update", e))?;

            if result.rows_affected() == 0 {
                return Err(AppError::NotFound(format!(
                    "{} row {} does not exist",
                    schema.kind, id
                )));
            }
        }

        self.fetch_one(schema, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{} row {} does not exist", schema.kind, id)))
    }

    async fn delete(&self, schema: &EntitySchema, id: i64) -> Result<bool> {
        let sql = format!("DELETE FROM \"{}\" WHERE id = ?", schema.kind.table());
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to delete row: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_batch(&self, schema: &EntitySchema, records: &[Record]) -> Result<()> {
        self.write_batch(&insert_sql(schema), schema, records).await
    }

    async fn upsert_batch(
        &self,
        schema: &EntitySchema,
        records: &[Record],
        conflict_key: &str,
    ) -> Result<()> {
        if schema.field(conflict_key).is_none() {
            return Err(AppError::ValidationError(format!(
                "'{}' is not a field of {}",
                conflict_key, schema.kind
            )));
        }

        // Internal columns keep their stored value on conflict
        let updates = schema
            .exported_fields()
            .map(|field| field.name)
            .filter(|name| *name != conflict_key)
            .map(|name| format!("\"{name}\" = excluded.\"{name}\"", name = name))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "{} ON CONFLICT(\"{}\") DO UPDATE SET {}",
            insert_sql(schema),
            conflict_key,
            updates
        );

        self.write_batch(&sql, schema, records).await
    }
}

/// Unique-index violations on single-row writes are conflicts, not store failures.
fn write_error(action: &str, err: sqlx::Error) -> AppError {
    let unique = err
        .as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false);
    if unique {
        AppError::Conflict(format!("Failed to {} row: {}", action, err))
    } else {
        AppError::DatabaseError(format!("Failed to {} row: {}", action, err))
    }
}

fn insert_sql(schema: &EntitySchema) -> String {
    let columns = schema
        .field_names()
        .map(|name| format!("\"{}\"", name))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; schema.fields.len()].join(", ");
    format!(
        "INSERT INTO \"{}\" ({}) VALUES ({})",
        schema.kind.table(),
        columns,
        placeholders
    )
}

fn bind_fields<'q>(mut query: SqliteQuery<'q>, schema: &EntitySchema, record: &Record) -> SqliteQuery<'q> {
    for field in schema.fields {
        query = bind_value(query, record.get(field.name));
    }
    query
}

fn bind_value<'q>(query: SqliteQuery<'q>, value: Option<&FieldValue>) -> SqliteQuery<'q> {
    match value {
        Some(FieldValue::Text(text)) => query.bind(text.clone()),
        Some(FieldValue::Date(date)) => query.bind(date.to_rfc3339()),
        Some(FieldValue::Bool(flag)) => query.bind(*flag),
        Some(FieldValue::Null) | None => query.bind(None::<String>),
    }
}

fn row_to_record(schema: &EntitySchema, row: &SqliteRow) -> Result<Record> {
    let decode_err =
        |e: sqlx::Error| AppError::DatabaseError(format!("Failed to decode row: {}", e));

    let mut record = Record::with_id(row.try_get::<i64, _>("id").map_err(decode_err)?);
    for field in schema.fields {
        let value = match field.kind {
            FieldKind::Bool => row
                .try_get::<Option<bool>, _>(field.name)
                .map_err(decode_err)?
                .map(FieldValue::Bool),
            FieldKind::Date => row
                .try_get::<Option<String>, _>(field.name)
                .map_err(decode_err)?
                .as_deref()
                .and_then(parse_date_text)
                .map(FieldValue::Date),
            FieldKind::Text | FieldKind::Enum => row
                .try_get::<Option<String>, _>(field.name)
                .map_err(decode_err)?
                .map(FieldValue::Text),
        };
        record.set(field.name, value.unwrap_or(FieldValue::Null));
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::import::{OFFICE_CONTACT_SCHEMA, TASK_SCHEMA};

    fn contact(name: &str, extension: &str) -> Record {
        let mut record = Record::new();
        record.set("name", FieldValue::Text(name.to_string()));
        record.set("extension", FieldValue::Text(extension.to_string()));
        record
    }

    #[tokio::test]
    async fn test_insert_fetch_update_delete() {
        let store = SqliteStore::in_memory().await.unwrap();

        let saved = store
            .insert(&OFFICE_CONTACT_SCHEMA, &contact("IT Helpdesk", "204"))
            .await
            .unwrap();
        let id = saved.id.unwrap();
        assert_eq!(saved.text("extension"), Some("204"));
        assert_eq!(saved.get("location"), Some(&FieldValue::Null));

        let mut patch = Record::with_id(id);
        patch.set("location", FieldValue::Text("Floor 2".to_string()));
        let updated = store.update(&OFFICE_CONTACT_SCHEMA, &patch).await.unwrap();
        assert_eq!(updated.text("location"), Some("Floor 2"));
        assert_eq!(updated.text("name"), Some("IT Helpdesk"));

        assert!(store.delete(&OFFICE_CONTACT_SCHEMA, id).await.unwrap());
        assert!(!store.delete(&OFFICE_CONTACT_SCHEMA, id).await.unwrap());
        assert!(store.fetch_one(&OFFICE_CONTACT_SCHEMA, id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_row_is_not_found() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut patch = Record::with_id(99);
        patch.set("name", FieldValue::Text("Nobody".to_string()));
        let err = store.update(&OFFICE_CONTACT_SCHEMA, &patch).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_upsert_updates_on_conflict_key() {
        let store = SqliteStore::in_memory().await.unwrap();
        let batch = vec![contact("Finance", "300"), contact("HR", "310")];
        store
            .upsert_batch(&OFFICE_CONTACT_SCHEMA, &batch, "name")
            .await
            .unwrap();
        store
            .upsert_batch(&OFFICE_CONTACT_SCHEMA, &[contact("Finance", "301")], "name")
            .await
            .unwrap();

        let rows = store.fetch_all(&OFFICE_CONTACT_SCHEMA).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].text("name"), Some("Finance"));
        assert_eq!(rows[0].text("extension"), Some("301"));
    }

    #[tokio::test]
    async fn test_failed_batch_writes_nothing() {
        let store = SqliteStore::in_memory().await.unwrap();
        let batch = vec![contact("Finance", "300"), contact("Finance", "301")];

        let err = store
            .insert_batch(&OFFICE_CONTACT_SCHEMA, &batch)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DatabaseError(_)));
        assert!(store.fetch_all(&OFFICE_CONTACT_SCHEMA).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_key_on_single_write_is_conflict() {
        let store = SqliteStore::in_memory().await.unwrap();
        store
            .insert(&OFFICE_CONTACT_SCHEMA, &contact("Finance", "300"))
            .await
            .unwrap();
        let hr = store
            .insert(&OFFICE_CONTACT_SCHEMA, &contact("HR", "310"))
            .await
            .unwrap();

        let err = store
            .insert(&OFFICE_CONTACT_SCHEMA, &contact("Finance", "301"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let mut rename = Record::with_id(hr.id.unwrap());
        rename.set("name", FieldValue::Text("Finance".to_string()));
        let err = store.update(&OFFICE_CONTACT_SCHEMA, &rename).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        assert_eq!(store.fetch_all(&OFFICE_CONTACT_SCHEMA).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_bool_and_date_round_trip() {
        let store = SqliteStore::in_memory().await.unwrap();
        let mut task = Record::new();
        task.set("title", FieldValue::Text("Audit".to_string()));
        task.set("completed", FieldValue::Bool(true));
        task.set(
            "due_date",
            FieldValue::Date(crate::shared::dates::serial_to_datetime(45000.0).unwrap()),
        );

        let saved = store.insert(&TASK_SCHEMA, &task).await.unwrap();
        assert_eq!(saved.get("completed"), Some(&FieldValue::Bool(true)));
        assert_eq!(saved.get("due_date"), task.get("due_date"));
    }

    #[tokio::test]
    async fn test_upsert_rejects_unknown_conflict_key() {
        let store = SqliteStore::in_memory().await.unwrap();
        let err = store
            .upsert_batch(&TASK_SCHEMA, &[], "missing")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
