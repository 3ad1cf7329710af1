use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use super::{record_from_json, record_to_json, RecordStore};
use crate::domain::error::{AppError, Result};
use crate::domain::import::EntitySchema;
use crate::domain::record::Record;

const PREFER_MINIMAL: &str = "return=minimal";
const PREFER_REPRESENTATION: &str = "return=representation";
const PREFER_MERGE: &str = "resolution=merge-duplicates,return=minimal";

/// Hosted PostgREST-compatible backend (`{base}/rest/v1/{table}`).
pub struct RestStore {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl RestStore {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| AppError::ConfigError(format!("Invalid REST base URL: {}", e)))?;
        // Url::join replaces the last path segment unless it ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            client: reqwest::Client::new(),
            base_url,
            api_key: api_key.to_string(),
        })
    }

    fn table_url(&self, schema: &EntitySchema, query: &[(&str, String)]) -> Result<Url> {
        let mut url = self
            .base_url
            .join(&format!("rest/v1/{}", schema.kind.table()))
            .map_err(|e| AppError::Internal(format!("Failed to build URL: {}", e)))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn request(&self, method: Method, url: Url, prefer: &str) -> RequestBuilder {
        self.client
            .request(method, url)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", prefer)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            let message = format!("API error ({}): {}", status, error_message(&text));
            return Err(if status == StatusCode::CONFLICT {
                AppError::Conflict(message)
            } else {
                AppError::DatabaseError(message)
            });
        }
        Ok(response)
    }

    async fn rows(&self, schema: &EntitySchema, response: Response) -> Result<Vec<Record>> {
        let rows: Vec<Map<String, Value>> = response
            .json()
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to parse JSON: {}", e)))?;
        Ok(rows.iter().map(|row| record_from_json(schema, row)).collect())
    }

    async fn write_batch(
        &self,
        schema: &EntitySchema,
        body: Vec<Value>,
        query: &[(&str, String)],
        prefer: &str,
    ) -> Result<()> {
        let rows = body.len();
        let url = self.table_url(schema, query)?;
        self.send(self.request(Method::POST, url, prefer).json(&body))
            .await?;

        debug!(table = schema.kind.table(), rows, "Batch written");
        Ok(())
    }
}

/// PostgREST errors carry a JSON body with a `message` field.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|json| json["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

fn id_filter(id: i64) -> (&'static str, String) {
    ("id", format!("eq.{}", id))
}

#[async_trait]
impl RecordStore for RestStore {
    async fn fetch_all(&self, schema: &EntitySchema) -> Result<Vec<Record>> {
        let url = self.table_url(
            schema,
            &[("select", "*".to_string()), ("order", "id.asc".to_string())],
        )?;
        let response = self.send(self.request(Method::GET, url, PREFER_MINIMAL)).await?;
        self.rows(schema, response).await
    }

    async fn fetch_one(&self, schema: &EntitySchema, id: i64) -> Result<Option<Record>> {
        let url = self.table_url(schema, &[("select", "*".to_string()), id_filter(id)])?;
        let response = self.send(self.request(Method::GET, url, PREFER_MINIMAL)).await?;
        Ok(self.rows(schema, response).await?.into_iter().next())
    }

    async fn insert(&self, schema: &EntitySchema, record: &Record) -> Result<Record> {
        let url = self.table_url(schema, &[])?;
        let body = Value::Object(record_to_json(schema, record));
        let response = self
            .send(self.request(Method::POST, url, PREFER_REPRESENTATION).json(&body))
            .await?;

        self.rows(schema, response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::DatabaseError("Insert returned no row".to_string()))
    }

    async fn update(&self, schema: &EntitySchema, record: &Record) -> Result<Record> {
        let id = record
            .id
            .ok_or_else(|| AppError::ValidationError("Cannot update a row without id".to_string()))?;

        let body: Map<String, Value> = record_to_json(schema, record)
            .into_iter()
            .filter(|(key, _)| record.get(key).is_some())
            .collect();
        let url = self.table_url(schema, &[id_filter(id)])?;
        let response = self
            .send(self.request(Method::PATCH, url, PREFER_REPRESENTATION).json(&body))
            .await?;

        self.rows(schema, response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AppError::NotFound(format!("{} row {} does not exist", schema.kind, id)))
    }

    async fn delete(&self, schema: &EntitySchema, id: i64) -> Result<bool> {
        let url = self.table_url(schema, &[id_filter(id)])?;
        let response = self
            .send(self.request(Method::DELETE, url, PREFER_REPRESENTATION))
            .await?;
        Ok(!self.rows(schema, response).await?.is_empty())
    }

    async fn insert_batch(&self, schema: &EntitySchema, records: &[Record]) -> Result<()> {
        let body = records
            .iter()
            .map(|record| Value::Object(record_to_json(schema, record)))
            .collect();
        self.write_batch(schema, body, &[], PREFER_MINIMAL).await
    }

    async fn upsert_batch(
        &self,
        schema: &EntitySchema,
        records: &[Record],
        conflict_key: &str,
    ) -> Result<()> {
        // Internal columns are left alone when merging into existing rows
        let body = records
            .iter()
            .map(|record| {
                let mut object = record_to_json(schema, record);
                for field in schema.fields.iter().filter(|f| !f.exported) {
                    object.remove(field.name);
                }
                Value::Object(object)
            })
            .collect();
        self.write_batch(
            schema,
            body,
            &[("on_conflict", conflict_key.to_string())],
            PREFER_MERGE,
        )
        .await
    }
}
