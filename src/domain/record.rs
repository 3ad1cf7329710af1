use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Declared storage type of a canonical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Date,
    /// Short categorical text; longer values are treated as corrupted input.
    Enum,
    Bool,
}

/// A type-correct field value after coercion.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Date(DateTime<Utc>),
    Bool(bool),
    Null,
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_date(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Date(d) => Some(*d),
            _ => None,
        }
    }
}

/// One stored row of any entity. `id` is the storage surrogate key and is
/// `None` until the row has been written.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Record {
    pub id: Option<i64>,
    #[serde(flatten)]
    pub fields: BTreeMap<String, FieldValue>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_id(id: i64) -> Self {
        Self {
            id: Some(id),
            fields: BTreeMap::new(),
        }
    }

    pub fn set(&mut self, field: &str, value: FieldValue) {
        self.fields.insert(field.to_string(), value);
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.fields.get(field)
    }

    pub fn text(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(FieldValue::as_text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_record_serializes_flat() {
        let mut record = Record::with_id(7);
        record.set("name", FieldValue::Text("Reception".to_string()));
        record.set("completed", FieldValue::Bool(true));
        record.set("due_date", FieldValue::Null);
        record.set(
            "date",
            FieldValue::Date(Utc.with_ymd_and_hms(2023, 3, 15, 0, 0, 0).unwrap()),
        );

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], 7);
        assert_eq!(json["name"], "Reception");
        assert_eq!(json["completed"], true);
        assert!(json["due_date"].is_null());
        assert_eq!(json["date"], "2023-03-15T00:00:00Z");
    }
}
