// ============================================================
// IMPORT ROW TYPES
// ============================================================

use std::collections::HashMap;

/// A row as read from the sheet: (raw header, raw cell text) pairs in column
/// order. Blank cells are present as empty strings.
pub type RawRow = Vec<(String, String)>;

/// A row keyed by canonical field names. Values are trimmed strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportRow {
    values: HashMap<String, String>,
}

impl ImportRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: &str, value: impl Into<String>) {
        self.values.insert(field.to_string(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.values.get(field).map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }

    /// Present and non-empty after trimming.
    pub fn is_filled(&self, field: &str) -> bool {
        self.get(field).map(|v| !v.trim().is_empty()).unwrap_or(false)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }
}

impl<const N: usize> From<[(&str, &str); N]> for ImportRow {
    fn from(pairs: [(&str, &str); N]) -> Self {
        let mut row = ImportRow::new();
        for (field, value) in pairs {
            row.insert(field, value);
        }
        row
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_filled_ignores_whitespace() {
        let row = ImportRow::from([("name", "  "), ("extension", "204")]);
        assert!(!row.is_filled("name"));
        assert!(row.is_filled("extension"));
        assert!(!row.is_filled("department"));
    }
}
