use std::collections::HashMap;

use crate::domain::error::{AppError, Result};
use crate::domain::import::{EntitySchema, ImportRow, RawRow};

/// Re-key raw rows by canonical field name, trimming values and dropping
/// columns no alias recognizes.
///
/// The first normalized row must carry every required field as a key;
/// otherwise the whole file is rejected with `MissingColumns`.
pub fn normalize_rows(schema: &EntitySchema, raw_rows: &[RawRow]) -> Result<Vec<ImportRow>> {
    // Sheets repeat the same headers on every row; resolve each spelling once.
    let mut resolved: HashMap<&str, Option<&'static str>> = HashMap::new();

    let rows: Vec<ImportRow> = raw_rows
        .iter()
        .map(|raw| {
            let mut row = ImportRow::new();
            for (header, value) in raw {
                let canonical = *resolved
                    .entry(header.as_str())
                    .or_insert_with(|| schema.canonical_for(header));
                if let Some(field) = canonical {
                    row.insert(field, value.trim());
                }
            }
            row
        })
        .collect();

    let first = rows.first().ok_or(AppError::EmptyFile)?;
    let missing: Vec<String> = schema
        .required
        .iter()
        .filter(|field| !first.contains(field))
        .map(|field| field.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(AppError::MissingColumns(missing));
    }

    Ok(rows)
}
