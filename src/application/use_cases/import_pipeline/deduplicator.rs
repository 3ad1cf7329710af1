use std::collections::HashMap;

use crate::domain::import::{EntitySchema, ImportRow};

#[derive(Debug)]
pub struct DedupedRows {
    pub rows: Vec<ImportRow>,
    pub duplicates_removed: usize,
}

/// Collapse rows sharing a natural key (compared after trimming).
///
/// The surviving row sits where the key first appeared but carries the data
/// of its last occurrence, so the bottom of the sheet wins.
pub fn dedupe_rows(schema: &EntitySchema, rows: Vec<ImportRow>) -> DedupedRows {
    let input_len = rows.len();
    let mut positions: HashMap<String, usize> = HashMap::with_capacity(input_len);
    let mut unique: Vec<ImportRow> = Vec::with_capacity(input_len);

    for row in rows {
        let key = row.get(schema.natural_key).unwrap_or_default().trim().to_string();
        match positions.get(&key) {
            Some(&index) => unique[index] = row,
            None => {
                positions.insert(key, unique.len());
                unique.push(row);
            }
        }
    }

    DedupedRows {
        duplicates_removed: input_len - unique.len(),
        rows: unique,
    }
}
