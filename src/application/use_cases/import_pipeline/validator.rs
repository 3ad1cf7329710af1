use crate::domain::import::{EntitySchema, ImportRow};

#[derive(Debug)]
pub struct ValidatedRows {
    pub rows: Vec<ImportRow>,
    pub rejected: usize,
}

/// Keep only real data rows: drop header echoes (a natural-key cell that is
/// one of that column's header spellings) and rows with an empty required
/// field.
pub fn validate_rows(schema: &EntitySchema, rows: Vec<ImportRow>) -> ValidatedRows {
    let input_len = rows.len();

    let rows: Vec<ImportRow> = rows
        .into_iter()
        .filter(|row| {
            let header_echo = row
                .get(schema.natural_key)
                .map(|value| schema.is_header_echo(value))
                .unwrap_or(false);
            !header_echo && schema.required.iter().all(|field| row.is_filled(field))
        })
        .collect();

    ValidatedRows {
        rejected: input_len - rows.len(),
        rows,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::import::{EMPLOYEE_SCHEMA, TRANSACTION_SCHEMA};

    #[test]
    fn test_header_echo_rows_rejected() {
        let rows = vec![
            ImportRow::from([("employee_id", "الرقم الوظيفي")]),
            ImportRow::from([("employee_id", "Employee ID")]),
            ImportRow::from([("employee_id", "001")]),
        ];
        let validated = validate_rows(&EMPLOYEE_SCHEMA, rows);
        assert_eq!(validated.rows.len(), 1);
        assert_eq!(validated.rejected, 2);
    }

    #[test]
    fn test_rows_missing_required_fields_rejected() {
        let rows = vec![
            ImportRow::from([("transaction_number", "T-1"), ("subject", "Budget"), ("date", "45000")]),
            ImportRow::from([("transaction_number", "T-2"), ("subject", "  "), ("date", "45000")]),
            ImportRow::from([("transaction_number", "T-3"), ("subject", "Leave")]),
        ];
        let validated = validate_rows(&TRANSACTION_SCHEMA, rows);
        assert_eq!(validated.rows.len(), 1);
        assert_eq!(validated.rows[0].get("transaction_number"), Some("T-1"));
        assert_eq!(validated.rejected, 2);
    }
}
