use crate::domain::import::{EntitySchema, ImportRow};
use crate::domain::record::{FieldKind, FieldValue, Record};
use crate::shared::dates::{parse_date_text, serial_to_datetime};

const TRUTHY: [&str; 10] = [
    "true", "1", "yes", "y", "نعم", "منجز", "مكتمل", "تم", "done", "completed",
];

pub const DEFAULT_ENUM_MAX_CHARS: usize = 20;

/// Result of converting one cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Coerced {
    Value(FieldValue),
    /// The cell was present but unusable for its field kind
    Invalid,
}

impl Coerced {
    pub fn into_value(self) -> FieldValue {
        match self {
            Coerced::Value(value) => value,
            Coerced::Invalid => FieldValue::Null,
        }
    }
}

#[derive(Debug)]
pub struct CoercedRow {
    pub record: Record,
    pub invalid_fields: usize,
}

/// Converts trimmed cell text into type-correct values per field kind.
#[derive(Debug, Clone)]
pub struct FieldCoercer {
    enum_max_chars: usize,
}

impl Default for FieldCoercer {
    fn default() -> Self {
        Self::new(DEFAULT_ENUM_MAX_CHARS)
    }
}

impl FieldCoercer {
    pub fn new(enum_max_chars: usize) -> Self {
        Self { enum_max_chars }
    }

    pub fn coerce_value(&self, kind: FieldKind, raw: &str) -> Coerced {
        let raw = raw.trim();
        match kind {
            FieldKind::Bool => Coerced::Value(FieldValue::Bool(is_truthy(raw))),
            _ if raw.is_empty() => Coerced::Value(FieldValue::Null),
            FieldKind::Text => Coerced::Value(FieldValue::Text(raw.to_string())),
            FieldKind::Enum => {
                if raw.chars().count() > self.enum_max_chars {
                    Coerced::Invalid
                } else {
                    Coerced::Value(FieldValue::Text(raw.to_string()))
                }
            }
            FieldKind::Date => Coerced::Value(coerce_date(raw)),
        }
    }

    /// Build a full record for `row`: every schema field gets a value, absent
    /// cells become null (or `false` for booleans).
    pub fn coerce_row(&self, schema: &EntitySchema, row: &ImportRow) -> CoercedRow {
        let mut record = Record::new();
        let mut invalid_fields = 0;

        for spec in schema.fields {
            let coerced = match row.get(spec.name) {
                Some(raw) => self.coerce_value(spec.kind, raw),
                None if spec.kind == FieldKind::Bool => Coerced::Value(FieldValue::Bool(false)),
                None => Coerced::Value(FieldValue::Null),
            };
            if coerced == Coerced::Invalid {
                invalid_fields += 1;
            }
            record.set(spec.name, coerced.into_value());
        }

        CoercedRow {
            record,
            invalid_fields,
        }
    }
}

fn is_truthy(raw: &str) -> bool {
    let lowered = raw.to_lowercase();
    TRUTHY.contains(&lowered.as_str())
}

/// Numeric text is a spreadsheet serial; anything else is parsed as a
/// calendar string. Unparseable input becomes null.
fn coerce_date(raw: &str) -> FieldValue {
    let parsed = match raw.parse::<f64>() {
        Ok(serial) => serial_to_datetime(serial),
        Err(_) => parse_date_text(raw),
    };
    parsed.map(FieldValue::Date).unwrap_or(FieldValue::Null)
}
