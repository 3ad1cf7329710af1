// ============================================================
// ENTITY SCHEMA
// ============================================================
// Static per-entity configuration driving the generic import pipeline

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::entity::EntityKind;
use crate::domain::record::FieldKind;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Canonical form used for every header and alias comparison:
/// trimmed, lower-cased, inner whitespace collapsed to one space.
pub fn normalize_header(header: &str) -> String {
    WHITESPACE_RUN
        .replace_all(header.trim(), " ")
        .to_lowercase()
}

/// One canonical field and the header spellings that map to it.
#[derive(Debug)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,

    /// Recognized header spellings besides the canonical name
    pub aliases: &'static [&'static str],

    /// Internal-only fields are stored but never exported
    pub exported: bool,
}

impl FieldSpec {
    pub const fn new(name: &'static str, kind: FieldKind, aliases: &'static [&'static str]) -> Self {
        Self {
            name,
            kind,
            aliases,
            exported: true,
        }
    }

    pub const fn internal(mut self) -> Self {
        self.exported = false;
        self
    }

    /// Whether `header` names this field, ignoring case and surrounding space.
    pub fn matches(&self, header: &str) -> bool {
        let header = normalize_header(header);
        if header.is_empty() {
            return false;
        }
        normalize_header(self.name) == header
            || self.aliases.iter().any(|alias| normalize_header(alias) == header)
    }
}

#[derive(Debug)]
pub struct EntitySchema {
    pub kind: EntityKind,
    pub fields: &'static [FieldSpec],

    /// Fields that must be present and non-empty for a row to be accepted
    pub required: &'static [&'static str],

    /// Duplicate detection key within one file
    pub natural_key: &'static str,

    /// Storage unique constraint used for upsert; `None` means plain insert
    pub conflict_key: Option<&'static str>,
}

impl EntitySchema {
    pub fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|f| f.name)
    }

    /// Resolve a raw header to its canonical field name.
    pub fn canonical_for(&self, header: &str) -> Option<&'static str> {
        self.fields.iter().find(|f| f.matches(header)).map(|f| f.name)
    }

    /// A natural-key value that is really one of that column's header
    /// spellings, i.e. a header row parsed as data.
    pub fn is_header_echo(&self, value: &str) -> bool {
        self.field(self.natural_key)
            .map(|spec| spec.matches(value))
            .unwrap_or(false)
    }

    pub fn exported_fields(&self) -> impl Iterator<Item = &'static FieldSpec> + '_ {
        self.fields.iter().filter(|f| f.exported)
    }
}
