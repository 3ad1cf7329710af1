use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::AppError;

/// The record collections managed by the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Employee,
    OfficeContact,
    Task,
    Transaction,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Employee,
        EntityKind::OfficeContact,
        EntityKind::Task,
        EntityKind::Transaction,
    ];

    /// Storage table name.
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::Employee => "employees",
            EntityKind::OfficeContact => "office_contacts",
            EntityKind::Task => "tasks",
            EntityKind::Transaction => "transactions",
        }
    }

    /// URL segment and export file prefix.
    pub fn slug(&self) -> &'static str {
        match self {
            EntityKind::Employee => "employees",
            EntityKind::OfficeContact => "office-contacts",
            EntityKind::Task => "tasks",
            EntityKind::Transaction => "transactions",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for EntityKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.slug() == normalized)
            .ok_or_else(|| AppError::NotFound(format!("Unknown entity '{}'", s)))
    }
}
