use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entity::EntityKind;
use crate::domain::error::Result;
use crate::domain::import::schema_for;
use crate::domain::record::{FieldValue, Record};
use crate::infrastructure::db::RecordStore;

const UNSPECIFIED: &str = "unspecified";

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct TaskProgress {
    pub completed: usize,
    pub pending: usize,
    /// Pending tasks whose due date has passed
    pub overdue: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize)]
pub struct Statistics {
    pub totals: BTreeMap<String, usize>,
    pub employees_by_department: BTreeMap<String, usize>,
    pub tasks: TaskProgress,
    pub transactions_by_status: BTreeMap<String, usize>,
}

pub struct StatisticsUseCase {
    store: Arc<dyn RecordStore>,
}

impl StatisticsUseCase {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    pub async fn summary(&self) -> Result<Statistics> {
        let mut collections = BTreeMap::new();
        for kind in EntityKind::ALL {
            collections.insert(kind, self.store.fetch_all(schema_for(kind)).await?);
        }
        Ok(summarize(&collections, Utc::now()))
    }
}

pub fn summarize(collections: &BTreeMap<EntityKind, Vec<Record>>, now: DateTime<Utc>) -> Statistics {
    let empty = Vec::new();
    let of = |kind: EntityKind| collections.get(&kind).unwrap_or(&empty);

    let totals = EntityKind::ALL
        .iter()
        .map(|kind| (kind.slug().to_string(), of(*kind).len()))
        .collect();

    let mut tasks = TaskProgress::default();
    for task in of(EntityKind::Task) {
        if task.get("completed") == Some(&FieldValue::Bool(true)) {
            tasks.completed += 1;
            continue;
        }
        tasks.pending += 1;
        if task
            .get("due_date")
            .and_then(FieldValue::as_date)
            .map(|due| due < now)
            .unwrap_or(false)
        {
            tasks.overdue += 1;
        }
    }

    Statistics {
        totals,
        employees_by_department: count_by(of(EntityKind::Employee), "department"),
        tasks,
        transactions_by_status: count_by(of(EntityKind::Transaction), "status"),
    }
}

fn count_by(records: &[Record], field: &str) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        let key = record
            .text(field)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .unwrap_or(UNSPECIFIED);
        *counts.entry(key.to_string()).or_insert(0) += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn with(pairs: &[(&str, FieldValue)]) -> Record {
        let mut record = Record::new();
        for (field, value) in pairs {
            record.set(field, value.clone());
        }
        record
    }

    fn text(value: &str) -> FieldValue {
        FieldValue::Text(value.to_string())
    }

    #[test]
    fn test_summarize_counts() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let past = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();
        let future = Utc.with_ymd_and_hms(2024, 7, 1, 0, 0, 0).unwrap();

        let mut collections = BTreeMap::new();
        collections.insert(
            EntityKind::Employee,
            vec![
                with(&[("department", text("IT"))]),
                with(&[("department", text("IT"))]),
                with(&[("department", FieldValue::Null)]),
            ],
        );
        collections.insert(
            EntityKind::Task,
            vec![
                with(&[("completed", FieldValue::Bool(true)), ("due_date", FieldValue::Date(past))]),
                with(&[("completed", FieldValue::Bool(false)), ("due_date", FieldValue::Date(past))]),
                with(&[("completed", FieldValue::Bool(false)), ("due_date", FieldValue::Date(future))]),
                with(&[("completed", FieldValue::Bool(false))]),
            ],
        );
        collections.insert(
            EntityKind::Transaction,
            vec![with(&[("status", text("وارد"))]), with(&[("status", text("صادر"))])],
        );

        let stats = summarize(&collections, now);

        assert_eq!(stats.totals["employees"], 3);
        assert_eq!(stats.totals["office-contacts"], 0);
        assert_eq!(stats.employees_by_department["IT"], 2);
        assert_eq!(stats.employees_by_department[UNSPECIFIED], 1);
        assert_eq!(
            stats.tasks,
            TaskProgress {
                completed: 1,
                pending: 3,
                overdue: 1
            }
        );
        assert_eq!(stats.transactions_by_status.len(), 2);
    }

    #[tokio::test]
    async fn test_summary_reads_every_collection() {
        let store = Arc::new(crate::infrastructure::db::SqliteStore::in_memory().await.unwrap());
        let stats = StatisticsUseCase::new(store).summary().await.unwrap();
        assert_eq!(stats.totals.len(), EntityKind::ALL.len());
        assert!(stats.totals.values().all(|count| *count == 0));
    }
}
