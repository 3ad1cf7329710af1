use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::domain::entity::EntityKind;
use crate::domain::error::{AppError, Result};

/// One in-flight import per entity kind. Imports of different kinds may run
/// side by side.
#[derive(Debug, Clone, Default)]
pub struct ImportGuard {
    flags: Arc<[AtomicBool; 4]>,
}

impl ImportGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self, kind: EntityKind) -> Result<ImportPermit> {
        let index = slot(kind);
        self.flags[index]
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AppError::ImportInProgress(kind.to_string()))?;

        Ok(ImportPermit {
            flags: Arc::clone(&self.flags),
            index,
        })
    }

    pub fn is_importing(&self, kind: EntityKind) -> bool {
        self.flags[slot(kind)].load(Ordering::Acquire)
    }
}

fn slot(kind: EntityKind) -> usize {
    match kind {
        EntityKind::Employee => 0,
        EntityKind::OfficeContact => 1,
        EntityKind::Task => 2,
        EntityKind::Transaction => 3,
    }
}

/// Held for the duration of an import; releases the slot when dropped,
/// whether the import succeeded, failed or panicked.
#[derive(Debug)]
pub struct ImportPermit {
    flags: Arc<[AtomicBool; 4]>,
    index: usize,
}

impl Drop for ImportPermit {
    fn drop(&mut self) {
        self.flags[self.index].store(false, Ordering::Release);
    }
}
