//! Per-page mutual exclusion.
//!
//! A payment page's builder state, its transaction list and its aggregates form one unit.
//! Schema edits, payment submissions and status changes hold the page's guard for their
//! whole read-validate-write-recalculate sequence, so a submission is always validated
//! against the schema that is current when it is recorded.
//!
//! Table entries only live while some task holds or waits on them.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex as TableMutex, PoisonError},
};
use tokio::sync::{Mutex, OwnedMutexGuard};

type LockTable = HashMap<String, Arc<Mutex<()>>>;

/// Hands out one async mutex per page id.
#[derive(Debug, Default)]
pub struct PageLocks {
    inner: Arc<TableMutex<LockTable>>,
}

/// Exclusive access to one page. Dropping it releases the page.
#[derive(Debug)]
pub struct PageGuard {
    guard: Option<OwnedMutexGuard<()>>,
    page_id: String,
    table: Arc<TableMutex<LockTable>>,
}

impl PageLocks {
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to a page. Access ends when the guard is dropped.
    pub async fn acquire(&self, page_id: &str) -> PageGuard {
        let lock = {
            let mut table = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(table.entry(page_id.to_string()).or_default())
        };
        tracing::trace!("Acquiring lock for page {}", page_id);
        let guard = lock.lock_owned().await;

        PageGuard {
            guard: Some(guard),
            page_id: page_id.to_string(),
            table: Arc::clone(&self.inner),
        }
    }

    #[cfg(test)]
    pub(crate) fn tracked(&self) -> usize {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl Drop for PageGuard {
    fn drop(&mut self) {
        drop(self.guard.take());

        // Clones are only taken under the table lock, so a count of one means the table
        // holds the last reference and nobody is waiting.
        let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
        if table
            .get(&self.page_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            table.remove(&self.page_id);
        }
    }
}
