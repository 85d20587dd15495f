use crate::error::ResultError;
use model::records::status::VerificationStatus;
use std::{
    collections::{HashMap, hash_map::Entry},
    sync::{Mutex, MutexGuard, PoisonError},
};
use tokio::sync::Notify;

/// Run-wide map from row index to its verification status.
///
/// Each index is written exactly once. Workers record whole batches under a
/// single short lock that is never held across an await point; the
/// coordinator can wait on [`ResultTable::changed`] for new entries.
#[derive(Debug)]
pub struct ResultTable {
    statuses: Mutex<HashMap<u64, VerificationStatus>>,
    notify: Notify,
}

impl ResultTable {
    pub fn new() -> Self {
        ResultTable {
            statuses: Mutex::new(HashMap::new()),
            notify: Notify::new(),
        }
    }

    pub fn record(&self, index: u64, status: VerificationStatus) -> Result<(), ResultError> {
        self.record_all([(index, status)])
    }

    /// Records every entry or stops at the first index that already has a
    /// status. Entries recorded before the duplicate are kept.
    pub fn record_all<I>(&self, entries: I) -> Result<(), ResultError>
    where
        I: IntoIterator<Item = (u64, VerificationStatus)>,
    {
        let outcome = {
            let mut statuses = self.lock();
            entries
                .into_iter()
                .try_for_each(|(index, status)| match statuses.entry(index) {
                    Entry::Occupied(_) => Err(ResultError::AlreadyRecorded { index }),
                    Entry::Vacant(slot) => {
                        slot.insert(status);
                        Ok(())
                    }
                })
        };

        self.notify.notify_one();
        outcome
    }

    pub fn get(&self, index: u64) -> Option<VerificationStatus> {
        self.lock().get(&index).copied()
    }

    pub fn contains(&self, index: u64) -> bool {
        self.lock().contains_key(&index)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Resolves after the next write, or immediately if a write happened
    /// since the last call.
    pub async fn changed(&self) {
        self.notify.notified().await;
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u64, VerificationStatus>> {
        // Entries are plain values, a panicking writer cannot leave one half-written.
        self.statuses.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ResultTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, time::Duration};

    #[test]
    fn test_record_is_write_once() {
        let table = ResultTable::new();
        table.record(3, VerificationStatus::Exists).unwrap();

        let err = table.record(3, VerificationStatus::Error).unwrap_err();
        assert!(matches!(err, ResultError::AlreadyRecorded { index: 3 }));
        assert_eq!(table.get(3), Some(VerificationStatus::Exists));
    }

    #[test]
    fn test_record_all() {
        let table = ResultTable::new();
        table
            .record_all([
                (0, VerificationStatus::Exists),
                (1, VerificationStatus::NonExist),
            ])
            .unwrap();

        assert_eq!(table.len(), 2);
        assert!(table.contains(1));
        assert!(!table.contains(2));
        assert_eq!(table.get(1), Some(VerificationStatus::NonExist));
    }

    #[tokio::test]
    async fn test_changed_wakes_waiter() {
        let table = Arc::new(ResultTable::new());
        let waiter = {
            let table = Arc::clone(&table);
            tokio::spawn(async move { table.changed().await })
        };

        table.record(0, VerificationStatus::Error).unwrap();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter was not notified")
            .unwrap();
    }
}
