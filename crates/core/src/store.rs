//! File-backed keyed storage of expense records.
//!
//! The store is small by design: a single JSON snapshot of all records,
//! rewritten wholesale on every mutation, guarded by one exclusive lock.
//! Every read-modify-persist cycle goes through [`FileExpenseStore::mutate`],
//! which serializes it against all other mutations.
//!
//! Single-process only. If the snapshot file is shared across instances,
//! id uniqueness and atomic balance updates are no longer guaranteed; that
//! deployment needs an externally consistent store instead.

use std::collections::HashMap;
use std::path::PathBuf;

use tokio::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

use crate::expense::{ExpenseError, ExpenseRecord, ExpenseResult};

/// Durable keyed store of [`ExpenseRecord`]s backed by one snapshot file.
pub struct FileExpenseStore {
    path: PathBuf,
    records: Mutex<HashMap<Uuid, ExpenseRecord>>,
}

impl FileExpenseStore {
    /// Opens the store, loading the snapshot at `path`.
    ///
    /// A missing or unreadable snapshot loads as an empty store; startup
    /// never fails on bad storage.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let records = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(records) => records,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Unreadable expense snapshot, starting empty");
                    HashMap::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read expense snapshot, starting empty");
                HashMap::new()
            }
        };

        Self {
            path,
            records: Mutex::new(records),
        }
    }

    /// Inserts or fully overwrites a record by id and persists the snapshot.
    pub async fn put(&self, record: ExpenseRecord) -> ExpenseResult<ExpenseRecord> {
        let mut records = self.records.lock().await;
        records.insert(record.id, record.clone());
        self.persist(&records).await?;
        Ok(record)
    }

    /// Returns the record with the given id, if present.
    pub async fn get(&self, id: Uuid) -> Option<ExpenseRecord> {
        self.records.lock().await.get(&id).cloned()
    }

    /// Applies an in-memory transformation to a record and persists it.
    ///
    /// This is the only sanctioned way to apply a state transition: the
    /// read-modify-persist cycle holds the store lock throughout, so it is
    /// atomic with respect to every other mutation. If the transformation
    /// fails the stored record is left untouched.
    ///
    /// # Errors
    ///
    /// `NotFound` if the id is absent, the closure's error otherwise.
    pub async fn mutate<F>(&self, id: Uuid, f: F) -> ExpenseResult<ExpenseRecord>
    where
        F: FnOnce(&mut ExpenseRecord) -> ExpenseResult<()>,
    {
        let mut records = self.records.lock().await;
        let Some(existing) = records.get(&id) else {
            return Err(ExpenseError::NotFound(id));
        };

        let mut updated = existing.clone();
        f(&mut updated)?;

        records.insert(id, updated.clone());
        self.persist(&records).await?;
        Ok(updated)
    }

    /// Returns all records matching the predicate, in unspecified order.
    pub async fn list<P>(&self, predicate: P) -> Vec<ExpenseRecord>
    where
        P: Fn(&ExpenseRecord) -> bool,
    {
        self.records
            .lock()
            .await
            .values()
            .filter(|record| predicate(record))
            .cloned()
            .collect()
    }

    /// Returns the number of stored records.
    pub async fn count(&self) -> usize {
        self.records.lock().await.len()
    }

    /// Removes a record after the guard approves it.
    ///
    /// The guard runs on the stored record while the store lock is held,
    /// so the check and the removal are atomic with respect to every
    /// other mutation; a transition committed concurrently is always
    /// observed by the guard.
    ///
    /// # Errors
    ///
    /// `NotFound` if the id is absent, the guard's error otherwise.
    pub async fn delete_if<F>(&self, id: Uuid, guard: F) -> ExpenseResult<()>
    where
        F: FnOnce(&ExpenseRecord) -> ExpenseResult<()>,
    {
        let mut records = self.records.lock().await;
        let Some(existing) = records.get(&id) else {
            return Err(ExpenseError::NotFound(id));
        };
        guard(existing)?;

        records.remove(&id);
        self.persist(&records).await?;
        Ok(())
    }

    /// Rewrites the snapshot file: serialize, write to a temp file in the
    /// same directory, rename over the target.
    async fn persist(&self, records: &HashMap<Uuid, ExpenseRecord>) -> ExpenseResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ExpenseError::Storage(e.to_string()))?;
        }

        let bytes =
            serde_json::to_vec_pretty(records).map_err(|e| ExpenseError::Storage(e.to_string()))?;

        let tmp = self.path.with_extension("tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| ExpenseError::Storage(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| ExpenseError::Storage(e.to_string()))?;

        Ok(())
    }
}
