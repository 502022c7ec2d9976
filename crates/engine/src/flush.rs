//! Durable flusher
//!
//! Drains the whole in-memory working set to a durable backend as a
//! destructive full resync: for every collection, the destination is
//! dropped and the current snapshot bulk-inserted in its place. One worker
//! thread per collection, all joined before `flush` returns; this is the
//! only parallel boundary in the system.
//!
//! There is no atomicity across collections and no retry: a failed bulk
//! operation does not roll back collections that already landed, and every
//! failure is collected into one [`FlushError`] naming the collections that
//! did not make it.

use anteroom_storage::Database;
use std::sync::Arc;
use std::thread;
use thiserror::Error;
use tracing::{debug, warn};

/// Error reported by a durable backend operation
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct BackendError(pub String);

impl BackendError {
    /// Backend error with a formatted message
    pub fn new(msg: impl Into<String>) -> Self {
        BackendError(msg.into())
    }
}

/// The two operations the flusher needs from a durable backend
///
/// Wire format and transport are the backend's business; the flusher hands
/// it opaque serialized records (JSON bytes of each document body).
pub trait DurableBackend: Send + Sync {
    /// Discard the destination collection's current contents
    fn drop_collection(&self, collection: &str) -> Result<(), BackendError>;

    /// Insert one batch of serialized records into the collection
    fn bulk_insert(&self, collection: &str, records: Vec<Vec<u8>>) -> Result<(), BackendError>;
}

/// One collection's failed flush
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlushFailure {
    /// Collection whose bulk operation failed
    pub collection: String,
    /// Backend error message
    pub message: String,
}

/// Aggregate of every collection that failed to flush
///
/// Collected rather than failing fast, so the caller learns the full
/// extent of the damage in one error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("flush failed for collection(s): {}", .failures.iter().map(|f| f.collection.as_str()).collect::<Vec<_>>().join(", "))]
pub struct FlushError {
    /// Per-collection failures, in snapshot order
    pub failures: Vec<FlushFailure>,
}

/// Full-resync flusher over a database and a durable backend
pub struct Flusher {
    database: Arc<Database>,
    backend: Arc<dyn DurableBackend>,
}

impl Flusher {
    /// Create a flusher writing `database` through `backend`
    pub fn new(database: Arc<Database>, backend: Arc<dyn DurableBackend>) -> Self {
        Flusher { database, backend }
    }

    /// Snapshot every collection and resync it to the backend
    ///
    /// Serialization happens on the calling thread; each collection's drop
    /// and bulk insert run on their own worker, and all workers are joined
    /// before this returns. Collections that flushed before a failure stay
    /// flushed.
    pub fn flush(&self) -> Result<(), FlushError> {
        let mut failures = Vec::new();
        let mut batches = Vec::new();

        for (name, collection) in self.database.collections() {
            let snapshot = collection.snapshot();
            let mut records = Vec::with_capacity(snapshot.len());
            let mut serialization_failed = false;
            for (id, document) in &snapshot {
                match serde_json::to_vec(document.body()) {
                    Ok(bytes) => records.push(bytes),
                    Err(e) => {
                        warn!(collection = %name, id = %id, "document serialization failed");
                        failures.push(FlushFailure {
                            collection: name.clone(),
                            message: format!("serialization of '{id}' failed: {e}"),
                        });
                        serialization_failed = true;
                        break;
                    }
                }
            }
            if !serialization_failed {
                batches.push((name, records));
            }
        }

        thread::scope(|scope| {
            let mut workers = Vec::with_capacity(batches.len());
            for (name, records) in batches {
                let backend = self.backend.clone();
                workers.push((
                    name.clone(),
                    scope.spawn(move || {
                        let count = records.len();
                        backend.drop_collection(&name)?;
                        backend.bulk_insert(&name, records)?;
                        debug!(collection = %name, records = count, "collection flushed");
                        Ok::<(), BackendError>(())
                    }),
                ));
            }

            for (name, worker) in workers {
                match worker.join() {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => failures.push(FlushFailure {
                        collection: name,
                        message: e.to_string(),
                    }),
                    Err(_) => failures.push(FlushFailure {
                        collection: name,
                        message: "flush worker panicked".to_string(),
                    }),
                }
            }
        });

        if failures.is_empty() {
            Ok(())
        } else {
            Err(FlushError { failures })
        }
    }
}
