//! Pending-call table
//!
//! Correlates outstanding call ids with the single-use slot their caller is
//! waiting on.
//!
//! # Lifecycle of an entry
//!
//! 1. The sender task calls [`PendingTable::add`] before writing the frame,
//!    so a fast reply can never arrive ahead of its entry
//! 2. The receiver task calls [`PendingTable::process`] with the reply; the
//!    entry is removed and its slot fulfilled
//! 3. Or the caller gives up on its deadline and calls
//!    [`PendingTable::cancel`]; a reply that shows up later finds nothing
//! 4. Or the transport closes and [`PendingTable::fail_all`] releases every
//!    remaining caller
//!
//! Every path removes the entry under the lock, so a slot is fulfilled at
//! most once.

use ariarpc_core::{Error, Id, JsonRpcResponse, Result};
use std::collections::HashMap;
use std::time::Instant;
use tokio::sync::{oneshot, Mutex};

/// Completion slot handed to the table
pub type ReplySlot = oneshot::Sender<Result<JsonRpcResponse>>;

struct PendingEntry {
    tx: ReplySlot,
    enqueued_at: Instant,
}

/// Outcome of [`PendingTable::add`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Entry stored
    Added,
    /// The caller already gave up; nothing stored
    Abandoned,
}

/// Registry of in-flight calls
#[derive(Default)]
pub struct PendingTable {
    entries: Mutex<HashMap<String, PendingEntry>>,
}

impl PendingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a call
    ///
    /// A slot whose receiver is already dropped is not stored; the caller
    /// timed out while the request sat in the queue. A live entry for the
    /// same id is an error.
    pub async fn add(&self, id: &Id, tx: ReplySlot) -> Result<Admission> {
        let key = id
            .correlation_key()
            .ok_or_else(|| Error::InvalidParams(format!("id {} cannot correlate a reply", id)))?;

        let mut entries = self.entries.lock().await;
        if tx.is_closed() {
            return Ok(Admission::Abandoned);
        }
        if entries.contains_key(&key) {
            return Err(Error::InvalidParams(format!("id {} is already pending", id)));
        }
        entries.insert(
            key,
            PendingEntry {
                tx,
                enqueued_at: Instant::now(),
            },
        );
        Ok(Admission::Added)
    }

    /// Hand a reply to its waiting caller
    ///
    /// Returns `false` when no entry matches, which is expected for replies
    /// that arrive after their caller timed out.
    pub async fn process(&self, response: JsonRpcResponse) -> bool {
        let Some(key) = response.id.correlation_key() else {
            tracing::debug!("reply without usable id ignored");
            return false;
        };

        let entry = self.entries.lock().await.remove(&key);
        match entry {
            Some(entry) => {
                tracing::trace!(
                    id = %key,
                    waited_ms = entry.enqueued_at.elapsed().as_millis() as u64,
                    "reply matched"
                );
                // The caller may have just given up; nothing to do then.
                let _ = entry.tx.send(Ok(response));
                true
            }
            None => {
                tracing::debug!(id = %key, "no pending call for reply, discarding");
                false
            }
        }
    }

    /// Fail a single call
    pub async fn fail(&self, id: &Id, error: Error) -> bool {
        let Some(key) = id.correlation_key() else {
            return false;
        };
        match self.entries.lock().await.remove(&key) {
            Some(entry) => {
                let _ = entry.tx.send(Err(error));
                true
            }
            None => false,
        }
    }

    /// Drop a call's entry without notifying it
    pub async fn cancel(&self, id: &Id) -> bool {
        match id.correlation_key() {
            Some(key) => self.entries.lock().await.remove(&key).is_some(),
            None => false,
        }
    }

    /// Fail every pending call, leaving the table empty
    pub async fn fail_all(&self, error: Error) -> usize {
        let drained: Vec<PendingEntry> = {
            let mut entries = self.entries.lock().await;
            entries.drain().map(|(_, entry)| entry).collect()
        };
        let count = drained.len();
        for entry in drained {
            let _ = entry.tx.send(Err(error.clone()));
        }
        count
    }

    /// Number of live entries
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_add_and_process() {
        let table = PendingTable::new();
        let (tx, rx) = oneshot::channel();
        let id = Id::Number(1);

        assert_eq!(table.add(&id, tx).await.unwrap(), Admission::Added);
        assert_eq!(table.len().await, 1);

        assert!(table.process(JsonRpcResponse::success(json!(42), id)).await);
        assert!(table.is_empty().await);

        let resp = rx.await.unwrap().unwrap();
        assert_eq!(resp.result, Some(json!(42)));
    }

    #[tokio::test]
    async fn test_process_unknown_id_is_noop() {
        let table = PendingTable::new();
        let (tx, _rx) = oneshot::channel();
        table.add(&Id::Number(1), tx).await.unwrap();

        assert!(!table.process(JsonRpcResponse::success(json!(0), Id::Number(2))).await);
        assert_eq!(table.len().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let table = PendingTable::new();
        let (tx1, _rx1) = oneshot::channel();
        let (tx2, _rx2) = oneshot::channel();

        table.add(&Id::Number(5), tx1).await.unwrap();
        assert!(table.add(&Id::Number(5), tx2).await.is_err());
        assert_eq!(table.len().await, 1);
    }

    #[tokio::test]
    async fn test_abandoned_slot_not_stored() {
        let table = PendingTable::new();
        let (tx, rx) = oneshot::channel();
        drop(rx);

        assert_eq!(table.add(&Id::Number(1), tx).await.unwrap(), Admission::Abandoned);
        assert!(table.is_empty().await);
    }

    #[tokio::test]
    async fn test_null_id_rejected() {
        let table = PendingTable::new();
        let (tx, _rx) = oneshot::channel();
        assert!(table.add(&Id::Null, tx).await.is_err());
    }

    #[tokio::test]
    async fn test_cancel_then_late_reply() {
        let table = PendingTable::new();
        let (tx, rx) = oneshot::channel();
        let id = Id::Number(3);
        table.add(&id, tx).await.unwrap();

        assert!(table.cancel(&id).await);
        assert!(!table.cancel(&id).await);
        assert!(!table.process(JsonRpcResponse::success(json!("late"), id)).await);

        // Dropping the entry dropped the sender
        assert!(rx.await.is_err());
    }

    #[tokio::test]
    async fn test_fail_single() {
        let table = PendingTable::new();
        let (tx, rx) = oneshot::channel();
        table.add(&Id::from("abc"), tx).await.unwrap();

        assert!(table.fail(&Id::from("abc"), Error::Decode("bad".into())).await);
        assert!(matches!(rx.await.unwrap(), Err(Error::Decode(_))));
    }

    #[tokio::test]
    async fn test_fail_all() {
        let table = PendingTable::new();
        let (tx1, rx1) = oneshot::channel();
        let (tx2, rx2) = oneshot::channel();
        table.add(&Id::Number(1), tx1).await.unwrap();
        table.add(&Id::Number(2), tx2).await.unwrap();

        assert_eq!(table.fail_all(Error::ConnectionClosed).await, 2);
        assert!(table.is_empty().await);
        assert!(matches!(rx1.await.unwrap(), Err(Error::ConnectionClosed)));
        assert!(matches!(rx2.await.unwrap(), Err(Error::ConnectionClosed)));
    }
}
