//! In-flight query table keyed by transaction ID.
//!
//! Three paths touch the table: send inserts, the receive loop removes on
//! match, the timeout path removes on expiry. Removal is atomic per key, so
//! whichever of receive and timeout gets there first owns completion and
//! the loser finds the entry already gone.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use nameq_domain::ResolveError;
use std::net::SocketAddr;
use tokio::sync::oneshot;

/// A matched datagram and where it came from.
pub(crate) type Reply = (SocketAddr, Vec<u8>);

/// How many random draws to try before declaring the ID space exhausted.
/// Hitting this with 65536 possible IDs means something is badly wrong.
const MAX_ID_ATTEMPTS: usize = 500;

pub(crate) struct PendingTable {
    entries: DashMap<u16, oneshot::Sender<Reply>>,
}

impl PendingTable {
    pub(crate) fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Reserves a random transaction ID not currently in flight and parks
    /// the completion channel under it.
    pub(crate) fn register(&self, tx: oneshot::Sender<Reply>) -> Result<u16, ResolveError> {
        let mut tx = Some(tx);
        for _ in 0..MAX_ID_ATTEMPTS {
            let id = fastrand::u16(..);
            if let Entry::Vacant(slot) = self.entries.entry(id) {
                if let Some(sender) = tx.take() {
                    slot.insert(sender);
                    return Ok(id);
                }
            }
        }
        Err(ResolveError::Internal(
            "transaction id space exhausted".into(),
        ))
    }

    /// Removes the entry for `id` and delivers the reply to its waiter.
    /// Returns false when nothing was pending under that ID.
    pub(crate) fn complete(&self, id: u16, from: SocketAddr, bytes: Vec<u8>) -> bool {
        match self.entries.remove(&id) {
            Some((_, tx)) => {
                // The waiter may have given up between removal and send;
                // that race resolves as a timeout on its side.
                let _ = tx.send((from, bytes));
                true
            }
            None => false,
        }
    }

    /// Drops the entry for `id`, if still present.
    pub(crate) fn remove(&self, id: u16) -> bool {
        self.entries.remove(&id).is_some()
    }
}
