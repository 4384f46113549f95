use std::sync::atomic::{AtomicU64, Ordering};

use crate::core::types::ClientInstanceId;

/// Connection-scoped source of client instance identifiers.
///
/// One allocator is shared by every reference on a connection, so each
/// fetched instance can be individually addressed by the server. Values are
/// issued in strict allocation order and never reused for the lifetime of
/// the connection, regardless of which reference or task asked.
#[derive(Debug)]
pub struct InstanceIdAllocator {
    next: AtomicU64,
}

impl InstanceIdAllocator {
    /// The first issued id is 1.
    pub fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    /// Fetch-and-increment. Safe under unbounded concurrent callers.
    pub fn next_id(&self) -> ClientInstanceId {
        ClientInstanceId::new(self.next.fetch_add(1, Ordering::SeqCst))
    }
}

impl Default for InstanceIdAllocator {
    fn default() -> Self {
        Self::new()
    }
}
