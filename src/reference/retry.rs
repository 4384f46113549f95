use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{Level, event};

use crate::manager::{EntityFailure, ManagerFault};

/// Busy-retry executor for lifecycle operations.
///
/// The server rejects an operation with a busy signal when the entity is
/// transiently occupied servicing another client. Re-running the unit of
/// work here keeps that contention handling out of every call site, at the
/// cost of blocking the caller for as long as the server stays busy.
///
/// Unbounded by default, matching the platform contract that a busy entity
/// eventually clears. A `max_attempts` cap can be configured; once the cap
/// is reached the busy fault is returned unchanged so the operation's own
/// classifier decides what it means.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusyRetryPolicy {
    /// Fixed delay between attempts in milliseconds. No backoff growth.
    pub retry_interval_ms: u64,
    /// Maximum number of busy rejections tolerated before the busy fault
    /// surfaces. `None` retries indefinitely.
    pub max_attempts: Option<u32>,
}

impl Default for BusyRetryPolicy {
    fn default() -> Self {
        Self {
            retry_interval_ms: 2_000,
            max_attempts: None,
        }
    }
}

impl BusyRetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the fixed delay between attempts.
    pub fn retry_interval(mut self, interval: Duration) -> Self {
        self.retry_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Cap the number of busy rejections tolerated.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Re-invoke `unit` while it fails with a busy signal.
    ///
    /// Every retry is logged at INFO with the operation name. Any non-busy
    /// outcome, including success, typed failures, transport faults and
    /// interrupted waits, stops the loop immediately and is returned
    /// unchanged.
    pub async fn run<T, F, Fut>(
        &self,
        operation: &str,
        mut unit: F,
    ) -> std::result::Result<T, ManagerFault>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, ManagerFault>>,
    {
        let mut busy_rejections: u32 = 0;

        loop {
            match unit().await {
                Err(ManagerFault::Entity(EntityFailure::Busy)) => {
                    busy_rejections += 1;
                    if let Some(cap) = self.max_attempts {
                        if busy_rejections >= cap {
                            return Err(ManagerFault::Entity(EntityFailure::Busy));
                        }
                    }

                    event!(Level::INFO, operation, "operation delayed, busy wait");
                    sleep(Duration::from_millis(self.retry_interval_ms)).await;
                }
                outcome => return outcome,
            }
        }
    }
}
