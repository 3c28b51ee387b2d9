// ABOUTME: Distributed lock manager keyed by lead identity.
// ABOUTME: Bounded wait-and-retry acquire, owner-checked release, fail-open on store outage.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use uuid::Uuid;

use super::key::{KEY_PREFIX, LeadIdentity};
use crate::error::{LockError, StoreError};
use crate::store::LockStore;
use crate::telemetry::{TelemetryBus, TelemetryEvent};

/// Tuning knobs for lock acquisition.
#[derive(Debug, Clone)]
pub struct LockConfig {
    /// Automatic expiry for a held lock. Invariant: must exceed the
    /// worst-case duration of the protected operation with margin,
    /// otherwise the lock can expire mid-operation and a second caller
    /// runs concurrently. Default 30s against a 60s-timeout provider call
    /// assumes operations complete well under the HTTP timeout.
    pub ttl: Duration,

    /// Fixed delay between failed acquisition attempts.
    pub retry_delay: Duration,

    /// Acquisition attempts before giving up with `LockError::Timeout`.
    pub max_attempts: u32,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(30),
            retry_delay: Duration::from_millis(500),
            max_attempts: 10,
        }
    }
}

/// One currently-held lock, for operational introspection.
#[derive(Debug, Clone, Serialize)]
pub struct ActiveLock {
    pub key: String,
    pub ttl_remaining: Duration,
}

/// Outcome of the internal acquire loop.
enum Acquisition {
    /// We own the key; the owner token must be presented to release it.
    Acquired,
    /// Store outage: proceed without the lock rather than blocking writes.
    FailOpen,
    /// Another holder kept the key for the whole retry budget.
    TimedOut { attempts: u32 },
}

/// Distributed mutual exclusion for writes keyed by customer identity.
///
/// At most one operation per key runs at a time across every process
/// sharing the store. Holding is time-bounded: if a holder crashes, the
/// store's TTL releases the key without intervention.
///
/// The only store mutations are the two conditional primitives
/// (`set_if_absent`, `compare_and_delete`); there is deliberately no
/// read-then-write sequence anywhere in this type.
pub struct LockManager {
    store: Arc<dyn LockStore>,
    config: LockConfig,
    telemetry: Arc<TelemetryBus>,
}

impl LockManager {
    /// Create a lock manager with no telemetry sinks.
    pub fn new(store: Arc<dyn LockStore>, config: LockConfig) -> Self {
        Self::with_telemetry(store, config, Arc::new(TelemetryBus::new()))
    }

    /// Create a lock manager that emits lifecycle events to `telemetry`.
    pub fn with_telemetry(
        store: Arc<dyn LockStore>,
        config: LockConfig,
        telemetry: Arc<TelemetryBus>,
    ) -> Self {
        Self {
            store,
            config,
            telemetry,
        }
    }

    /// Run `op` while holding the lock for `identity`.
    ///
    /// On acquisition the lock is released afterwards in every case -
    /// success and failure alike - and `op`'s own error passes through
    /// unchanged. If the retry budget runs out, `op` is never run and the
    /// caller gets `LockError::Timeout`, which upstream code should map to
    /// a "please retry" response rather than a hard failure.
    ///
    /// If the store itself is unavailable the operation proceeds unlocked
    /// (fail open): availability is chosen over duplicate protection, and
    /// the degradation is logged at error severity.
    pub async fn with_lock<T, E, F, Fut>(&self, identity: &LeadIdentity, op: F) -> Result<T, E>
    where
        E: From<LockError>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let key = identity.lock_key();
        let owner = Uuid::new_v4().to_string();

        match self.acquire(&key, &owner).await {
            Acquisition::Acquired => {
                let result = op().await;
                self.release(&key, &owner).await;
                result
            }
            Acquisition::FailOpen => op().await,
            Acquisition::TimedOut { attempts } => {
                Err(E::from(LockError::Timeout { key, attempts }))
            }
        }
    }

    /// Attempt `set_if_absent` up to the configured budget.
    async fn acquire(&self, key: &str, owner: &str) -> Acquisition {
        for attempt in 1..=self.config.max_attempts {
            match self
                .store
                .set_if_absent(key, owner, self.config.ttl)
                .await
            {
                Ok(true) => {
                    tracing::debug!(key, owner, attempt, "lock acquired");
                    self.telemetry
                        .emit(TelemetryEvent::LockAcquired {
                            key: key.to_string(),
                            owner: owner.to_string(),
                        })
                        .await;
                    return Acquisition::Acquired;
                }
                Ok(false) => {
                    tracing::debug!(key, attempt, "lock busy, waiting");
                    self.telemetry
                        .emit(TelemetryEvent::LockContended {
                            key: key.to_string(),
                            attempt,
                        })
                        .await;
                    if attempt < self.config.max_attempts {
                        tokio::time::sleep(self.config.retry_delay).await;
                    }
                }
                Err(err) => {
                    tracing::error!(
                        key,
                        error = %err,
                        "lock store unavailable, proceeding WITHOUT lock"
                    );
                    self.telemetry
                        .emit(TelemetryEvent::StoreFailOpen {
                            key: key.to_string(),
                            error: err.to_string(),
                        })
                        .await;
                    return Acquisition::FailOpen;
                }
            }
        }

        tracing::warn!(
            key,
            attempts = self.config.max_attempts,
            "lock acquisition timed out"
        );
        self.telemetry
            .emit(TelemetryEvent::LockTimedOut {
                key: key.to_string(),
                attempts: self.config.max_attempts,
            })
            .await;
        Acquisition::TimedOut {
            attempts: self.config.max_attempts,
        }
    }

    /// Release the key if we still own it. Never deletes unconditionally:
    /// after a TTL expiry another owner may hold the key, and their lock
    /// must survive our late release.
    async fn release(&self, key: &str, owner: &str) {
        match self.store.compare_and_delete(key, owner).await {
            Ok(released) => {
                if released {
                    tracing::debug!(key, owner, "lock released");
                } else {
                    tracing::warn!(key, owner, "lock not released (expired or foreign-owned)");
                }
                self.telemetry
                    .emit(TelemetryEvent::LockReleased {
                        key: key.to_string(),
                        owner: owner.to_string(),
                        released,
                    })
                    .await;
            }
            Err(err) => {
                // TTL reclaims the key if the store comes back
                tracing::error!(key, error = %err, "lock release failed");
            }
        }
    }

    /// Delete every lock in this manager's namespace. Returns how many were
    /// removed. Operational escape hatch; not part of the steady-state
    /// contract.
    pub async fn clear_all(&self) -> Result<usize, StoreError> {
        let keys = self.store.list_keys(KEY_PREFIX).await?;
        let mut cleared = 0;
        for key in &keys {
            if self.store.remove(key).await? {
                cleared += 1;
            }
        }
        tracing::info!(cleared, "cleared all locks");
        Ok(cleared)
    }

    /// Snapshot of currently-held locks with their remaining TTLs.
    pub async fn list_active(&self) -> Result<Vec<ActiveLock>, StoreError> {
        let keys = self.store.list_keys(KEY_PREFIX).await?;
        let mut active = Vec::with_capacity(keys.len());
        for key in keys {
            if let Some(ttl_remaining) = self.store.ttl_remaining(&key).await? {
                active.push(ActiveLock { key, ttl_remaining });
            }
        }
        Ok(active)
    }
}
