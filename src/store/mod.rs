// ABOUTME: Lock store port - the shared key-value backend for distributed locks.
// ABOUTME: Only conditional single-round-trip primitives; no read-then-write sequences.

mod memory;

pub use memory::MemoryStore;

#[cfg(test)]
mod memory_test;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::StoreError;

/// Shared store backing the lock manager.
///
/// Implementations must make `set_if_absent` and `compare_and_delete`
/// atomic server-side operations (Redis `SET NX PX` and a compare-and-delete
/// script, a SQL transaction, or a mutex-guarded map in process). Client-side
/// read-then-write against the store reintroduces the race the lock exists
/// to prevent and is not a valid implementation.
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Set `key` to `value` with a TTL, only if the key is absent.
    /// Returns true if the key was set.
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError>;

    /// Delete `key` only if its current value equals `expected`.
    /// Returns true if the key was deleted.
    async fn compare_and_delete(&self, key: &str, expected: &str) -> Result<bool, StoreError>;

    /// Remaining TTL for `key`, or None if the key does not exist.
    async fn ttl_remaining(&self, key: &str) -> Result<Option<Duration>, StoreError>;

    /// All live keys starting with `prefix`. Operational introspection only.
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StoreError>;

    /// Unconditional delete. Returns true if the key existed.
    ///
    /// Backs the administrative `clear_all` escape hatch; steady-state lock
    /// code never calls this (release goes through `compare_and_delete`).
    async fn remove(&self, key: &str) -> Result<bool, StoreError>;
}
