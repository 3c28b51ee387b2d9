// ABOUTME: Lock module - distributed mutual exclusion keyed by lead identity.
// ABOUTME: Contains the LockManager, its config, and lock key derivation.

mod key;
mod manager;

pub use key::{KEY_PREFIX, LeadIdentity};
pub use manager::{ActiveLock, LockConfig, LockManager};

#[cfg(test)]
mod key_test;
