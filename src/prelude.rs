// ABOUTME: Prelude module - convenient imports for common use cases.
// ABOUTME: Use `use sluice::prelude::*;` to get started quickly.

pub use crate::call::{CallError, CallFuture, CallResult, HttpCall};
pub use crate::dispatch::{DispatchStats, Dispatcher, DispatcherConfig, Priority};
pub use crate::error::{DispatchError, LockError, SluiceError, StoreError};
pub use crate::lock::{ActiveLock, LeadIdentity, LockConfig, LockManager};
pub use crate::store::{LockStore, MemoryStore};
pub use crate::telemetry::{TelemetryBus, TelemetryEvent, TelemetrySink};
