// ABOUTME: Root module for sluice - outbound API governance library.
// ABOUTME: Re-exports the dispatcher, lock manager, store port, and telemetry.

//! Admission control for a rate-limited third-party API.
//!
//! Two cooperating components protect the provider:
//!
//! - [`Dispatcher`](dispatch::Dispatcher) serializes all outbound calls
//!   through one priority queue with a fixed-window rate ceiling and bounded
//!   retry on provider rate limits.
//! - [`LockManager`](lock::LockManager) grants time-bounded exclusive
//!   ownership of a customer identity across process instances, so two
//!   writes for the same real-world entity never race.
//!
//! # Composing the two
//!
//! Any write that could plausibly fire twice for the same entity (double
//! form submit, concurrent webhook retry) must take the lock FIRST and
//! route its network calls through the dispatcher INSIDE the lock body:
//!
//! ```no_run
//! # async fn doc(manager: sluice::lock::LockManager, dispatcher: std::sync::Arc<sluice::dispatch::Dispatcher>) {
//! use sluice::prelude::*;
//!
//! let identity = LeadIdentity::new("a@b.com", "+7 700 123 45 67");
//! let dispatcher_in_op = dispatcher.clone();
//! let result: Result<serde_json::Value, SluiceError> = manager
//!     .with_lock(&identity, || async move {
//!         let lead = dispatcher_in_op
//!             .enqueue(
//!                 "create-lead",
//!                 || -> CallFuture { Box::pin(async { Ok(serde_json::json!({"id": 1})) }) },
//!                 Priority::Critical,
//!             )
//!             .await?;
//!         Ok(lead)
//!     })
//!     .await;
//! # let _ = result;
//! # }
//! ```
//!
//! The reverse nesting (dispatch outside, lock inside) is incorrect: two
//! dispatched tasks for the same entity could interleave their side effects
//! even though each respects the rate ceiling.

pub mod call;
pub mod dispatch;
pub mod error;
pub mod lock;
pub mod prelude;
pub mod store;
pub mod telemetry;

pub use error::SluiceError;
