// ABOUTME: Dispatch module - priority queue and rate-limited scheduler.
// ABOUTME: Contains the Dispatcher, its config/stats, and the Priority tiers.

mod dispatcher;
mod task;

pub use dispatcher::{DispatchStats, Dispatcher, DispatcherConfig};
pub use task::Priority;
