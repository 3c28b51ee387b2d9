// ABOUTME: Telemetry events for the dispatch and lock lifecycle.
// ABOUTME: Provides a sink trait and a fire-and-forget bus for metrics/logging.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::dispatch::Priority;

/// Events emitted by the dispatcher and lock manager.
#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    /// A task entered the queue.
    TaskEnqueued {
        operation: String,
        priority: Priority,
        queue_length: usize,
    },

    /// A task's work completed successfully.
    TaskSucceeded {
        operation: String,
        /// Time spent waiting in the queue before dispatch.
        wait_ms: u64,
    },

    /// A rate-limited task was re-queued for another attempt.
    TaskRetried {
        operation: String,
        retry_count: u32,
        backoff_ms: u64,
    },

    /// A task failed terminally (non-retryable error or retries exhausted).
    TaskFailed {
        operation: String,
        error: String,
    },

    /// The scheduler hit the window ceiling and is suspending until reset.
    WindowSaturated {
        requests: u32,
        ceiling: u32,
    },

    /// A lock was acquired.
    LockAcquired {
        key: String,
        owner: String,
    },

    /// An acquisition attempt found the key held by someone else.
    LockContended {
        key: String,
        attempt: u32,
    },

    /// A lock was released (or found already expired/foreign-owned).
    LockReleased {
        key: String,
        owner: String,
        released: bool,
    },

    /// Acquisition gave up after exhausting its retry budget.
    LockTimedOut {
        key: String,
        attempts: u32,
    },

    /// The store was unavailable and the operation proceeded unlocked.
    /// Silently weakens duplicate prevention; always worth alerting on.
    StoreFailOpen {
        key: String,
        error: String,
    },
}

/// Trait for telemetry sink implementations.
///
/// Sinks must be cheap: the bus awaits them inline, so anything slow
/// (network shipping, disk flushes) belongs behind the sink's own channel.
#[async_trait]
pub trait TelemetrySink: Send + Sync {
    /// Called for every emitted event.
    async fn record(&self, event: &TelemetryEvent);

    /// Optional: filter which events this sink cares about.
    /// Default accepts all events.
    fn accepts(&self, event: &TelemetryEvent) -> bool {
        let _ = event;
        true
    }
}

/// Registry of telemetry sinks.
///
/// Emission is fire-and-forget: sinks cannot fail an emit, and an empty bus
/// costs one read-lock acquisition. The dispatch and lock paths never branch
/// on telemetry.
pub struct TelemetryBus {
    sinks: RwLock<Vec<Arc<dyn TelemetrySink>>>,
}

impl TelemetryBus {
    /// Create a bus with no sinks.
    pub fn new() -> Self {
        Self {
            sinks: RwLock::new(Vec::new()),
        }
    }

    /// Register a sink.
    pub async fn register(&self, sink: impl TelemetrySink + 'static) {
        self.sinks.write().await.push(Arc::new(sink));
    }

    /// Register a sink wrapped in Arc.
    pub async fn register_arc(&self, sink: Arc<dyn TelemetrySink>) {
        self.sinks.write().await.push(sink);
    }

    /// Emit an event to every accepting sink.
    pub async fn emit(&self, event: TelemetryEvent) {
        let sinks = self.sinks.read().await;
        for sink in sinks.iter() {
            if sink.accepts(&event) {
                sink.record(&event).await;
            }
        }
    }

    /// Number of registered sinks.
    pub async fn len(&self) -> usize {
        self.sinks.read().await.len()
    }

    /// Whether any sinks are registered.
    pub async fn is_empty(&self) -> bool {
        self.sinks.read().await.is_empty()
    }
}

impl Default for TelemetryBus {
    fn default() -> Self {
        Self::new()
    }
}
