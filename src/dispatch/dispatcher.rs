// ABOUTME: Priority rate-limited dispatcher for calls to an external API.
// ABOUTME: Single scheduler task, fixed-window admission, fixed-backoff retry.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::sync::{Notify, oneshot};
use uuid::Uuid;

use super::task::{QueuedTask, insert_by_priority};
use super::Priority;
use crate::call::CallFuture;
use crate::error::DispatchError;
use crate::telemetry::{TelemetryBus, TelemetryEvent};

/// Tuning knobs for a dispatcher instance.
#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Ceiling on calls issued within one window.
    pub max_requests_per_window: u32,

    /// Fixed window length. The counter resets on window boundaries, so up
    /// to 2x the ceiling can land in a short span straddling a boundary;
    /// accepted tradeoff over a sliding window.
    pub window: Duration,

    /// How many times a rate-limited task is re-queued before it is
    /// abandoned with `RetriesExhausted`.
    pub max_retries: u32,

    /// Fixed pause after a rate-limited attempt. The provider's limit is
    /// window-based, not congestion-based, so the backoff does not grow.
    pub retry_backoff: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            max_requests_per_window: 5,
            window: Duration::from_secs(1),
            max_retries: 3,
            retry_backoff: Duration::from_secs(1),
        }
    }
}

/// Read-only snapshot of dispatcher activity.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchStats {
    pub total_requests: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub queue_length: usize,
    pub requests_this_window: u32,
    pub ceiling: u32,
    /// Running average of enqueue-to-dispatch wait for succeeded tasks.
    pub avg_wait_ms: f64,
}

/// Mutable dispatcher state, guarded by one mutex.
///
/// The scheduler never holds the guard across an await; every lock scope is
/// a few field updates.
struct State {
    queue: VecDeque<QueuedTask>,
    window_start: Instant,
    window_count: u32,
    total_requests: u64,
    succeeded: u64,
    failed: u64,
    avg_wait_ms: f64,
}

struct Shared {
    config: DispatcherConfig,
    state: Mutex<State>,
    notify: Notify,
    telemetry: Arc<TelemetryBus>,
}

/// What the scheduler decided to do with the queue head this iteration.
enum Step {
    /// Queue is empty; park until the next enqueue.
    Idle,
    /// Window ceiling reached; suspend until the boundary.
    Saturated { reset_at: Instant },
    /// A task was admitted and the window counter charged.
    Run(QueuedTask),
}

/// Priority rate-limited dispatcher.
///
/// All outbound calls to the protected provider go through one instance so
/// the aggregate rate stays under the provider's quota. Tasks are admitted
/// in priority-then-FIFO order by a single scheduler task that suspends
/// (never spins) when the window is exhausted or the queue is empty.
///
/// A task failure is isolated to its own caller; the scheduler keeps
/// running.
pub struct Dispatcher {
    shared: Arc<Shared>,
    scheduler: tokio::task::JoinHandle<()>,
}

impl Dispatcher {
    /// Create a dispatcher with no telemetry sinks.
    pub fn new(config: DispatcherConfig) -> Self {
        Self::with_telemetry(config, Arc::new(TelemetryBus::new()))
    }

    /// Create a dispatcher that emits lifecycle events to `telemetry`.
    pub fn with_telemetry(config: DispatcherConfig, telemetry: Arc<TelemetryBus>) -> Self {
        let shared = Arc::new(Shared {
            config,
            state: Mutex::new(State {
                queue: VecDeque::new(),
                window_start: Instant::now(),
                window_count: 0,
                total_requests: 0,
                succeeded: 0,
                failed: 0,
                avg_wait_ms: 0.0,
            }),
            notify: Notify::new(),
            telemetry,
        });

        let scheduler = tokio::spawn(run_scheduler(shared.clone()));
        Self { shared, scheduler }
    }

    /// Queue `work` for execution and wait for its final outcome.
    ///
    /// The returned future settles once the task succeeds, fails with a
    /// non-retryable error (passed through unchanged), or exhausts its
    /// rate-limit retry budget. `operation` is a label for logs and
    /// telemetry only; it plays no part in routing.
    pub async fn enqueue<W>(
        &self,
        operation: impl Into<String>,
        work: W,
        priority: Priority,
    ) -> Result<serde_json::Value, DispatchError>
    where
        W: Fn() -> CallFuture + Send + Sync + 'static,
    {
        let operation = operation.into();
        let (reply, receiver) = oneshot::channel();
        let task = QueuedTask {
            id: Uuid::new_v4(),
            operation: operation.clone(),
            priority,
            work: Box::new(work),
            reply,
            enqueued_at: Instant::now(),
            retry_count: 0,
        };

        let queue_length = {
            let mut state = self.shared.state.lock().unwrap();
            state.total_requests += 1;
            insert_by_priority(&mut state.queue, task);
            state.queue.len()
        };

        tracing::debug!(%operation, %priority, queue_length, "task enqueued");
        self.shared
            .telemetry
            .emit(TelemetryEvent::TaskEnqueued {
                operation: operation.clone(),
                priority,
                queue_length,
            })
            .await;
        self.shared.notify.notify_one();

        receiver
            .await
            .unwrap_or_else(|_| Err(DispatchError::Disconnected { operation }))
    }

    /// Non-blocking snapshot of current activity. Safe to call from any
    /// task concurrently with dispatch.
    pub fn get_stats(&self) -> DispatchStats {
        let state = self.shared.state.lock().unwrap();
        let window_expired = state.window_start.elapsed() >= self.shared.config.window;
        DispatchStats {
            total_requests: state.total_requests,
            succeeded: state.succeeded,
            failed: state.failed,
            queue_length: state.queue.len(),
            requests_this_window: if window_expired { 0 } else { state.window_count },
            ceiling: self.shared.config.max_requests_per_window,
            avg_wait_ms: state.avg_wait_ms,
        }
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.scheduler.abort();
    }
}

/// The perpetual scheduler loop.
///
/// One iteration admits at most one task. Suspension points: parked on the
/// notify when idle, sleeping until the window boundary when saturated, and
/// the fixed backoff after a rate-limited attempt.
async fn run_scheduler(shared: Arc<Shared>) {
    loop {
        let step = next_step(&shared);

        match step {
            Step::Idle => {
                shared.notify.notified().await;
            }
            Step::Saturated { reset_at } => {
                let (requests, ceiling) = {
                    let state = shared.state.lock().unwrap();
                    (state.window_count, shared.config.max_requests_per_window)
                };
                tracing::debug!(requests, ceiling, "window saturated, suspending until reset");
                shared
                    .telemetry
                    .emit(TelemetryEvent::WindowSaturated { requests, ceiling })
                    .await;
                tokio::time::sleep_until(reset_at.into()).await;
            }
            Step::Run(task) => {
                run_task(&shared, task).await;
            }
        }
    }
}

/// Decide what to do with the queue head. All state mutation happens under
/// one short lock scope; the caller performs any waiting.
fn next_step(shared: &Shared) -> Step {
    let mut state = shared.state.lock().unwrap();

    if state.queue.is_empty() {
        return Step::Idle;
    }

    let now = Instant::now();
    if now.duration_since(state.window_start) >= shared.config.window {
        state.window_start = now;
        state.window_count = 0;
    }

    if state.window_count >= shared.config.max_requests_per_window {
        return Step::Saturated {
            reset_at: state.window_start + shared.config.window,
        };
    }

    let task = state.queue.pop_front().expect("queue checked non-empty");
    state.window_count += 1;
    Step::Run(task)
}

/// Execute one admitted task and settle or re-queue it.
async fn run_task(shared: &Shared, mut task: QueuedTask) {
    let wait = task.enqueued_at.elapsed();
    tracing::debug!(
        operation = %task.operation,
        priority = %task.priority,
        retry_count = task.retry_count,
        wait_ms = wait.as_millis() as u64,
        "dispatching task"
    );

    let result = (task.work)().await;

    match result {
        Ok(value) => {
            {
                let mut state = shared.state.lock().unwrap();
                state.succeeded += 1;
                let n = state.succeeded as f64;
                state.avg_wait_ms += (wait.as_millis() as f64 - state.avg_wait_ms) / n;
            }
            shared
                .telemetry
                .emit(TelemetryEvent::TaskSucceeded {
                    operation: task.operation.clone(),
                    wait_ms: wait.as_millis() as u64,
                })
                .await;
            // Caller may have gone away; nothing to do about it
            let _ = task.reply.send(Ok(value));
        }
        Err(err) if err.is_rate_limited() && task.retry_count < shared.config.max_retries => {
            task.retry_count += 1;
            let retry_count = task.retry_count;
            let backoff = shared.config.retry_backoff;
            tracing::warn!(
                operation = %task.operation,
                retry_count,
                max_retries = shared.config.max_retries,
                "rate limited, re-queueing"
            );
            shared
                .telemetry
                .emit(TelemetryEvent::TaskRetried {
                    operation: task.operation.clone(),
                    retry_count,
                    backoff_ms: backoff.as_millis() as u64,
                })
                .await;
            {
                let mut state = shared.state.lock().unwrap();
                insert_by_priority(&mut state.queue, task);
            }
            tokio::time::sleep(backoff).await;
        }
        Err(err) => {
            let dispatch_err = if err.is_rate_limited() {
                DispatchError::RetriesExhausted {
                    operation: task.operation.clone(),
                    attempts: task.retry_count + 1,
                }
            } else {
                DispatchError::Task {
                    operation: task.operation.clone(),
                    source: err,
                }
            };
            {
                let mut state = shared.state.lock().unwrap();
                state.failed += 1;
            }
            tracing::warn!(operation = %task.operation, error = %dispatch_err, "task failed");
            shared
                .telemetry
                .emit(TelemetryEvent::TaskFailed {
                    operation: task.operation.clone(),
                    error: dispatch_err.to_string(),
                })
                .await;
            let _ = task.reply.send(Err(dispatch_err));
        }
    }
}
