// ABOUTME: Queued task representation and priority-ordered insertion.
// ABOUTME: Priority tiers are totally ordered; ties within a tier stay FIFO.

use std::collections::VecDeque;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::call::CallFuture;
use crate::error::DispatchError;

/// Priority class for a queued task.
///
/// `Critical` is serviced before any lower tier regardless of arrival time;
/// a live form submission outranks a background bulk sync.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Critical => write!(f, "critical"),
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

/// Re-invocable factory for a task's work. Each retry calls it again for a
/// fresh attempt future.
pub(crate) type WorkFn = Box<dyn Fn() -> CallFuture + Send + Sync>;

/// One unit of work waiting in (or popped from) the dispatch queue.
pub(crate) struct QueuedTask {
    pub id: Uuid,
    pub operation: String,
    pub priority: Priority,
    pub work: WorkFn,
    pub reply: oneshot::Sender<Result<serde_json::Value, DispatchError>>,
    pub enqueued_at: Instant,
    pub retry_count: u32,
}

impl std::fmt::Debug for QueuedTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueuedTask")
            .field("id", &self.id)
            .field("operation", &self.operation)
            .field("priority", &self.priority)
            .field("retry_count", &self.retry_count)
            .finish()
    }
}

/// Insert `task` before the first queued task with a strictly lower
/// priority, or at the tail if none exists.
///
/// Stable: a task re-inserted for retry becomes the newest tail of its own
/// tier, behind same-priority tasks that were already waiting.
pub(crate) fn insert_by_priority(queue: &mut VecDeque<QueuedTask>, task: QueuedTask) {
    let position = queue.iter().position(|queued| queued.priority > task.priority);
    match position {
        Some(index) => queue.insert(index, task),
        None => queue.push_back(task),
    }
}
