//! Worker tasks that back the SDK.
//!
//! The queue worker serializes every API call; completions attached to a
//! request run on the worker before the next request starts.

mod metrics;
mod queue;

pub use metrics::{MetricsSnapshot, QueueMetrics};
pub use queue::{Completion, CompletionFuture, QueueWorker, RequestHandler, RequestQueue};
