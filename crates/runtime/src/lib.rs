//! Behave SDK runtime.
//!
//! This crate wires the transport seams, the serial request queue and the
//! per-instance session into the API host applications use. Consumers build a
//! [`Behave`] instance and talk to the service through [`BehaveHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the instance, its builder and configuration
//! - [`api`] exposes the handle, the error type and the presenter seam
//! - [`events`] provides the fixed-topic event bus
//! - [`response`] unwraps service envelopes into one error channel
//! - `workers` keeps the queue worker internal to the crate
pub mod api;
pub mod events;
pub mod response;
pub mod runtime;

mod session;
mod workers;

pub use api::{BehaveHandle, Result, RewardPresenter, SdkError};
pub use events::{Event, EventBus, SubscriptionId, Topic};
pub use runtime::{Behave, BehaveBuilder, SdkConfig};
pub use workers::{MetricsSnapshot, QueueMetrics};
