//! Topic-based event bus for player and reward events.
//!
//! Host code subscribes to the four fixed topics to react to identification
//! and rewards without polling.

mod bus;

pub use bus::{Event, EventBus, SubscriptionId, Topic, UnknownTopic};
