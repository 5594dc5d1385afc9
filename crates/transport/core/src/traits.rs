//! Transport traits and their error types.

use async_trait::async_trait;
use serde_json::Value;

use crate::types::{HttpRequest, RealtimeSubscription};

// ============================================================================
// Error Types
// ============================================================================

/// Transport-level failures: the request never produced a usable body.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode response body: {0}")]
    Decode(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Realtime channel failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RealtimeError {
    #[error("subscription to {channel} refused: {reason}")]
    Refused { channel: String, reason: String },

    #[error("realtime connection error: {0}")]
    Connection(String),
}

// ============================================================================
// Request/Response
// ============================================================================

/// Executes resolved requests against the service.
///
/// Implementations attach authentication, encode params, and return the raw
/// decoded JSON body. Envelope handling is the caller's job.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<Value, TransportError>;
}

// ============================================================================
// Realtime Push
// ============================================================================

/// Publish/subscribe channel delivering reward payloads.
///
/// Implementations carry the credentials they were built with and attach
/// them to outgoing subscription messages.
#[async_trait]
pub trait RealtimeClient: Send + Sync {
    /// Subscribes to `channel`. Messages flow until [`RealtimeClient::cancel`]
    /// is called or the returned subscription is dropped.
    async fn subscribe(&self, channel: &str) -> Result<RealtimeSubscription, RealtimeError>;

    /// Cancels the subscription to `channel`, if any.
    fn cancel(&self, channel: &str);
}
