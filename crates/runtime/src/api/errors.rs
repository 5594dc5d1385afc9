//! Unified error type surfaced by every SDK operation.
//!
//! Precondition failures, transport failures and service-reported errors all
//! arrive through [`SdkError`], so callers handle a single error channel no
//! matter where a failure originated.
use thiserror::Error;
use tokio::sync::oneshot;

use behave_core::{CoreError, ServiceError};
use behave_transport::TransportError;

pub type Result<T> = std::result::Result<T, SdkError>;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("Behave must be built with a valid token before calling any other methods")]
    Uninitialized,

    #[error("identify() must be called before tracking any of the player's behaviours")]
    PlayerNotIdentified,

    #[error("{0} cannot be empty")]
    MissingArgument(&'static str),

    #[error("a transport must be configured before building")]
    MissingTransport,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("{0}")]
    Service(String),

    #[error("invalid response payload")]
    InvalidResponse(#[from] CoreError),

    #[error("request queue closed")]
    QueueClosed,

    #[error("request completion dropped before replying")]
    ReplyDropped(#[source] oneshot::error::RecvError),

    #[error("request queue worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),
}

impl From<ServiceError> for SdkError {
    fn from(error: ServiceError) -> Self {
        SdkError::Service(error.0)
    }
}

impl SdkError {
    /// Whether the operation was rejected before any request was issued.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            SdkError::Uninitialized
                | SdkError::PlayerNotIdentified
                | SdkError::MissingArgument(_)
                | SdkError::MissingTransport
        )
    }
}
