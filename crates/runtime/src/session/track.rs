use std::sync::Arc;

use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, info};

use behave_core::TrackOutcome;
use behave_transport::TransportError;

use super::Session;
use crate::api::Result;
use crate::response::normalize_into;
use crate::workers::{Completion, CompletionFuture};

/// Applies a track response: adopts an auto-generated anonymous identity and
/// dispatches the rewards unless the realtime channel delivers them.
pub(crate) struct TrackCompletion {
    session: Arc<Session>,
    reply: oneshot::Sender<Result<TrackOutcome>>,
}

impl TrackCompletion {
    pub(crate) fn new(session: Arc<Session>, reply: oneshot::Sender<Result<TrackOutcome>>) -> Self {
        Self { session, reply }
    }

    async fn apply(
        session: &Session,
        result: std::result::Result<Value, TransportError>,
    ) -> Result<TrackOutcome> {
        let outcome: TrackOutcome = normalize_into(result, "track response")?;

        if let Some(reference_id) = outcome.anonymous_identity() {
            let mut player = session.player.write().await;
            if player.adopt_anonymous_identity(reference_id) {
                info!(
                    target: "behave::session",
                    "Adopted anonymous identity {}", reference_id
                );
            }
        }

        if session.realtime.is_active() {
            debug!(target: "behave::rewards", "Rewards left to the realtime channel");
        } else {
            session.dispatch_rewards(&outcome.rewards).await;
        }
        Ok(outcome)
    }
}

impl Completion for TrackCompletion {
    fn complete(
        self: Box<Self>,
        result: std::result::Result<Value, TransportError>,
    ) -> CompletionFuture {
        Box::pin(async move {
            let Self { session, reply } = *self;
            let outcome = Self::apply(&session, result).await;
            if reply.send(outcome).is_err() {
                debug!(target: "behave::session", "Track reply channel closed (caller dropped)");
            }
        })
    }
}
