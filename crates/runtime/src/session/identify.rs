use std::sync::Arc;

use serde_json::Value;
use tokio::sync::oneshot;
use tracing::{debug, info};

use behave_core::{Player, PlayerProfile};
use behave_transport::TransportError;

use super::Session;
use crate::api::Result;
use crate::events::Event;
use crate::response::normalize_into;
use crate::workers::{Completion, CompletionFuture};

/// Applies an identify/reidentify response.
///
/// The service's profile overwrites the optimistic identity, the realtime
/// channel is moved to the new player, and only then is
/// `player:identified` published.
pub(crate) struct IdentifyCompletion {
    session: Arc<Session>,
    reply: oneshot::Sender<Result<Player>>,
}

impl IdentifyCompletion {
    pub(crate) fn new(session: Arc<Session>, reply: oneshot::Sender<Result<Player>>) -> Self {
        Self { session, reply }
    }

    async fn apply(
        session: &Arc<Session>,
        result: std::result::Result<Value, TransportError>,
    ) -> Result<Player> {
        let profile: PlayerProfile = normalize_into(result, "player profile")?;

        let snapshot = {
            let mut player = session.player.write().await;
            player.apply_profile(&profile);
            player.clone()
        };
        info!(target: "behave::session", "Identified player {}", profile.reference_id);

        session.resubscribe(&profile).await;
        session.events.publish(Event::PlayerIdentified(snapshot.clone()));
        Ok(snapshot)
    }
}

impl Completion for IdentifyCompletion {
    fn complete(
        self: Box<Self>,
        result: std::result::Result<Value, TransportError>,
    ) -> CompletionFuture {
        Box::pin(async move {
            let Self { session, reply } = *self;
            let outcome = Self::apply(&session, result).await;
            if reply.send(outcome).is_err() {
                debug!(target: "behave::session", "Identify reply channel closed (caller dropped)");
            }
        })
    }
}
