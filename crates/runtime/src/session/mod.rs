//! Per-instance SDK state and the domain side of the request pipeline.
//!
//! A [`Session`] replaces process-wide globals: it owns the player, the app
//! info, the event bus and the realtime subscription of one SDK instance.
//! Request completions mutate it from the queue worker, strictly one at a
//! time.

mod app;
mod identify;
mod realtime;
mod rewards;
mod track;

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::debug;

use behave_core::{ApiRequest, AppInfo, Player};
use behave_transport::{HttpRequest, RealtimeClient, Transport, TransportError};

use crate::api::RewardPresenter;
use crate::events::EventBus;
use crate::runtime::SdkConfig;
use crate::workers::RequestHandler;

pub(crate) use app::AppInfoCompletion;
pub(crate) use identify::IdentifyCompletion;
pub(crate) use realtime::RealtimeState;
pub(crate) use track::TrackCompletion;

pub(crate) struct Session {
    pub(crate) config: SdkConfig,
    pub(crate) player: RwLock<Player>,
    pub(crate) app: RwLock<Option<AppInfo>>,
    pub(crate) events: EventBus,
    pub(crate) realtime: RealtimeState,
    pub(crate) presenter: Option<Arc<dyn RewardPresenter>>,
}

impl Session {
    pub(crate) fn new(
        config: SdkConfig,
        events: EventBus,
        realtime: Option<Arc<dyn RealtimeClient>>,
        presenter: Option<Arc<dyn RewardPresenter>>,
    ) -> Self {
        Self {
            config,
            player: RwLock::new(Player::new()),
            app: RwLock::new(None),
            events,
            realtime: RealtimeState::new(realtime),
            presenter,
        }
    }

    pub(crate) async fn player_snapshot(&self) -> Player {
        self.player.read().await.clone()
    }
}

/// Executes queued requests over the configured transport.
///
/// Routing happens here, at dequeue time, so a track call queued behind an
/// identify sees the identity that identify produced.
pub(crate) struct ApiHandler {
    session: Arc<Session>,
    transport: Arc<dyn Transport>,
}

impl ApiHandler {
    pub(crate) fn new(session: Arc<Session>, transport: Arc<dyn Transport>) -> Self {
        Self { session, transport }
    }
}

#[async_trait]
impl RequestHandler for ApiHandler {
    async fn execute(&self, request: ApiRequest) -> Result<Value, TransportError> {
        let path = {
            let player = self.session.player.read().await;
            request.path.resolve(&player)
        };
        debug!(target: "behave::session", "{} {}", request.method, path);

        let http = HttpRequest::new(request.method, path, request.params);
        self.transport.send(http).await
    }
}
