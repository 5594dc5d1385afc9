//! SDK orchestrator.
//!
//! [`Behave`] owns the request queue worker and exposes a builder-based API
//! for wiring in the transport, an optional realtime client and an optional
//! reward presenter. [`BehaveHandle`] is the cloneable façade host code uses.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::info;

use behave_core::ApiRequest;
use behave_transport::{RealtimeClient, Transport};

use crate::api::{BehaveHandle, Result, RewardPresenter, SdkError};
use crate::events::EventBus;
use crate::session::{ApiHandler, AppInfoCompletion, Session};
use crate::workers::RequestQueue;

/// SDK configuration shared by the session and its workers.
///
/// Where requests go and how they authenticate is owned by the injected
/// [`Transport`]; the token here only gates initialization.
#[derive(Debug, Clone)]
pub struct SdkConfig {
    /// API token the instance was initialized with.
    pub token: String,
    /// Hand a badge dialog to the presenter when a reward carries badges.
    pub handles_tracking_response: bool,
    /// Allow `track` before `identify` (routed to the anonymous endpoint).
    pub anonymous_tracking: bool,
    pub queue_buffer_size: usize,
    pub event_buffer_size: usize,
}

impl SdkConfig {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            ..Self::default()
        }
    }
}

impl Default for SdkConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            handles_tracking_response: true,
            anonymous_tracking: true,
            queue_buffer_size: 64,
            event_buffer_size: 100,
        }
    }
}

/// One SDK instance.
///
/// Instances are fully independent: each owns its player, event bus and
/// request queue.
pub struct Behave {
    handle: BehaveHandle,
    worker: JoinHandle<()>,
}

impl Behave {
    pub fn builder(token: impl Into<String>) -> BehaveBuilder {
        BehaveBuilder::new(token)
    }

    /// Get a cloneable handle to this instance
    pub fn handle(&self) -> BehaveHandle {
        self.handle.clone()
    }

    pub fn events(&self) -> &EventBus {
        self.handle.events()
    }

    /// Cancels realtime delivery, lets the queue finish what was already
    /// submitted, then waits for the worker to exit.
    pub async fn shutdown(self) -> Result<()> {
        self.handle.session().realtime.cancel();

        // A worker that already stopped has nothing left to drain
        let _ = self.handle.queue().close().await;
        drop(self.handle);

        self.worker.await.map_err(SdkError::WorkerJoin)?;
        info!(target: "behave::session", "Behave shut down");
        Ok(())
    }
}

/// Builder for [`Behave`].
pub struct BehaveBuilder {
    config: SdkConfig,
    transport: Option<Arc<dyn Transport>>,
    realtime: Option<Arc<dyn RealtimeClient>>,
    presenter: Option<Arc<dyn RewardPresenter>>,
    events: Option<EventBus>,
}

impl BehaveBuilder {
    fn new(token: impl Into<String>) -> Self {
        Self {
            config: SdkConfig::new(token),
            transport: None,
            realtime: None,
            presenter: None,
            events: None,
        }
    }

    /// Replace the whole configuration. The builder's token is kept if the
    /// given config has none.
    pub fn config(mut self, config: SdkConfig) -> Self {
        let token = std::mem::take(&mut self.config.token);
        self.config = config;
        if self.config.token.is_empty() {
            self.config.token = token;
        }
        self
    }

    pub fn handles_tracking_response(mut self, enabled: bool) -> Self {
        self.config.handles_tracking_response = enabled;
        self
    }

    pub fn anonymous_tracking(mut self, enabled: bool) -> Self {
        self.config.anonymous_tracking = enabled;
        self
    }

    /// Set the HTTP transport (required)
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Set the realtime push client (optional)
    pub fn realtime(mut self, realtime: impl RealtimeClient + 'static) -> Self {
        self.realtime = Some(Arc::new(realtime));
        self
    }

    /// Set the reward presenter (optional)
    pub fn presenter(mut self, presenter: impl RewardPresenter + 'static) -> Self {
        self.presenter = Some(Arc::new(presenter));
        self
    }

    /// Use an existing event bus, e.g. to subscribe before the first event.
    pub fn events(mut self, events: EventBus) -> Self {
        self.events = Some(events);
        self
    }

    /// Build the SDK instance.
    ///
    /// Spawns the queue worker and queues the app info request first, so it
    /// completes before any call made on the returned instance.
    pub async fn build(self) -> Result<Behave> {
        if self.config.token.trim().is_empty() {
            return Err(SdkError::Uninitialized);
        }
        let transport = self.transport.ok_or(SdkError::MissingTransport)?;

        let events = self
            .events
            .unwrap_or_else(|| EventBus::with_capacity(self.config.event_buffer_size));
        let queue_buffer_size = self.config.queue_buffer_size;
        let session = Arc::new(Session::new(
            self.config,
            events,
            self.realtime,
            self.presenter,
        ));

        let handler = ApiHandler::new(Arc::clone(&session), transport);
        let (queue, worker) = RequestQueue::new(handler, queue_buffer_size);
        let worker = tokio::spawn(worker.run());

        queue
            .push(
                ApiRequest::app_info(),
                Some(Box::new(AppInfoCompletion::new(Arc::clone(&session)))),
            )
            .await?;

        info!(target: "behave::session", "Behave initialized");

        Ok(Behave {
            handle: BehaveHandle::new(queue, session),
            worker,
        })
    }
}
