//! Realtime reward subscription.
//!
//! At most one channel is subscribed at a time. Re-identifying cancels the
//! previous subscription before the new one is opened. Cancelling stops the
//! forwarder between messages; a reward already being dispatched finishes.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

use behave_core::{PlayerProfile, RewardResult, decode};
use behave_transport::{RealtimeClient, RealtimeMessage, RealtimeSubscription};

use super::Session;

struct ActiveSubscription {
    channel: String,
    stop: oneshot::Sender<()>,
}

impl ActiveSubscription {
    fn stop(self, client: Option<&Arc<dyn RealtimeClient>>) {
        if let Some(client) = client {
            client.cancel(&self.channel);
        }
        // The forwarder may already have exited on its own
        let _ = self.stop.send(());
    }
}

pub(crate) struct RealtimeState {
    client: Option<Arc<dyn RealtimeClient>>,
    enabled: AtomicBool,
    active: Mutex<Option<ActiveSubscription>>,
}

impl RealtimeState {
    pub(crate) fn new(client: Option<Arc<dyn RealtimeClient>>) -> Self {
        Self {
            client,
            enabled: AtomicBool::new(false),
            active: Mutex::new(None),
        }
    }

    /// Turns realtime delivery on. Returns `false` without a client.
    pub(crate) fn enable(&self) -> bool {
        if self.client.is_none() {
            return false;
        }
        self.enabled.store(true, Ordering::Release);
        true
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    /// Whether a channel is currently subscribed.
    pub(crate) fn is_active(&self) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub(crate) fn channel(&self) -> Option<String> {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|active| active.channel.clone())
    }

    /// Cancels the current subscription, if any.
    pub(crate) fn cancel(&self) {
        let previous = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(previous) = previous {
            debug!(target: "behave::realtime", "Cancelled subscription to {}", previous.channel);
            previous.stop(self.client.as_ref());
        }
    }

    fn activate(&self, channel: String, stop: oneshot::Sender<()>) {
        let replaced = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(ActiveSubscription { channel, stop });

        // Only reachable if two identify completions raced, which the queue
        // rules out; keep the singleton anyway
        if let Some(replaced) = replaced {
            replaced.stop(self.client.as_ref());
        }
    }
}

impl Drop for RealtimeState {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl Session {
    /// Moves the reward subscription to the freshly identified player.
    pub(crate) async fn resubscribe(self: &Arc<Self>, profile: &PlayerProfile) {
        if !self.realtime.is_enabled() {
            return;
        }
        let Some(client) = self.realtime.client.clone() else {
            return;
        };

        self.realtime.cancel();

        let app_id = match profile.app_id.clone() {
            Some(app_id) => Some(app_id),
            None => self.app.read().await.as_ref().and_then(|app| app.id.clone()),
        };
        let Some(app_id) = app_id else {
            warn!(target: "behave::realtime", "No app id known, realtime rewards unavailable");
            return;
        };

        let channel = format!("/{}/{}/rewards", app_id, profile.reference_id);
        match client.subscribe(&channel).await {
            Ok(subscription) => {
                info!(target: "behave::realtime", "Subscribed to {}", channel);
                let (stop_tx, stop_rx) = oneshot::channel();
                tokio::spawn(forward_rewards(Arc::downgrade(self), subscription, stop_rx));
                self.realtime.activate(channel, stop_tx);
            }
            Err(err) => {
                error!(target: "behave::realtime", "Failed to subscribe to {}: {}", channel, err);
            }
        }
    }
}

/// Dispatches every pushed reward payload until the channel closes, the
/// subscription is stopped or the session goes away.
async fn forward_rewards(
    session: Weak<Session>,
    mut subscription: RealtimeSubscription,
    mut stop: oneshot::Receiver<()>,
) {
    loop {
        let message = tokio::select! {
            biased;
            _ = &mut stop => break,
            message = subscription.recv() => match message {
                Some(message) => message,
                None => break,
            },
        };
        let Some(session) = session.upgrade() else {
            break;
        };

        match message {
            RealtimeMessage::Payload(payload) => {
                match decode::<RewardResult>(payload, "reward push") {
                    Ok(rewards) => session.dispatch_rewards(&rewards).await,
                    Err(err) => {
                        warn!(target: "behave::realtime", "Dropping reward push: {}", err)
                    }
                }
            }
            RealtimeMessage::Error(message) => {
                error!(
                    target: "behave::realtime",
                    "Realtime error on {}: {}",
                    subscription.channel(),
                    message
                );
            }
        }
    }
    debug!(target: "behave::realtime", "Subscription to {} closed", subscription.channel());
}
