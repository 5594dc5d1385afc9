//! Fixed-topic event bus.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use behave_core::{Badge, LevelReward, Player, PointsReward};

/// Topics for event routing. The set is fixed; there is no dynamic topic
/// creation.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// `player:identified`
    PlayerIdentified,
    /// `reward:points`
    RewardPoints,
    /// `reward:badge`
    RewardBadge,
    /// `reward:level`
    RewardLevel,
}

impl Topic {
    pub const ALL: [Topic; 4] = [
        Topic::PlayerIdentified,
        Topic::RewardPoints,
        Topic::RewardBadge,
        Topic::RewardLevel,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::PlayerIdentified => "player:identified",
            Topic::RewardPoints => "reward:points",
            Topic::RewardBadge => "reward:badge",
            Topic::RewardLevel => "reward:level",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown topic: {0}")]
pub struct UnknownTopic(pub String);

impl FromStr for Topic {
    type Err = UnknownTopic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Topic::ALL
            .into_iter()
            .find(|topic| topic.as_str() == s)
            .ok_or_else(|| UnknownTopic(s.to_string()))
    }
}

/// Event carrying its payload; the topic follows from the variant.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// Full player snapshot after a successful identify.
    PlayerIdentified(Player),
    RewardPoints(PointsReward),
    RewardBadge(Badge),
    RewardLevel(LevelReward),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::PlayerIdentified(_) => Topic::PlayerIdentified,
            Event::RewardPoints(_) => Topic::RewardPoints,
            Event::RewardBadge(_) => Topic::RewardBadge,
            Event::RewardLevel(_) => Topic::RewardLevel,
        }
    }
}

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct SubscriptionId(u64);

type Callback = Arc<dyn Fn(&Event) + Send + Sync>;

struct BusInner {
    subscribers: RwLock<HashMap<Topic, Vec<(SubscriptionId, Callback)>>>,
    next_id: AtomicU64,
    stream: broadcast::Sender<Event>,
}

/// Publish/subscribe register for player and reward events.
///
/// Callbacks run synchronously, in subscription order, on the task that
/// publishes. [`EventBus::listen`] additionally exposes every event, in
/// publish order, as a broadcast stream.
pub struct EventBus {
    inner: Arc<BusInner>,
}

impl EventBus {
    /// Creates a new event bus with default stream capacity
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with the given stream capacity
    pub fn with_capacity(capacity: usize) -> Self {
        let subscribers = Topic::ALL
            .into_iter()
            .map(|topic| (topic, Vec::new()))
            .collect();

        Self {
            inner: Arc::new(BusInner {
                subscribers: RwLock::new(subscribers),
                next_id: AtomicU64::new(1),
                stream: broadcast::channel(capacity).0,
            }),
        }
    }

    /// Registers `callback` for `topic`.
    pub fn subscribe<F>(&self, topic: Topic, callback: F) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.inner
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(topic)
            .or_default()
            .push((id, Arc::new(callback)));
        id
    }

    /// Removes a callback. Returns `false` if it was not registered on `topic`.
    pub fn unsubscribe(&self, topic: Topic, id: SubscriptionId) -> bool {
        let mut subscribers = self
            .inner
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let Some(callbacks) = subscribers.get_mut(&topic) else {
            return false;
        };
        match callbacks.iter().position(|(existing, _)| *existing == id) {
            Some(index) => {
                callbacks.remove(index);
                true
            }
            None => false,
        }
    }

    /// Publishes an event to the callbacks of its topic, then to listeners.
    pub fn publish(&self, event: Event) {
        let topic = event.topic();

        // Callbacks are cloned out so they may (un)subscribe while running
        let callbacks: Vec<Callback> = self
            .inner
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&topic)
            .map(|callbacks| callbacks.iter().map(|(_, cb)| Arc::clone(cb)).collect())
            .unwrap_or_default();

        for callback in callbacks {
            callback(&event);
        }

        if self.inner.stream.send(event).is_err() {
            // No listeners - this is normal, not an error
            tracing::trace!(target: "behave::events", "No listeners for topic {}", topic);
        }
    }

    /// Streams every published event, in publish order.
    pub fn listen(&self) -> broadcast::Receiver<Event> {
        self.inner.stream.subscribe()
    }

    /// Number of callbacks registered on `topic`.
    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.inner
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&topic)
            .map_or(0, Vec::len)
    }
}

impl Clone for EventBus {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    fn badge(name: &str) -> Badge {
        Badge {
            name: Some(name.to_string()),
            ..Badge::default()
        }
    }

    #[test]
    fn topics_round_trip_through_their_names() {
        for topic in Topic::ALL {
            assert_eq!(topic.as_str().parse::<Topic>(), Ok(topic));
        }
        assert!("reward:xp".parse::<Topic>().is_err());
    }

    #[test]
    fn callbacks_run_in_subscription_order_for_their_topic_only() {
        let bus = EventBus::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second"] {
            let seen = Arc::clone(&seen);
            bus.subscribe(Topic::RewardBadge, move |event| {
                if let Event::RewardBadge(badge) = event {
                    seen.lock()
                        .unwrap()
                        .push(format!("{tag}:{}", badge.name.as_deref().unwrap_or("")));
                }
            });
        }
        let other = Arc::clone(&seen);
        bus.subscribe(Topic::RewardLevel, move |_| {
            other.lock().unwrap().push("level".to_string());
        });

        bus.publish(Event::RewardBadge(badge("b1")));

        assert_eq!(*seen.lock().unwrap(), vec!["first:b1", "second:b1"]);
    }

    #[test]
    fn unsubscribe_removes_exactly_one_callback() {
        let bus = EventBus::new();
        let calls = Arc::new(AtomicU64::new(0));

        let counter = Arc::clone(&calls);
        let id = bus.subscribe(Topic::RewardBadge, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let counter = Arc::clone(&calls);
        bus.subscribe(Topic::RewardBadge, move |_| {
            counter.fetch_add(10, Ordering::SeqCst);
        });

        assert!(!bus.unsubscribe(Topic::RewardPoints, id));
        assert!(bus.unsubscribe(Topic::RewardBadge, id));
        assert!(!bus.unsubscribe(Topic::RewardBadge, id));
        assert_eq!(bus.subscriber_count(Topic::RewardBadge), 1);

        bus.publish(Event::RewardBadge(badge("b1")));
        assert_eq!(calls.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn callbacks_may_unsubscribe_while_running() {
        let bus = EventBus::new();
        let slot = Arc::new(Mutex::new(None));

        let inner_bus = bus.clone();
        let inner_slot = Arc::clone(&slot);
        let id = bus.subscribe(Topic::RewardLevel, move |_| {
            if let Some(id) = inner_slot.lock().unwrap().take() {
                inner_bus.unsubscribe(Topic::RewardLevel, id);
            }
        });
        *slot.lock().unwrap() = Some(id);

        bus.publish(Event::RewardLevel(LevelReward::default()));
        assert_eq!(bus.subscriber_count(Topic::RewardLevel), 0);
    }

    #[tokio::test]
    async fn listeners_see_every_event_in_publish_order() {
        let bus = EventBus::new();
        let mut rx = bus.listen();

        bus.publish(Event::RewardBadge(badge("b1")));
        bus.publish(Event::RewardPoints(PointsReward::default()));

        assert_eq!(rx.recv().await.unwrap().topic(), Topic::RewardBadge);
        assert_eq!(rx.recv().await.unwrap().topic(), Topic::RewardPoints);
    }
}
