//! Cloneable façade for issuing calls to the Behave API.
//!
//! [`BehaveHandle`] hides queue plumbing. Every remote call it makes goes
//! through the serial request queue and resolves once its completion has
//! run, so a returned value always reflects state the next call will see.
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tokio::sync::{broadcast, oneshot};

use behave_core::{
    ApiRequest, AppInfo, Badge, LeaderboardEntry, LeaderboardOptions, PageCursor, Player,
    PlayerLeaderboardOptions, PlayerLeaderboardResult, PlayerProfile, TrackOutcome,
};

use super::errors::{Result, SdkError};
use crate::events::{Event, EventBus, SubscriptionId, Topic};
use crate::response::normalize_into;
use crate::session::{IdentifyCompletion, Session, TrackCompletion};
use crate::workers::{MetricsSnapshot, RequestQueue};

/// Client-facing handle to a [`Behave`](crate::Behave) instance
#[derive(Clone)]
pub struct BehaveHandle {
    queue: RequestQueue,
    session: Arc<Session>,
}

fn require(value: &str, name: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        Err(SdkError::MissingArgument(name))
    } else {
        Ok(())
    }
}

impl BehaveHandle {
    pub(crate) fn new(queue: RequestQueue, session: Arc<Session>) -> Self {
        Self { queue, session }
    }

    pub(crate) fn queue(&self) -> &RequestQueue {
        &self.queue
    }

    pub(crate) fn session(&self) -> &Arc<Session> {
        &self.session
    }

    // ------------------------------------------------------------------
    // Identity & tracking
    // ------------------------------------------------------------------

    /// Identify the current player as `user_id`.
    ///
    /// An anonymous player that already received a server-assigned id is
    /// re-identified, carrying its history over to `user_id`. The local
    /// identity switches to `user_id` immediately; once the service answers,
    /// its profile replaces the local one and `player:identified` is
    /// published with the resulting snapshot.
    pub async fn identify(&self, user_id: &str, traits: Map<String, Value>) -> Result<Player> {
        require(user_id, "user_id")?;

        let request = {
            let mut player = self.session.player.write().await;
            let request = match player.reference_id.clone() {
                Some(anonymous_id) if player.should_reidentify() => {
                    ApiRequest::reidentify(&anonymous_id, user_id, &traits)
                }
                _ => ApiRequest::identify(user_id, &traits),
            };
            player.mark_identified(user_id);
            request
        };

        let (reply_tx, reply_rx) = oneshot::channel();
        let completion = IdentifyCompletion::new(Arc::clone(&self.session), reply_tx);
        self.queue.push(request, Some(Box::new(completion))).await?;

        self.queue.reply(reply_rx).await?
    }

    /// Report a behaviour for the current player.
    ///
    /// The route is chosen when the request executes: the per-player
    /// endpoint once the player has a reference id, the anonymous endpoint
    /// before that.
    pub async fn track(&self, behaviour: &str, context: Option<Value>) -> Result<TrackOutcome> {
        require(behaviour, "behaviour")?;
        if !self.session.config.anonymous_tracking {
            self.require_identified().await?;
        }

        let (reply_tx, reply_rx) = oneshot::channel();
        let completion = TrackCompletion::new(Arc::clone(&self.session), reply_tx);
        self.queue
            .push(
                ApiRequest::track(behaviour, context.as_ref()),
                Some(Box::new(completion)),
            )
            .await?;

        self.queue.reply(reply_rx).await?
    }

    /// Set a trait on the current player and push it to the service.
    pub async fn set_trait(&self, name: &str, value: Value) -> Result<Player> {
        require(name, "trait name")?;

        let (reference_id, traits) = {
            let mut player = self.session.player.write().await;
            let Some(reference_id) = player.reference_id.clone() else {
                return Err(SdkError::PlayerNotIdentified);
            };
            player.set(name, value);
            (reference_id, player.traits.clone())
        };

        self.identify(&reference_id, traits).await
    }

    /// Snapshot of the current player.
    pub async fn player(&self) -> Player {
        self.session.player_snapshot().await
    }

    /// App info fetched at startup, if that request succeeded.
    pub async fn app_info(&self) -> Option<AppInfo> {
        self.session.app.read().await.clone()
    }

    /// Channel currently subscribed for realtime rewards.
    pub fn realtime_channel(&self) -> Option<String> {
        self.session.realtime.channel()
    }

    // ------------------------------------------------------------------
    // Players & badges
    // ------------------------------------------------------------------

    pub async fn fetch_player(&self, player_id: &str) -> Result<PlayerProfile> {
        require(player_id, "player_id")?;
        self.call(ApiRequest::player(player_id), "player profile")
            .await
    }

    pub async fn fetch_player_badges(&self, player_id: &str) -> Result<Vec<Badge>> {
        require(player_id, "player_id")?;
        self.call(ApiRequest::player_badges(player_id), "badges")
            .await
    }

    /// Badges the player has not unlocked yet.
    pub async fn fetch_player_locked_badges(&self, player_id: &str) -> Result<Vec<Badge>> {
        require(player_id, "player_id")?;
        self.call(ApiRequest::player_locked_badges(player_id), "badges")
            .await
    }

    pub async fn current_player_badges(&self) -> Result<Vec<Badge>> {
        let player_id = self.require_identified().await?;
        self.fetch_player_badges(&player_id).await
    }

    pub async fn current_player_locked_badges(&self) -> Result<Vec<Badge>> {
        let player_id = self.require_identified().await?;
        self.fetch_player_locked_badges(&player_id).await
    }

    // ------------------------------------------------------------------
    // Leaderboards
    // ------------------------------------------------------------------

    /// Fetch one page of leaderboard results.
    pub async fn fetch_leaderboard_results(
        &self,
        leaderboard_id: &str,
        options: &LeaderboardOptions,
    ) -> Result<Vec<LeaderboardEntry>> {
        require(leaderboard_id, "leaderboard_id")?;
        let request = ApiRequest::leaderboard_results(leaderboard_id, &options.query());
        self.call(request, "leaderboard results").await
    }

    /// Walk leaderboard pages, handing each non-empty page to `iterator`.
    ///
    /// Stops at the first empty page or once the `max` position is reached;
    /// the page crossing `max` is truncated. Returns the number of pages
    /// handed to `iterator`.
    pub async fn iterate_leaderboard_results<F>(
        &self,
        leaderboard_id: &str,
        options: &LeaderboardOptions,
        mut iterator: F,
    ) -> Result<u32>
    where
        F: FnMut(Vec<LeaderboardEntry>, u32),
    {
        require(leaderboard_id, "leaderboard_id")?;

        let mut cursor = PageCursor::new(options);
        let mut pages = 0;
        while !cursor.is_done() {
            let results = self
                .fetch_leaderboard_results(leaderboard_id, &cursor.options_for(options))
                .await?;
            let Some((results, page)) = cursor.advance(results) else {
                break;
            };
            iterator(results, page);
            pages += 1;
        }
        Ok(pages)
    }

    /// Positions of a player across leaderboards.
    pub async fn fetch_player_leaderboard_results(
        &self,
        player_id: &str,
        options: &PlayerLeaderboardOptions,
    ) -> Result<Vec<PlayerLeaderboardResult>> {
        require(player_id, "player_id")?;
        let request = ApiRequest::player_leaderboard_results(&options.query(player_id));
        self.call(request, "player leaderboard results").await
    }

    /// Position of a player on a single leaderboard, `None` if unranked.
    pub async fn fetch_player_leaderboard_result(
        &self,
        player_id: &str,
        leaderboard_id: &str,
        options: &PlayerLeaderboardOptions,
    ) -> Result<Option<PlayerLeaderboardResult>> {
        require(leaderboard_id, "leaderboard_id")?;
        let options = options
            .clone()
            .leaderboards(vec![leaderboard_id.to_string()]);
        let results = self
            .fetch_player_leaderboard_results(player_id, &options)
            .await?;
        Ok(results.into_iter().next())
    }

    pub async fn current_player_leaderboard_results(
        &self,
        options: &PlayerLeaderboardOptions,
    ) -> Result<Vec<PlayerLeaderboardResult>> {
        let player_id = self.require_identified().await?;
        self.fetch_player_leaderboard_results(&player_id, options)
            .await
    }

    pub async fn current_player_leaderboard_result(
        &self,
        leaderboard_id: &str,
        options: &PlayerLeaderboardOptions,
    ) -> Result<Option<PlayerLeaderboardResult>> {
        let player_id = self.require_identified().await?;
        self.fetch_player_leaderboard_result(&player_id, leaderboard_id, options)
            .await
    }

    // ------------------------------------------------------------------
    // Events & metrics
    // ------------------------------------------------------------------

    pub fn events(&self) -> &EventBus {
        &self.session.events
    }

    /// Register a callback for `topic`.
    pub fn subscribe<F>(&self, topic: Topic, callback: F) -> SubscriptionId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.session.events.subscribe(topic, callback)
    }

    pub fn unsubscribe(&self, topic: Topic, id: SubscriptionId) -> bool {
        self.session.events.unsubscribe(topic, id)
    }

    /// Stream every event, in publish order.
    pub fn listen(&self) -> broadcast::Receiver<Event> {
        self.session.events.listen()
    }

    pub fn queue_metrics(&self) -> MetricsSnapshot {
        self.queue.metrics().snapshot()
    }

    // ------------------------------------------------------------------

    async fn require_identified(&self) -> Result<String> {
        self.session
            .player
            .read()
            .await
            .reference_id
            .clone()
            .ok_or(SdkError::PlayerNotIdentified)
    }

    async fn call<T: DeserializeOwned>(&self, request: ApiRequest, what: &'static str) -> Result<T> {
        let outcome = self.queue.request(request).await?;
        normalize_into(outcome, what)
    }
}
