//! In-memory player state.
//!
//! A [`Player`] is created anonymous once per SDK session and only mutated by
//! the identify/track protocol: optimistically when `identify` is issued, and
//! authoritatively when responses come back.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::lenient;
use crate::reward::RewardResult;

/// The tracked end-user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    /// External identity. `None` while nothing is known about the player.
    pub reference_id: Option<String>,

    /// `true` until an `identify` call has been issued for this player.
    pub anonymous: bool,

    /// Current points balance.
    pub points: u64,

    /// Service-defined level description.
    pub level: Option<Value>,

    /// Custom attributes (language, name, picture, ...).
    pub traits: Map<String, Value>,
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Player {
    /// Creates the anonymous player every session starts with.
    pub fn new() -> Self {
        Self {
            reference_id: None,
            anonymous: true,
            points: 0,
            level: None,
            traits: Map::new(),
        }
    }

    /// Whether the player has a reference id (server-assigned or user-provided).
    pub fn is_identified(&self) -> bool {
        self.reference_id.is_some()
    }

    /// Whether an `identify` should map the current anonymous identity to the
    /// new user id instead of creating a fresh player.
    pub fn should_reidentify(&self) -> bool {
        self.anonymous && self.is_identified()
    }

    /// Reads a custom trait.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.traits.get(name)
    }

    /// Stores a custom trait locally.
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.traits.insert(name.into(), value);
    }

    /// Optimistic update applied when `identify` is issued, before the
    /// service answers.
    pub fn mark_identified(&mut self, user_id: &str) {
        self.reference_id = Some(user_id.to_string());
        self.anonymous = false;
    }

    /// Overwrites identity and profile fields with the service's answer.
    pub fn apply_profile(&mut self, profile: &PlayerProfile) {
        self.reference_id = Some(profile.reference_id.clone());
        self.traits = profile.traits.clone();
        self.level = profile.level.clone();
        self.points = profile.points;
    }

    /// Adopts the identity auto-generated by an anonymous track call.
    ///
    /// Returns `false` when the player is no longer anonymous; an identify
    /// issued in between takes precedence.
    pub fn adopt_anonymous_identity(&mut self, reference_id: &str) -> bool {
        if !self.anonymous {
            return false;
        }
        self.reference_id = Some(reference_id.to_string());
        true
    }

    /// Applies the state part of a reward result (points balance, level).
    pub fn apply_rewards(&mut self, rewards: &RewardResult) {
        if let Some(balance) = rewards.points.as_ref().and_then(|points| points.balance) {
            self.points = balance;
        }
        if let Some(level) = &rewards.level {
            self.level = Some(level.to_value());
        }
    }
}

/// Player profile as returned by the identify, reidentify and fetch-player
/// endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerProfile {
    /// Canonical reference id (may differ from the one sent).
    pub reference_id: String,

    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub traits: Map<String, Value>,

    #[serde(default)]
    pub level: Option<Value>,

    #[serde(default, deserialize_with = "lenient::count")]
    pub points: u64,

    /// Owning application, used for realtime channel names.
    #[serde(default)]
    pub app_id: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
