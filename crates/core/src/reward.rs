//! Reward payloads: what a tracked behaviour earned.
//!
//! The same [`RewardResult`] shape arrives either inline in a track response
//! or pushed over the realtime channel.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::app::AppInfo;
use crate::lenient;

/// Points section of a reward result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointsReward {
    /// New balance after this reward.
    #[serde(
        default,
        deserialize_with = "lenient::optional_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub balance: Option<u64>,

    /// Points earned by this behaviour (may be zero or negative).
    #[serde(default, deserialize_with = "lenient::delta")]
    pub earned: i64,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Level section of a reward result. Apart from `up` the content is
/// service-defined.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelReward {
    /// Whether the player reached a new level.
    #[serde(default)]
    pub up: bool,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl LevelReward {
    /// The level as an opaque value, the way it is stored on the player.
    pub fn to_value(&self) -> Value {
        let mut fields = self.extra.clone();
        fields.insert("up".to_string(), Value::Bool(self.up));
        Value::Object(fields)
    }
}

/// An unlocked badge, with everything a reward popup needs to render it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Icon URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_id: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Rewards earned by one tracked behaviour.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RewardResult {
    #[serde(default)]
    pub points: Option<PointsReward>,

    #[serde(default)]
    pub level: Option<LevelReward>,

    /// Unlocked badges in service order. `null` decodes as empty.
    #[serde(default, deserialize_with = "lenient::null_as_default")]
    pub badges: Vec<Badge>,
}

impl RewardResult {
    /// Points section, only when something was actually earned.
    pub fn earned_points(&self) -> Option<&PointsReward> {
        self.points.as_ref().filter(|points| points.earned != 0)
    }

    /// Level section, only on level-up.
    pub fn level_up(&self) -> Option<&LevelReward> {
        self.level.as_ref().filter(|level| level.up)
    }

    pub fn is_empty(&self) -> bool {
        self.badges.is_empty() && self.earned_points().is_none() && self.level_up().is_none()
    }
}

/// `data` section of a track response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackOutcome {
    /// Set when the call was routed to the anonymous endpoint.
    #[serde(default)]
    pub is_anonymous: bool,

    /// The player the behaviour was recorded for.
    #[serde(default)]
    pub player: Option<Value>,

    #[serde(flatten)]
    pub rewards: RewardResult,
}

impl TrackOutcome {
    /// Reference id of the player the service recorded the behaviour for.
    pub fn player_reference_id(&self) -> Option<&str> {
        match self.player.as_ref()? {
            Value::String(id) => Some(id),
            Value::Object(fields) => fields.get("reference_id").and_then(Value::as_str),
            _ => None,
        }
    }

    /// The identity the service generated for an anonymous caller, if any.
    pub fn anonymous_identity(&self) -> Option<&str> {
        if self.is_anonymous {
            self.player_reference_id()
        } else {
            None
        }
    }
}

/// What a badge-unlock popup needs from the SDK.
#[derive(Debug, Clone, PartialEq)]
pub struct BadgeDialog {
    pub badge: Badge,
    /// Link attached when sharing the badge.
    pub share_link: Option<String>,
    /// Caption attached when sharing the badge.
    pub share_caption: Option<String>,
}

impl BadgeDialog {
    /// Builds the dialog for the first badge of a reward result.
    pub fn for_rewards(rewards: &RewardResult, app: Option<&AppInfo>) -> Option<Self> {
        let badge = rewards.badges.first()?.clone();
        Some(Self {
            badge,
            share_link: app.and_then(|app| app.url.clone()),
            share_caption: app.and_then(|app| app.name.clone()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn decodes_full_tracking_response() {
        let outcome: TrackOutcome = serde_json::from_value(json!({
            "is_anonymous": false,
            "player": "u1",
            "points": { "balance": 150, "earned": 50 },
            "level": { "up": true, "value": 2 },
            "badges": [{ "id": "b1" }]
        }))
        .unwrap();

        let rewards = &outcome.rewards;
        assert_eq!(rewards.points.as_ref().unwrap().balance, Some(150));
        assert!(rewards.level_up().is_some());
        assert_eq!(rewards.badges.len(), 1);
        assert_eq!(rewards.badges[0].extra.get("id"), Some(&json!("b1")));
        assert_eq!(outcome.anonymous_identity(), None);
    }

    #[test]
    fn null_badges_decode_as_empty() {
        let rewards: RewardResult =
            serde_json::from_value(json!({ "badges": null, "points": null })).unwrap();
        assert!(rewards.badges.is_empty());
        assert!(rewards.is_empty());
    }

    #[test]
    fn zero_points_and_no_level_up_are_not_rewards() {
        let rewards: RewardResult = serde_json::from_value(json!({
            "points": { "balance": 10, "earned": 0 },
            "level": { "up": false, "value": 1 },
            "badges": []
        }))
        .unwrap();

        assert!(rewards.earned_points().is_none());
        assert!(rewards.level_up().is_none());
        assert!(rewards.is_empty());
    }

    #[test]
    fn anonymous_identity_is_read_from_string_or_object() {
        let outcome: TrackOutcome =
            serde_json::from_value(json!({ "is_anonymous": true, "player": "anon-1" })).unwrap();
        assert_eq!(outcome.anonymous_identity(), Some("anon-1"));

        let outcome: TrackOutcome = serde_json::from_value(
            json!({ "is_anonymous": true, "player": { "reference_id": "anon-2" } }),
        )
        .unwrap();
        assert_eq!(outcome.anonymous_identity(), Some("anon-2"));
    }

    #[test]
    fn level_serializes_with_service_fields() {
        let level: LevelReward = serde_json::from_value(json!({ "up": true, "value": 2 })).unwrap();
        assert_eq!(level.to_value(), json!({ "up": true, "value": 2 }));
        assert_eq!(
            serde_json::to_value(&level).unwrap(),
            json!({ "up": true, "value": 2 })
        );
    }

    #[test]
    fn dialog_uses_first_badge_and_app_sharing_info() {
        let rewards: RewardResult = serde_json::from_value(json!({
            "badges": [{ "name": "First blood" }, { "name": "Second" }]
        }))
        .unwrap();
        let app = AppInfo {
            name: Some("Arcade".into()),
            url: Some("https://arcade.example".into()),
            ..AppInfo::default()
        };

        let dialog = BadgeDialog::for_rewards(&rewards, Some(&app)).unwrap();
        assert_eq!(dialog.badge.name.as_deref(), Some("First blood"));
        assert_eq!(dialog.share_link.as_deref(), Some("https://arcade.example"));
        assert_eq!(dialog.share_caption.as_deref(), Some("Arcade"));

        assert!(BadgeDialog::for_rewards(&RewardResult::default(), Some(&app)).is_none());
    }

    #[test]
    fn float_points_decode_in_track_responses() {
        let outcome: TrackOutcome = serde_json::from_value(json!({
            "is_anonymous": true,
            "player": "anon-1",
            "points": { "balance": 10.0, "earned": 10.0 }
        }))
        .unwrap();

        let points = outcome.rewards.earned_points().unwrap();
        assert_eq!(points.balance, Some(10));
        assert_eq!(points.earned, 10);
        assert_eq!(outcome.anonymous_identity(), Some("anon-1"));
    }
}
