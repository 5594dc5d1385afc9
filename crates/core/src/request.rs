//! Logical API requests and their late-bound routing.
//!
//! A request is described when an operation is called but its path may only
//! be resolved when the request reaches the head of the queue: tracking goes
//! to the anonymous endpoint or the per-player endpoint depending on the
//! player state at that moment, not at enqueue time.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::leaderboard::{LeaderboardQuery, PlayerLeaderboardQuery};
use crate::player::Player;

/// HTTP verb of a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
        }
    }

    /// Whether params travel as a JSON body rather than a query string.
    pub fn has_body(&self) -> bool {
        matches!(self, Method::Post | Method::Put)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Path of a request, resolved against the player state at execution time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestPath {
    /// A path known when the request is created.
    Fixed(String),
    /// `/players/{reference_id}/track` once the player has a reference id,
    /// `/players/anonymous_track` otherwise.
    Track,
}

impl RequestPath {
    pub fn resolve(&self, player: &Player) -> String {
        match self {
            RequestPath::Fixed(path) => path.clone(),
            RequestPath::Track => match &player.reference_id {
                Some(reference_id) => format!("/players/{reference_id}/track"),
                None => "/players/anonymous_track".to_string(),
            },
        }
    }
}

impl fmt::Display for RequestPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestPath::Fixed(path) => f.write_str(path),
            RequestPath::Track => f.write_str("<track>"),
        }
    }
}

/// A logical call to the Behave API.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub path: RequestPath,
    pub method: Method,
    pub params: Option<Value>,
}

impl ApiRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            path: RequestPath::Fixed(path.into()),
            method: Method::Get,
            params: None,
        }
    }

    pub fn post(path: impl Into<String>, params: Value) -> Self {
        Self {
            path: RequestPath::Fixed(path.into()),
            method: Method::Post,
            params: Some(params),
        }
    }

    /// `GET /app/info`
    pub fn app_info() -> Self {
        Self::get("/app/info")
    }

    /// `POST /players/{user_id}/identify`
    pub fn identify(user_id: &str, traits: &Map<String, Value>) -> Self {
        Self::post(
            format!("/players/{user_id}/identify"),
            json!({ "traits": traits }),
        )
    }

    /// `POST /players/{anonymous_id}/reidentify`, mapping an anonymous player
    /// (and its history) to `new_reference_id`.
    pub fn reidentify(
        anonymous_id: &str,
        new_reference_id: &str,
        traits: &Map<String, Value>,
    ) -> Self {
        Self::post(
            format!("/players/{anonymous_id}/reidentify"),
            json!({ "new_reference_id": new_reference_id, "traits": traits }),
        )
    }

    /// Tracking call, routed when executed.
    pub fn track(behaviour: &str, context: Option<&Value>) -> Self {
        Self {
            path: RequestPath::Track,
            method: Method::Post,
            params: Some(json!({ "verb": behaviour, "context": context })),
        }
    }

    /// `GET /players/{player_id}`
    pub fn player(player_id: &str) -> Self {
        Self::get(format!("/players/{player_id}"))
    }

    /// `GET /players/{player_id}/badges`
    pub fn player_badges(player_id: &str) -> Self {
        Self::get(format!("/players/{player_id}/badges"))
    }

    /// `GET /players/{player_id}/badges/todo`
    pub fn player_locked_badges(player_id: &str) -> Self {
        Self::get(format!("/players/{player_id}/badges/todo"))
    }

    /// `POST /leaderboards/{leaderboard_id}/results`
    pub fn leaderboard_results(leaderboard_id: &str, query: &LeaderboardQuery) -> Self {
        Self::post(
            format!("/leaderboards/{leaderboard_id}/results"),
            query.to_params(),
        )
    }

    /// `POST /leaderboards/player-results`
    pub fn player_leaderboard_results(query: &PlayerLeaderboardQuery) -> Self {
        Self::post("/leaderboards/player-results", query.to_params())
    }
}
