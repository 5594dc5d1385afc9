//! Leaderboard query options and result paging.
//!
//! [`LeaderboardOptions`] is what callers build; [`LeaderboardOptions::query`]
//! normalizes it into the parameters sent to the service. [`PageCursor`]
//! drives multi-page iteration and enforces the max-position cap.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Largest page the service hands out.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// How positions are computed when results are restricted to some players.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Positions {
    /// Positions among all players.
    #[default]
    Absolute,
    /// Positions among the selected players only.
    Relative,
}

/// Options for fetching a leaderboard's results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardOptions {
    /// Leaderboards to restrict to.
    pub leaderboards: Option<Vec<String>>,
    /// Maximum position to fetch. `0` or unset means no cap.
    pub max: Option<u32>,
    /// A player to always include in the results.
    pub player_id: Option<String>,
    /// Only include these players.
    pub players: Option<Vec<String>>,
    pub positions: Option<Positions>,
    /// 1-based page. Defaults to 1.
    pub page: Option<u32>,
    /// Page size. Defaults to, and is clamped at, [`MAX_PAGE_SIZE`].
    pub limit: Option<u32>,
    /// Restrict scoring to behaviours tracked under a matching context,
    /// e.g. `{ "timestamp": ">42424242" }`.
    pub context: Option<Value>,
}

impl LeaderboardOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn max(mut self, max: u32) -> Self {
        self.max = Some(max);
        self
    }

    pub fn page(mut self, page: u32) -> Self {
        self.page = Some(page);
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn player_id(mut self, player_id: impl Into<String>) -> Self {
        self.player_id = Some(player_id.into());
        self
    }

    pub fn players(mut self, players: Vec<String>) -> Self {
        self.players = Some(players);
        self
    }

    pub fn positions(mut self, positions: Positions) -> Self {
        self.positions = Some(positions);
        self
    }

    pub fn context(mut self, context: Value) -> Self {
        self.context = Some(context);
        self
    }

    /// 1-based page number; unset or `0` both mean the first page.
    pub fn page_number(&self) -> u32 {
        self.page.filter(|&page| page > 0).unwrap_or(1)
    }

    /// Page size before the max-position cap is applied.
    pub fn page_size(&self) -> u32 {
        match self.limit {
            Some(limit) if limit > 0 => limit.min(MAX_PAGE_SIZE),
            _ => MAX_PAGE_SIZE,
        }
    }

    /// Max-position cap, if any.
    pub fn max_position(&self) -> Option<u32> {
        self.max.filter(|&max| max > 0)
    }

    /// Normalizes the options into request parameters.
    ///
    /// The offset is derived from the page size; only then is the limit
    /// lowered to the max-position cap, so a small cap never needs more than
    /// one request.
    pub fn query(&self) -> LeaderboardQuery {
        let page_size = self.page_size();
        let offset = u64::from(self.page_number() - 1) * u64::from(page_size);
        let limit = match self.max_position() {
            Some(max) if max < page_size => max,
            _ => page_size,
        };

        LeaderboardQuery {
            leaderboards: self.leaderboards.clone(),
            max: self.max_position(),
            player_id: self.player_id.clone(),
            players: self.players.clone(),
            positions: self.positions,
            page: self.page_number(),
            limit,
            offset,
            context: self.context.clone(),
        }
    }
}

/// Normalized parameters of a leaderboard results request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leaderboards: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub players: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub positions: Option<Positions>,
    pub page: u32,
    pub limit: u32,
    pub offset: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<Value>,
}

impl LeaderboardQuery {
    pub fn to_params(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Options for fetching the leaderboards a player appears in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerLeaderboardOptions {
    /// Leaderboards to restrict to (all by default).
    pub leaderboards: Option<Vec<String>>,
    /// Ignore leaderboards where the player's position is above this.
    pub max: Option<u32>,
}

impl PlayerLeaderboardOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn leaderboards(mut self, leaderboards: Vec<String>) -> Self {
        self.leaderboards = Some(leaderboards);
        self
    }

    pub fn max(mut self, max: u32) -> Self {
        self.max = Some(max);
        self
    }

    pub fn query(&self, player_id: &str) -> PlayerLeaderboardQuery {
        PlayerLeaderboardQuery {
            player_id: player_id.to_string(),
            leaderboards: self.leaderboards.clone(),
            max: self.max.filter(|&max| max > 0),
        }
    }
}

/// Normalized parameters of a player leaderboard results request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerLeaderboardQuery {
    pub player_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leaderboards: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
}

impl PlayerLeaderboardQuery {
    pub fn to_params(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// One ranked row of a leaderboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    #[serde(default)]
    pub position: Option<u64>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub player: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A player's standing in one leaderboard.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerLeaderboardResult {
    #[serde(default)]
    pub leaderboard: Option<Value>,
    #[serde(default)]
    pub position: Option<u64>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Iteration state over consecutive result pages.
///
/// Iteration ends on the first empty page, or once the max-position cap is
/// reached; the page that crosses the cap is truncated so callers never see
/// positions beyond it.
#[derive(Debug, Clone)]
pub struct PageCursor {
    page: u32,
    page_size: u32,
    max: Option<u32>,
    done: bool,
}

impl PageCursor {
    pub fn new(options: &LeaderboardOptions) -> Self {
        Self {
            page: options.page_number(),
            page_size: options.page_size(),
            max: options.max_position(),
            done: false,
        }
    }

    /// Page to fetch next.
    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Options for fetching the current page.
    pub fn options_for(&self, base: &LeaderboardOptions) -> LeaderboardOptions {
        LeaderboardOptions {
            page: Some(self.page),
            ..base.clone()
        }
    }

    /// Consumes a fetched page.
    ///
    /// Returns the results to hand to the caller along with their page
    /// number, or `None` once iteration is over.
    pub fn advance<T>(&mut self, mut results: Vec<T>) -> Option<(Vec<T>, u32)> {
        if self.done || results.is_empty() {
            self.done = true;
            return None;
        }

        let total = u64::from(self.page - 1) * u64::from(self.page_size) + results.len() as u64;
        if let Some(max) = self.max.map(u64::from) {
            if total > max {
                let excess = (total - max) as usize;
                results.truncate(results.len().saturating_sub(excess));
                self.done = true;
                if results.is_empty() {
                    return None;
                }
            } else if total == max {
                self.done = true;
            }
        }

        let page = self.page;
        self.page += 1;
        Some((results, page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_to_first_page_of_max_size() {
        let query = LeaderboardOptions::new().query();
        assert_eq!(query.limit, MAX_PAGE_SIZE);
        assert_eq!(query.offset, 0);
        assert_eq!(query.page, 1);
    }

    #[test]
    fn limit_is_clamped_and_zero_means_default() {
        assert_eq!(LeaderboardOptions::new().limit(5000).query().limit, 1000);
        assert_eq!(LeaderboardOptions::new().limit(0).query().limit, 1000);
        assert_eq!(LeaderboardOptions::new().limit(50).query().limit, 50);
    }

    #[test]
    fn offset_follows_page() {
        let query = LeaderboardOptions::new().limit(50).page(3).query();
        assert_eq!(query.offset, 100);
        assert_eq!(LeaderboardOptions::new().page(0).query().offset, 0);
    }

    #[test]
    fn max_lowers_the_limit() {
        let query = LeaderboardOptions::new().max(25).limit(1000).query();
        assert_eq!(query.limit, 25);
        assert_eq!(query.max, Some(25));

        let query = LeaderboardOptions::new().max(1200).query();
        assert_eq!(query.limit, 1000);
    }

    #[test]
    fn offset_is_computed_before_max_lowering() {
        let query = LeaderboardOptions::new().max(25).page(2).query();
        assert_eq!(query.offset, 1000);
        assert_eq!(query.limit, 25);
    }

    #[test]
    fn query_params_skip_unset_options() {
        let params = LeaderboardOptions::new()
            .positions(Positions::Relative)
            .context(json!({ "placeId": "42" }))
            .query()
            .to_params();
        assert_eq!(
            params,
            json!({
                "positions": "relative",
                "page": 1,
                "limit": 1000,
                "offset": 0,
                "context": { "placeId": "42" }
            })
        );
    }

    #[test]
    fn player_query_carries_player_id() {
        let params = PlayerLeaderboardOptions::new()
            .leaderboards(vec!["weekly".into()])
            .query("u1")
            .to_params();
        assert_eq!(
            params,
            json!({ "player_id": "u1", "leaderboards": ["weekly"] })
        );
    }

    fn page_of(len: usize) -> Vec<usize> {
        (0..len).collect()
    }

    #[test]
    fn cursor_stops_on_empty_page() {
        let mut cursor = PageCursor::new(&LeaderboardOptions::new());
        let mut sizes = Vec::new();
        for len in [1000, 1000, 500, 0] {
            if let Some((results, _)) = cursor.advance(page_of(len)) {
                sizes.push(results.len());
            }
        }
        assert_eq!(sizes, vec![1000, 1000, 500]);
        assert!(cursor.is_done());
    }

    #[test]
    fn cursor_truncates_the_page_crossing_max() {
        let mut cursor = PageCursor::new(&LeaderboardOptions::new().max(1200));

        let (first, page) = cursor.advance(page_of(1000)).unwrap();
        assert_eq!((first.len(), page), (1000, 1));
        assert!(!cursor.is_done());

        let (second, page) = cursor.advance(page_of(1000)).unwrap();
        assert_eq!((second.len(), page), (200, 2));
        assert_eq!(second.last(), Some(&199));
        assert!(cursor.is_done());
        assert!(cursor.advance(page_of(1000)).is_none());
    }

    #[test]
    fn cursor_stops_exactly_at_max() {
        let mut cursor = PageCursor::new(&LeaderboardOptions::new().max(25));
        let (results, _) = cursor.advance(page_of(25)).unwrap();
        assert_eq!(results.len(), 25);
        assert!(cursor.is_done());
    }

    #[test]
    fn cursor_never_yields_an_empty_truncated_page() {
        let mut cursor = PageCursor::new(&LeaderboardOptions::new().max(25).page(2));
        assert!(cursor.advance(page_of(25)).is_none());
        assert!(cursor.is_done());
    }

    #[test]
    fn cursor_starts_at_requested_page() {
        let options = LeaderboardOptions::new().page(3).limit(10);
        let mut cursor = PageCursor::new(&options);
        assert_eq!(cursor.options_for(&options).page, Some(3));

        let (_, page) = cursor.advance(page_of(10)).unwrap();
        assert_eq!(page, 3);
        assert_eq!(cursor.options_for(&options).page, Some(4));
    }
}
