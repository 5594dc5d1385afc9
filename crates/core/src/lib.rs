//! Data model shared by every layer of the Behave SDK.
//!
//! `behave-core` holds the types that flow between the transport, the request
//! queue and the host application. All of it is pure: requests are described
//! here and executed elsewhere, responses are decoded here and acted upon by
//! the runtime.
//!
//! - [`player`] tracks identity, points, level and custom traits
//! - [`reward`] decodes tracking responses and realtime reward pushes
//! - [`envelope`] unwraps the `{ data, error }` shape every endpoint returns
//! - [`request`] describes API calls with late-bound routing
//! - [`leaderboard`] normalizes query options and drives result paging
pub mod app;
pub mod envelope;
pub mod error;
pub mod leaderboard;
pub mod player;
pub mod request;
pub mod reward;

mod lenient;

pub use app::AppInfo;
pub use envelope::{Envelope, ServiceError};
pub use error::{CoreError, decode};
pub use leaderboard::{
    LeaderboardEntry, LeaderboardOptions, LeaderboardQuery, MAX_PAGE_SIZE, PageCursor,
    PlayerLeaderboardOptions, PlayerLeaderboardQuery, PlayerLeaderboardResult, Positions,
};
pub use player::{Player, PlayerProfile};
pub use request::{ApiRequest, Method, RequestPath};
pub use reward::{Badge, BadgeDialog, LevelReward, PointsReward, RewardResult, TrackOutcome};
