//! Public application info returned by `GET /app/info`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Public metadata of the application the SDK token belongs to.
///
/// Only the fields the SDK reads are typed; everything else is kept in
/// `extra` so new service fields never break decoding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AppInfo {
    /// Application id, used to build realtime channel names.
    #[serde(default, alias = "_id", alias = "app_id")]
    pub id: Option<String>,

    /// Display name (used as share caption).
    #[serde(default)]
    pub name: Option<String>,

    /// Public URL of the host application (used as share link).
    #[serde(default)]
    pub url: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
