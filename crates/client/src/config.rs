//! Client configuration loaded from the process environment.

use std::env;

use behave_runtime::SdkConfig;
use behave_transport_http::DEFAULT_API_ROOT;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub sdk: SdkConfig,
    pub api_root: String,
    /// Player to identify before tracking; tracking stays anonymous without it.
    pub player_id: Option<String>,
}

impl ClientConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `BEHAVE_API_TOKEN` - API token (required)
    /// - `BEHAVE_API_ROOT` - API root (default: http://api.behave.io)
    /// - `BEHAVE_PLAYER_ID` - Player to identify (optional)
    /// - `BEHAVE_HANDLES_TRACKING_RESPONSE` - Present badge dialogs (default: true)
    /// - `BEHAVE_ANONYMOUS_TRACKING` - Allow tracking before identify (default: true)
    /// - `BEHAVE_QUEUE_BUFFER` - Request queue capacity (default: 64)
    pub fn from_env() -> Self {
        let mut sdk = SdkConfig::new(read_env::<String>("BEHAVE_API_TOKEN").unwrap_or_default());

        if let Some(enabled) = read_env_bool("BEHAVE_HANDLES_TRACKING_RESPONSE") {
            sdk.handles_tracking_response = enabled;
        }
        if let Some(enabled) = read_env_bool("BEHAVE_ANONYMOUS_TRACKING") {
            sdk.anonymous_tracking = enabled;
        }
        if let Some(capacity) = read_env::<usize>("BEHAVE_QUEUE_BUFFER") {
            sdk.queue_buffer_size = capacity.max(1);
        }

        Self {
            sdk,
            api_root: read_env("BEHAVE_API_ROOT").unwrap_or_else(|| DEFAULT_API_ROOT.to_string()),
            player_id: read_env::<String>("BEHAVE_PLAYER_ID").filter(|id| !id.is_empty()),
        }
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}

fn read_env_bool(key: &str) -> Option<bool> {
    match env::var(key).ok()?.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
