use std::sync::Arc;

use serde_json::Value;
use tracing::{error, info};

use behave_core::AppInfo;
use behave_transport::TransportError;

use super::Session;
use crate::response::normalize_into;
use crate::workers::{Completion, CompletionFuture};

/// Stores the app info fetched at startup and enables realtime delivery.
pub(crate) struct AppInfoCompletion {
    session: Arc<Session>,
}

impl AppInfoCompletion {
    pub(crate) fn new(session: Arc<Session>) -> Self {
        Self { session }
    }
}

impl Completion for AppInfoCompletion {
    fn complete(self: Box<Self>, result: Result<Value, TransportError>) -> CompletionFuture {
        Box::pin(async move {
            let app: AppInfo = match normalize_into(result, "app info") {
                Ok(app) => app,
                Err(err) => {
                    error!(target: "behave::session", "Failed to fetch app info: {}", err);
                    return;
                }
            };

            info!(
                target: "behave::session",
                "Connected to app {}",
                app.name.as_deref().or(app.id.as_deref()).unwrap_or("<unnamed>")
            );
            *self.session.app.write().await = Some(app);

            if self.session.realtime.enable() {
                info!(target: "behave::realtime", "Realtime reward delivery enabled");
            }
        })
    }
}
