//! Behave client binary.
//!
//! Composition root that wires the reqwest transport into an SDK instance,
//! identifies the configured player and tracks each behaviour given on the
//! command line.
//!
//! ```bash
//! BEHAVE_API_TOKEN=... BEHAVE_PLAYER_ID=u1 cargo run -p behave-client -- played won
//! ```

mod config;
mod presenter;

use anyhow::{Context, Result};
use serde_json::Map;

use behave_runtime::{Behave, Event, Topic};
use behave_transport_http::HttpTransport;

use crate::config::ClientConfig;
use crate::presenter::LogPresenter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ClientConfig::from_env();
    let behaviours: Vec<String> = std::env::args().skip(1).collect();

    let transport = HttpTransport::with_root(&config.api_root, &config.sdk.token)
        .context("BEHAVE_API_TOKEN must be set")?;

    let behave = Behave::builder(config.sdk.token.clone())
        .config(config.sdk.clone())
        .transport(transport)
        .presenter(LogPresenter)
        .build()
        .await
        .context("failed to initialize Behave")?;
    let handle = behave.handle();

    handle.subscribe(Topic::RewardPoints, |event| {
        if let Event::RewardPoints(points) = event {
            tracing::info!("+{} points (balance: {:?})", points.earned, points.balance);
        }
    });
    handle.subscribe(Topic::RewardLevel, |event| {
        if let Event::RewardLevel(level) = event {
            tracing::info!("Level up: {}", level.to_value());
        }
    });

    if let Some(player_id) = &config.player_id {
        let player = handle
            .identify(player_id, Map::new())
            .await
            .with_context(|| format!("failed to identify {player_id}"))?;
        tracing::info!(
            "Identified {} ({} points)",
            player.reference_id.as_deref().unwrap_or(player_id),
            player.points
        );
    }

    for behaviour in &behaviours {
        match handle.track(behaviour, None).await {
            Ok(outcome) if outcome.rewards.is_empty() => {
                tracing::info!("Tracked {}: no rewards", behaviour);
            }
            Ok(_) => tracing::info!("Tracked {}", behaviour),
            Err(err) => tracing::error!("Failed to track {}: {}", behaviour, err),
        }
    }

    let metrics = handle.queue_metrics();
    tracing::info!(
        "{} requests completed, {} failed, avg {:?}",
        metrics.completed,
        metrics.failed,
        metrics.avg_latency
    );

    behave.shutdown().await.context("shutdown failed")?;
    Ok(())
}
