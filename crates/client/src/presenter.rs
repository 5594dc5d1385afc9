use async_trait::async_trait;

use behave_core::BadgeDialog;
use behave_runtime::RewardPresenter;

/// Presents badge unlocks as log lines.
pub struct LogPresenter;

#[async_trait]
impl RewardPresenter for LogPresenter {
    async fn present(&self, dialog: BadgeDialog) {
        let badge = &dialog.badge;
        tracing::info!(
            "Badge unlocked: {} - {}",
            badge.name.as_deref().unwrap_or("<unnamed>"),
            badge.message.as_deref().unwrap_or("")
        );
        if let Some(hint) = &badge.hint {
            tracing::info!("  hint: {}", hint);
        }
        if let Some(link) = &dialog.share_link {
            tracing::info!("  share: {} {}", dialog.share_caption.as_deref().unwrap_or(""), link);
        }
    }
}
