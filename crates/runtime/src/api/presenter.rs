//! Reward presentation seam.

use async_trait::async_trait;

use behave_core::BadgeDialog;

/// Displays a badge-unlock notification to the player.
///
/// Rendering is entirely up to the host; the SDK only decides when a dialog
/// is due and what it contains.
#[async_trait]
pub trait RewardPresenter: Send + Sync {
    async fn present(&self, dialog: BadgeDialog);
}
