//! Reward dispatch.
//!
//! Player state is mutated first, then events go out: badges in the order
//! returned, then points when something was earned, then the level on a
//! level-up. Callbacks therefore never observe a stale player.

use tracing::debug;

use behave_core::{BadgeDialog, RewardResult};

use super::Session;
use crate::events::Event;

impl Session {
    pub(crate) async fn dispatch_rewards(&self, rewards: &RewardResult) {
        {
            let mut player = self.player.write().await;
            player.apply_rewards(rewards);
        }

        for badge in &rewards.badges {
            self.events.publish(Event::RewardBadge(badge.clone()));
        }
        if let Some(points) = rewards.earned_points() {
            self.events.publish(Event::RewardPoints(points.clone()));
        }
        if let Some(level) = rewards.level_up() {
            self.events.publish(Event::RewardLevel(level.clone()));
        }

        if self.config.handles_tracking_response
            && let Some(presenter) = &self.presenter
        {
            let dialog = {
                let app = self.app.read().await;
                BadgeDialog::for_rewards(rewards, app.as_ref())
            };
            if let Some(dialog) = dialog {
                debug!(target: "behave::rewards", "Presenting badge dialog");
                presenter.present(dialog).await;
            }
        }
    }
}
