// Discord layer - serenity adapters for the core ports and the event handlers
// that drive them.

use crate::core::context::ModerationContext;
use poise::serenity_prelude as serenity;
use std::sync::Arc;

#[path = "moderation/message_gate.rs"]
pub mod message_gate;
#[path = "promotion/promotion_announcements.rs"]
pub mod promotion_announcements;
#[path = "lifecycle/presence.rs"]
pub mod presence;
#[path = "outcome_logger.rs"]
pub mod outcome_logger;
#[path = "platform.rs"]
pub mod platform;

/// Shared state handed to every event handler.
pub struct Data {
    pub moderation: Arc<ModerationContext>,
    /// Resolved once at startup; `None` sends everything to the fallback channel.
    pub announcement_webhook: Option<Arc<serenity::Webhook>>,
}

pub type Error = Box<dyn std::error::Error + Send + Sync>;
