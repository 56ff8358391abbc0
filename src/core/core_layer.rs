// The core module contains all business logic.
// Each feature gets its own submodule.

#[path = "tiers/tier_table.rs"]
pub mod tiers;

#[path = "moderation/mod.rs"]
pub mod moderation;

#[path = "promotion/mod.rs"]
pub mod promotion;

#[path = "config/bot_config.rs"]
pub mod config;

#[path = "moderation_context.rs"]
pub mod context;
