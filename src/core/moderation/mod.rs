// Core moderation module - message classification and the per-tier decision engine.

pub mod message_classifier;
pub mod moderation_models;
pub mod moderation_service;
pub mod tier_policy;

pub use message_classifier::MessageClassifier;
pub use moderation_models::*;
pub use moderation_service::*;
pub use tier_policy::{PolicyRule, PolicyTable};
