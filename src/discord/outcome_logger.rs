// Structured log lines for moderation and promotion outcomes.
//
// Deletions and deliveries are info, routine allows are debug, failures are
// warn (already-deleted messages drop to debug).

use crate::core::moderation::{InboundMessage, ModerationError, ModerationOutcome};
use crate::core::promotion::{PromotionEvent, PromotionOutcome, RoleSetChange};

pub fn log_moderation(message: &InboundMessage, result: &Result<ModerationOutcome, ModerationError>) {
    match result {
        Ok(ModerationOutcome::Deleted(reason)) => tracing::info!(
            message_id = message.message_id,
            author_id = message.author_id,
            channel_id = message.channel_id,
            %reason,
            "Deleted message"
        ),
        Ok(ModerationOutcome::Allowed(reason)) => tracing::debug!(
            message_id = message.message_id,
            author_id = message.author_id,
            ?reason,
            "Allowed message"
        ),
        Err(err) if err.is_benign() => tracing::debug!(
            message_id = message.message_id,
            "Message was already gone: {}",
            err
        ),
        Err(err) => tracing::warn!(
            message_id = message.message_id,
            author_id = message.author_id,
            channel_id = message.channel_id,
            kind = err.kind(),
            "Moderation failed: {}",
            err
        ),
    }
}

pub fn log_promotions(change: &RoleSetChange, results: &[(PromotionEvent, PromotionOutcome)]) {
    for (event, outcome) in results {
        match outcome {
            PromotionOutcome::DeliveredPrimary => tracing::info!(
                guild_id = change.guild_id,
                member_id = event.member_id,
                tier = %event.tier,
                "Promotion announced"
            ),
            PromotionOutcome::DeliveredFallback { primary_error } => tracing::info!(
                guild_id = change.guild_id,
                member_id = event.member_id,
                tier = %event.tier,
                %primary_error,
                "Promotion announced in fallback channel"
            ),
            PromotionOutcome::Suppressed => tracing::debug!(
                member_id = event.member_id,
                tier = %event.tier,
                "Duplicate promotion suppressed"
            ),
            PromotionOutcome::NotAnnounced => tracing::debug!(
                member_id = event.member_id,
                tier = %event.tier,
                "Tier has no announcement template"
            ),
            PromotionOutcome::Dropped {
                primary_error,
                fallback_error,
            } => tracing::warn!(
                guild_id = change.guild_id,
                member_id = event.member_id,
                tier = %event.tier,
                %primary_error,
                %fallback_error,
                "Promotion announcement dropped"
            ),
        }
    }
}
