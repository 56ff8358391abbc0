// Tiered moderation service - core business logic for deciding whether a
// member's message may stay.
//
// This service handles:
// - Mapping the author's roles to tiers and picking the governing tier
// - The forwarded/empty check shared by every moderated tier
// - Per-tier attachment and link rules
// - Best-effort deletion through the platform port
//
// NO Discord dependencies here - just pure domain logic.

use super::message_classifier::MessageClassifier;
use super::moderation_models::{
    AllowReason, DeleteReason, InboundMessage, MemberSnapshot, MessageFeatures, MessageKind,
    Verdict,
};
use super::tier_policy::{resolve_effective_tier, LinkDecision, PolicyRule, PolicyTable};
use crate::core::tiers::TierTable;
use async_trait::async_trait;
use thiserror::Error;

// ============================================================================
// ERRORS
// ============================================================================

/// Failure reported by the chat platform.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PlatformError {
    #[error("Not found")]
    NotFound,

    #[error("Missing permissions")]
    Forbidden,

    #[error("Platform error: {0}")]
    Other(String),
}

#[derive(Debug, Error)]
pub enum ModerationError {
    #[error("Member lookup failed: {0}")]
    Lookup(PlatformError),

    #[error("Member {user_id} is not in guild {guild_id}")]
    MemberNotFound { user_id: u64, guild_id: u64 },

    #[error("Failed to delete message ({reason}): {source}")]
    Deletion {
        reason: DeleteReason,
        source: PlatformError,
    },
}

impl ModerationError {
    /// Stable label for the error kind, for log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            ModerationError::Lookup(_) => "lookup_failure",
            ModerationError::MemberNotFound { .. } => "lookup_failure",
            ModerationError::Deletion { .. } => "deletion_failure",
        }
    }

    /// Deleting something that is already gone is not worth a warning.
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            ModerationError::Deletion {
                source: PlatformError::NotFound,
                ..
            }
        )
    }
}

// ============================================================================
// PLATFORM TRAIT (PORT)
// ============================================================================

/// What moderation needs from the chat platform.
#[async_trait]
pub trait ModerationPlatform: Send + Sync {
    /// Look up a guild member. `Ok(None)` if they are not (or no longer) a member.
    async fn fetch_member(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> Result<Option<MemberSnapshot>, PlatformError>;

    /// Remove a message.
    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<(), PlatformError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// What happened to a message after moderation ran.
#[derive(Debug, Clone, PartialEq)]
pub enum ModerationOutcome {
    Allowed(AllowReason),
    Deleted(DeleteReason),
}

/// Decision engine over a fixed tier table and policy table.
pub struct ModerationService {
    tiers: TierTable,
    policies: PolicyTable,
    classifier: MessageClassifier,
}

impl ModerationService {
    pub fn new(tiers: TierTable, policies: PolicyTable, classifier: MessageClassifier) -> Self {
        Self {
            tiers,
            policies,
            classifier,
        }
    }

    pub fn classifier(&self) -> &MessageClassifier {
        &self.classifier
    }

    pub fn tiers(&self) -> &TierTable {
        &self.tiers
    }

    pub fn policies(&self) -> &PolicyTable {
        &self.policies
    }

    /// Decide what to do with a message from `member`. Pure: no I/O.
    pub fn decide(&self, member: &MemberSnapshot, message: &InboundMessage) -> Verdict {
        if message.kind == MessageKind::System {
            return Verdict::Allow(AllowReason::SystemMessage);
        }

        let held = self.tiers.held_tiers(&member.role_ids);
        if !held.iter().any(|tier| self.policies.is_moderated(*tier)) {
            return Verdict::Allow(AllowReason::Unmoderated);
        }

        let Some(tier) = resolve_effective_tier(&held) else {
            return Verdict::Allow(AllowReason::Unmoderated);
        };
        let Some(rule) = self.policies.rule(tier) else {
            return Verdict::Allow(AllowReason::UnrestrictedTier(tier));
        };

        let features = self.classifier.classify(message);
        match Self::first_violation(&features, rule, message.channel_id) {
            Some(reason) => Verdict::Delete { tier, reason },
            None => Verdict::Allow(AllowReason::PolicyPermits(tier)),
        }
    }

    /// Rules run in a fixed order; the first one that fails decides the reason.
    fn first_violation(
        features: &MessageFeatures,
        rule: &PolicyRule,
        channel_id: u64,
    ) -> Option<DeleteReason> {
        if let Some(reason) = features.forwarded {
            return Some(DeleteReason::Forwarded(reason));
        }

        if !rule.allow_animated && features.has_animated_attachment {
            return Some(DeleteReason::AnimatedAttachment);
        }
        if !rule.allow_device_video && features.has_device_video_attachment {
            return Some(DeleteReason::DeviceVideoAttachment);
        }

        let exempt = rule.is_exempt_channel(channel_id);
        for link in &features.links {
            match rule.links.check(&link.domain, exempt) {
                LinkDecision::Permitted => {}
                LinkDecision::Forbidden => {
                    return Some(DeleteReason::DisallowedLink {
                        domain: link.domain.clone(),
                    })
                }
                LinkDecision::NotExemptChannel => {
                    return Some(DeleteReason::LinkOutsideExemptChannel {
                        domain: link.domain.clone(),
                    })
                }
            }
        }

        if !rule.allow_images && features.has_any_attachment {
            return Some(DeleteReason::Attachment);
        }

        None
    }

    /// Look up the author, decide, and delete if needed.
    ///
    /// A failed lookup aborts without deleting. A failed delete is reported but
    /// never retried.
    pub async fn moderate_message<P: ModerationPlatform>(
        &self,
        platform: &P,
        message: &InboundMessage,
    ) -> Result<ModerationOutcome, ModerationError> {
        let member = platform
            .fetch_member(message.guild_id, message.author_id)
            .await
            .map_err(ModerationError::Lookup)?
            .ok_or(ModerationError::MemberNotFound {
                user_id: message.author_id,
                guild_id: message.guild_id,
            })?;

        match self.decide(&member, message) {
            Verdict::Allow(reason) => Ok(ModerationOutcome::Allowed(reason)),
            Verdict::Delete { reason, .. } => {
                match platform
                    .delete_message(message.channel_id, message.message_id)
                    .await
                {
                    Ok(()) => Ok(ModerationOutcome::Deleted(reason)),
                    Err(source) => Err(ModerationError::Deletion { reason, source }),
                }
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
