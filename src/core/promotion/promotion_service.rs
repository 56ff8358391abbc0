// Promotion announcements - turns tier gains into exactly one message each.
//
// Flow per role change:
// 1. Diff old vs new roles into newly gained tiers that have a template
// 2. Debounce per (member, tier)
// 3. Render the template
// 4. Deliver through the primary sink, falling back once to a channel
//
// Debounce state lives in memory only. A restart right after a promotion can
// announce it again; nothing here persists in-flight announcements.

use super::promotion_debouncer::PromotionDebouncer;
use super::template_registry::TemplateRegistry;
use crate::core::moderation::PlatformError;
use crate::core::tiers::{gained_tiers, Tier, TierTable};
use async_trait::async_trait;
use std::time::Instant;
use thiserror::Error;

// ============================================================================
// DOMAIN MODELS
// ============================================================================

/// A member's roles before and after an update.
#[derive(Debug, Clone, PartialEq)]
pub struct RoleSetChange {
    pub guild_id: u64,
    pub member_id: u64,
    pub old_role_ids: Vec<u64>,
    pub new_role_ids: Vec<u64>,
}

/// A member newly holding a tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PromotionEvent {
    pub member_id: u64,
    pub tier: Tier,
    pub observed_at: Instant,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PromotionOutcome {
    /// Same (member, tier) was announced less than one window ago
    Suppressed,
    /// No template registered for this tier
    NotAnnounced,
    DeliveredPrimary,
    DeliveredFallback { primary_error: DeliveryError },
    /// Both paths failed; the announcement is gone
    Dropped {
        primary_error: DeliveryError,
        fallback_error: DeliveryError,
    },
}

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Clone, Error, PartialEq)]
pub enum DeliveryError {
    #[error("No primary announcement sink is available")]
    PrimaryUnavailable,

    #[error("No fallback channel configured")]
    FallbackUnconfigured,

    #[error("Fallback channel {0} could not be resolved")]
    FallbackUnresolved(u64),

    #[error(transparent)]
    Platform(#[from] PlatformError),
}

// ============================================================================
// SINK TRAIT (PORT)
// ============================================================================

/// Where announcements go.
#[async_trait]
pub trait AnnouncementSink: Send + Sync {
    /// Platform token that refers to the member (a mention on Discord).
    fn member_reference(&self, member_id: u64) -> String;

    /// Send through the primary path, independent of the bot's own identity.
    async fn send_primary(&self, text: &str) -> Result<(), DeliveryError>;

    /// Check that a channel exists and can be posted to. `Ok(None)` if it is gone.
    async fn resolve_channel(&self, channel_id: u64) -> Result<Option<u64>, DeliveryError>;

    async fn send_to_channel(&self, channel_id: u64, text: &str) -> Result<(), DeliveryError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

pub struct PromotionService {
    tiers: TierTable,
    templates: TemplateRegistry,
    debouncer: PromotionDebouncer,
    fallback_channel_id: Option<u64>,
}

impl PromotionService {
    pub fn new(
        tiers: TierTable,
        templates: TemplateRegistry,
        debouncer: PromotionDebouncer,
        fallback_channel_id: Option<u64>,
    ) -> Self {
        Self {
            tiers,
            templates,
            debouncer,
            fallback_channel_id,
        }
    }

    pub fn fallback_channel_id(&self) -> Option<u64> {
        self.fallback_channel_id
    }

    pub fn debouncer(&self) -> &PromotionDebouncer {
        &self.debouncer
    }

    /// Newly gained tiers worth announcing.
    pub fn promotions_for(&self, change: &RoleSetChange, now: Instant) -> Vec<PromotionEvent> {
        gained_tiers(&self.tiers, &change.old_role_ids, &change.new_role_ids)
            .into_iter()
            .filter(|tier| self.templates.has_template(*tier))
            .map(|tier| PromotionEvent {
                member_id: change.member_id,
                tier,
                observed_at: now,
            })
            .collect()
    }

    pub async fn handle_role_change<S: AnnouncementSink>(
        &self,
        sink: &S,
        change: &RoleSetChange,
    ) -> Vec<(PromotionEvent, PromotionOutcome)> {
        let mut results = Vec::new();
        for event in self.promotions_for(change, Instant::now()) {
            let outcome = self.announce(sink, &event).await;
            results.push((event, outcome));
        }
        results
    }

    /// Debounce, render and deliver one promotion.
    pub async fn announce<S: AnnouncementSink>(
        &self,
        sink: &S,
        event: &PromotionEvent,
    ) -> PromotionOutcome {
        // Must stay ahead of the first await below.
        if !self
            .debouncer
            .try_accept(event.member_id, event.tier, event.observed_at)
        {
            return PromotionOutcome::Suppressed;
        }

        let member_ref = sink.member_reference(event.member_id);
        let tier_name = self.tiers.display_name(event.tier);
        let Some(text) = self.templates.render(event.tier, &member_ref, &tier_name) else {
            return PromotionOutcome::NotAnnounced;
        };

        let primary_error = match sink.send_primary(&text).await {
            Ok(()) => return PromotionOutcome::DeliveredPrimary,
            Err(err) => err,
        };

        match self.send_fallback(sink, &text).await {
            Ok(()) => PromotionOutcome::DeliveredFallback { primary_error },
            Err(fallback_error) => PromotionOutcome::Dropped {
                primary_error,
                fallback_error,
            },
        }
    }

    async fn send_fallback<S: AnnouncementSink>(
        &self,
        sink: &S,
        text: &str,
    ) -> Result<(), DeliveryError> {
        let channel_id = self
            .fallback_channel_id
            .ok_or(DeliveryError::FallbackUnconfigured)?;
        let channel_id = sink
            .resolve_channel(channel_id)
            .await?
            .ok_or(DeliveryError::FallbackUnresolved(channel_id))?;
        sink.send_to_channel(channel_id, text).await
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::promotion::Template;
    use crate::core::tiers::TierEntry;
    use std::sync::Mutex;
    use std::time::Duration;

    const FALLBACK: u64 = 333;

    /// Records every delivered announcement as (destination, text)
    struct RecordingSink {
        sent: Mutex<Vec<(String, String)>>,
        primary_fails: bool,
        fallback_fails: bool,
        fallback_missing: bool,
        primary_attempts: Mutex<u32>,
    }

    impl RecordingSink {
        fn new() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                primary_fails: false,
                fallback_fails: false,
                fallback_missing: false,
                primary_attempts: Mutex::new(0),
            }
        }

        fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AnnouncementSink for RecordingSink {
        fn member_reference(&self, member_id: u64) -> String {
            format!("<@{}>", member_id)
        }

        async fn send_primary(&self, text: &str) -> Result<(), DeliveryError> {
            *self.primary_attempts.lock().unwrap() += 1;
            if self.primary_fails {
                return Err(DeliveryError::Platform(PlatformError::Other(
                    "webhook deleted".into(),
                )));
            }
            self.sent
                .lock()
                .unwrap()
                .push(("primary".to_string(), text.to_string()));
            Ok(())
        }

        async fn resolve_channel(&self, channel_id: u64) -> Result<Option<u64>, DeliveryError> {
            Ok((!self.fallback_missing).then_some(channel_id))
        }

        async fn send_to_channel(&self, channel_id: u64, text: &str) -> Result<(), DeliveryError> {
            if self.fallback_fails {
                return Err(DeliveryError::Platform(PlatformError::Forbidden));
            }
            self.sent
                .lock()
                .unwrap()
                .push((format!("channel:{}", channel_id), text.to_string()));
            Ok(())
        }
    }

    // Role ids: T1 = 11, T2 = 12, T3 = 13 (T3 has no template)
    fn service(fallback: Option<u64>) -> PromotionService {
        let tiers = TierTable::new(
            [(Tier::T1, 11, "Member"), (Tier::T2, 12, "Regular"), (Tier::T3, 13, "Veteran")]
                .into_iter()
                .map(|(tier, role_id, name)| TierEntry {
                    tier,
                    role_id,
                    name: name.to_string(),
                }),
        )
        .unwrap();
        let templates = TemplateRegistry::new()
            .with_templates(Tier::T1, vec![Template::parse("{member} is a {tier}").unwrap()])
            .with_templates(Tier::T2, vec![Template::parse("{member} -> {tier}").unwrap()]);

        PromotionService::new(
            tiers,
            templates,
            PromotionDebouncer::new(Duration::from_secs(3)),
            fallback,
        )
    }

    fn event(tier: Tier, observed_at: Instant) -> PromotionEvent {
        PromotionEvent {
            member_id: 42,
            tier,
            observed_at,
        }
    }

    fn change(old: &[u64], new: &[u64]) -> RoleSetChange {
        RoleSetChange {
            guild_id: 1,
            member_id: 42,
            old_role_ids: old.to_vec(),
            new_role_ids: new.to_vec(),
        }
    }

    #[test]
    fn only_gained_templated_tiers_are_promotions() {
        let svc = service(None);
        let now = Instant::now();

        let events = svc.promotions_for(&change(&[11], &[11, 12, 13, 99]), now);
        assert_eq!(events, vec![event(Tier::T2, now)]);

        assert!(svc.promotions_for(&change(&[11, 12], &[11]), now).is_empty());
    }

    #[tokio::test]
    async fn primary_delivery_renders_template() {
        let svc = service(Some(FALLBACK));
        let sink = RecordingSink::new();

        let outcome = svc.announce(&sink, &event(Tier::T2, Instant::now())).await;

        assert_eq!(outcome, PromotionOutcome::DeliveredPrimary);
        assert_eq!(
            sink.sent(),
            vec![("primary".to_string(), "<@42> -> Regular".to_string())]
        );
    }

    #[tokio::test]
    async fn debounce_window_gates_duplicates() {
        let svc = service(Some(FALLBACK));
        let sink = RecordingSink::new();
        let start = Instant::now();

        let first = svc.announce(&sink, &event(Tier::T1, start)).await;
        let second = svc
            .announce(&sink, &event(Tier::T1, start + Duration::from_secs(1)))
            .await;
        let third = svc
            .announce(&sink, &event(Tier::T1, start + Duration::from_secs(4)))
            .await;

        assert_eq!(first, PromotionOutcome::DeliveredPrimary);
        assert_eq!(second, PromotionOutcome::Suppressed);
        assert_eq!(third, PromotionOutcome::DeliveredPrimary);
        assert_eq!(sink.sent().len(), 2);
    }

    #[tokio::test]
    async fn primary_failure_falls_back_once() {
        let svc = service(Some(FALLBACK));
        let mut sink = RecordingSink::new();
        sink.primary_fails = true;

        let outcome = svc.announce(&sink, &event(Tier::T1, Instant::now())).await;

        assert!(matches!(outcome, PromotionOutcome::DeliveredFallback { .. }));
        assert_eq!(
            sink.sent(),
            vec![(format!("channel:{}", FALLBACK), "<@42> is a Member".to_string())]
        );
        assert_eq!(*sink.primary_attempts.lock().unwrap(), 1);
    }

    #[tokio::test]
    async fn both_paths_failing_drops_the_announcement() {
        let svc = service(Some(FALLBACK));
        let mut sink = RecordingSink::new();
        sink.primary_fails = true;
        sink.fallback_fails = true;

        let outcome = svc.announce(&sink, &event(Tier::T1, Instant::now())).await;

        assert_eq!(
            outcome,
            PromotionOutcome::Dropped {
                primary_error: DeliveryError::Platform(PlatformError::Other(
                    "webhook deleted".into()
                )),
                fallback_error: DeliveryError::Platform(PlatformError::Forbidden),
            }
        );
        assert!(sink.sent().is_empty());
    }

    #[tokio::test]
    async fn unresolvable_or_missing_fallback_is_dropped() {
        let mut sink = RecordingSink::new();
        sink.primary_fails = true;
        sink.fallback_missing = true;

        let outcome = service(Some(FALLBACK))
            .announce(&sink, &event(Tier::T1, Instant::now()))
            .await;
        assert!(matches!(
            outcome,
            PromotionOutcome::Dropped {
                fallback_error: DeliveryError::FallbackUnresolved(FALLBACK),
                ..
            }
        ));

        let outcome = service(None)
            .announce(&sink, &event(Tier::T1, Instant::now()))
            .await;
        assert!(matches!(
            outcome,
            PromotionOutcome::Dropped {
                fallback_error: DeliveryError::FallbackUnconfigured,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn untemplated_tier_is_not_announced() {
        let sink = RecordingSink::new();
        let outcome = service(None)
            .announce(&sink, &event(Tier::T3, Instant::now()))
            .await;
        assert_eq!(outcome, PromotionOutcome::NotAnnounced);
        assert_eq!(*sink.primary_attempts.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn duplicate_role_updates_announce_once() {
        let svc = service(Some(FALLBACK));
        let sink = RecordingSink::new();
        let update = change(&[11], &[11, 12]);

        let first = svc.handle_role_change(&sink, &update).await;
        let second = svc.handle_role_change(&sink, &update).await;

        assert_eq!(first.len(), 1);
        assert_eq!(first[0].1, PromotionOutcome::DeliveredPrimary);
        assert_eq!(second[0].1, PromotionOutcome::Suppressed);
        assert_eq!(sink.sent().len(), 1);
    }
}
