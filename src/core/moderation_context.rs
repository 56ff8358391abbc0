// The moderation context - every piece of moderation and promotion state,
// built once from config and handed to event handlers.
//
// Only the promotion debouncer mutates after construction.

use crate::core::config::{BotConfig, ConfigError};
use crate::core::moderation::{
    InboundMessage, MessageClassifier, MessageFeatures, ModerationError, ModerationOutcome,
    ModerationPlatform, ModerationService, PolicyTable,
};
use crate::core::promotion::{
    AnnouncementSink, PromotionDebouncer, PromotionEvent, PromotionOutcome, PromotionService,
    RoleSetChange, Template, TemplateRegistry,
};
use crate::core::tiers::{TierEntry, TierTable};

pub struct ModerationContext {
    moderation: ModerationService,
    promotions: PromotionService,
    debug_messages: bool,
}

impl ModerationContext {
    /// Validate the config and build every table from it.
    pub fn from_config(config: &BotConfig) -> Result<Self, ConfigError> {
        let tiers = TierTable::new(config.tiers.iter().map(|t| TierEntry {
            tier: t.tier,
            role_id: t.role_id,
            name: t.name.clone(),
        }))?;

        let policies = PolicyTable::new(
            config
                .moderated_tiers()
                .map(|(tier, rule)| (tier, rule.clone())),
        );

        let mut templates = TemplateRegistry::new();
        for tier_config in config.tiers.iter().filter(|t| t.announce) {
            let parsed = tier_config
                .templates
                .iter()
                .map(|text| {
                    Template::parse(text.as_str()).ok_or_else(|| ConfigError::Template {
                        tier: tier_config.tier,
                        template: text.clone(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            templates = templates.with_templates(tier_config.tier, parsed);
        }

        let debouncer = PromotionDebouncer::new(config.debounce_window()?);
        let classifier = MessageClassifier::new()?;

        Ok(Self {
            moderation: ModerationService::new(tiers.clone(), policies, classifier),
            promotions: PromotionService::new(
                tiers,
                templates,
                debouncer,
                config.announcements.fallback_channel_id,
            ),
            debug_messages: config.debug_messages,
        })
    }

    pub fn moderation(&self) -> &ModerationService {
        &self.moderation
    }

    pub fn promotions(&self) -> &PromotionService {
        &self.promotions
    }

    pub fn debug_messages(&self) -> bool {
        self.debug_messages
    }

    pub fn classify(&self, message: &InboundMessage) -> MessageFeatures {
        self.moderation.classifier().classify(message)
    }

    pub async fn moderate_message<P: ModerationPlatform>(
        &self,
        platform: &P,
        message: &InboundMessage,
    ) -> Result<ModerationOutcome, ModerationError> {
        self.moderation.moderate_message(platform, message).await
    }

    pub async fn handle_role_change<S: AnnouncementSink>(
        &self,
        sink: &S,
        change: &RoleSetChange,
    ) -> Vec<(PromotionEvent, PromotionOutcome)> {
        self.promotions.handle_role_change(sink, change).await
    }
}
