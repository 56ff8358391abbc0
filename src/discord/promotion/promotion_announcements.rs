// Promotion announcements over serenity: a webhook first, the fallback
// channel second.

use crate::core::moderation::PlatformError;
use crate::core::promotion::{AnnouncementSink, DeliveryError, RoleSetChange};
use crate::discord::outcome_logger;
use crate::discord::platform::platform_error;
use crate::discord::{Data, Error};
use async_trait::async_trait;
use poise::serenity_prelude::{self as serenity, Mentionable};
use std::sync::Arc;

/// Announces promotions through a webhook, falling back to a plain channel send.
pub struct DiscordAnnouncer {
    ctx: serenity::Context,
    webhook: Option<Arc<serenity::Webhook>>,
}

impl DiscordAnnouncer {
    pub fn new(ctx: &serenity::Context, webhook: Option<Arc<serenity::Webhook>>) -> Self {
        Self {
            ctx: ctx.clone(),
            webhook,
        }
    }
}

#[async_trait]
impl AnnouncementSink for DiscordAnnouncer {
    fn member_reference(&self, member_id: u64) -> String {
        serenity::UserId::new(member_id).mention().to_string()
    }

    async fn send_primary(&self, text: &str) -> Result<(), DeliveryError> {
        let webhook = self
            .webhook
            .as_ref()
            .ok_or(DeliveryError::PrimaryUnavailable)?;

        webhook
            .execute(&self.ctx, false, serenity::ExecuteWebhook::new().content(text))
            .await
            .map(|_| ())
            .map_err(|e| DeliveryError::Platform(platform_error(e)))
    }

    async fn resolve_channel(&self, channel_id: u64) -> Result<Option<u64>, DeliveryError> {
        match serenity::ChannelId::new(channel_id).to_channel(&self.ctx).await {
            Ok(channel) => Ok(Some(channel.id().get())),
            Err(err) => match platform_error(err) {
                PlatformError::NotFound => Ok(None),
                other => Err(DeliveryError::Platform(other)),
            },
        }
    }

    async fn send_to_channel(&self, channel_id: u64, text: &str) -> Result<(), DeliveryError> {
        serenity::ChannelId::new(channel_id)
            .say(&self.ctx, text)
            .await
            .map(|_| ())
            .map_err(|e| DeliveryError::Platform(platform_error(e)))
    }
}

/// Look up the announcement webhook once at startup.
pub async fn resolve_webhook(
    ctx: &serenity::Context,
    url: Option<&str>,
) -> Option<Arc<serenity::Webhook>> {
    let url = url?;
    match serenity::Webhook::from_url(ctx, url).await {
        Ok(webhook) => Some(Arc::new(webhook)),
        Err(err) => {
            tracing::warn!(
                error = %err,
                "Announcement webhook unavailable; promotions will use the fallback channel"
            );
            None
        }
    }
}

/// Diff a member's roles and announce any newly gained tiers.
pub async fn handle_member_update(
    ctx: &serenity::Context,
    data: &Data,
    old: Option<&serenity::Member>,
    event: &serenity::GuildMemberUpdateEvent,
) -> Result<(), Error> {
    if event.user.bot {
        return Ok(());
    }

    // Without the previous roles there is nothing to diff against
    let old = match old {
        Some(member) => member,
        None => {
            tracing::debug!(
                guild_id = event.guild_id.get(),
                user_id = event.user.id.get(),
                "Member update without cached previous state, skipping promotion check"
            );
            return Ok(());
        }
    };

    let change = RoleSetChange {
        guild_id: event.guild_id.get(),
        member_id: event.user.id.get(),
        old_role_ids: old.roles.iter().map(|r| r.get()).collect(),
        new_role_ids: event.roles.iter().map(|r| r.get()).collect(),
    };

    let announcer = DiscordAnnouncer::new(ctx, data.announcement_webhook.clone());
    let results = data.moderation.handle_role_change(&announcer, &change).await;
    outcome_logger::log_promotions(&change, &results);

    if !results.is_empty() {
        tracing::debug!(
            tracked = data.moderation.promotions().debouncer().tracked(),
            "Debouncer state"
        );
    }

    Ok(())
}
