// Discord-specific message moderation - translates serenity messages into core
// types, runs the decision engine, and deletes through serenity.

use crate::core::moderation::{
    AttachmentInfo, InboundMessage, MemberSnapshot, MessageKind, ModerationPlatform, PlatformError,
};
use crate::discord::outcome_logger;
use crate::discord::platform::platform_error;
use crate::discord::{Data, Error};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;

/// serenity-backed implementation of the moderation port.
pub struct DiscordModerationGateway {
    ctx: serenity::Context,
}

impl DiscordModerationGateway {
    pub fn new(ctx: &serenity::Context) -> Self {
        Self { ctx: ctx.clone() }
    }
}

#[async_trait]
impl ModerationPlatform for DiscordModerationGateway {
    async fn fetch_member(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> Result<Option<MemberSnapshot>, PlatformError> {
        // Served from the cache when the member is there, HTTP otherwise
        match serenity::GuildId::new(guild_id)
            .member(&self.ctx, serenity::UserId::new(user_id))
            .await
        {
            Ok(member) => Ok(Some(MemberSnapshot {
                user_id,
                role_ids: member.roles.iter().map(|r| r.get()).collect(),
            })),
            Err(err) => match platform_error(err) {
                PlatformError::NotFound => Ok(None),
                other => Err(other),
            },
        }
    }

    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<(), PlatformError> {
        serenity::ChannelId::new(channel_id)
            .delete_message(&self.ctx.http, serenity::MessageId::new(message_id))
            .await
            .map_err(platform_error)
    }
}

fn message_kind(kind: serenity::MessageType) -> MessageKind {
    match kind {
        serenity::MessageType::Regular => MessageKind::Default,
        serenity::MessageType::InlineReply => MessageKind::Reply,
        _ => MessageKind::System,
    }
}

/// Snapshot the parts of a serenity message that moderation looks at.
pub fn to_inbound_message(msg: &serenity::Message, guild_id: serenity::GuildId) -> InboundMessage {
    let kind = message_kind(msg.kind);
    let reply_to = match kind {
        MessageKind::Reply => msg
            .message_reference
            .as_ref()
            .and_then(|r| r.message_id)
            .map(|id| id.get()),
        _ => None,
    };

    InboundMessage {
        message_id: msg.id.get(),
        author_id: msg.author.id.get(),
        guild_id: guild_id.get(),
        channel_id: msg.channel_id.get(),
        text: msg.content.clone(),
        attachments: msg
            .attachments
            .iter()
            .map(|a| AttachmentInfo::new(a.filename.clone(), a.content_type.as_deref()))
            .collect(),
        embed_count: msg.embeds.len(),
        reply_to,
        kind,
    }
}

/// Moderate a freshly created guild message.
pub async fn handle_message(
    ctx: &serenity::Context,
    data: &Data,
    msg: &serenity::Message,
) -> Result<(), Error> {
    // Skip bots and webhooks (including our own announcements)
    if msg.author.bot || msg.webhook_id.is_some() {
        return Ok(());
    }

    // Only check guild messages
    let guild_id = match msg.guild_id {
        Some(id) => id,
        None => return Ok(()),
    };

    let inbound = to_inbound_message(msg, guild_id);

    if data.moderation.debug_messages() {
        let features = data.moderation.classify(&inbound);
        tracing::info!(
            message_id = inbound.message_id,
            author_id = inbound.author_id,
            channel_id = inbound.channel_id,
            kind = ?inbound.kind,
            reply_to = ?inbound.reply_to,
            attachments = inbound.attachments.len(),
            embeds = inbound.embed_count,
            ?features,
            "Inbound message"
        );
    }

    let gateway = DiscordModerationGateway::new(ctx);
    let result = data.moderation.moderate_message(&gateway, &inbound).await;
    outcome_logger::log_moderation(&inbound, &result);

    Ok(())
}
