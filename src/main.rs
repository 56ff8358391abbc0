// This is the entry point of the tier moderation bot.
//
// **Architecture Overview:**
// - `core/` = Business logic (platform-agnostic)
// - `infra/` = Implementations of non-Discord I/O (config file loading)
// - `discord/` = Discord-specific adapters (event handlers, port implementations)
//
// This file's job is to:
// 1. Load configuration
// 2. Build the moderation context (dependency injection)
// 3. Set up the Discord framework
// 4. Route gateway events to the handlers

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with half a dozen mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "discord/discord_layer.rs"]
mod discord;
#[path = "infra/infra_layer.rs"]
mod infra;

use crate::core::context::ModerationContext;
use crate::discord::message_gate;
use crate::discord::presence;
use crate::discord::promotion_announcements;
use crate::discord::{Data, Error};
use crate::infra::config::{JsonConfigStore, DEFAULT_CONFIG_PATH};
use anyhow::Context as _;
use poise::serenity_prelude as serenity;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// How long to wait for the gateway handshake before warning.
const READY_WATCHDOG: Duration = Duration::from_secs(30);

/// Event handler for non-command Discord events.
async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Message { new_message } => {
            if let Err(e) = message_gate::handle_message(ctx, data, new_message).await {
                tracing::error!("Error moderating message: {}", e);
            }
        }
        serenity::FullEvent::GuildMemberUpdate {
            old_if_available,
            new: _,
            event,
        } => {
            if let Err(e) = promotion_announcements::handle_member_update(
                ctx,
                data,
                old_if_available.as_ref(),
                event,
            )
            .await
            {
                tracing::error!("Error handling member update: {}", e);
            }
        }

        _ => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt::init();

    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    let token = std::env::var("DISCORD_TOKEN").context(
        "Missing DISCORD_TOKEN environment variable! Create a .env file with your bot token.",
    )?;

    let config_path =
        std::env::var("TIER_CONFIG_PATH").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // Everything is validated here, before we ever connect to the gateway.

    let store = JsonConfigStore::new(&config_path);
    let config = store
        .load_with_env()
        .with_context(|| format!("Failed to load tier config from {}", config_path))?;

    let moderation = Arc::new(
        ModerationContext::from_config(&config).context("Invalid tier configuration")?,
    );

    let tiers = moderation.moderation().tiers();
    if tiers.is_empty() {
        tracing::warn!("No tiers configured; every message will be allowed");
    }

    tracing::info!(
        tiers = tiers.len(),
        moderated = moderation.moderation().policies().moderated_tiers().count(),
        debounce_ms = moderation.promotions().debouncer().window().as_millis() as u64,
        debug_messages = moderation.debug_messages(),
        "Loaded tier config from {}",
        store.path().display()
    );

    let webhook_url = config.announcements.webhook_url.clone();
    let fallback_channel = moderation.promotions().fallback_channel_id();

    // ========================================================================
    // DISCORD FRAMEWORK SETUP
    // ========================================================================

    let intents = serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT // Required to read message content
        | serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MEMBERS; // Required for role updates

    let ready = Arc::new(AtomicBool::new(false));
    let ready_flag = Arc::clone(&ready);

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![],
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            ..Default::default()
        })
        .setup(move |ctx, ready_event, _framework| {
            Box::pin(async move {
                ready_flag.store(true, Ordering::SeqCst);

                tracing::info!(
                    "Logged in as {} (fallback channel: {})",
                    ready_event.user.tag(),
                    fallback_channel
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| "not set".to_string())
                );

                let announcement_webhook =
                    promotion_announcements::resolve_webhook(ctx, webhook_url.as_deref()).await;
                if announcement_webhook.is_none() && fallback_channel.is_none() {
                    tracing::warn!(
                        "No announcement webhook or fallback channel; promotions will be dropped"
                    );
                }

                presence::on_ready(ctx);

                Ok(Data {
                    moderation,
                    announcement_webhook,
                })
            })
        })
        .build();

    // The gateway can hang silently on bad intents or network trouble
    tokio::spawn(async move {
        tokio::time::sleep(READY_WATCHDOG).await;
        if !ready.load(Ordering::SeqCst) {
            tracing::warn!(
                "Not ready after {}s; check the token, the privileged intents and network access",
                READY_WATCHDOG.as_secs()
            );
        }
    });

    // Role diffs need the previous member state, which only the cache has
    let mut settings = serenity::cache::Settings::default();
    settings.cache_users = true;

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .cache_settings(settings)
        .await
        .context("Error creating client")?;

    client.start().await.context("Error running bot")?;

    Ok(())
}
