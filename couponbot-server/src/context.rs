//! couponbot-server/src/context.rs
//!
//! Builds every long-lived service once at startup and hands them to the event loop.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use couponbot_common::traits::api::ChatSink;
use couponbot_core::platforms::coupon::CouponApiClient;
use couponbot_core::platforms::discord::DiscordPlatform;
use couponbot_core::platforms::PlatformIntegration;
use couponbot_core::repositories::JsonFileStore;
use couponbot_core::services::redemption::RedemptionEngine;
use couponbot_core::services::{CommandService, Registry};
use couponbot_core::BotConfig;

use crate::Args;

pub struct ServerContext {
    pub config: Arc<BotConfig>,
    pub registry: Arc<Registry>,
    pub discord: DiscordPlatform,
    pub command_service: Arc<CommandService>,
}

impl ServerContext {
    pub async fn new(args: &Args) -> anyhow::Result<Self> {
        let config = args.to_config();
        config.validate().context("invalid configuration")?;
        let config = Arc::new(config);

        let store = Arc::new(JsonFileStore::new(config.players_file.clone()));
        let registry = Registry::load(store, config.owner_policy)
            .await
            .with_context(|| format!("could not load {}", config.players_file.display()))?;
        let registry = Arc::new(registry);

        let client = CouponApiClient::from_config(&config).context("could not build coupon client")?;
        let engine = Arc::new(RedemptionEngine::new(Arc::new(client), config.request_delay));

        let mut discord = DiscordPlatform::new(config.discord_token.clone());
        discord.connect().await.context("could not connect to Discord")?;
        let sink: Arc<dyn ChatSink> = Arc::new(discord.sink()?);
        info!("Connected to Discord.");

        let command_service = Arc::new(CommandService::new(
            config.clone(),
            registry.clone(),
            engine,
            sink,
        ));

        Ok(Self {
            config,
            registry,
            discord,
            command_service,
        })
    }
}
