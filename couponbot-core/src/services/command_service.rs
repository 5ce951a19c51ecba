use std::sync::Arc;

use tracing::{debug, error, info, warn};

use couponbot_common::models::{AccountRegistration, IncomingMessage};
use couponbot_common::traits::api::ChatSink;

use crate::config::BotConfig;
use crate::services::command_parser::{parse_command, Intent};
use crate::services::redemption::{AccountBatch, RedemptionEngine};
use crate::services::registry::{RegistryError, Registry, RemovalTarget};
use crate::services::reporter;
use crate::utils::time::{Clock, SystemClock};
use crate::Error;

/// Routes chat commands to the registry or the redemption engine and posts
/// the rendered results back to the channel.
pub struct CommandService {
    registry: Arc<Registry>,
    engine: Arc<RedemptionEngine>,
    sink: Arc<dyn ChatSink>,
    clock: Arc<dyn Clock>,
    config: Arc<BotConfig>,
}

impl CommandService {
    pub fn new(
        config: Arc<BotConfig>,
        registry: Arc<Registry>,
        engine: Arc<RedemptionEngine>,
        sink: Arc<dyn ChatSink>,
    ) -> Self {
        debug!("Initializing CommandService");
        Self {
            registry,
            engine,
            sink,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Handles one inbound message. Returns `Ok(false)` when the message was
    /// not for us (wrong channel, a DM, a bot, or not a command).
    pub async fn handle_message(&self, msg: &IncomingMessage) -> Result<bool, Error> {
        if msg.author_is_bot {
            return Ok(false);
        }
        if let Some(channel) = &self.config.command_channel_id {
            if &msg.channel_id != channel {
                return Ok(false);
            }
        }
        let Some(guild_id) = msg.guild_id.as_deref() else {
            return Ok(false);
        };

        let intent = match parse_command(&msg.content) {
            None => return Ok(false),
            Some(Err(usage)) => {
                self.reply(msg, &usage.to_string()).await?;
                return Ok(true);
            }
            Some(Ok(intent)) => intent,
        };

        let scope = self.config.scope_for(guild_id);
        debug!("{} in scope {scope} => {:?}", msg.author_name, intent);

        match intent {
            Intent::Help => self.send_help(msg, &scope).await?,
            Intent::ListAccounts => self.list_accounts(msg, &scope).await?,
            Intent::ShowOwn => self.show_own(msg, &scope).await?,
            Intent::AddAccount { account_id, display_name } => {
                self.add_account(msg, &scope, account_id, display_name).await?
            }
            Intent::RemoveAccount(target) => self.remove_account(msg, &scope, &target).await?,
            Intent::Redeem { code } => self.redeem_for_all(msg, &scope, &code).await?,
        }
        Ok(true)
    }

    async fn reply(&self, msg: &IncomingMessage, text: &str) -> Result<String, Error> {
        self.sink.reply_text(&msg.channel_id, &msg.message_id, text).await
    }

    async fn send_help(&self, msg: &IncomingMessage, scope: &str) -> Result<(), Error> {
        let total = self.registry.accounts(scope).await.len();
        self.sink
            .send_embeds(&msg.channel_id, None, vec![reporter::help_embed(total, self.clock.now())])
            .await
    }

    async fn list_accounts(&self, msg: &IncomingMessage, scope: &str) -> Result<(), Error> {
        let accounts = self.registry.accounts(scope).await;
        if accounts.is_empty() {
            return self.sink.send_text(&msg.channel_id, reporter::NO_PLAYERS_TO_LIST).await;
        }
        for embed in reporter::accounts_list(&accounts, self.clock.now()) {
            self.sink.send_embeds(&msg.channel_id, None, vec![embed]).await?;
        }
        Ok(())
    }

    async fn show_own(&self, msg: &IncomingMessage, scope: &str) -> Result<(), Error> {
        let mine = self.registry.owned_by(scope, &msg.author_id).await;
        if mine.is_empty() {
            self.reply(msg, reporter::NO_OWN_PLAYERS).await?;
            return Ok(());
        }
        for embed in reporter::own_accounts(&mine, self.clock.now()) {
            self.sink
                .send_embeds(&msg.channel_id, Some(&msg.message_id), vec![embed])
                .await?;
        }
        Ok(())
    }

    async fn add_account(
        &self,
        msg: &IncomingMessage,
        scope: &str,
        account_id: String,
        display_name: String,
    ) -> Result<(), Error> {
        let registration = AccountRegistration {
            external_account_id: account_id,
            display_name,
            owner_id: msg.author_id.clone(),
            registered_at: self.clock.now(),
        };

        match self.registry.register(scope, registration).await {
            Ok(change) => {
                info!(
                    "Added player: {} ({}) for user {} in scope {scope}",
                    change.registration.display_name,
                    change.registration.external_account_id,
                    msg.author_name
                );
                let embed = reporter::added_embed(&change.registration, change.scope_total, self.clock.now());
                self.sink
                    .send_embeds(&msg.channel_id, Some(&msg.message_id), vec![embed])
                    .await
            }
            Err(RegistryError::DuplicateAccount(_)) => {
                self.reply(msg, reporter::DUPLICATE_ACCOUNT).await.map(|_| ())
            }
            Err(RegistryError::OwnerAlreadyRegistered(_)) => {
                self.reply(msg, reporter::OWNER_LIMIT_REACHED).await.map(|_| ())
            }
            Err(RegistryError::Persist(e)) => {
                error!("Error saving players: {e}");
                self.reply(msg, reporter::ADD_SAVE_FAILED).await.map(|_| ())
            }
            Err(e @ (RegistryError::NotFound | RegistryError::NotOwner)) => {
                warn!("Unexpected registry error while adding: {e}");
                self.reply(msg, reporter::ADD_SAVE_FAILED).await.map(|_| ())
            }
        }
    }

    async fn remove_account(
        &self,
        msg: &IncomingMessage,
        scope: &str,
        target: &RemovalTarget,
    ) -> Result<(), Error> {
        let result = self
            .registry
            .remove(scope, target, &msg.author_id, msg.author_is_admin)
            .await;

        let text = match result {
            Ok(change) => {
                info!(
                    "Removed player: {} ({}) from scope {scope}",
                    change.registration.display_name, change.registration.external_account_id
                );
                let embed = reporter::removed_embed(&change.registration, change.scope_total, self.clock.now());
                return self
                    .sink
                    .send_embeds(&msg.channel_id, Some(&msg.message_id), vec![embed])
                    .await;
            }
            Err(RegistryError::NotOwner) => reporter::NOT_OWNER,
            Err(RegistryError::NotFound) => reporter::PLAYER_NOT_FOUND,
            Err(RegistryError::Persist(e)) => {
                error!("Error saving players: {e}");
                reporter::REMOVE_SAVE_FAILED
            }
            Err(e @ (RegistryError::DuplicateAccount(_) | RegistryError::OwnerAlreadyRegistered(_))) => {
                warn!("Unexpected registry error while removing: {e}");
                reporter::REMOVE_SAVE_FAILED
            }
        };
        self.reply(msg, text).await.map(|_| ())
    }

    async fn redeem_for_all(&self, msg: &IncomingMessage, scope: &str, code: &str) -> Result<(), Error> {
        let Some(batch) = AccountBatch::new(self.registry.accounts(scope).await) else {
            self.reply(msg, reporter::NO_PLAYERS_TO_REDEEM).await?;
            return Ok(());
        };

        info!("Redeeming coupon {code} for {} player(s) in scope {scope}...", batch.len());

        // The status line is cosmetic; a failure to post it must not stop the batch.
        let status_id = match self.reply(msg, &reporter::redeeming_status(code, batch.len())).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("Could not post redemption status message: {e}");
                None
            }
        };

        let result = self.engine.redeem_all(&batch, code).await;

        let embeds = reporter::batch_report(&result, &msg.author_name);
        let mut send_result = Ok(());
        for embed in embeds {
            if let Err(e) = self.sink.send_embeds(&msg.channel_id, None, vec![embed]).await {
                send_result = Err(e);
                break;
            }
        }

        if let Some(id) = status_id {
            if let Err(e) = self.sink.delete_message(&msg.channel_id, &id).await {
                debug!("Could not delete status message {id}: {e}");
            }
        }
        send_result
    }
}
