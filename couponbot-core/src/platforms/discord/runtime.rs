use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, trace, warn};

use twilight_cache_inmemory::{InMemoryCache, ResourceType};
use twilight_gateway::{
    self as gateway,
    CloseFrame,
    Config,
    Event,
    EventTypeFlags,
    Intents,
    MessageSender,
    Shard,
    StreamExt,
};
use twilight_http::client::ClientBuilder;
use twilight_http::Client as HttpClient;
use twilight_model::gateway::payload::incoming::{MessageCreate, Ready as ReadyPayload};
use twilight_model::guild::Permissions;

use couponbot_common::models::IncomingMessage;

use crate::platforms::discord::sink::DiscordSink;
use crate::platforms::{ConnectionStatus, PlatformAuth, PlatformIntegration};
use crate::Error;

/// Whether `msg`'s author holds Administrator in the guild it was posted in.
/// Guild owners resolve to all permissions. Anything missing from the cache
/// counts as "not an admin".
fn author_is_admin(cache: &InMemoryCache, msg: &MessageCreate) -> bool {
    let Some(guild_id) = msg.guild_id else {
        return false;
    };
    match cache.permissions().root(msg.author.id, guild_id) {
        Ok(perms) => perms.contains(Permissions::ADMINISTRATOR),
        Err(e) => {
            debug!("Could not resolve permissions for {} in {guild_id}: {e}", msg.author.id);
            false
        }
    }
}

fn to_incoming(cache: &InMemoryCache, msg: &MessageCreate) -> IncomingMessage {
    IncomingMessage {
        guild_id: msg.guild_id.map(|g| g.to_string()),
        channel_id: msg.channel_id.to_string(),
        message_id: msg.id.to_string(),
        author_id: msg.author.id.to_string(),
        author_name: msg.author.name.clone(),
        author_is_bot: msg.author.bot,
        author_is_admin: author_is_admin(cache, msg),
        content: msg.content.clone(),
    }
}

/// Pulls events off one shard:
///   - updates the in-memory cache (guilds, roles, members)
///   - forwards human-authored messages to `tx`.
async fn shard_runner(
    mut shard: Shard,
    tx: UnboundedSender<IncomingMessage>,
    cache: Arc<InMemoryCache>,
) {
    let shard_id = shard.id().number();
    info!("(ShardRunner) Shard {shard_id} started. Listening for events.");

    while let Some(item) = shard.next_event(EventTypeFlags::all()).await {
        match item {
            Ok(event) => {
                cache.update(&event);

                match &event {
                    Event::Ready(ready) => {
                        let data: &ReadyPayload = ready;
                        info!(
                            "Shard {shard_id} => READY as {} (ID={}), {} guild(s)",
                            data.user.name,
                            data.user.id,
                            data.guilds.len()
                        );
                    }
                    Event::MessageCreate(msg_create) => {
                        let msg: &MessageCreate = msg_create;
                        if msg.author.bot {
                            trace!("Ignoring bot message from {}", msg.author.name);
                            continue;
                        }
                        if tx.send(to_incoming(&cache, msg)).is_err() {
                            warn!("Shard {shard_id} => message receiver dropped");
                            break;
                        }
                    }
                    _ => {
                        trace!("Shard {shard_id} => unhandled event: {:?}", event.kind());
                    }
                }
            }
            Err(err) => {
                error!("Shard {shard_id} => error receiving event: {err:?}");
            }
        }
    }

    warn!("(ShardRunner) Shard {shard_id} event loop ended.");
}

pub struct DiscordPlatform {
    pub token: String,
    pub connection_status: ConnectionStatus,

    /// Filled in by `connect()`; `None` while disconnected.
    pub rx: Mutex<Option<UnboundedReceiver<IncomingMessage>>>,

    pub shard_tasks: Vec<JoinHandle<()>>,
    pub shard_senders: Vec<MessageSender>,

    pub http: Option<Arc<HttpClient>>,
    pub cache: Option<Arc<InMemoryCache>>,
}

impl DiscordPlatform {
    pub fn new(token: String) -> Self {
        Self {
            token,
            connection_status: ConnectionStatus::Disconnected,
            rx: Mutex::new(None),
            shard_tasks: Vec::new(),
            shard_senders: Vec::new(),
            http: None,
            cache: None,
        }
    }

    /// Waits for the next inbound message. Returns `None` once every shard
    /// has stopped, or when not connected.
    pub async fn next_message_event(&self) -> Option<IncomingMessage> {
        let mut guard = self.rx.lock().await;
        match guard.as_mut() {
            Some(r) => r.recv().await,
            None => None,
        }
    }

    /// Outbound handle for the command dispatcher. Only available after `connect()`.
    pub fn sink(&self) -> Result<DiscordSink, Error> {
        self.http
            .clone()
            .map(DiscordSink::new)
            .ok_or_else(|| Error::Platform("Discord platform is not connected".into()))
    }
}

#[async_trait]
impl PlatformAuth for DiscordPlatform {
    async fn authenticate(&mut self) -> Result<(), Error> {
        if self.token.trim().is_empty() {
            return Err(Error::Auth("Discord token is empty".into()));
        }
        Ok(())
    }

    async fn is_authenticated(&self) -> Result<bool, Error> {
        Ok(!self.token.trim().is_empty())
    }
}

#[async_trait]
impl PlatformIntegration for DiscordPlatform {
    async fn connect(&mut self) -> Result<(), Error> {
        if matches!(self.connection_status, ConnectionStatus::Connected) {
            info!("(DiscordPlatform) Already connected => skipping");
            return Ok(());
        }
        self.authenticate().await?;

        let (tx, rx) = unbounded_channel::<IncomingMessage>();
        {
            let mut guard = self.rx.lock().await;
            *guard = Some(rx);
        }

        let http_client = Arc::new(
            ClientBuilder::new()
                .token(self.token.clone())
                .timeout(Duration::from_secs(30))
                .build(),
        );
        self.http = Some(http_client.clone());

        // Roles + members are what the permission calculator needs.
        let cache: InMemoryCache = InMemoryCache::builder()
            .resource_types(
                ResourceType::GUILD
                    | ResourceType::CHANNEL
                    | ResourceType::ROLE
                    | ResourceType::MEMBER,
            )
            .build();
        let cache = Arc::new(cache);
        self.cache = Some(cache.clone());

        let config = Config::new(
            self.token.clone(),
            Intents::GUILDS | Intents::GUILD_MESSAGES | Intents::MESSAGE_CONTENT,
        );

        // An invalid token surfaces here, since this is the first authenticated call.
        let shards = gateway::create_recommended(&http_client, config, |_, b| b.build())
            .await
            .map_err(|e| {
                self.connection_status = ConnectionStatus::Error(e.to_string());
                Error::Auth(format!("create_recommended error: {e}"))
            })?;

        for shard in shards {
            self.shard_senders.push(shard.sender());

            let tx_for_shard = tx.clone();
            let cache_for_shard = cache.clone();
            let handle = tokio::spawn(async move {
                shard_runner(shard, tx_for_shard, cache_for_shard).await;
            });
            self.shard_tasks.push(handle);
        }

        self.connection_status = ConnectionStatus::Connected;
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<(), Error> {
        self.connection_status = ConnectionStatus::Disconnected;

        for sender in &self.shard_senders {
            let _ = sender.close(CloseFrame::NORMAL);
        }
        for task in &mut self.shard_tasks {
            let _ = task.await;
        }

        self.shard_senders.clear();
        self.shard_tasks.clear();

        {
            let mut guard = self.rx.lock().await;
            *guard = None;
        }

        Ok(())
    }

    async fn get_connection_status(&self) -> Result<ConnectionStatus, Error> {
        Ok(self.connection_status.clone())
    }
}
