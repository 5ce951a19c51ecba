// File: couponbot-common/src/models/chat.rs

/// A chat message as seen by the command dispatcher, detached from the
/// gateway types it was built from. Ids are kept as strings the same way the
/// records file stores them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Guild the message was posted in; `None` for direct messages.
    pub guild_id: Option<String>,
    pub channel_id: String,
    pub message_id: String,
    pub author_id: String,
    pub author_name: String,
    pub author_is_bot: bool,
    /// Whether the author holds the Administrator permission in the guild.
    pub author_is_admin: bool,
    pub content: String,
}
