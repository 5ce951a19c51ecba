// File: couponbot-common/src/traits/api.rs

use async_trait::async_trait;
use twilight_model::channel::message::Embed;

use crate::error::Error;
use crate::models::RewardResponse;

/// One redemption attempt against the game's coupon endpoint.
///
/// `Ok` covers every response the endpoint actually produced, including
/// "already redeemed" style rejections (`succeeded == false`). `Err` is
/// reserved for transport failures: no connection, timeouts, or a body that
/// could not be decoded.
#[async_trait]
pub trait RewardClient: Send + Sync {
    async fn redeem(&self, account_id: &str, code: &str) -> Result<RewardResponse, Error>;
}

/// Outbound side of the chat platform, as used by the command dispatcher.
/// Channel and message ids are the platform's ids rendered as strings.
#[async_trait]
pub trait ChatSink: Send + Sync {
    async fn send_text(&self, channel_id: &str, text: &str) -> Result<(), Error>;

    /// Replies to `reply_to` and returns the id of the message that was created.
    async fn reply_text(&self, channel_id: &str, reply_to: &str, text: &str) -> Result<String, Error>;

    /// Sends embeds to the channel, as a reply when `reply_to` is set.
    async fn send_embeds(
        &self,
        channel_id: &str,
        reply_to: Option<&str>,
        embeds: Vec<Embed>,
    ) -> Result<(), Error>;

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), Error>;
}
