use std::sync::Arc;

use async_trait::async_trait;
use tracing::trace;
use twilight_http::Client as HttpClient;
use twilight_model::channel::message::Embed;
use twilight_model::id::Id;

use couponbot_common::traits::api::ChatSink;

use crate::Error;

/// [`ChatSink`] backed by the Discord REST API.
#[derive(Clone)]
pub struct DiscordSink {
    http: Arc<HttpClient>,
}

impl DiscordSink {
    pub fn new(http: Arc<HttpClient>) -> Self {
        Self { http }
    }
}

/// Parses a snowflake rendered as a string. Zero is not a valid id.
pub(crate) fn parse_id<T>(raw: &str, what: &str) -> Result<Id<T>, Error> {
    raw.trim()
        .parse::<u64>()
        .ok()
        .and_then(Id::new_checked)
        .ok_or_else(|| Error::Platform(format!("Invalid {what} ID: {raw}")))
}

#[async_trait]
impl ChatSink for DiscordSink {
    async fn send_text(&self, channel_id: &str, text: &str) -> Result<(), Error> {
        let channel = parse_id(channel_id, "channel")?;
        self.http
            .create_message(channel)
            .content(text)
            .await
            .map_err(|e| Error::Platform(format!("Error sending Discord message: {e:?}")))?;
        Ok(())
    }

    async fn reply_text(&self, channel_id: &str, reply_to: &str, text: &str) -> Result<String, Error> {
        let channel = parse_id(channel_id, "channel")?;
        let reply = parse_id(reply_to, "message")?;
        let message = self
            .http
            .create_message(channel)
            .content(text)
            .reply(reply)
            .await
            .map_err(|e| Error::Platform(format!("Error sending Discord reply: {e:?}")))?
            .model()
            .await
            .map_err(|e| Error::Platform(format!("Error decoding Discord reply: {e:?}")))?;
        trace!("reply {} created in channel {}", message.id, channel_id);
        Ok(message.id.to_string())
    }

    async fn send_embeds(
        &self,
        channel_id: &str,
        reply_to: Option<&str>,
        embeds: Vec<Embed>,
    ) -> Result<(), Error> {
        let channel = parse_id(channel_id, "channel")?;
        let mut request = self.http.create_message(channel).embeds(&embeds);
        if let Some(reply_to) = reply_to {
            request = request.reply(parse_id(reply_to, "message")?);
        }
        request
            .await
            .map_err(|e| Error::Platform(format!("Error sending Discord embeds: {e:?}")))?;
        Ok(())
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), Error> {
        let channel = parse_id(channel_id, "channel")?;
        let message = parse_id(message_id, "message")?;
        self.http
            .delete_message(channel, message)
            .await
            .map_err(|e| Error::Platform(format!("Error deleting Discord message: {e:?}")))?;
        Ok(())
    }
}
