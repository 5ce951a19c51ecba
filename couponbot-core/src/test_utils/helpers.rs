// File: couponbot-core/src/test_utils/helpers.rs

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use twilight_model::channel::message::Embed;

use couponbot_common::models::{AccountRegistration, IncomingMessage};
use couponbot_common::traits::api::ChatSink;

use crate::utils::time::{Clock, Pacer};
use crate::Error;

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    // A panicking test thread poisons the lock; the data is still usable for assertions.
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One call made against a [`RecordingSink`].
#[derive(Debug, Clone)]
pub enum SentMessage {
    Text { channel_id: String, text: String },
    Reply { channel_id: String, reply_to: String, text: String, message_id: String },
    Embeds { channel_id: String, reply_to: Option<String>, embeds: Vec<Embed> },
    Deleted { channel_id: String, message_id: String },
}

/// In-memory [`ChatSink`] that records everything it is asked to send.
#[derive(Debug, Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<SentMessage>>,
    next_id: Mutex<u64>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        lock(&self.sent).clone()
    }

    /// All plain-text and reply bodies, in send order.
    pub fn texts(&self) -> Vec<String> {
        lock(&self.sent)
            .iter()
            .filter_map(|m| match m {
                SentMessage::Text { text, .. } | SentMessage::Reply { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// All embeds, flattened, in send order.
    pub fn embeds(&self) -> Vec<Embed> {
        lock(&self.sent)
            .iter()
            .filter_map(|m| match m {
                SentMessage::Embeds { embeds, .. } => Some(embeds.clone()),
                _ => None,
            })
            .flatten()
            .collect()
    }

    pub fn deleted(&self) -> Vec<String> {
        lock(&self.sent)
            .iter()
            .filter_map(|m| match m {
                SentMessage::Deleted { message_id, .. } => Some(message_id.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ChatSink for RecordingSink {
    async fn send_text(&self, channel_id: &str, text: &str) -> Result<(), Error> {
        lock(&self.sent).push(SentMessage::Text {
            channel_id: channel_id.to_string(),
            text: text.to_string(),
        });
        Ok(())
    }

    async fn reply_text(&self, channel_id: &str, reply_to: &str, text: &str) -> Result<String, Error> {
        let message_id = {
            let mut next = lock(&self.next_id);
            *next += 1;
            format!("sent-{}", *next)
        };
        lock(&self.sent).push(SentMessage::Reply {
            channel_id: channel_id.to_string(),
            reply_to: reply_to.to_string(),
            text: text.to_string(),
            message_id: message_id.clone(),
        });
        Ok(message_id)
    }

    async fn send_embeds(
        &self,
        channel_id: &str,
        reply_to: Option<&str>,
        embeds: Vec<Embed>,
    ) -> Result<(), Error> {
        lock(&self.sent).push(SentMessage::Embeds {
            channel_id: channel_id.to_string(),
            reply_to: reply_to.map(str::to_string),
            embeds,
        });
        Ok(())
    }

    async fn delete_message(&self, channel_id: &str, message_id: &str) -> Result<(), Error> {
        lock(&self.sent).push(SentMessage::Deleted {
            channel_id: channel_id.to_string(),
            message_id: message_id.to_string(),
        });
        Ok(())
    }
}

/// Clock frozen at a given instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Pacer that returns immediately and writes `pause:<ms>` into a shared
/// journal, so tests can check how pauses interleave with other calls.
#[derive(Debug, Clone, Default)]
pub struct RecordingPacer {
    journal: Arc<Mutex<Vec<String>>>,
}

impl RecordingPacer {
    pub fn new(journal: Arc<Mutex<Vec<String>>>) -> Self {
        Self { journal }
    }

    pub fn pauses(&self) -> usize {
        lock(&self.journal).iter().filter(|e| e.starts_with("pause:")).count()
    }
}

#[async_trait]
impl Pacer for RecordingPacer {
    async fn pause(&self, delay: Duration) {
        lock(&self.journal).push(format!("pause:{}", delay.as_millis()));
    }
}

pub fn journal_entries(journal: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    lock(journal).clone()
}

pub fn push_journal(journal: &Arc<Mutex<Vec<String>>>, entry: impl Into<String>) {
    lock(journal).push(entry.into());
}

pub fn registration(pid: &str, name: &str, owner: &str) -> AccountRegistration {
    AccountRegistration {
        external_account_id: pid.to_string(),
        display_name: name.to_string(),
        owner_id: owner.to_string(),
        registered_at: Utc::now(),
    }
}

/// A guild message from a regular member in channel `500`.
pub fn guild_message(author_id: &str, content: &str) -> IncomingMessage {
    IncomingMessage {
        guild_id: Some("100".to_string()),
        channel_id: "500".to_string(),
        message_id: "900".to_string(),
        author_id: author_id.to_string(),
        author_name: format!("user{author_id}"),
        author_is_bot: false,
        author_is_admin: false,
        content: content.to_string(),
    }
}
