// File: couponbot-core/src/config.rs

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use couponbot_common::models::DEFAULT_SCOPE;

use crate::Error;

pub const DEFAULT_REQUEST_DELAY_MS: u64 = 2000;
pub const DEFAULT_GAME_CODE: &str = "tskgb";
pub const DEFAULT_API_BASE: &str = "https://coupon.netmarble.com";
pub const DEFAULT_PLAYERS_FILE: &str = "players.json";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Whether a chat user may register more than one game account per scope.
/// The PID itself is always unique per scope regardless of this setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OwnerPolicy {
    /// One registration per owner.
    Single,
    /// Owners may register several accounts.
    #[default]
    Multiple,
}

impl fmt::Display for OwnerPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OwnerPolicy::Single => write!(f, "single"),
            OwnerPolicy::Multiple => write!(f, "multiple"),
        }
    }
}

impl FromStr for OwnerPolicy {
    type Err = Error;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "single" | "one" => Ok(OwnerPolicy::Single),
            "multiple" | "many" => Ok(OwnerPolicy::Multiple),
            other => Err(Error::Config(format!(
                "unknown owner policy '{other}' (expected 'single' or 'multiple')"
            ))),
        }
    }
}

/// Runtime configuration, assembled once at startup and never changed afterwards.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub discord_token: String,

    /// When set, commands are only accepted in this channel.
    pub command_channel_id: Option<String>,

    /// Pause before every reward request in a batch.
    pub request_delay: Duration,

    /// Game identifier sent to the coupon endpoint.
    pub game_code: String,

    pub players_file: PathBuf,
    pub api_base: String,
    pub request_timeout: Duration,
    pub owner_policy: OwnerPolicy,

    /// Share one registration list across every guild instead of one list per guild.
    pub single_scope: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            discord_token: String::new(),
            command_channel_id: None,
            request_delay: Duration::from_millis(DEFAULT_REQUEST_DELAY_MS),
            game_code: DEFAULT_GAME_CODE.to_string(),
            players_file: PathBuf::from(DEFAULT_PLAYERS_FILE),
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            owner_policy: OwnerPolicy::default(),
            single_scope: false,
        }
    }
}

impl BotConfig {
    /// Maps a guild id onto the registration scope it reads and writes.
    pub fn scope_for(&self, guild_id: &str) -> String {
        if self.single_scope {
            DEFAULT_SCOPE.to_string()
        } else {
            guild_id.to_string()
        }
    }

    /// Rejects settings the bot cannot start with.
    pub fn validate(&self) -> Result<(), Error> {
        if self.discord_token.trim().is_empty() {
            return Err(Error::Config("Discord bot token is empty".into()));
        }
        if self.request_delay.is_zero() {
            return Err(Error::Config("request delay must be a positive number of milliseconds".into()));
        }
        if self.game_code.trim().is_empty() {
            return Err(Error::Config("game code is empty".into()));
        }
        Ok(())
    }
}
