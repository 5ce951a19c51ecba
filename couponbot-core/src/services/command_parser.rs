// File: couponbot-core/src/services/command_parser.rs
//
// Turns raw chat text into one of the bot's fixed intents. Anything that is
// not one of our commands yields `None` and is ignored by the dispatcher.

use thiserror::Error;

use crate::services::registry::RemovalTarget;

pub const COMMAND_PREFIX: char = '!';

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    AddAccount { account_id: String, display_name: String },
    RemoveAccount(RemovalTarget),
    ListAccounts,
    ShowOwn,
    /// Code is trimmed and upper-cased.
    Redeem { code: String },
    Help,
}

/// A recognised command that was missing its arguments. The display text is
/// the usage hint shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum UsageError {
    #[error("❌ Please provide a coupon code. Usage: `!redeem COUPONCODE`")]
    Redeem,

    #[error("❌ Usage: `!addplayer <PID> <AccountName>`\nExample: `!addplayer ABC123 MyAccount`")]
    AddAccount,

    #[error("❌ Usage: `!removeplayer <PID or @mention>`\nExample: `!removeplayer ABC123` or `!removeplayer @user`")]
    RemoveAccount,
}

pub fn parse_command(content: &str) -> Option<Result<Intent, UsageError>> {
    let content = content.trim();
    if !content.starts_with(COMMAND_PREFIX) {
        return None;
    }

    let (command, rest) = match content.split_once(char::is_whitespace) {
        Some((cmd, rest)) => (cmd, rest.trim()),
        None => (content, ""),
    };

    let parsed = match command {
        "!help" | "!commands" => Ok(Intent::Help),
        "!players" | "!list" => Ok(Intent::ListAccounts),
        "!mypid" | "!myplayer" => Ok(Intent::ShowOwn),
        "!redeem" => parse_redeem(rest),
        "!addplayer" => parse_add(rest),
        "!removeplayer" => parse_remove(rest),
        _ => return None,
    };
    Some(parsed)
}

fn parse_redeem(rest: &str) -> Result<Intent, UsageError> {
    if rest.is_empty() {
        return Err(UsageError::Redeem);
    }
    Ok(Intent::Redeem {
        code: rest.to_uppercase(),
    })
}

fn parse_add(rest: &str) -> Result<Intent, UsageError> {
    let (pid, name) = rest
        .split_once(char::is_whitespace)
        .ok_or(UsageError::AddAccount)?;
    let name = name.trim();
    if pid.is_empty() || name.is_empty() {
        return Err(UsageError::AddAccount);
    }
    Ok(Intent::AddAccount {
        account_id: pid.to_string(),
        display_name: name.to_string(),
    })
}

fn parse_remove(rest: &str) -> Result<Intent, UsageError> {
    if rest.is_empty() {
        return Err(UsageError::RemoveAccount);
    }
    let target = match parse_user_mention(rest) {
        Some(user_id) => RemovalTarget::Owner(user_id),
        None => RemovalTarget::AccountId(rest.to_string()),
    };
    Ok(Intent::RemoveAccount(target))
}

/// `<@123>` or the legacy nickname form `<@!123>`.
fn parse_user_mention(s: &str) -> Option<String> {
    let inner = s.strip_prefix("<@")?.strip_suffix('>')?;
    let inner = inner.strip_prefix('!').unwrap_or(inner);
    if !inner.is_empty() && inner.bytes().all(|b| b.is_ascii_digit()) {
        Some(inner.to_string())
    } else {
        None
    }
}
