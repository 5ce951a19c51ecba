// File: couponbot-core/src/services/reporter.rs
//
// Everything the bot says in chat. Embeds are built with twilight-util and
// kept inside Discord's size limits.

use chrono::{DateTime, Utc};
use twilight_model::channel::message::Embed;
use twilight_model::util::Timestamp;
use twilight_util::builder::embed::{EmbedBuilder, EmbedFieldBuilder, EmbedFooterBuilder};

use couponbot_common::models::{AccountRegistration, RedemptionOutcome};

use crate::services::redemption::{BatchResult, Severity};

pub const COLOR_SUCCESS: u32 = 0x00ff00;
pub const COLOR_PARTIAL: u32 = 0xffa500;
pub const COLOR_FAILURE: u32 = 0xff0000;
pub const COLOR_INFO: u32 = 0x0099ff;

/// Discord embed limits.
pub const MAX_TITLE_LEN: usize = 256;
pub const MAX_FIELDS_PER_EMBED: usize = 25;
pub const MAX_FIELD_NAME_LEN: usize = 256;
pub const MAX_FIELD_VALUE_LEN: usize = 1024;
pub const MAX_DESCRIPTION_LEN: usize = 4096;
/// Combined length of title, description, footer, field names and values.
pub const MAX_EMBED_TOTAL_LEN: usize = 6000;

pub const NO_PLAYERS_TO_REDEEM: &str =
    "❌ No players registered in this server! Use `!addplayer <PID> <AccountName>` to add a player.";
pub const NO_PLAYERS_TO_LIST: &str =
    "❌ No players registered in this server yet! Use `!addplayer <PID> <AccountName>` to add one.";
pub const NO_OWN_PLAYERS: &str = "❌ You don't have any players registered in this server!\nUse `!addplayer <PID> <AccountName>` to add one.";
pub const DUPLICATE_ACCOUNT: &str = "❌ This PID is already registered in this server!";
pub const OWNER_LIMIT_REACHED: &str =
    "❌ You already have a player registered in this server! Remove it first with `!removeplayer <PID>`.";
pub const NOT_OWNER: &str = "❌ You can only remove your own player!";
pub const PLAYER_NOT_FOUND: &str = "❌ Player not found in this server!";
pub const ADD_SAVE_FAILED: &str = "❌ Failed to save player data. Please try again.";
pub const REMOVE_SAVE_FAILED: &str = "❌ Failed to save changes. Please try again.";

pub fn severity_color(severity: Severity) -> u32 {
    match severity {
        Severity::AllSuccess => COLOR_SUCCESS,
        Severity::PartialSuccess => COLOR_PARTIAL,
        Severity::AllFailure => COLOR_FAILURE,
    }
}

pub fn redeeming_status(code: &str, players: usize) -> String {
    format!("🔄 Redeeming coupon **{code}** for {players} player(s)...")
}

fn timestamp(at: DateTime<Utc>) -> Option<Timestamp> {
    Timestamp::from_secs(at.timestamp()).ok()
}

fn with_timestamp(builder: EmbedBuilder, at: DateTime<Utc>) -> EmbedBuilder {
    match timestamp(at) {
        Some(ts) => builder.timestamp(ts),
        None => builder,
    }
}

/// Cuts `s` to at most `max` characters, marking the cut with an ellipsis.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn outcome_field(outcome: &RedemptionOutcome) -> (String, String) {
    let emoji = if outcome.succeeded { "✅" } else { "❌" };
    let mut value = format!("{emoji} {}", outcome.message);

    if let Some(items) = outcome.reward_items.as_ref().filter(|i| !i.is_empty()) {
        let rewards = items
            .iter()
            .map(|r| format!("{} x{}", r.item_name, r.item_count))
            .collect::<Vec<_>>()
            .join(", ");
        value.push_str(&format!("\n*{rewards}*"));
    }

    (
        truncate(&format!("{} <@{}>", outcome.account_label, outcome.owner_id), MAX_FIELD_NAME_LEN),
        truncate(&value, MAX_FIELD_VALUE_LEN),
    )
}

struct ReportPage {
    title: String,
    description: Option<String>,
    fields: Vec<(String, String)>,
    len: usize,
}

impl ReportPage {
    fn new(title: String, description: Option<String>) -> Self {
        let len = char_len(&title) + description.as_deref().map_or(0, char_len);
        Self { title, description, fields: Vec::new(), len }
    }

    fn fits(&self, field_len: usize) -> bool {
        self.fields.len() < MAX_FIELDS_PER_EMBED && self.len + field_len <= MAX_EMBED_TOTAL_LEN
    }

    fn push(&mut self, field: (String, String), field_len: usize) {
        self.len += field_len;
        self.fields.push(field);
    }
}

/// The batch report: one field per account, split across several embeds
/// whenever the next field would break Discord's per-embed limits.
pub fn batch_report(result: &BatchResult, requested_by: &str) -> Vec<Embed> {
    let color = severity_color(result.severity());
    let summary = format!(
        "✨ Redeemed {}/{} successfully\nRequested by: {}",
        result.success_count(),
        result.total_count(),
        requested_by
    );
    let title = truncate(&format!("🎟️ Coupon: {}", result.code), MAX_TITLE_LEN);
    let continued = truncate(&format!("🎟️ Coupon: {} (continued)", result.code), MAX_TITLE_LEN);

    let mut pages = vec![ReportPage::new(title, Some(truncate(&summary, MAX_DESCRIPTION_LEN)))];
    for outcome in &result.outcomes {
        let field = outcome_field(outcome);
        let field_len = char_len(&field.0) + char_len(&field.1);
        let needs_new_page = pages.last().is_some_and(|page| !page.fits(field_len));
        if needs_new_page {
            pages.push(ReportPage::new(continued.clone(), None));
        }
        if let Some(page) = pages.last_mut() {
            page.push(field, field_len);
        }
    }

    pages
        .into_iter()
        .map(|page| {
            let mut builder = EmbedBuilder::new().title(page.title).color(color);
            if let Some(description) = page.description {
                builder = builder.description(description);
            }
            for (name, value) in page.fields {
                builder = builder.field(EmbedFieldBuilder::new(name, value));
            }
            with_timestamp(builder, result.finished_at).build()
        })
        .collect()
}

pub fn help_embed(scope_total: usize, now: DateTime<Utc>) -> Embed {
    let builder = EmbedBuilder::new()
        .title("🎮 Coupon Redeemer Bot - Commands")
        .description("Use these commands to manage players and redeem coupons:")
        .color(COLOR_INFO)
        .field(EmbedFieldBuilder::new(
            "📝 Player Management",
            "`!addplayer <PID> <Name>` - Add a player\n\
             `!removeplayer <PID or @mention>` - Remove a player\n\
             `!mypid` - Show your players\n\
             `!players` - List all players in server",
        ))
        .field(EmbedFieldBuilder::new(
            "🎟️ Coupon Commands",
            "`!redeem <CODE>` - Redeem coupon for all players\nExample: `!redeem FREEGEMS2024`",
        ))
        .field(EmbedFieldBuilder::new("❓ Other", "`!help` - Show this message"))
        .footer(EmbedFooterBuilder::new(format!(
            "Currently {scope_total} player(s) registered in this server"
        )));
    with_timestamp(builder, now).build()
}

/// Splits rendered entries into descriptions that fit one embed each.
fn paginate(entries: Vec<String>) -> Vec<String> {
    let mut pages = Vec::new();
    let mut current = String::new();
    for entry in entries {
        let entry = truncate(&entry, MAX_DESCRIPTION_LEN);
        let extra = if current.is_empty() { 0 } else { 2 };
        if !current.is_empty()
            && current.chars().count() + extra + entry.chars().count() > MAX_DESCRIPTION_LEN
        {
            pages.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push_str("\n\n");
        }
        current.push_str(&entry);
    }
    if !current.is_empty() {
        pages.push(current);
    }
    pages
}

fn listing(title: &str, entries: Vec<String>, footer: String, now: DateTime<Utc>) -> Vec<Embed> {
    paginate(entries)
        .into_iter()
        .enumerate()
        .map(|(page, description)| {
            let title = if page == 0 {
                title.to_string()
            } else {
                format!("{title} (continued)")
            };
            let builder = EmbedBuilder::new()
                .title(title)
                .description(description)
                .color(COLOR_INFO)
                .footer(EmbedFooterBuilder::new(footer.clone()));
            with_timestamp(builder, now).build()
        })
        .collect()
}

pub fn accounts_list(accounts: &[AccountRegistration], now: DateTime<Utc>) -> Vec<Embed> {
    let entries = accounts
        .iter()
        .enumerate()
        .map(|(i, p)| {
            format!(
                "{}. **{}** <@{}>\n   PID: `{}`",
                i + 1,
                p.display_name,
                p.owner_id,
                p.external_account_id
            )
        })
        .collect();
    listing(
        "👥 Registered Players",
        entries,
        format!("Total: {} player(s) in this server", accounts.len()),
        now,
    )
}

pub fn own_accounts(accounts: &[AccountRegistration], now: DateTime<Utc>) -> Vec<Embed> {
    let entries = accounts
        .iter()
        .enumerate()
        .map(|(i, p)| {
            format!(
                "**{}. {}**\nPID: `{}`\nAdded: {}",
                i + 1,
                p.display_name,
                p.external_account_id,
                p.registered_at.format("%Y-%m-%d")
            )
        })
        .collect();
    listing(
        "👤 Your Players",
        entries,
        format!("Total: {} player(s)", accounts.len()),
        now,
    )
}

pub fn added_embed(registration: &AccountRegistration, scope_total: usize, now: DateTime<Utc>) -> Embed {
    let builder = EmbedBuilder::new()
        .title("✅ Player Added Successfully")
        .color(COLOR_SUCCESS)
        .field(EmbedFieldBuilder::new("Account Name", truncate(&registration.display_name, MAX_FIELD_VALUE_LEN)).inline())
        .field(EmbedFieldBuilder::new("PID", truncate(&registration.external_account_id, MAX_FIELD_VALUE_LEN)).inline())
        .field(EmbedFieldBuilder::new("Discord User", format!("<@{}>", registration.owner_id)).inline())
        .footer(EmbedFooterBuilder::new(format!(
            "Total players in this server: {scope_total}"
        )));
    with_timestamp(builder, now).build()
}

pub fn removed_embed(registration: &AccountRegistration, scope_total: usize, now: DateTime<Utc>) -> Embed {
    let builder = EmbedBuilder::new()
        .title("✅ Player Removed")
        .color(COLOR_FAILURE)
        .field(EmbedFieldBuilder::new("Account Name", truncate(&registration.display_name, MAX_FIELD_VALUE_LEN)).inline())
        .field(EmbedFieldBuilder::new("PID", truncate(&registration.external_account_id, MAX_FIELD_VALUE_LEN)).inline())
        .footer(EmbedFooterBuilder::new(format!(
            "Total players in this server: {scope_total}"
        )));
    with_timestamp(builder, now).build()
}
