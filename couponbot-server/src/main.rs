use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use couponbot_core::config::{
    DEFAULT_API_BASE, DEFAULT_GAME_CODE, DEFAULT_PLAYERS_FILE, DEFAULT_REQUEST_DELAY_MS,
    DEFAULT_REQUEST_TIMEOUT_SECS,
};
use couponbot_core::{BotConfig, OwnerPolicy};

mod context;
mod server;

#[derive(Parser, Debug, Clone)]
#[command(name = "couponbot")]
#[command(author, version, about = "Discord bot that redeems game coupons for every registered player")]
pub struct Args {
    /// Discord bot token.
    #[arg(long, env = "DISCORD_BOT_TOKEN", hide_env_values = true)]
    discord_token: String,

    /// Only accept commands in this channel.
    #[arg(long, env = "DISCORD_CHANNEL_ID")]
    channel_id: Option<String>,

    /// Milliseconds to wait before each reward request.
    #[arg(long, env = "REQUEST_DELAY", default_value_t = DEFAULT_REQUEST_DELAY_MS)]
    request_delay: u64,

    #[arg(long, env = "GAME_CODE", default_value = DEFAULT_GAME_CODE)]
    game_code: String,

    /// Where registrations are stored.
    #[arg(long, env = "PLAYERS_FILE", default_value = DEFAULT_PLAYERS_FILE)]
    players_file: PathBuf,

    #[arg(long, env = "COUPON_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,

    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    request_timeout_secs: u64,

    /// "single" allows one player per Discord user per server, "multiple" allows several.
    #[arg(long, env = "OWNER_POLICY", default_value = "multiple")]
    owner_policy: OwnerPolicy,

    /// Use one player list for every server instead of one per server.
    #[arg(long, env = "SINGLE_SCOPE", default_value = "false")]
    single_scope: bool,
}

impl Args {
    pub fn to_config(&self) -> BotConfig {
        BotConfig {
            discord_token: self.discord_token.clone(),
            command_channel_id: self.channel_id.clone().filter(|c| !c.trim().is_empty()),
            request_delay: Duration::from_millis(self.request_delay),
            game_code: self.game_code.clone(),
            players_file: self.players_file.clone(),
            api_base: self.api_base.clone(),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            owner_policy: self.owner_policy,
            single_scope: self.single_scope,
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("couponbot=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(sub) {
        eprintln!("Failed to set global subscriber: {e}");
    }
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    init_tracing();
    let args = Args::parse();
    info!(
        "CouponBot starting. game_code={}, delay={}ms, players_file={}",
        args.game_code,
        args.request_delay,
        args.players_file.display()
    );

    if let Err(e) = server::run_server(args).await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
    info!("Main finished. Goodbye!");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_map_onto_config() {
        let args = Args::try_parse_from([
            "couponbot",
            "--discord-token",
            "abc",
            "--channel-id",
            "123",
            "--request-delay",
            "500",
            "--owner-policy",
            "single",
        ])
        .unwrap();
        let cfg = args.to_config();
        assert_eq!(cfg.discord_token, "abc");
        assert_eq!(cfg.command_channel_id.as_deref(), Some("123"));
        assert_eq!(cfg.request_delay, Duration::from_millis(500));
        assert_eq!(cfg.owner_policy, OwnerPolicy::Single);
        assert_eq!(cfg.game_code, DEFAULT_GAME_CODE);
        assert!(!cfg.single_scope);
    }

    #[test]
    fn blank_channel_means_no_filter() {
        let args = Args::try_parse_from(["couponbot", "--discord-token", "abc", "--channel-id", " "]).unwrap();
        assert!(args.to_config().command_channel_id.is_none());
    }
}
