//! couponbot-server/src/server.rs
//!
//! The main loop: pull messages off the Discord shards and hand each one to
//! the command service on its own task.

use tracing::{error, info, warn};

use couponbot_core::platforms::PlatformIntegration;

use crate::Args;
use crate::context::ServerContext;

pub async fn run_server(args: Args) -> anyhow::Result<()> {
    let mut ctx = ServerContext::new(&args).await?;

    let (total, scopes) = ctx.registry.stats().await;
    info!(
        "Ready. {total} player(s) registered across {scopes} server(s); owner policy = {}",
        ctx.registry.owner_policy()
    );
    match &ctx.config.command_channel_id {
        Some(channel) => info!("Listening for commands in channel {channel}"),
        None => info!("Listening for commands in every channel"),
    }

    loop {
        tokio::select! {
            maybe_msg = ctx.discord.next_message_event() => {
                let Some(msg) = maybe_msg else {
                    warn!("Discord event stream closed; stopping.");
                    break;
                };
                let service = ctx.command_service.clone();
                tokio::spawn(async move {
                    if let Err(e) = service.handle_message(&msg).await {
                        error!("Error handling message {} from {}: {e}", msg.message_id, msg.author_name);
                    }
                });
            }
            res = tokio::signal::ctrl_c() => {
                if let Err(e) = res {
                    error!("Error waiting for Ctrl‑C: {e}");
                }
                info!("Ctrl‑C detected; shutting down.");
                break;
            }
        }
    }

    if let Err(e) = ctx.discord.disconnect().await {
        warn!("Error disconnecting from Discord: {e}");
    }
    info!("Server shutdown complete.");
    Ok(())
}
