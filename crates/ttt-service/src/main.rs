//! Tic-tac-toe client entry point
//!
//! Run with:
//! ```bash
//! cargo run -p ttt-service --bin ttt-client
//! ```
//!
//! Configuration is loaded from environment variables. Commands are read
//! from stdin one per line; type `help` for the list.

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info};
use ttt_common::{try_init_tracing, ClientConfig, TracingConfig};
use ttt_core::UserId;
use ttt_service::cli::{parse_line, render_notification, HELP};
use ttt_service::{ClientContextBuilder, ClientNotification, ClientRequest, GameClient};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %e, "Client failed");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let config = ClientConfig::from_env().context("failed to load configuration")?;

    if let Err(e) = try_init_tracing(&TracingConfig::from_client_config(&config)) {
        eprintln!("Warning: Failed to initialize tracing: {e}");
    }

    info!(
        env = ?config.app.env,
        api = %config.api.base_url,
        socket = %config.gateway.url,
        "Configuration loaded"
    );

    let buffer = config.client.event_buffer;
    let (mut ctx, notifications) = ClientContextBuilder::new()
        .config(config)
        .build()
        .context("failed to build client")?;

    let restored = ctx.restore().await.context("failed to restore session")?;
    let (client, handle) = GameClient::new(ctx, buffer);
    let runtime = tokio::spawn(client.run());
    let printer = tokio::spawn(print_notifications(notifications));

    println!("{HELP}");
    if restored {
        handle.send(ClientRequest::Connect).await?;
    } else {
        println!("Not logged in. Use 'login' or 'register'.");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == "help" {
            println!("{HELP}");
            continue;
        }
        match parse_line(line) {
            Ok(ClientRequest::Shutdown) => break,
            Ok(request) => {
                if handle.send(request).await.is_err() {
                    break;
                }
            }
            Err(message) => println!("{message}"),
        }
    }

    // Best effort: the runtime may already be gone
    let _ = handle.send(ClientRequest::Shutdown).await;
    drop(handle);
    runtime.await.context("client runtime panicked")?;
    printer.abort();
    info!("Client exited");
    Ok(())
}

async fn print_notifications(mut notifications: mpsc::Receiver<ClientNotification>) {
    let mut local_user: Option<UserId> = None;
    while let Some(notification) = notifications.recv().await {
        match &notification {
            ClientNotification::LoggedIn { user_id, .. }
            | ClientNotification::SessionReady { user_id, .. } => local_user = Some(*user_id),
            ClientNotification::LoggedOut | ClientNotification::SessionRevoked { .. } => {
                local_user = None;
            }
            _ => {}
        }
        println!("{}", render_notification(&notification, local_user));
    }
}
