mod api;
mod chainhooks;
mod config;
mod models;
mod webhook;

use anyhow::Result;
use api::AppState;
use chainhooks::ChainhooksClient;
use config::Config;
use std::{env, sync::Arc};
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;
use webhook::WebhookReceiver;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    // 1. Load configuration
    let config = Arc::new(Config::from_env()?);
    info!(
        chainhooks = %config.chainhooks_base_url,
        network = %config.chainhooks_network,
        webhook = %config.webhook_url(),
        exchange = ?config.timelock_exchange_contract,
        position_nft = ?config.position_nft_contract,
        fee_collector = ?config.fee_collector_contract,
        "Configuration loaded"
    );
    if config.chainhooks_api_key.is_none() {
        warn!("CHAINHOOKS_API_KEY not set, chainhook registration will fail");
    }

    // 2. Build the chainhooks client and webhook receiver
    let state = Arc::new(AppState {
        chainhooks: ChainhooksClient::new(&config, reqwest::Client::new()),
        receiver: WebhookReceiver::default(),
    });

    // 3. Optionally register the hook once at start-up
    let args: Vec<String> = env::args().collect();
    if args.iter().any(|arg| arg == "--register") {
        match state.chainhooks.register().await {
            Ok(uuid) => info!(%uuid, "Registered chainhook at start-up"),
            Err(e) => error!(error = %e, "Start-up chainhook registration failed"),
        }
    }
    if args.iter().any(|arg| arg == "--list") {
        match state.chainhooks.list().await {
            Ok(hooks) => {
                info!(count = hooks.len(), "Existing chainhooks");
                for hook in hooks {
                    info!(uuid = %hook.uuid, details = ?hook.details, "Chainhook");
                }
            }
            Err(e) => error!(error = %e, "Failed to list chainhooks"),
        }
    }

    // 4. Serve until the listener fails
    api::run_api_server(Arc::clone(&config), state).await.map_err(|e| {
        error!(error = %e, "API server has exited");
        e
    })
}
