use anyhow::Result;
use position_dashboard::{
    dashboard::now_unix,
    passkey::UnsupportedPlatform,
    session::{AppDetails, StaticWallet},
    stacks::{StacksClient, StacksPositionSource},
    view::DashboardState,
    DashboardConfig, PlaceholderSubmitter, PositionDashboard, SessionSlot,
};
use std::{env, time::Duration};
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

fn report(state: &DashboardState) {
    let stats = state.stats();
    info!(
        total = stats.total_positions,
        active = stats.active_positions,
        value_locked = %stats.value_locked,
        "Dashboard"
    );
    if state.positions.is_empty() {
        info!("No positions found. Create your first TimeLock position!");
    }
    for tracked in &state.positions {
        let p = &tracked.position;
        info!(
            id = p.id,
            amount = %p.amount,
            asset = %p.asset,
            duration_days = p.duration_days,
            created_at = p.created_at,
            status = ?tracked.status,
            "Position"
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    let watch = env::args().any(|arg| arg == "--watch");
    let config = DashboardConfig::from_env()?;
    info!(
        api = %config.stacks_api_url,
        exchange = %config.contracts.timelock_exchange,
        position_nft = %config.contracts.position_nft,
        fee_collector = %config.contracts.fee_collector,
        "Configuration loaded"
    );

    let source = StacksPositionSource::new(
        StacksClient::new(&config.stacks_api_url, reqwest::Client::new()),
        config.contracts.timelock_exchange.clone(),
    );
    let dashboard = PositionDashboard::new(source, PlaceholderSubmitter, UnsupportedPlatform);

    let mut slot = SessionSlot::new();
    let app = AppDetails::timelock(&config.app_origin);
    let wallet = config.wallet_address.clone().map(StaticWallet::new);
    if let Some(wallet) = &wallet {
        if let Some(session) = slot.restore(wallet, &app, now_unix()).await {
            info!(address = %session.short_address(), "Connected");
        }
    } else {
        warn!("WALLET_ADDRESS not set, showing positions for all accounts");
    }

    loop {
        let session = slot.current(now_unix());
        if let Err(e) = dashboard.refresh(session).await {
            error!(error = %e, "Refresh failed");
        }
        report(&dashboard.state().await);

        if !watch {
            break;
        }
        tokio::time::sleep(Duration::from_secs(config.refresh_interval_secs)).await;
    }

    if let Some(wallet) = &wallet {
        if slot.current(now_unix()).is_some() {
            slot.disconnect(wallet).await?;
        }
    }
    Ok(())
}
