use anyhow::Result;
use dashboard::{create_router, Config, Dashboard};
use env_logger::Env;
use evm_interface::EvmClient;
use log::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    if config.wallet_rpc_url.is_none() {
        warn!("WALLET_RPC_URL not set, connecting will report a missing wallet");
    }

    let client = EvmClient::new(config.wallet_rpc_url.as_deref())?
        .with_poll_interval(config.receipt_poll_interval);
    let app = create_router(Dashboard::new(client));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Dashboard listening on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
