use std::{net::SocketAddr, sync::Arc};

use siteploy::{
    Config, DeploymentManager, ProviderRegistry, StatusStore,
    api::{self, AppState},
    slack_client::SlackWebhookClient,
    timing::TokioDelay,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with env filter, defaulting to debug levels if RUST_LOG is unset.
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("debug,axum=info,reqwest=info,hyper_util=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .init();

    let config = Config::load()?;

    let manager = Arc::new(DeploymentManager::new(
        StatusStore::new(config.status_capacity, config.status_ttl()),
        ProviderRegistry::standard(),
        Arc::new(TokioDelay::new(config.delay_scale)),
    ));

    let notifier = config
        .slack_webhook_url
        .as_deref()
        .map(SlackWebhookClient::new)
        .transpose()?;
    if notifier.is_none() {
        tracing::info!("slack webhook not configured, notifications disabled");
    }
    if config.api_key.is_none() {
        tracing::warn!("api_key not configured, API is open");
    }

    // Drop finished deployment records once they outlive the TTL.
    let pruner = manager.clone();
    let prune_interval = config.prune_interval();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(prune_interval);
        loop {
            ticker.tick().await;
            pruner.prune();
        }
    });

    let addr: SocketAddr = config.bind_addr.parse()?;
    let state = AppState {
        manager,
        config: Arc::new(config),
        notifier,
    };
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
