use std::sync::Arc;

use card_recommendation_api::{
    api::{create_router, AppState, RouterOptions},
    config::Config,
    db::{create_pool, PgScoreStore, ScoreStore},
    models::PlaceholderCardCatalog,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::try_new(format!(
            "{level},tower_http={level}",
            level = log_level.to_lowercase()
        ))
        .unwrap_or_else(|_| EnvFilter::new("info"))
    });

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config.log_level, config.is_production());

    tracing::info!(
        environment = %config.environment,
        api_prefix = %config.api_prefix,
        allowed_hosts = ?config.allowed_hosts_list(),
        allowed_origins = ?config.allowed_origins_list(),
        "Configuration loaded"
    );

    let pool = create_pool(&config).await?;
    let store: Arc<dyn ScoreStore> = Arc::new(PgScoreStore::new(pool, config.query_timeout()));
    tracing::info!(
        store = store.name(),
        max_connections = config.max_connections(),
        "Score store connected"
    );

    let state = AppState::new(store, Arc::new(PlaceholderCardCatalog), config.limits());
    let app = create_router(state, &RouterOptions::from_config(&config));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}
