use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use booking_api::config::AppConfig;
use booking_api::database::connection::get_db_client;
use booking_api::errors::Result;
use booking_api::routes::build_router;
use booking_api::services::phonepe_service::{PaymentGateway, PhonePeService};
use booking_api::services::transaction_store::{
    MemoryTransactionStore, MongoTransactionStore, TransactionStore,
};
use booking_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = AppConfig::from_env().context("loading configuration")?;
    tracing::info!("✅ App config loaded: {}", config.get_config_info());

    let app_state = initialize_app_state(&config)
        .await
        .context("initializing services")?;

    let app = build_router(app_state);
    start_server(&config, app).await
}

async fn initialize_app_state(config: &AppConfig) -> Result<AppState> {
    let store: Arc<dyn TransactionStore> = if config.use_memory_store {
        tracing::warn!("Using in-memory transaction store, records are lost on restart");
        Arc::new(MemoryTransactionStore::new())
    } else {
        let db = get_db_client(config).await?;
        let store = MongoTransactionStore::new(db);
        store.ensure_indexes().await?;
        Arc::new(store)
    };

    let gateway: Arc<dyn PaymentGateway> = Arc::new(PhonePeService::new(config.phonepe.clone())?);
    tracing::info!("✅ PhonePe client ready for merchant {}", config.phonepe.merchant_id);

    Ok(AppState::new(store, gateway, config.phonepe.clone(), config.jwt_secret.clone()))
}

async fn start_server(config: &AppConfig, app: axum::Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.host, config.port))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;

    tracing::info!("🚀 Server started on {}", addr);
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
