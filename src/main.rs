use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use slid::{
    config::Config,
    db::{create_pool, MemorySlidStore, PgSlidStore, SlidStore},
    llm::{LLMProviderConfig, LLM},
    payment::{EthersChainClient, PaymentService},
    routes::create_router,
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "slid=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded: {:?}", config.server);

    let store: Arc<dyn SlidStore> = match &config.database.url {
        Some(url) => {
            let pool = create_pool(&config.database, url).await?;

            info!("Running database migrations...");
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to run migrations: {}", e))?;
            info!("Database migrations completed");

            Arc::new(PgSlidStore::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set, invoices are kept in memory and lost on restart");
            Arc::new(MemorySlidStore::new())
        }
    };

    let chain = Arc::new(EthersChainClient::new(&config.chain.rpc_url)?);
    let payments = PaymentService::new(store.clone(), chain, &config.chain)?;
    info!(rpc = %config.chain.rpc_url, chain_id = config.chain.chain_id, "Payment service ready");

    let llm = if config.llm.gemini_api_key.is_empty() {
        warn!("GEMINI_API_KEY not set, text assist is disabled");
        None
    } else {
        let llm = LLM::new(LLMProviderConfig {
            name: config.llm.default_provider.clone(),
            api_key: config.llm.gemini_api_key.clone(),
            model: config.llm.default_model.clone(),
        })?;
        info!(provider = llm.provider_name(), model = llm.model(), "Text assist enabled");
        Some(Arc::new(llm))
    };

    // Create shared state
    let state = AppState {
        store,
        payments: Arc::new(payments),
        llm,
        config: config.clone(),
    };

    // Create router
    let app = create_router(state);

    // Start server
    let ip: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::new(ip, config.server.port);
    info!("Server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
