//! HTTP server bootstrap for the FlightVault gateway.
//!
//! This module wires together:
//! - configuration
//! - database connection pool
//! - core services (nonce authority, chain reader, object store, gateway)
//! - the Axum router

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tower_http::cors::AllowOrigin;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::EnvFilter;

use crate::auth::{NonceAuthority, DEFAULT_NONCE_TTL_SECS};
use crate::chain::{ChainConfig, EthChainReader};
use crate::gateway::{AuthorizationGateway, DEFAULT_SIGNED_URL_TTL_SECS};
use crate::infra::{
    BatchStore, HttpArtifactStore, ObjectStoreConfig, PgBatchStore, PgNonceStore,
    PgSubmissionStore,
};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL.
    pub database_url: String,
    /// Server listen address.
    pub listen_addr: SocketAddr,
    /// Maximum database connections.
    pub max_connections: u32,
    /// Settlement chain RPC and contract.
    pub chain: ChainConfig,
    /// Object store signing endpoint.
    pub object_store: ObjectStoreConfig,
    /// Challenge nonce lifetime in seconds.
    pub nonce_ttl_secs: i64,
    /// Signed artifact URL lifetime in seconds.
    pub signed_url_ttl_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Chain and object store settings have no sane defaults and are
    /// required.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| "postgres://localhost/flightvault_gateway".to_string());

        let port: u16 = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8080);

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let listen_addr: SocketAddr = format!("{host}:{port}")
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid listen address: {e}"))?;

        let max_connections: u32 = std::env::var("MAX_DB_CONNECTIONS")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(10);

        let rpc_url =
            std::env::var("RPC_URL").map_err(|_| anyhow::anyhow!("RPC_URL must be set"))?;
        let contract_address = std::env::var("ESCROW_CONTRACT_ADDRESS")
            .map_err(|_| anyhow::anyhow!("ESCROW_CONTRACT_ADDRESS must be set"))?
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid ESCROW_CONTRACT_ADDRESS: {e}"))?;
        let chain_id: u64 = std::env::var("CHAIN_ID")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1);

        let storage_api_url = std::env::var("STORAGE_API_URL")
            .map_err(|_| anyhow::anyhow!("STORAGE_API_URL must be set"))?;
        let storage_service_key = std::env::var("STORAGE_SERVICE_KEY")
            .map_err(|_| anyhow::anyhow!("STORAGE_SERVICE_KEY must be set"))?;

        let nonce_ttl_secs: i64 = std::env::var("NONCE_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_NONCE_TTL_SECS);

        let signed_url_ttl_secs: u64 = std::env::var("SIGNED_URL_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_SIGNED_URL_TTL_SECS);

        Ok(Self {
            database_url,
            listen_addr,
            max_connections,
            chain: ChainConfig {
                rpc_url,
                contract_address,
                chain_id,
            },
            object_store: ObjectStoreConfig {
                base_url: storage_api_url,
                service_key: storage_service_key,
                request_timeout: Duration::from_secs(10),
            },
            nonce_ttl_secs,
            signed_url_ttl_secs,
        })
    }
}

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<AuthorizationGateway>,
    pub batches: Arc<dyn BatchStore>,
    pub db: PgPool,
}

/// Start the HTTP server.
pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting FlightVault gateway v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::from_env()?;
    info!("Configuration loaded");
    info!("  Listen address: {}", config.listen_addr);
    info!("  Max connections: {}", config.max_connections);
    info!("  Chain ID: {}", config.chain.chain_id);
    info!("  Escrow contract: {}", config.chain.contract_address);

    // Connect to PostgreSQL
    info!("Connecting to PostgreSQL...");
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await?;
    info!("Connected to PostgreSQL");

    let migrate_on_startup = std::env::var("DB_MIGRATE_ON_STARTUP")
        .ok()
        .map(|v| {
            !matches!(
                v.trim().to_ascii_lowercase().as_str(),
                "0" | "false" | "off"
            )
        })
        .unwrap_or(true);
    if migrate_on_startup {
        info!("Running database migrations...");
        crate::migrations::run_postgres(&pool).await?;
        info!("Database migrations applied");
    } else {
        info!("DB migrations skipped (DB_MIGRATE_ON_STARTUP=0)");
    }

    // Initialize services
    let nonce_store = Arc::new(PgNonceStore::new(pool.clone()));
    let submissions = Arc::new(PgSubmissionStore::new(pool.clone()));
    let batches: Arc<dyn BatchStore> = Arc::new(PgBatchStore::new(pool.clone()));
    let chain = Arc::new(EthChainReader::new(config.chain.clone()));
    let artifacts = Arc::new(HttpArtifactStore::new(config.object_store.clone())?);

    let gateway = Arc::new(AuthorizationGateway::new(
        NonceAuthority::new(nonce_store.clone(), config.nonce_ttl_secs),
        chain,
        submissions,
        artifacts,
        config.signed_url_ttl_secs,
    ));

    spawn_nonce_sweeper(nonce_store);

    // Create application state
    let state = AppState {
        gateway,
        batches,
        db: pool,
    };

    // Build router
    let app = build_router()?.with_state(state);

    // Start server
    info!("Starting HTTP server on {}", config.listen_addr);
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;

    info!("FlightVault gateway is ready to accept connections");
    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically delete expired challenge rows. Correctness never depends
/// on this; consumption judges expiry itself.
fn spawn_nonce_sweeper(store: Arc<PgNonceStore>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
        loop {
            interval.tick().await;
            match store.sweep_expired().await {
                Ok(0) => {}
                Ok(n) => info!(swept = n, "expired challenges removed"),
                Err(e) => warn!(error = %e, "nonce sweep failed"),
            }
        }
    });
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(Level::INFO.to_string()));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();
}

fn build_router() -> anyhow::Result<Router<AppState>> {
    let mut router = Router::new()
        .merge(crate::api::rest::routes())
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .layer(TraceLayer::new_for_http());

    if let Some(cors_layer) = cors_layer_from_env()? {
        router = router.layer(cors_layer);
    }

    Ok(router)
}

fn cors_layer_from_env() -> anyhow::Result<Option<CorsLayer>> {
    let origins = match std::env::var("CORS_ALLOW_ORIGINS") {
        Ok(v) => v,
        Err(_) => return Ok(None),
    };

    let origins = origins.trim();
    if origins.is_empty() {
        return Ok(None);
    }

    let allow_origin = if origins == "*" {
        AllowOrigin::any()
    } else {
        let origins: Vec<HeaderValue> = origins
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<HeaderValue>()
                    .map_err(|e| anyhow::anyhow!("Invalid CORS origin {s:?}: {e}"))
            })
            .collect::<anyhow::Result<_>>()?;
        AllowOrigin::list(origins)
    };

    Ok(Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([
                axum::http::header::AUTHORIZATION,
                axum::http::header::CONTENT_TYPE,
            ]),
    ))
}

/// Health check endpoint.
async fn health_check() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "status": "healthy",
        "service": "flightvault-gateway",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Readiness check endpoint.
async fn readiness_check(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<axum::Json<serde_json::Value>, (axum::http::StatusCode, String)> {
    match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => Ok(axum::Json(serde_json::json!({
            "status": "ready",
            "database": "connected",
        }))),
        Err(e) => Err((
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            format!("Database unavailable: {}", e),
        )),
    }
}
