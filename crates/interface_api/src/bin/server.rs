//! Settlement API Server Binary
//!
//! # Usage
//!
//! ```bash
//! API_PORT=8080 API_DATABASE_URL=postgres://... cargo run --bin settlement-api
//! ```
//!
//! # Environment Variables
//!
//! * `API_HOST` - Server host (default: 0.0.0.0)
//! * `API_PORT` - Server port (default: 8080)
//! * `API_JWT_SECRET` - JWT signing secret (required in production)
//! * `API_JWT_EXPIRATION_SECS` - JWT token expiration in seconds (default: 3600)
//! * `API_DATABASE_URL` or `DATABASE_URL` - PostgreSQL connection string
//! * `API_DB_MAX_CONNECTIONS` - Pool size (default: 10)
//! * `API_APPLY_SCHEMA` - Create missing tables on start (default: true)
//! * `API_LOG_LEVEL` - Log level, overridden by `RUST_LOG` (default: info)

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use domain_settlement::SettlementService;
use infra_db::{
    apply_schema, create_pool, DatabaseConfig, PostgresAuditAdapter, PostgresBillAdapter,
    PostgresSettingsAdapter,
};
use interface_api::{config::ApiConfig, create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = load_config()?;
    init_tracing(&config.log_level);

    tracing::info!(
        host = %config.host,
        port = %config.port,
        "Starting settlement API server"
    );

    let pool = create_pool(
        DatabaseConfig::new(config.database_url.clone()).max_connections(config.db_max_connections),
    )
    .await
    .context("connecting to database")?;

    if config.apply_schema {
        apply_schema(&pool).await.context("applying schema")?;
    }

    let settings = Arc::new(PostgresSettingsAdapter::new(pool.clone()));
    let bills = Arc::new(PostgresBillAdapter::new(pool.clone()));
    let audit = Arc::new(PostgresAuditAdapter::new(pool));

    let service = Arc::new(SettlementService::new(
        settings.clone(),
        bills.clone(),
        audit.clone(),
    ));

    let state = AppState::new(service, config.clone())
        .with_health_check(settings)
        .with_health_check(bills)
        .with_health_check(audit);
    let app = create_router(state);

    let addr: SocketAddr = config
        .server_addr()
        .parse()
        .with_context(|| format!("invalid listen address {}", config.server_addr()))?;

    tracing::info!(%addr, "Server listening");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Loads configuration, honouring a bare `DATABASE_URL` when the prefixed
/// variable is absent
fn load_config() -> anyhow::Result<ApiConfig> {
    let mut config = ApiConfig::from_env().context("reading API_ environment")?;

    if std::env::var("API_DATABASE_URL").is_err() {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            config.database_url = url;
        }
    }

    Ok(config)
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .init();
}

/// Waits for Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
