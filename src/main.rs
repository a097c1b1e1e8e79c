use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use clap::Parser;
use tower_http::trace::TraceLayer;

mod clock;
mod config;
mod db;
mod middleware;
mod models;
pub mod observability;
mod rate_limiter;
mod routes;
pub mod services;

#[cfg(test)]
mod tests;

/// Shared state handed to every handler and middleware.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::ServiceConfig>,
    pub db: Arc<db::DbPool>,
    pub lookup: Arc<services::LookupService>,
    pub rate_limiter: Arc<rate_limiter::RateLimiter>,
}

impl AppState {
    /// Connect to the panel database and build the state on the system clock.
    pub async fn new(config: config::ServiceConfig) -> Result<Self, db::DbError> {
        let db = db::DbPool::from_config(&config.database).await?;
        Ok(Self::with_clock(config, db, Arc::new(clock::SystemClock)))
    }

    /// Build the state around an existing pool and clock.
    pub fn with_clock(
        config: config::ServiceConfig,
        db: db::DbPool,
        clock: Arc<dyn clock::Clock>,
    ) -> Self {
        let lookup = services::LookupService::new(db.client_traffic(), Arc::clone(&clock));
        let rate_limiter =
            rate_limiter::RateLimiter::from_config(&config.limits.rate_limit, clock);

        Self {
            config: Arc::new(config),
            db: Arc::new(db),
            lookup: Arc::new(lookup),
            rate_limiter: Arc::new(rate_limiter),
        }
    }
}

#[derive(Parser, Debug)]
#[command(version, about = "Client traffic lookup service for x-ui panels", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to config file (defaults to ./trafficscope.toml if it exists,
    /// otherwise built-in defaults are used)
    #[arg(short, long, global = true)]
    config: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Command {
    /// Start the HTTP server (default)
    Serve,
    /// Validate the configuration and check that the panel database is readable
    Check,
    /// Resolve one client id against the database and print the result as JSON
    Lookup {
        /// Client UUID as it appears in the inbound settings
        client_id: String,
    },
}

const DEFAULT_CONFIG_FILE: &str = "trafficscope.toml";

/// Find the config file to load. `Ok(None)` means run on defaults.
fn resolve_config_path(explicit_path: Option<&str>) -> Result<Option<PathBuf>, String> {
    if let Some(path) = explicit_path {
        let path = PathBuf::from(path);
        if !path.exists() {
            return Err(format!("Config file not found: {}", path.display()));
        }
        return Ok(Some(path));
    }

    let cwd_config = PathBuf::from(DEFAULT_CONFIG_FILE);
    if cwd_config.exists() {
        return Ok(Some(cwd_config));
    }

    Ok(None)
}

/// Load configuration or exit with a message.
fn load_config(explicit_path: Option<&str>) -> (config::ServiceConfig, Option<PathBuf>) {
    let config_path = match resolve_config_path(explicit_path) {
        Ok(path) => path,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let Some(path) = config_path else {
        return (config::ServiceConfig::default(), None);
    };

    match config::ServiceConfig::from_file(&path) {
        Ok(c) => (c, Some(path)),
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", path.display(), e);
            std::process::exit(1);
        }
    }
}

fn init_observability(config: &config::ServiceConfig) {
    if let Err(e) = observability::init_tracing(&config.observability) {
        eprintln!("Failed to initialize tracing: {}", e);
        std::process::exit(1);
    }
}

pub fn build_app(config: &config::ServiceConfig, state: AppState) -> Router {
    let lookup_route = post(routes::lookup_client)
        .options(routes::preflight)
        .fallback(routes::method_not_allowed);

    // Rate limiting wraps the lookup route only; CORS sits outside it so
    // preflight requests are answered before any budget is spent.
    let mut api = Router::new()
        .route("/api", lookup_route)
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::rate_limit_middleware,
        ));

    if let Some(cors_layer) = config.server.cors.clone().into_layer() {
        api = api.layer(cors_layer);
    }

    let mut app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/health/live", get(routes::health::liveness))
        .route("/health/ready", get(routes::health::readiness))
        .merge(api);

    if config.observability.metrics.enabled {
        app = app.route(
            &config.observability.metrics.path,
            get(routes::health::metrics),
        );
    }

    app.layer(axum::middleware::from_fn(middleware::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        // Enforced by the body extractor so oversized requests still get the
        // endpoint's JSON error body.
        .layer(DefaultBodyLimit::max(config.server.body_limit_bytes))
        .with_state(state)
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    match args.command {
        Some(Command::Check) => {
            run_check(args.config.as_deref()).await;
        }
        Some(Command::Lookup { client_id }) => {
            run_lookup(args.config.as_deref(), &client_id).await;
        }
        Some(Command::Serve) | None => {
            run_server(args.config.as_deref()).await;
        }
    }
}

async fn run_server(explicit_config_path: Option<&str>) {
    let (config, config_path) = load_config(explicit_config_path);
    init_observability(&config);

    if let Err(e) = observability::metrics::init_metrics(&config.observability.metrics) {
        tracing::warn!(error = %e, "Failed to initialize metrics");
    }

    match &config_path {
        Some(path) => tracing::info!(config_file = %path.display(), "Starting trafficscope"),
        None => tracing::info!("Starting trafficscope with default configuration"),
    }

    if !config.limits.rate_limit.enabled {
        tracing::warn!("Rate limiting is disabled; the lookup endpoint is unthrottled");
    }

    let state = match AppState::new(config.clone()).await {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(
                error = %e,
                path = %config.database.sqlite().path,
                "Failed to open panel database"
            );
            std::process::exit(1);
        }
    };

    let db = Arc::clone(&state.db);
    let app = build_app(&config, state);

    let bind_addr = SocketAddr::new(config.server.host, config.server.port);
    let listener = match tokio::net::TcpListener::bind(bind_addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!(error = %e, address = %bind_addr, "Failed to bind");
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on http://{}", bind_addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server error");
    }

    db.close().await;
    tracing::info!("Shutdown complete");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining in-flight requests");
}

/// Id that never appears in a panel; used to exercise the lookup query.
const PROBE_CLIENT_ID: &str = "00000000-0000-0000-0000-000000000000";

async fn run_check(explicit_config_path: Option<&str>) {
    let (config, config_path) = load_config(explicit_config_path);
    init_observability(&config);

    match &config_path {
        Some(path) => println!("Configuration OK: {}", path.display()),
        None => println!("Configuration OK: built-in defaults"),
    }

    let db_path = &config.database.sqlite().path;
    let pool = match db::DbPool::from_config(&config.database).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!("Error: Failed to open database {}: {}", db_path, e);
            std::process::exit(1);
        }
    };

    let result = match pool.health_check().await {
        Ok(()) => pool.client_traffic().find_by_client_id(PROBE_CLIENT_ID).await,
        Err(e) => Err(e),
    };
    pool.close().await;

    match result {
        Ok(_) => println!("Database OK: {}", db_path),
        Err(e) => {
            eprintln!("Error: Database {} is not usable: {}", db_path, e);
            std::process::exit(1);
        }
    }
}

async fn run_lookup(explicit_config_path: Option<&str>, client_id: &str) {
    let (config, _) = load_config(explicit_config_path);
    init_observability(&config);

    if !models::is_valid_client_id(client_id) {
        eprintln!("Error: Invalid Client ID format");
        std::process::exit(2);
    }

    let pool = match db::DbPool::from_config(&config.database).await {
        Ok(pool) => pool,
        Err(e) => {
            eprintln!(
                "Error: Failed to open database {}: {}",
                config.database.sqlite().path,
                e
            );
            std::process::exit(1);
        }
    };

    let lookup = services::LookupService::new(pool.client_traffic(), Arc::new(clock::SystemClock));
    let result = lookup.resolve(client_id).await;
    pool.close().await;

    match result {
        Ok(snapshot) => match serde_json::to_string_pretty(&snapshot) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: Failed to serialize result: {}", e);
                std::process::exit(1);
            }
        },
        Err(services::LookupError::NotFound) => {
            eprintln!("Client not found");
            std::process::exit(1);
        }
        Err(services::LookupError::Store(e)) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
