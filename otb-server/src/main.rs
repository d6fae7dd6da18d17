//! Open Theatre Booking Server
//!
//! Seat reservation and seance lifecycle engine for a theatre booking
//! platform.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::{ConfigLoader, get_database_url};
use otb_core::booking::BookingService;
use otb_core::dispatch::NotificationDispatcher;
use otb_core::events::lifecycle_event_channel;
use otb_core::lifecycle::{LifecycleService, Sweeper, SweeperConfig};
use otb_core::messaging::{BotMessenger, MessagingChannel};
use otb_core::push::PushRegistry;
use server::{build_router, run_server};
use sqlx::postgres::PgPoolOptions;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Open Theatre Booking - seat reservation and seance lifecycle engine
#[derive(Parser, Debug)]
#[command(name = "otb-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, default_value = "./otb-config.toml")]
    config: PathBuf,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Run database migrations on startup
    #[arg(long, default_value = "false")]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    // Parse command line arguments
    let args = Args::parse();

    tracing::info!("Starting otb-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = ConfigLoader::new(&args.config, args.listen);
    let config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let listen_addr = config.server.listen;
    tracing::info!("Configuration loaded from {:?}", args.config);

    // Get database URL from environment
    let database_url = get_database_url().map_err(|e| {
        tracing::error!("DATABASE_URL environment variable not set");
        e
    })?;

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|e| {
            tracing::error!("Failed to connect to database: {}", e);
            e
        })?;
    tracing::info!("Database connection established");

    // Run migrations if requested
    if args.migrate {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("../migrations")
            .run(&db_pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to run migrations: {}", e);
                e
            })?;
        tracing::info!("Migrations completed successfully");
    }

    // Shutdown signal for the background processors
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    // Event plumbing: commands -> dispatcher
    let (event_tx, event_rx) = lifecycle_event_channel();

    // Delivery channels
    let push_registry = PushRegistry::new();
    let messenger = Arc::new(BotMessenger::new(
        config.messaging.api_base.clone(),
        config.messaging.token.clone(),
    ));
    let messaging = MessagingChannel::new(db_pool.clone(), messenger);

    // Spawn the notification dispatcher
    let dispatcher = NotificationDispatcher::new(
        db_pool.clone(),
        push_registry.clone(),
        messaging,
        event_rx,
        shutdown_rx.clone(),
    );
    let dispatcher_handle = tokio::spawn(dispatcher.run());

    // Spawn the lifecycle sweeper
    let sweeper = Sweeper::new(
        db_pool.clone(),
        SweeperConfig {
            tick_interval: std::time::Duration::from_secs(config.engine.sweep_interval_secs),
            dedup_ttl: time::Duration::days(config.engine.dedup_ttl_days),
        },
    );
    let sweeper_handle = tokio::spawn(sweeper.run(shutdown_rx));

    // Create application state
    let state = AppState::new(
        BookingService::new(db_pool.clone()),
        LifecycleService::new(db_pool.clone(), event_tx),
        push_registry,
        std::time::Duration::from_secs(config.engine.ping_interval_secs),
    );

    // Build the router
    let router = build_router(state);

    // Run the server
    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // Stop the background processors
    tracing::info!("Stopping background processors...");
    let _ = shutdown_tx.send(true);
    let _ = tokio::join!(dispatcher_handle, sweeper_handle);

    // Close database connections gracefully
    tracing::info!("Closing database connections...");
    db_pool.close().await;
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
