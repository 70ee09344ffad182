//! Fleet Booking server
//!
//! REST API for vehicle reservations.
//! Reads configuration from TOML file (~/.config/fleet-booking/config.toml).

use std::sync::Arc;

use sea_orm_migration::MigratorTrait;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use fleet_booking::application::booking::PricingPolicy;
use fleet_booking::application::ports::{SharedNotifier, SharedPaymentGateway};
use fleet_booking::config::{AppConfig, LoggingConfig};
use fleet_booking::domain::RepositoryProvider;
use fleet_booking::infrastructure::database::migrator::Migrator;
use fleet_booking::shared::{ShutdownCoordinator, SystemClock};
use fleet_booking::{
    create_api_router, create_event_bus, default_config_path, init_database, DatabaseConfig,
    InMemoryPaymentGateway, ReservationService, SeaOrmRepositoryProvider,
};

fn init_logging(cfg: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cfg.level));
    if cfg.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Load configuration ─────────────────────────────────────
    let config_path = default_config_path();
    let app_cfg = match AppConfig::load(&config_path) {
        Ok(cfg) => {
            init_logging(&cfg.logging);
            info!("Configuration loaded from {}", config_path.display());
            cfg
        }
        Err(e) => {
            init_logging(&LoggingConfig::default());
            error!("Failed to load config: {}. Using defaults.", e);
            AppConfig::default()
        }
    };

    info!("Starting Fleet Booking...");

    // ── Database ───────────────────────────────────────────────
    let db_config = DatabaseConfig::from(&app_cfg.database);
    info!("Database: {}", db_config.url);

    let db = match init_database(&db_config).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to connect to database: {}", e);
            return Err(e.into());
        }
    };

    info!("Running database migrations...");
    if let Err(e) = Migrator::up(&db, None).await {
        error!("Failed to run migrations: {}", e);
        return Err(e.into());
    }
    info!("Migrations completed");

    let repos: Arc<dyn RepositoryProvider> = Arc::new(SeaOrmRepositoryProvider::new(db.clone()));

    // ── Collaborators ──────────────────────────────────────────
    let event_bus = create_event_bus();
    let mut subscriber = event_bus.subscribe();
    tokio::spawn(async move {
        while let Some(message) = subscriber.recv().await {
            info!(
                event = message.event.event_type(),
                booking_id = %message.event.booking_id(),
                "Booking event"
            );
        }
    });

    // Payments are settled by an external system; none are recorded locally.
    let payments: SharedPaymentGateway = Arc::new(InMemoryPaymentGateway::new());
    let notifier: SharedNotifier = event_bus.clone();

    let pricing = PricingPolicy::from(&app_cfg.pricing);
    info!(
        tax_rate = %pricing.tax_rate,
        fee_rate = %pricing.fee_rate,
        "Pricing policy configured"
    );

    let service = Arc::new(ReservationService::new(
        repos,
        notifier,
        payments,
        Arc::new(SystemClock),
        pricing,
    ));

    // ── Shutdown ───────────────────────────────────────────────
    let shutdown = ShutdownCoordinator::new(app_cfg.server.shutdown_timeout);
    shutdown.start_signal_listener();
    let shutdown_signal = shutdown.signal();

    // ── REST API ───────────────────────────────────────────────
    let api_router = create_api_router(service, db.clone());

    let api_addr = app_cfg.server.address();
    let listener = tokio::net::TcpListener::bind(&api_addr).await?;
    info!("REST API server listening on http://{}", api_addr);
    info!("Swagger UI available at http://{}/docs/", api_addr);

    let api_shutdown = shutdown_signal.clone();
    let api_server = axum::serve(listener, api_router).with_graceful_shutdown(async move {
        api_shutdown.wait().await;
        info!("🛑 REST API server received shutdown signal");
    });

    let api_result = tokio::spawn(async move { api_server.await });

    match api_result.await {
        Ok(Ok(())) => info!("REST API server stopped"),
        Ok(Err(e)) => error!("REST API server error: {}", e),
        Err(e) => error!("REST API server task panicked: {}", e),
    }

    // ── Cleanup ────────────────────────────────────────────────
    // The server may also stop on its own error; make sure cleanup runs.
    shutdown_signal.trigger();
    let finished = shutdown
        .shutdown_with_cleanup(|| async move {
            info!("🧹 Performing final cleanup...");
            if let Err(e) = db.close().await {
                warn!("Error closing database connection: {}", e);
            } else {
                info!("✅ Database connection closed");
            }
        })
        .await;
    if !finished {
        warn!("Cleanup did not finish in time");
    }

    info!("👋 Fleet Booking shutdown complete");
    Ok(())
}
