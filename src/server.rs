//! Box office server runtime
//!
//! [`ServerHandle`] owns the whole lifecycle: storage selection, the REST
//! API, the reservation expiry sweep, metrics and graceful shutdown.

use std::sync::{Arc, OnceLock};

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use sea_orm::DatabaseConnection;
use tracing::{error, info, warn};

use crate::application::{start_reservation_expiry_task, AdmissionQueue, ReservationService};
use crate::config::AppConfig;
use crate::domain::RepositoryProvider;
use crate::infrastructure::{init_database, InMemoryRepositoryProvider, SeaOrmRepositoryProvider};
use crate::interfaces::http::modules::metrics::describe_booking_metrics;
use crate::interfaces::http::{create_api_router, ApiState};
use crate::shared::errors::AppError;
use crate::shared::shutdown::{ShutdownCoordinator, ShutdownSignal};
use crate::shared::time::SystemClock;

/// Options for starting the service
#[derive(Default)]
pub struct ServerOptions {
    pub config: AppConfig,
}

/// Handle to a running box office service.
///
/// ```rust,no_run
/// use boxoffice::server::{ServerHandle, ServerOptions};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let handle = ServerHandle::start(ServerOptions::default()).await?;
///     handle.shutdown().await;
///     Ok(())
/// }
/// ```
pub struct ServerHandle {
    pub repos: Arc<dyn RepositoryProvider>,
    pub reservations: Arc<ReservationService>,
    pub admission: Arc<AdmissionQueue>,
    /// The configuration the server was started with
    pub config: AppConfig,
    /// Port the REST API is bound to
    pub api_port: u16,

    db: Option<DatabaseConnection>,
    shutdown: ShutdownCoordinator,
    api_task: tokio::task::JoinHandle<()>,
    sweeper_task: Option<tokio::task::JoinHandle<()>>,
}

/// The global metrics recorder can be installed once per process; a second
/// `start` in the same process reuses it.
fn prometheus_handle() -> Option<PrometheusHandle> {
    static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

    if let Some(handle) = PROM_HANDLE.get() {
        return Some(handle.clone());
    }
    match PrometheusBuilder::new().install_recorder() {
        Ok(handle) => {
            describe_booking_metrics();
            info!("Prometheus metrics recorder installed");
            Some(PROM_HANDLE.get_or_init(|| handle).clone())
        }
        Err(e) => {
            warn!(error = %e, "Prometheus recorder unavailable, /metrics disabled");
            None
        }
    }
}

impl ServerHandle {
    /// Start the service:
    ///
    /// 1. Install the Prometheus recorder
    /// 2. Connect to the database and migrate, or fall back to memory
    /// 3. Wire the booking services and the waiting room
    /// 4. Start the reservation expiry sweep
    /// 5. Serve the REST API (with Swagger UI at `/docs`)
    pub async fn start(opts: ServerOptions) -> Result<Self, AppError> {
        let config = opts.config;
        config.validate()?;

        info!("Starting box office service...");
        let prometheus = prometheus_handle();

        // ── Storage ────────────────────────────────────────────
        let (repos, db): (Arc<dyn RepositoryProvider>, Option<DatabaseConnection>) =
            match config.database.to_database_config() {
                Some(db_config) => {
                    info!(url = %db_config.url, "Connecting to database");
                    let db = init_database(&db_config).await?;
                    info!("Database ready, migrations applied");
                    (Arc::new(SeaOrmRepositoryProvider::new(db.clone())), Some(db))
                }
                None => {
                    info!("No database configured, using in-memory storage");
                    (Arc::new(InMemoryRepositoryProvider::new()), None)
                }
            };

        // ── Services ───────────────────────────────────────────
        let state = ApiState::build(repos.clone(), &config, SystemClock::shared(), db.clone());
        let reservations = state.reservations.clone();
        let admission = state.admission.clone();

        let shutdown = ShutdownCoordinator::new(config.server.shutdown_timeout);
        let shutdown_signal = shutdown.signal();

        let sweeper_task = if config.reservations.sweep_interval_secs > 0 {
            Some(start_reservation_expiry_task(
                reservations.clone(),
                Some(admission.clone()),
                shutdown_signal.clone(),
                config.reservations.sweep_interval_secs,
            ))
        } else {
            info!("Reservation sweep disabled; holds expire and rooms empty lazily on access");
            None
        };

        // ── REST API ───────────────────────────────────────────
        let router = create_api_router(state, prometheus);
        let api_addr = format!("{}:{}", config.server.api_host, config.server.api_port);
        let listener = tokio::net::TcpListener::bind(&api_addr).await?;
        let local_addr = listener.local_addr()?;
        let api_port = local_addr.port();
        info!("REST API listening on http://{}", local_addr);
        info!("Swagger UI available at http://{}/docs/", local_addr);

        let api_shutdown = shutdown_signal.clone();
        let api_server = axum::serve(listener, router).with_graceful_shutdown(async move {
            api_shutdown.wait().await;
            info!("REST API received shutdown signal");
        });
        let api_task = tokio::spawn(async move {
            if let Err(e) = api_server.await {
                error!("REST API server error: {}", e);
            }
        });

        Ok(Self {
            repos,
            reservations,
            admission,
            config,
            api_port,
            db,
            shutdown,
            api_task,
            sweeper_task,
        })
    }

    pub fn shutdown_signal(&self) -> ShutdownSignal {
        self.shutdown.signal()
    }

    /// Install SIGTERM / SIGINT listeners that trigger shutdown.
    pub fn install_signal_handler(&self) {
        self.shutdown.start_signal_listener();
    }

    /// Trigger graceful shutdown without waiting for it.
    pub fn trigger_shutdown(&self) {
        self.shutdown.signal().trigger();
    }

    /// Wait for every task to stop once shutdown has been triggered,
    /// bounded by `server.shutdown_timeout`.
    pub async fn wait(self) {
        let Self {
            db,
            shutdown,
            api_task,
            sweeper_task,
            ..
        } = self;

        let finished = shutdown
            .shutdown_with_cleanup(|| async move {
                match api_task.await {
                    Ok(()) => info!("REST API stopped"),
                    Err(e) => error!("REST API task panicked: {}", e),
                }
                if let Some(sweeper) = sweeper_task {
                    if let Err(e) = sweeper.await {
                        error!("Reservation sweep task panicked: {}", e);
                    }
                }
            })
            .await;
        if !finished {
            warn!("Some tasks did not stop before the shutdown timeout");
        }

        if let Some(db) = db {
            match db.close().await {
                Ok(()) => info!("Database connection closed"),
                Err(e) => warn!("Error closing database connection: {}", e),
            }
        }

        info!("Box office service shutdown complete");
    }

    /// Trigger shutdown and wait for completion.
    pub async fn shutdown(self) {
        info!("Shutting down box office service...");
        self.trigger_shutdown();
        self.wait().await;
    }

    pub fn is_running(&self) -> bool {
        !self.api_task.is_finished()
    }
}

/// Initialize tracing from the logging config. `RUST_LOG` wins over
/// `logging.level` when set.
///
/// Call once at process startup, before [`ServerHandle::start`].
pub fn init_tracing(config: &AppConfig) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    match config.logging.format.to_lowercase().as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }
}
