//! HTTP server with graceful shutdown

use std::future::{Future, IntoFuture};
use std::net::SocketAddr;
use std::time::Duration;

use axum::{error_handling::HandleErrorLayer, BoxError, Router};
use tokio::{net::TcpListener, signal, task::JoinHandle};
use tokio_util::sync::CancellationToken;
use tower::{timeout::error::Elapsed, ServiceBuilder};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

use crate::{
    config::Config,
    error::Result,
    handlers::ApiError,
    middleware::{
        catch_panic_layer, request_id_layer, request_id_propagation_layer, run_sweeper,
        sensitive_headers_layer,
    },
    routes::router,
    state::AppState,
};

/// Server instance
pub struct Server {
    state: AppState,
}

impl Server {
    /// Create a new server instance
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        self.state.config()
    }

    /// Router with the full middleware stack applied
    pub fn app(&self) -> Router {
        let config = self.config();

        // Layers wrap everything added before them; the last one is outermost.
        let mut app = router(self.state.clone());
        if config.middleware.catch_panic {
            app = app.layer(catch_panic_layer());
        }
        app = with_timeout(app, config.service.timeout())
            .layer(request_id_propagation_layer())
            .layer(sensitive_headers_layer())
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(DefaultMakeSpan::new().include_headers(true))
                    .on_response(DefaultOnResponse::new().include_headers(true)),
            )
            .layer(request_id_layer());
        if config.middleware.compression {
            app = app.layer(CompressionLayer::new());
        }
        app.layer(self.build_cors_layer())
    }

    /// Bind the configured port and serve until SIGINT or SIGTERM
    pub async fn serve(self) -> Result<()> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.config().service.port));
        let listener = TcpListener::bind(addr).await?;

        tracing::info!(
            %addr,
            env = %self.config().service.environment,
            "Starting {}",
            self.config().service.name
        );

        let shutdown = CancellationToken::new();
        tokio::spawn({
            let shutdown = shutdown.clone();
            async move {
                shutdown_signal().await;
                shutdown.cancel();
            }
        });

        self.run(listener, shutdown).await
    }

    /// Serve on `listener` until `shutdown` is cancelled
    ///
    /// In-flight requests get `service.shutdown_grace_secs` to finish; after
    /// that the server stops without waiting for them. The rate limiter
    /// sweeper runs for the lifetime of the server.
    pub async fn run(self, listener: TcpListener, shutdown: CancellationToken) -> Result<()> {
        self.log_middleware_config();

        let sweeper = self.state.rate_limiter().cloned().map(|limiter| {
            tokio::spawn(run_sweeper(
                limiter,
                self.config().limiter.sweep_interval(),
                shutdown.clone(),
            ))
        });

        let grace = self.config().service.shutdown_grace();
        let app = self
            .app()
            .into_make_service_with_connect_info::<SocketAddr>();

        let signal = shutdown.clone();
        let server = axum::serve(listener, app)
            .with_graceful_shutdown(async move { signal.cancelled().await })
            .into_future();

        supervise(server, sweeper, shutdown, grace).await?;
        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Log middleware configuration for debugging
    fn log_middleware_config(&self) {
        let config = self.config();
        tracing::info!("Middleware configuration:");
        tracing::info!("  - Panic recovery: {}", enabled(config.middleware.catch_panic));
        tracing::info!("  - Request ID tracking: enabled");
        tracing::info!("  - Sensitive header masking: enabled");
        tracing::info!(
            "  - Request body limit: {} bytes",
            config.middleware.max_body_bytes
        );
        tracing::info!("  - Compression: {}", enabled(config.middleware.compression));
        tracing::info!("  - CORS mode: {}", config.middleware.cors_mode);
        tracing::info!(
            "  - Request timeout: {} seconds",
            config.service.timeout_secs
        );
        if config.limiter.enabled {
            tracing::info!(
                "  - Rate limiting: {} req/sec per client (burst: {})",
                config.limiter.requests_per_second,
                config.limiter.burst
            );
        } else {
            tracing::info!("  - Rate limiting: disabled");
        }
    }

    /// Build CORS layer based on configuration
    fn build_cors_layer(&self) -> CorsLayer {
        let mode = &self.config().middleware.cors_mode;
        match mode.as_str() {
            "permissive" => {
                tracing::debug!("Enabling permissive CORS");
                CorsLayer::permissive()
            }
            "restrictive" => {
                tracing::debug!("Enabling restrictive CORS (default deny)");
                CorsLayer::new()
            }
            _ => {
                tracing::warn!("Unknown CORS mode: {}, defaulting to permissive", mode);
                CorsLayer::permissive()
            }
        }
    }
}

/// Drive `server` until it finishes or the grace period after `shutdown`
/// runs out, then stop the sweeper
///
/// The sweeper is stopped on every exit path, including a failed `server`.
async fn supervise<F>(
    server: F,
    sweeper: Option<JoinHandle<()>>,
    shutdown: CancellationToken,
    grace: Duration,
) -> std::io::Result<()>
where
    F: Future<Output = std::io::Result<()>>,
{
    tokio::pin!(server);

    let served = tokio::select! {
        result = &mut server => result,
        _ = async {
            shutdown.cancelled().await;
            tracing::info!(grace_secs = grace.as_secs(), "Shutdown signal received, draining requests");
            tokio::time::sleep(grace).await;
        } => {
            tracing::warn!("Grace period elapsed with requests still in flight");
            Ok(())
        }
    };

    // The sweeper exits on its own only once the token is cancelled.
    shutdown.cancel();
    if let Some(handle) = sweeper {
        if let Err(e) = handle.await {
            tracing::error!(error = %e, "Rate limiter sweeper failed");
        }
    }

    served
}

/// Abandon requests running longer than `timeout`, answering 408 with the
/// standard error body
fn with_timeout(app: Router, timeout: Duration) -> Router {
    app.layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(timeout_error))
            .timeout(timeout),
    )
}

async fn timeout_error(err: BoxError) -> ApiError {
    if err.is::<Elapsed>() {
        ApiError::request_timeout()
    } else {
        ApiError::internal(err)
    }
}

fn enabled(flag: bool) -> &'static str {
    if flag {
        "enabled"
    } else {
        "disabled"
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
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
        _ = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl+C), starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
