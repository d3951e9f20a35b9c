//! Demonstration server.
//!
//! Serves a tracked handler on `/` that simulates a variable amount of work
//! and returns a variable amount of data, plus chaff that mimics it:
//!
//! ```text
//!                  ┌───────────────────────────────┐
//!   GET /    ────► │  track ──► demo handler       │ ──► sample ──► Tracker
//!                  │                               │
//!   GET /chaff ──► │  chaff ◄── snapshot ◄──────── │ ◄──────────── Tracker
//!                  └───────────────────────────────┘
//! ```
//!
//! With a `detector_header` configured there is no separate chaff route:
//! requests to `/` that carry the header are answered with chaff.

pub mod config;

pub use config::{ResponderKind, ServerConfig, ServerConfigFile};

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::Router;
use tokio::net::TcpListener;

use crate::error::Result;
use crate::middleware::{self, ChaffGate};
use crate::profile::Tracker;
use crate::random::random_delay_ms;

/// Main server instance.
pub struct Server {
    config: Arc<ServerConfig>,
    tracker: Arc<Tracker>,
}

impl Server {
    /// Create a new server with the given configuration.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(config: ServerConfig) -> Result<Self> {
        config.validate()?;
        let tracker = Tracker::from_config(&config.tracker, Some(config.responder.build()))?;

        Ok(Self {
            config: Arc::new(config),
            tracker: Arc::new(tracker),
        })
    }

    /// Build the application router.
    pub fn router(&self) -> Result<Router> {
        let demo_routes = Router::new()
            .route("/", get(demo))
            .with_state(Arc::clone(&self.config));

        let router = match self.config.detector()? {
            Some(detector) => middleware::gated(
                demo_routes,
                ChaffGate::new(Arc::clone(&self.tracker), detector),
            ),
            None => middleware::tracked(demo_routes, Arc::clone(&self.tracker)).route(
                &self.config.chaff_path,
                any(middleware::chaff).with_state(Arc::clone(&self.tracker)),
            ),
        };
        Ok(router)
    }

    /// Start the server and run until Ctrl-C.
    pub async fn run(&self) -> Result<()> {
        let addr = format!("{}:{}", self.config.listen_addr, self.config.listen_port);
        let listener = TcpListener::bind(&addr).await?;

        tracing::info!("chaff server listening on {}", addr);
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on `listener` until `shutdown` resolves, then stop the tracker.
    pub async fn serve<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        axum::serve(listener, self.router()?)
            .with_graceful_shutdown(shutdown)
            .await?;

        self.tracker.shutdown().await?;
        tracing::info!("\n{}", self.tracker.metrics().format_report());
        Ok(())
    }

    /// Tracker behind this server.
    pub fn tracker(&self) -> &Arc<Tracker> {
        &self.tracker
    }
}

/// Simulated work: sleeps a random time, then reports it with that many
/// bytes of data.
async fn demo(State(config): State<Arc<ServerConfig>>) -> Response {
    let sleep_ms = random_delay_ms(
        config.demo_delay_min.as_millis() as u64,
        config.demo_delay_max.as_millis() as u64,
    );
    tokio::time::sleep(Duration::from_millis(sleep_ms)).await;

    let mut body = format!("Slept {} ms, some data below\n", sleep_ms);
    body.push_str(&"a".repeat(sleep_ms as usize));
    body.into_response()
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Unable to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
