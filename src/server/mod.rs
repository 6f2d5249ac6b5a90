//! Web UI for converting a file and visually verifying the result.
//!
//! The server is the Rust rendition of the original single-page app: one
//! session, one conversion attempt at a time, a persistent map surface that
//! outlives every document it shows. State lives in [`AppState`]:
//!
//! - the [`AttemptTracker`] drives the Idle/Loading/Success/Error lifecycle
//!   and discards stale completions after a reset;
//! - the [`MapSurface`] is the process-wide visual resource — created once,
//!   layer-swapped on every successful render, never torn down while the
//!   server lives.

mod handlers;
mod page;
mod routes;

pub use routes::create_router;

use crate::config::ConversionConfig;
use crate::error::Kml2GeoError;
use crate::map::MapSurface;
use crate::state::AttemptTracker;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

/// Shared state for the verification server.
#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<AttemptTracker>,
    pub surface: Arc<Mutex<MapSurface>>,
    pub config: ConversionConfig,
}

impl AppState {
    pub fn new(config: ConversionConfig) -> Self {
        Self {
            tracker: Arc::new(AttemptTracker::new()),
            surface: Arc::new(Mutex::new(MapSurface::new())),
            config,
        }
    }
}

/// Start the verification server.
///
/// The converter is resolved eagerly so a missing credential fails at
/// startup instead of on the first upload.
pub async fn serve(config: ConversionConfig, host: &str, port: u16) -> Result<(), Kml2GeoError> {
    let mut config = config;
    let converter = crate::convert::resolve_converter(&config)?;
    config.converter = Some(converter);

    let state = AppState::new(config);
    let app = create_router(state);

    let addr: SocketAddr = format!("{host}:{port}")
        .parse()
        .map_err(|e| Kml2GeoError::InvalidConfig(format!("invalid listen address: {e}")))?;
    tracing::info!("Starting verification UI at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| Kml2GeoError::Internal(format!("failed to bind {addr}: {e}")))?;
    axum::serve(listener, app)
        .await
        .map_err(|e| Kml2GeoError::Internal(format!("server error: {e}")))?;

    Ok(())
}
