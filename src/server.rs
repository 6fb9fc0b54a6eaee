//! HTTP front end.
//!
//! Endpoints:
//! - GET /audio - render a WAV from query parameters
//! - GET /      - static files (index.html) from the configured directory

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::dsp::oscillator::DEFAULT_SAMPLE_RATE;
use crate::error::SynthError;
use crate::params::{AudioQuery, RenderParams};

pub const DEFAULT_ADDR: &str = "127.0.0.1:5001";

/// Immutable server settings, shared by every request.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: String,
    /// Score rendered in melody mode.
    pub score_path: PathBuf,
    pub static_dir: PathBuf,
    pub sample_rate: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            addr: DEFAULT_ADDR.to_string(),
            score_path: PathBuf::from("scores/fur_elise.score"),
            static_dir: PathBuf::from("static"),
            sample_rate: DEFAULT_SAMPLE_RATE,
        }
    }
}

#[derive(Clone)]
struct AppState {
    config: Arc<ServerConfig>,
}

/// Build the application router.
pub fn router(config: Arc<ServerConfig>) -> Router {
    let static_dir = config.static_dir.clone();
    let mut app = Router::new()
        .route("/audio", get(audio))
        .with_state(AppState { config });

    if static_dir.is_dir() {
        app = app.fallback_service(ServeDir::new(static_dir));
    } else {
        warn!(dir = %static_dir.display(), "static dir not found, serving /audio only");
    }

    app.layer(TraceLayer::new_for_http())
}

/// Bind and serve until the process is stopped.
pub async fn serve(config: ServerConfig) -> Result<()> {
    let addr = parse_addr(&config.addr)?;
    let config = Arc::new(config);

    if !config.score_path.is_file() {
        warn!(path = %config.score_path.display(), "score file not found, melody mode will fail");
    }

    let app = router(config.clone());
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, score = %config.score_path.display(), "server started");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Parse an address, accepting the `:port` shorthand for all interfaces.
pub fn parse_addr(addr: &str) -> Result<SocketAddr> {
    let addr = if addr.starts_with(':') {
        format!("0.0.0.0{addr}")
    } else {
        addr.to_string()
    };
    Ok(addr.parse()?)
}

async fn audio(State(state): State<AppState>, Query(query): Query<AudioQuery>) -> Response {
    match render_audio(state.config, query).await {
        Ok(wav) => wav_response(wav),
        Err(e) => e.into_response(),
    }
}

async fn render_audio(config: Arc<ServerConfig>, query: AudioQuery) -> Result<Vec<u8>, SynthError> {
    let params = RenderParams::from_query(&query)?;
    info!(
        mode = %params.mode,
        waveform = %params.waveform,
        notes = params.notes.len(),
        "rendering audio"
    );

    tokio::task::spawn_blocking(move || params.render_wav(&config.score_path, config.sample_rate))
        .await
        .map_err(|e| SynthError::Io(std::io::Error::other(e)))?
}

fn wav_response(wav: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "audio/wav"),
            (header::CONTENT_DISPOSITION, "inline; filename=\"output.wav\""),
        ],
        wav,
    )
        .into_response()
}

/// Every failure is a server error. Bad parameters only log at a lower level.
impl IntoResponse for SynthError {
    fn into_response(self) -> Response {
        if self.is_client_error() {
            warn!(error = %self, "rejected request");
        } else {
            error!(error = %self, "render failed");
        }
        (StatusCode::INTERNAL_SERVER_ERROR, self.to_string()).into_response()
    }
}
