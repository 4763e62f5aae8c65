//! HTTP surface: a single multipart upload endpoint returning the redacted image.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::config::ServerConfig;
use crate::error::RedactError;
use crate::pipeline::Redactor;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub redactor: Arc<Redactor>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// An error response; never carries image data.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn internal() -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "Failed to redact image".to_string(),
        }
    }
}

impl From<RedactError> for ApiError {
    fn from(err: RedactError) -> Self {
        if err.is_client_error() {
            warn!(error = %err, "Rejected upload");
            ApiError::bad_request(err.to_string())
        } else {
            error!(error = ?anyhow::Error::from(err), "Redaction failed");
            ApiError::internal()
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

pub fn router(state: AppState, config: &ServerConfig) -> anyhow::Result<Router> {
    let origin: HeaderValue = config
        .allowed_origin
        .parse()
        .with_context(|| format!("Invalid CORS origin {}", config.allowed_origin))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any);

    Ok(Router::new()
        .route("/health", get(health_handler))
        .route("/upload", post(upload_handler))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Run the HTTP server until Ctrl+C or SIGTERM.
pub async fn run_server(redactor: Arc<Redactor>, config: ServerConfig) -> anyhow::Result<()> {
    let app = router(AppState { redactor }, &config)?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid address {}:{}", config.host, config.port))?;

    info!("Server listening on http://{}", addr);
    info!("  GET  /health - Health check");
    info!("  POST /upload - Redact an uploaded image");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Turns a client-supplied filename into something safe for a quoted header value.
fn header_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect()
}

async fn upload_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") && field.file_name().is_none() {
            continue;
        }
        let filename = field.file_name().map(str::to_owned);
        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read upload: {e}")))?;
        upload = Some((filename, data));
        break;
    }
    let (filename, data) = upload.ok_or_else(|| ApiError::bad_request("Missing `file` field"))?;
    info!(bytes = data.len(), "Received upload");

    let redactor = state.redactor.clone();
    let redacted = tokio::task::spawn_blocking(move || redactor.redact(&data, filename.as_deref()))
        .await
        .map_err(|e| {
            error!(error = %e, "Redaction task panicked");
            ApiError::internal()
        })??;

    let disposition = format!("attachment; filename=\"{}\"", header_filename(&redacted.filename));
    Ok((
        [
            (header::CONTENT_TYPE, redacted.media_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        redacted.bytes,
    )
        .into_response())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
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
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown...");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_filenames_are_sanitised() {
        assert_eq!(header_filename("id_masked.png"), "id_masked.png");
        assert_eq!(header_filename("a\"b\\c.png"), "a_b_c.png");
        assert_eq!(header_filename("पता_masked.png"), "____masked.png");
    }
}
