//! HTTP surface of the relay.
//!
//! ## Endpoints
//!
//! - `GET /health`: liveness probe
//! - `POST /api/analyze-task`: suggested time slots for one task
//! - `POST /api/monthly-report`: role statistics plus a model narrative
//!
//! All responses carry a permissive CORS header; `OPTIONS` preflights are
//! answered directly with `204 No Content`.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::{Instrument, info};
use uuid::Uuid;

use crate::config::ServerConfig;
use crate::error::{Result, SparkError};
use crate::service::{AnalyzeTaskRequest, MonthlyReportRequest, RelayService};

/// Response header naming where analysis suggestions came from.
pub const SUGGESTION_SOURCE_HEADER: &str = "x-suggestion-source";

/// Error body for an analysis whose model call failed.
const ANALYSIS_FAILED: &str = "Failed to analyze task";

/// Error body for any failed report.
const REPORT_FAILED: &str = "Failed to generate report";

const ALLOWED_METHODS: &str = "GET, POST, OPTIONS";

/// Build the relay router around a shared service.
pub fn router(service: Arc<RelayService>) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route("/api/analyze-task", post(handle_analyze_task))
        .route("/api/monthly-report", post(handle_monthly_report))
        .layer(middleware::from_fn(cors))
        .with_state(service)
}

// ---------------------------------------------------------------------------
// RelayServer
// ---------------------------------------------------------------------------

/// The relay running in a background tokio task.
pub struct RelayServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl RelayServer {
    /// Start serving in the background.
    ///
    /// Binds to `{config.host}:{config.port}` (use port `0` for auto-assign).
    ///
    /// # Errors
    ///
    /// Returns an error if the TCP listener cannot bind.
    pub async fn start(service: Arc<RelayService>, config: &ServerConfig) -> Result<Self> {
        let listener = bind(config).await?;
        let addr = listener
            .local_addr()
            .map_err(|e| SparkError::Server(format!("failed to get local addr: {e}")))?;

        info!("relay listening on http://{addr}");

        let app = router(service);
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("relay server error: {e}");
            }
        });

        Ok(Self { addr, handle })
    }

    /// Returns the address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Returns the port the server is listening on.
    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Abort the server task.
    pub fn shutdown(&self) {
        self.handle.abort();
    }
}

impl Drop for RelayServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Serve in the foreground until Ctrl-C.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails.
pub async fn serve(service: Arc<RelayService>, config: &ServerConfig) -> Result<()> {
    let listener = bind(config).await?;
    if let Ok(addr) = listener.local_addr() {
        info!("relay listening on http://{addr}");
    }
    axum::serve(listener, router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("relay stopped");
    Ok(())
}

async fn bind(config: &ServerConfig) -> Result<TcpListener> {
    let bind_addr = format!("{}:{}", config.host, config.port);
    TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| SparkError::Server(format!("bind to {bind_addr} failed: {e}")))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("failed to listen for ctrl-c: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

// ---------------------------------------------------------------------------
// Middleware
// ---------------------------------------------------------------------------

/// Allow any origin; answer preflights without reaching a handler.
async fn cors(request: Request, next: Next) -> Response {
    let preflight = request.method() == Method::OPTIONS;
    let requested_headers = request
        .headers()
        .get(header::ACCESS_CONTROL_REQUEST_HEADERS)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("content-type"));

    let mut response = if preflight {
        StatusCode::NO_CONTENT.into_response()
    } else {
        next.run(request).await
    };

    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    if preflight {
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, requested_headers);
    }
    response
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

/// Map a body extraction failure to a JSON error.
///
/// Syntax and shape problems are client errors (400); other rejections
/// (wrong content type, oversized body) keep their own status.
fn rejection_response(rejection: &JsonRejection) -> Response {
    let status = match rejection {
        JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_) => {
            StatusCode::BAD_REQUEST
        }
        other => other.status(),
    };
    error_body(status, &rejection.body_text())
}

// ---------------------------------------------------------------------------
// Route handlers
// ---------------------------------------------------------------------------

/// `GET /health`
async fn handle_health() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "message": "Spark API server is running",
    }))
}

/// `POST /api/analyze-task`
async fn handle_analyze_task(
    State(service): State<Arc<RelayService>>,
    body: std::result::Result<Json<AnalyzeTaskRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(&rejection),
    };

    let span = tracing::info_span!("analyze_task", request_id = %Uuid::new_v4());
    let outcome = match service.analyze_task(&request).instrument(span).await {
        Ok(outcome) => outcome,
        Err(SparkError::Validation(message)) => {
            return error_body(StatusCode::BAD_REQUEST, &message);
        }
        Err(e) => {
            tracing::error!("task analysis failed: {e}");
            return error_body(StatusCode::INTERNAL_SERVER_ERROR, ANALYSIS_FAILED);
        }
    };

    let source = outcome.source.as_str();
    let (status, body) = match outcome.remote_error {
        None => (
            StatusCode::OK,
            json!({ "suggestions": outcome.suggestions }),
        ),
        Some(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({
                "error": ANALYSIS_FAILED,
                "fallback": true,
                "suggestions": outcome.suggestions,
            }),
        ),
    };
    (status, [(SUGGESTION_SOURCE_HEADER, source)], Json(body)).into_response()
}

/// `POST /api/monthly-report`
async fn handle_monthly_report(
    State(service): State<Arc<RelayService>>,
    body: std::result::Result<Json<MonthlyReportRequest>, JsonRejection>,
) -> Response {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => return rejection_response(&rejection),
    };

    let span = tracing::info_span!("monthly_report", request_id = %Uuid::new_v4());
    match service.monthly_report(&request).instrument(span).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(SparkError::Validation(message)) => error_body(StatusCode::BAD_REQUEST, &message),
        Err(e) => {
            tracing::error!("monthly report failed: {e}");
            error_body(StatusCode::INTERNAL_SERVER_ERROR, REPORT_FAILED)
        }
    }
}
