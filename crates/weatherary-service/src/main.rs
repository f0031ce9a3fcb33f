//! Intergalactic weatherary HTTP microservice.
//!
//! Runs the same traced request handler as the Lambda functions behind a
//! plain HTTP listener, for local development and container deployments.
//!
//! # Endpoints
//!
//! - `POST /api/v1/weather` - Weather for the planet named in the JSON body
//! - `GET /health/live` - Liveness probe
//!
//! # Configuration
//!
//! - `SERVICE_PORT` - HTTP port (default: 8080)
//! - `RUST_LOG` - Log level (default: info)
//! - `LOG_FORMAT` - Log format: json (default) or text
//! - `WEATHERARY_*` / `HONEYCOMB_*` - handler and span backend settings

mod logging;

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use weatherary_lib::{InboundRequest, RequestHandler, TracingClient, WeatherConfig};

use crate::logging::{init_logging, LoggingConfig};

/// Longest wait for queued spans at shutdown.
const SHUTDOWN_FLUSH: Duration = Duration::from_secs(2);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let logging_config = LoggingConfig::from_env();
    init_logging(&logging_config);

    let config = WeatherConfig::from_env().map_err(|e| {
        error!(error = %e, "invalid configuration");
        e
    })?;
    let port: u16 = env::var("SERVICE_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    let tracing = TracingClient::from_backend(&config.backend, config.tracing.clone())?;
    let handler = RequestHandler::from_config(&config, tracing.clone());

    info!(
        port = port,
        application = %config.identity.application,
        require_input_planet = config.require_input_planet,
        "starting weather service"
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(addr = %addr, "listening on");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app(handler))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    if !tracing.flush(SHUTDOWN_FLUSH).await {
        warn!("span queue not drained before shutdown");
    }
    let stats = tracing.stats();
    info!(
        traces = stats.traces_finished,
        exported = stats.events_exported,
        dropped = stats.events_dropped,
        "weather service stopped"
    );

    Ok(())
}

fn app(handler: RequestHandler) -> Router {
    Router::new()
        .route("/api/v1/weather", post(weather_handler))
        .route("/health/live", get(health_live))
        .layer(TraceLayer::new_for_http())
        .with_state(handler)
}

/// Handle POST /api/v1/weather requests.
async fn weather_handler(
    State(handler): State<RequestHandler>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let mut request = InboundRequest::new();
    for (name, value) in &headers {
        // Non-UTF-8 header values cannot carry a trace header
        if let Ok(value) = value.to_str() {
            request = request.with_header(name.as_str(), value);
        }
    }
    // A body that is not UTF-8 cannot name a planet; treat it as absent
    match String::from_utf8(body.to_vec()) {
        Ok(body) if !body.is_empty() => request = request.with_body(body),
        Ok(_) => {}
        Err(e) => warn!(error = %e, "request body is not UTF-8, ignoring body"),
    }

    let response = handler.handle(&request);
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    (
        status,
        [(header::CONTENT_TYPE, response.content_type())],
        response.body_string(),
    )
}

async fn health_live() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received");
}
