//! Lambda runtime initialization.
//!
//! The handler and its tracing client are built once at cold start, before
//! the first invocation, and shared by every invocation after that. Nothing
//! is held in a process-wide global: `main` owns the runtime and hands an
//! `Arc` of it to the service function.
//!
//! # Cold-Start Performance
//!
//! Initialization logs `init_ms` along with the configured span backend.

use std::time::Instant;

use serde_json::Value;
use tracing::info;

use weatherary_lib::{
    BackendConfig, Error as LibError, RequestHandler, TracingClient, WeatherConfig,
};

use crate::requests::inbound_from_payload;
use crate::response::ApiGatewayProxyResponse;

/// Error during runtime initialization.
#[derive(Debug, Clone)]
pub struct InitError {
    pub message: String,
}

impl std::fmt::Display for InitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Lambda initialization failed: {}", self.message)
    }
}

impl std::error::Error for InitError {}

impl From<LibError> for InitError {
    fn from(err: LibError) -> Self {
        Self {
            message: err.to_string(),
        }
    }
}

/// Function name and version as reported by the Lambda environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionInfo {
    pub name: Option<String>,
    pub version: Option<String>,
}

impl FunctionInfo {
    /// Read `AWS_LAMBDA_FUNCTION_NAME` and `AWS_LAMBDA_FUNCTION_VERSION`.
    pub fn from_env() -> Self {
        Self {
            name: std::env::var("AWS_LAMBDA_FUNCTION_NAME").ok(),
            version: std::env::var("AWS_LAMBDA_FUNCTION_VERSION").ok(),
        }
    }
}

/// Initialized Lambda runtime: one handler, one tracing client.
#[derive(Debug, Clone)]
pub struct LambdaRuntime {
    handler: RequestHandler,
    function: FunctionInfo,
}

impl LambdaRuntime {
    /// Build the tracing client for the configured backend and the handler
    /// around it. Must be called from within a Tokio runtime.
    pub fn init(config: &WeatherConfig) -> Result<Self, InitError> {
        let start = Instant::now();

        let tracing = TracingClient::from_backend(&config.backend, config.tracing.clone())?;
        let runtime = Self::with_tracing(config, tracing).with_function(FunctionInfo::from_env());

        info!(
            init_ms = start.elapsed().as_millis() as u64,
            application = %config.identity.application,
            backend = backend_name(&config.backend),
            require_input_planet = config.require_input_planet,
            catalog_size = runtime.handler.catalog().phrases().len(),
            "Lambda runtime initialized"
        );

        Ok(runtime)
    }

    /// Build around an existing tracing client.
    pub fn with_tracing(config: &WeatherConfig, tracing: TracingClient) -> Self {
        Self {
            handler: RequestHandler::from_config(config, tracing),
            function: FunctionInfo::default(),
        }
    }

    pub fn with_function(mut self, function: FunctionInfo) -> Self {
        self.function = function;
        self
    }

    pub fn handler(&self) -> &RequestHandler {
        &self.handler
    }

    pub fn tracing(&self) -> &TracingClient {
        self.handler.tracing()
    }

    /// Handle one API Gateway or direct-invoke payload.
    ///
    /// Span export is fire-and-forget; this never waits on the backend.
    pub fn handle_http(&self, request_id: &str, payload: Value) -> ApiGatewayProxyResponse {
        let mut request = inbound_from_payload(payload).with_attribute("request_id", request_id);
        if let Some(name) = &self.function.name {
            request = request.with_attribute("function_name", name.as_str());
        }
        if let Some(version) = &self.function.version {
            request = request.with_attribute("function_version", version.as_str());
        }

        let response = self.handler.handle(&request);

        info!(
            request_id = %request_id,
            status = response.status,
            "request handled"
        );

        response.into()
    }
}

fn backend_name(backend: &BackendConfig) -> &'static str {
    match backend {
        BackendConfig::Log => "log",
        BackendConfig::Honeycomb(_) => "honeycomb",
    }
}
