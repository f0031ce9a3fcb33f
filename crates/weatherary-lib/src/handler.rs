//! Request Handler.
//!
//! Composes the trace context manager and the weather responder into the
//! per-invocation state machine:
//!
//! ```text
//! Start → Trace-Open → Validate ─┬→ Compute → Trace-Close → Respond-OK (200)
//!                                └→ Trace-Close → Reject (400)
//! ```
//!
//! Handler variants (fixed planet vs. caller-supplied planet) are expressed
//! through [`HandlerConfig`] rather than separate code paths.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::info;

use crate::config::WeatherConfig;
use crate::trace::{
    HeaderCarrier, ServiceIdentity, TraceHandle, TracingClient, HANDLE_REQUEST,
};
use crate::weather::{RngSource, WeatherCatalog, WeatherResponder, WeatherResult};

/// Body of the 400 response when a required planet is missing.
pub const MISSING_PLANET_MESSAGE: &str = "Please pass a planet in the request body";

/// Transport-independent view of an inbound HTTP-style request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InboundRequest {
    headers: HashMap<String, String>,
    body: Option<String>,
    attributes: Map<String, Value>,
}

#[derive(Deserialize)]
struct PlanetBody {
    #[serde(default)]
    planet: Option<String>,
}

impl InboundRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header. Names are stored lowercased.
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Attach a request property recorded on the root span (e.g. `function_name`).
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn headers(&self) -> &HashMap<String, String> {
        &self.headers
    }

    pub fn body(&self) -> Option<&str> {
        self.body.as_deref()
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Planet named in the JSON body.
    ///
    /// `None` when there is no body, the body is not a JSON object, or
    /// `planet` is missing, not a string, or empty. Any other string is
    /// accepted as-is, whitespace included.
    pub fn planet(&self) -> Option<String> {
        let body: PlanetBody = serde_json::from_str(self.body.as_deref()?).ok()?;
        body.planet.filter(|planet| !planet.is_empty())
    }
}

impl HeaderCarrier for InboundRequest {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.header(name)
    }
}

/// Response payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseBody {
    Json(WeatherResult),
    Text(String),
}

/// Status and body produced by one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerResponse {
    pub status: u16,
    pub body: ResponseBody,
}

impl HandlerResponse {
    pub fn ok(result: WeatherResult) -> Self {
        Self {
            status: 200,
            body: ResponseBody::Json(result),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: 400,
            body: ResponseBody::Text(message.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn weather(&self) -> Option<&WeatherResult> {
        match &self.body {
            ResponseBody::Json(result) => Some(result),
            ResponseBody::Text(_) => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self.body {
            ResponseBody::Json(_) => "application/json",
            ResponseBody::Text(_) => "text/plain; charset=utf-8",
        }
    }

    /// Serialized body as sent on the wire.
    pub fn body_string(&self) -> String {
        match &self.body {
            ResponseBody::Json(result) => json!({
                "planet": result.planet,
                "weather": result.weather,
            })
            .to_string(),
            ResponseBody::Text(text) => text.clone(),
        }
    }
}

/// Variant settings for [`RequestHandler`].
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    /// Reject requests whose body does not name a planet.
    pub require_input_planet: bool,
    /// Planet answered regardless of input, when the body is not required.
    pub fixed_planet: Option<String>,
    pub catalog: WeatherCatalog,
    pub rng: RngSource,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            require_input_planet: true,
            fixed_planet: None,
            catalog: WeatherCatalog::default(),
            rng: RngSource::Entropy,
        }
    }
}

/// Single configurable handler for every deployed variant.
#[derive(Debug, Clone)]
pub struct RequestHandler {
    tracing: TracingClient,
    identity: ServiceIdentity,
    require_input_planet: bool,
    fixed_planet: Option<String>,
    rng: RngSource,
    responder: WeatherResponder,
}

impl RequestHandler {
    pub fn new(tracing: TracingClient, identity: ServiceIdentity, config: HandlerConfig) -> Self {
        Self {
            tracing,
            identity,
            require_input_planet: config.require_input_planet,
            fixed_planet: config.fixed_planet,
            rng: config.rng,
            responder: WeatherResponder::new(config.catalog),
        }
    }

    pub fn from_config(config: &WeatherConfig, tracing: TracingClient) -> Self {
        Self::new(tracing, config.identity.clone(), config.handler_config())
    }

    pub fn tracing(&self) -> &TracingClient {
        &self.tracing
    }

    pub fn catalog(&self) -> &WeatherCatalog {
        self.responder.catalog()
    }

    /// Handle one request. The trace is closed on both the success and the
    /// rejection path before the response is returned.
    pub fn handle(&self, request: &InboundRequest) -> HandlerResponse {
        let mut trace = self
            .tracing
            .start_trace(request, self.identity.trace_info(HANDLE_REQUEST));
        for (key, value) in request.attributes() {
            trace.add_field(key.clone(), value.clone());
        }

        let response = self.respond(&trace, request);

        trace.add_field("response.status_code", response.status);
        self.tracing.finish_trace(&mut trace);
        response
    }

    fn respond(&self, trace: &TraceHandle, request: &InboundRequest) -> HandlerResponse {
        let Some(planet) = self.resolve_planet(request) else {
            info!(
                trace_id = %trace.trace_id(),
                "rejecting request without a planet"
            );
            return HandlerResponse::bad_request(MISSING_PLANET_MESSAGE);
        };

        let weather = self
            .responder
            .get_weather(trace, &planet, &mut self.rng.rng());

        info!(
            trace_id = %trace.trace_id(),
            continued = trace.is_continuation(),
            planet = %planet,
            weather = %weather,
            "weather computed"
        );

        HandlerResponse::ok(WeatherResult { planet, weather })
    }

    fn resolve_planet(&self, request: &InboundRequest) -> Option<String> {
        if self.require_input_planet {
            return request.planet();
        }
        Some(
            self.fixed_planet
                .clone()
                .or_else(|| request.planet())
                .unwrap_or_default(),
        )
    }
}

/// Entry point for background (non-HTTP) triggers.
///
/// Does no work and invokes `on_complete` exactly once before returning.
pub fn handle_event<E: ?Sized, F: FnOnce()>(_event: &E, on_complete: F) {
    on_complete();
}
