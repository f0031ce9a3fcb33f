//! Weatherary library entry points.
//!
//! This crate holds everything the handlers share: the trace context manager
//! that opens, continues and closes distributed traces, the weather responder
//! that answers for a planet inside nested spans, and the request handler that
//! composes the two. Lambda binaries and the HTTP service should only depend
//! on the items exported here instead of reimplementing behavior.
//!
//! # Testing Support
//!
//! The [`test_utils`] module provides in-memory span sinks and request
//! builders. Enable the `test-utils` feature to access it from dependent crates.

#![deny(warnings)]

pub mod config;
pub mod error;
pub mod handler;
pub mod trace;
pub mod weather;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{BackendConfig, HoneycombConfig, WeatherConfig};
pub use error::{Error, Result};
pub use handler::{
    handle_event, HandlerConfig, HandlerResponse, InboundRequest, RequestHandler, ResponseBody,
    MISSING_PLANET_MESSAGE,
};
pub use trace::{
    HeaderCarrier, LogSink, PropagationContext, ServiceIdentity, SpanEvent, SpanHandle, SpanInfo,
    SpanParent, SpanSink, TraceHandle, TraceInfo, TraceStats, TracingClient, TracingOptions,
    HANDLE_REQUEST, TRACE_HEADER,
};
pub use weather::{RngSource, WeatherCatalog, WeatherResponder, WeatherResult, DEFAULT_CATALOG};
