//! Distributed trace lifecycle around request handling.
//!
//! A [`TracingClient`] is built once at process start and handed to whatever
//! serves requests. Each request opens exactly one [`TraceHandle`] (continuing
//! the caller's trace when a valid [`TRACE_HEADER`] is present) and nested
//! [`SpanHandle`]s for internal steps. Closing a span never blocks: the
//! finished [`SpanEvent`] is queued for a background exporter that feeds a
//! [`SpanSink`].
//!
//! ```text
//! handleRequest (TraceHandle)
//! └── getWeather (SpanHandle)
//!     ├── getDistance
//!     └── contactWeatherStation
//! ```

mod client;
mod ids;
mod info;
mod propagation;
mod sink;
mod span;

pub use client::{TraceStats, TracingClient, TracingOptions};
pub use ids::{new_span_id, new_trace_id};
pub use info::{ServiceIdentity, SpanInfo, TraceInfo, HANDLE_REQUEST};
pub use propagation::{HeaderCarrier, PropagationContext, TRACE_HEADER};
pub use sink::{HoneycombSink, LogSink, SpanSink};
pub use span::{SpanEvent, SpanHandle, SpanParent, TraceHandle};
