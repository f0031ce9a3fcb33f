//! Trace and span handles.
//!
//! Handles close themselves on drop, so a trace or span is closed exactly once
//! on every exit path. A [`SpanHandle`] borrows its parent, which keeps the
//! span tree properly nested: a child cannot outlive its parent and a trace
//! cannot be finished while one of its spans is still open.

use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use super::client::TracingClient;
use super::ids::{new_span_id, new_trace_id};
use super::info::{SpanInfo, TraceInfo};
use super::propagation::PropagationContext;

/// Finished span as handed to a [`SpanSink`](super::SpanSink).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpanEvent {
    pub trace_id: String,
    pub span_id: String,
    /// `None` only for the root span of a trace started without continuation.
    pub parent_id: Option<String>,
    pub name: String,
    pub service_name: String,
    /// Wall-clock start of the span.
    pub timestamp: DateTime<Utc>,
    pub duration_ms: f64,
    /// Trace-level fields merged with the span's own fields.
    pub fields: Map<String, Value>,
}

/// State shared by every span of one trace.
#[derive(Debug)]
struct TraceScope {
    trace_id: String,
    service_name: String,
    dataset: Option<String>,
    fields: Map<String, Value>,
}

#[derive(Debug)]
struct SpanCore {
    client: TracingClient,
    scope: Arc<TraceScope>,
    span_id: String,
    parent_id: Option<String>,
    name: String,
    fields: Map<String, Value>,
    started_at: DateTime<Utc>,
    timer: Instant,
    is_root: bool,
    closed: bool,
}

impl SpanCore {
    fn child(&self, info: SpanInfo) -> SpanCore {
        self.client.record_open(false);

        let mut fields = Map::new();
        fields.insert("operation".to_string(), Value::String(info.operation.clone()));
        fields.insert("planet".to_string(), Value::String(info.planet));

        SpanCore {
            client: self.client.clone(),
            scope: Arc::clone(&self.scope),
            span_id: new_span_id(),
            parent_id: Some(self.span_id.clone()),
            name: info.operation,
            fields,
            started_at: Utc::now(),
            timer: Instant::now(),
            is_root: false,
            closed: false,
        }
    }

    fn add_field(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    fn propagation(&self) -> PropagationContext {
        PropagationContext {
            trace_id: self.scope.trace_id.clone(),
            parent_span_id: self.span_id.clone(),
            dataset: self.scope.dataset.clone(),
            trace_fields: self.scope.fields.clone(),
        }
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        let mut fields = self.scope.fields.clone();
        fields.extend(std::mem::take(&mut self.fields));

        let event = SpanEvent {
            trace_id: self.scope.trace_id.clone(),
            span_id: self.span_id.clone(),
            parent_id: self.parent_id.clone(),
            name: self.name.clone(),
            service_name: self.scope.service_name.clone(),
            timestamp: self.started_at,
            duration_ms: self.timer.elapsed().as_secs_f64() * 1000.0,
            fields,
        };
        self.client.submit(self.is_root, event);
    }
}

/// Anything that can parent a nested span.
pub trait SpanParent {
    /// Open a child span tagged with `info`.
    fn start_span(&self, info: SpanInfo) -> SpanHandle<'_>;
}

/// Root span of one inbound request's trace.
#[derive(Debug)]
pub struct TraceHandle {
    core: SpanCore,
    continued: bool,
}

impl TraceHandle {
    pub(crate) fn open(
        client: TracingClient,
        info: TraceInfo,
        continuation: Option<PropagationContext>,
    ) -> Self {
        client.record_open(true);

        let mut trace_fields = Map::new();
        trace_fields.insert("application".to_string(), Value::String(info.application.clone()));
        trace_fields.insert("platform".to_string(), Value::String(info.platform));

        let continued = continuation.is_some();
        let (trace_id, parent_id) = match continuation {
            Some(context) => {
                // Caller fields first so our static tags win on conflict.
                let mut merged = context.trace_fields;
                merged.extend(trace_fields);
                trace_fields = merged;
                (context.trace_id, Some(context.parent_span_id))
            }
            None => (new_trace_id(), None),
        };

        let scope = Arc::new(TraceScope {
            trace_id,
            service_name: info.application,
            dataset: client.dataset().map(str::to_string),
            fields: trace_fields,
        });

        let mut fields = Map::new();
        fields.insert(
            "operation".to_string(),
            Value::String(info.operation_name.clone()),
        );

        Self {
            core: SpanCore {
                client,
                scope,
                span_id: new_span_id(),
                parent_id,
                name: info.operation_name,
                fields,
                started_at: Utc::now(),
                timer: Instant::now(),
                is_root: true,
                closed: false,
            },
            continued,
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.core.scope.trace_id
    }

    pub fn span_id(&self) -> &str {
        &self.core.span_id
    }

    /// Caller span this trace was continued from, if any.
    pub fn parent_id(&self) -> Option<&str> {
        self.core.parent_id.as_deref()
    }

    /// Whether the trace continues a caller's trace from a propagation header.
    pub fn is_continuation(&self) -> bool {
        self.continued
    }

    pub fn is_finished(&self) -> bool {
        self.core.closed
    }

    /// Add a field to the root span.
    pub fn add_field(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.core.add_field(key, value);
    }

    /// Header value that continues this trace from the root span.
    pub fn propagation_header(&self) -> String {
        self.core.propagation().to_header()
    }

    /// Close the trace. Calling this on a finished trace does nothing.
    pub fn finish(&mut self) {
        self.core.close();
    }
}

impl SpanParent for TraceHandle {
    fn start_span(&self, info: SpanInfo) -> SpanHandle<'_> {
        SpanHandle::new(self.core.child(info))
    }
}

impl Drop for TraceHandle {
    fn drop(&mut self) {
        self.core.close();
    }
}

/// Nested unit of work within a trace.
#[derive(Debug)]
pub struct SpanHandle<'p> {
    core: SpanCore,
    _parent: PhantomData<&'p ()>,
}

impl SpanHandle<'_> {
    fn new(core: SpanCore) -> Self {
        Self {
            core,
            _parent: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        &self.core.name
    }

    pub fn trace_id(&self) -> &str {
        &self.core.scope.trace_id
    }

    pub fn span_id(&self) -> &str {
        &self.core.span_id
    }

    pub fn parent_id(&self) -> &str {
        self.core.parent_id.as_deref().unwrap_or_default()
    }

    pub fn add_field(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.core.add_field(key, value);
    }

    /// Header value that continues the trace from this span.
    pub fn propagation_header(&self) -> String {
        self.core.propagation().to_header()
    }

    pub fn finish(mut self) {
        self.core.close();
    }
}

impl SpanParent for SpanHandle<'_> {
    fn start_span(&self, info: SpanInfo) -> SpanHandle<'_> {
        SpanHandle::new(self.core.child(info))
    }
}

impl Drop for SpanHandle<'_> {
    fn drop(&mut self) {
        self.core.close();
    }
}
