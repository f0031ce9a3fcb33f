//! Test utilities for handler and exporter testing.
//!
//! These utilities are only available in test builds or with the
//! `test-utils` feature:
//!
//! ```ignore
//! use weatherary_lib::test_utils::{memory_client, planet_request};
//!
//! #[tokio::test]
//! async fn test_handler() {
//!     let (client, sink) = memory_client();
//!     let request = planet_request("mars");
//!     // ... run the handler, then `client.flush(..)` and inspect `sink.events()`
//! }
//! ```

use std::sync::{Arc, Mutex};

use serde_json::json;
use tokio::sync::Notify;

use crate::error::{Error, Result};
use crate::handler::InboundRequest;
use crate::trace::{SpanEvent, SpanSink, TracingClient, TracingOptions, TRACE_HEADER};

/// Sink that keeps every exported span in memory.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    events: Arc<Mutex<Vec<SpanEvent>>>,
    batches: Arc<Mutex<Vec<usize>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every span exported so far, in export order.
    pub fn events(&self) -> Vec<SpanEvent> {
        self.events.lock().expect("memory sink poisoned").clone()
    }

    /// Size of each batch the exporter delivered.
    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().expect("memory sink poisoned").clone()
    }

    /// Spans exported for one trace.
    pub fn trace(&self, trace_id: &str) -> Vec<SpanEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.trace_id == trace_id)
            .collect()
    }
}

impl SpanSink for MemorySink {
    async fn export(&mut self, batch: Vec<SpanEvent>) -> Result<()> {
        self.batches
            .lock()
            .expect("memory sink poisoned")
            .push(batch.len());
        self.events
            .lock()
            .expect("memory sink poisoned")
            .extend(batch);
        Ok(())
    }
}

/// Sink whose backend is always unreachable.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingSink;

impl SpanSink for FailingSink {
    async fn export(&mut self, _batch: Vec<SpanEvent>) -> Result<()> {
        Err(Error::Export {
            status: 503,
            body: "collector unavailable".to_string(),
        })
    }
}

/// Sink that blocks every export until [`StalledSink::release`] is called.
#[derive(Debug, Clone, Default)]
pub struct StalledSink {
    release: Arc<Notify>,
}

impl StalledSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Let one pending (or the next) export complete.
    pub fn release(&self) {
        self.release.notify_one();
    }
}

impl SpanSink for StalledSink {
    async fn export(&mut self, _batch: Vec<SpanEvent>) -> Result<()> {
        let release = Arc::clone(&self.release);
        release.notified().await;
        Ok(())
    }
}

/// Client exporting into a fresh [`MemorySink`]. Requires a Tokio runtime.
pub fn memory_client() -> (TracingClient, MemorySink) {
    let sink = MemorySink::new();
    let client = TracingClient::spawn(sink.clone(), TracingOptions::default());
    (client, sink)
}

/// Request whose JSON body names `planet`.
pub fn planet_request(planet: &str) -> InboundRequest {
    InboundRequest::new().with_body(json!({ "planet": planet }).to_string())
}

/// Request with no body and no headers.
pub fn empty_request() -> InboundRequest {
    InboundRequest::new()
}

/// Propagation header continuing `trace_id` at `parent_id`.
pub fn trace_header(trace_id: &str, parent_id: &str) -> (String, String) {
    (
        TRACE_HEADER.to_string(),
        format!("1;trace_id={trace_id},parent_id={parent_id}"),
    )
}
