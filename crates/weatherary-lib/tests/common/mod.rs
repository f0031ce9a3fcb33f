//! Common test utilities for integration tests.
//!
//! Provides a recording span sink and a handler wired to it, so tests can
//! assert on the spans a request actually exported.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use weatherary_lib::{
    HandlerConfig, RequestHandler, Result, ServiceIdentity, SpanEvent, SpanSink, TracingClient,
    TracingOptions,
};

/// Span sink that records every exported span.
#[derive(Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<SpanEvent>>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<SpanEvent> {
        self.events.lock().expect("recording sink poisoned").clone()
    }

    #[allow(dead_code)]
    pub fn span(&self, name: &str) -> SpanEvent {
        self.events()
            .into_iter()
            .find(|event| event.name == name)
            .unwrap_or_else(|| panic!("no span named {name}"))
    }
}

impl SpanSink for RecordingSink {
    async fn export(&mut self, batch: Vec<SpanEvent>) -> Result<()> {
        self.events
            .lock()
            .expect("recording sink poisoned")
            .extend(batch);
        Ok(())
    }
}

/// Handler exporting into a fresh [`RecordingSink`]. Requires a Tokio runtime.
pub fn recorded_handler(config: HandlerConfig) -> (RequestHandler, RecordingSink) {
    let sink = RecordingSink::default();
    let client = TracingClient::spawn(sink.clone(), TracingOptions::default());
    let handler = RequestHandler::new(
        client,
        ServiceIdentity::new("intergalactic-weatherary", "aws"),
        config,
    );
    (handler, sink)
}

/// Flush the handler's exporter, failing the test if it does not drain.
pub async fn drain(handler: &RequestHandler) {
    assert!(
        handler.tracing().flush(Duration::from_secs(2)).await,
        "span exporter should drain"
    );
}
