//! Tracing client and its background exporter.
//!
//! The client owns a bounded queue feeding one exporter task. Closing a span
//! only ever `try_send`s onto that queue; when the queue is full or the
//! exporter is gone the event is dropped and counted, never surfaced.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, warn};

use super::info::TraceInfo;
use super::propagation::{HeaderCarrier, PropagationContext};
use super::sink::{HoneycombSink, LogSink, SpanSink};
use super::span::{SpanEvent, TraceHandle};
use crate::config::BackendConfig;
use crate::error::Result;

/// Exporter tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracingOptions {
    /// Maximum number of finished spans waiting for export.
    pub queue_capacity: usize,
    /// Maximum number of spans handed to the sink in one call.
    pub batch_size: usize,
    /// Dataset advertised in outgoing propagation headers.
    pub dataset: Option<String>,
}

impl Default for TracingOptions {
    fn default() -> Self {
        Self {
            queue_capacity: 1024,
            batch_size: 50,
            dataset: None,
        }
    }
}

/// Point-in-time counters for the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TraceStats {
    pub traces_started: u64,
    pub traces_finished: u64,
    pub spans_started: u64,
    pub spans_finished: u64,
    /// Events discarded because the queue was full or closed.
    pub events_dropped: u64,
    /// Events the sink accepted.
    pub events_exported: u64,
    /// Batches the sink rejected.
    pub export_failures: u64,
}

#[derive(Debug, Default)]
struct Counters {
    traces_started: AtomicU64,
    traces_finished: AtomicU64,
    spans_started: AtomicU64,
    spans_finished: AtomicU64,
    events_dropped: AtomicU64,
    events_exported: AtomicU64,
    export_failures: AtomicU64,
}

impl Counters {
    fn snapshot(&self) -> TraceStats {
        TraceStats {
            traces_started: self.traces_started.load(Ordering::Relaxed),
            traces_finished: self.traces_finished.load(Ordering::Relaxed),
            spans_started: self.spans_started.load(Ordering::Relaxed),
            spans_finished: self.spans_finished.load(Ordering::Relaxed),
            events_dropped: self.events_dropped.load(Ordering::Relaxed),
            events_exported: self.events_exported.load(Ordering::Relaxed),
            export_failures: self.export_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug)]
enum Command {
    Export(SpanEvent),
    Flush(oneshot::Sender<()>),
}

#[derive(Debug)]
struct Inner {
    queue: Option<mpsc::Sender<Command>>,
    counters: Arc<Counters>,
    dataset: Option<String>,
}

/// Handle to the tracing backend.
///
/// Cheap to clone; all clones share one queue and one set of counters. The
/// exporter task stops once the last clone is dropped.
#[derive(Debug, Clone)]
pub struct TracingClient {
    inner: Arc<Inner>,
}

impl TracingClient {
    /// Start an exporter task draining into `sink`.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn<S: SpanSink>(sink: S, options: TracingOptions) -> Self {
        let (tx, rx) = mpsc::channel(options.queue_capacity.max(1));
        let counters = Arc::new(Counters::default());

        tokio::spawn(run_exporter(
            rx,
            sink,
            options.batch_size.max(1),
            Arc::clone(&counters),
        ));

        Self {
            inner: Arc::new(Inner {
                queue: Some(tx),
                counters,
                dataset: options.dataset,
            }),
        }
    }

    /// Build the client for a configured backend.
    pub fn from_backend(backend: &BackendConfig, mut options: TracingOptions) -> Result<Self> {
        match backend {
            BackendConfig::Log => Ok(Self::spawn(LogSink, options)),
            BackendConfig::Honeycomb(config) => {
                let sink = HoneycombSink::new(config)?;
                if options.dataset.is_none() {
                    options.dataset = Some(config.dataset.clone());
                }
                Ok(Self::spawn(sink, options))
            }
        }
    }

    /// A client that keeps counters but discards every span.
    pub fn disabled() -> Self {
        Self {
            inner: Arc::new(Inner {
                queue: None,
                counters: Arc::new(Counters::default()),
                dataset: None,
            }),
        }
    }

    /// Open the trace for one inbound request.
    ///
    /// Continues the caller's trace when `carrier` holds a decodable
    /// propagation header, otherwise starts a fresh one.
    pub fn start_trace(&self, carrier: &impl HeaderCarrier, info: TraceInfo) -> TraceHandle {
        let continuation = match PropagationContext::extract(carrier) {
            Some(Ok(context)) => Some(context),
            Some(Err(e)) => {
                debug!(error = %e, "ignoring malformed trace header, starting a fresh trace");
                None
            }
            None => None,
        };

        TraceHandle::open(self.clone(), info, continuation)
    }

    /// Close `handle`. Safe to call on an already finished trace.
    pub fn finish_trace(&self, handle: &mut TraceHandle) {
        handle.finish();
    }

    pub fn stats(&self) -> TraceStats {
        self.inner.counters.snapshot()
    }

    /// Wait until every span queued before this call reached the sink.
    ///
    /// Best effort: returns `false` if `timeout` elapsed or the exporter is
    /// gone. Returns `true` immediately for a disabled client.
    pub async fn flush(&self, timeout: Duration) -> bool {
        let Some(queue) = &self.inner.queue else {
            return true;
        };

        let (ack, done) = oneshot::channel();
        let wait = async {
            queue.send(Command::Flush(ack)).await.ok()?;
            done.await.ok()
        };

        matches!(tokio::time::timeout(timeout, wait).await, Ok(Some(())))
    }

    pub(crate) fn dataset(&self) -> Option<&str> {
        self.inner.dataset.as_deref()
    }

    pub(crate) fn record_open(&self, is_root: bool) {
        let counters = &self.inner.counters;
        if is_root {
            counters.traces_started.fetch_add(1, Ordering::Relaxed);
        } else {
            counters.spans_started.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn submit(&self, is_root: bool, event: SpanEvent) {
        let counters = &self.inner.counters;
        if is_root {
            counters.traces_finished.fetch_add(1, Ordering::Relaxed);
        } else {
            counters.spans_finished.fetch_add(1, Ordering::Relaxed);
        }

        let Some(queue) = &self.inner.queue else {
            return;
        };

        if let Err(e) = queue.try_send(Command::Export(event)) {
            counters.events_dropped.fetch_add(1, Ordering::Relaxed);
            let reason = match e {
                mpsc::error::TrySendError::Full(_) => "queue full",
                mpsc::error::TrySendError::Closed(_) => "exporter stopped",
            };
            debug!(reason, "dropping span event");
        }
    }
}

async fn run_exporter<S: SpanSink>(
    mut rx: mpsc::Receiver<Command>,
    mut sink: S,
    batch_size: usize,
    counters: Arc<Counters>,
) {
    let mut batch = Vec::with_capacity(batch_size);
    let mut acks = Vec::new();

    while let Some(command) = rx.recv().await {
        collect(command, &mut batch, &mut acks);
        while batch.len() < batch_size {
            match rx.try_recv() {
                Ok(command) => collect(command, &mut batch, &mut acks),
                Err(_) => break,
            }
        }

        if !batch.is_empty() {
            export_batch(&mut sink, std::mem::take(&mut batch), &counters).await;
        }
        for ack in acks.drain(..) {
            let _ = ack.send(());
        }
    }

    debug!("span exporter stopped");
}

fn collect(command: Command, batch: &mut Vec<SpanEvent>, acks: &mut Vec<oneshot::Sender<()>>) {
    match command {
        Command::Export(event) => batch.push(event),
        Command::Flush(ack) => acks.push(ack),
    }
}

async fn export_batch<S: SpanSink>(sink: &mut S, batch: Vec<SpanEvent>, counters: &Counters) {
    let size = batch.len() as u64;
    match sink.export(batch).await {
        Ok(()) => {
            counters.events_exported.fetch_add(size, Ordering::Relaxed);
        }
        Err(e) => {
            counters.export_failures.fetch_add(1, Ordering::Relaxed);
            warn!(error = %e, events = size, "span export failed, dropping batch");
        }
    }
}
