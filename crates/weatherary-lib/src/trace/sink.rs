//! Span sinks: where finished spans go.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use chrono::SecondsFormat;
use serde_json::{json, Value};
use tracing::info;

use super::span::SpanEvent;
use crate::config::HoneycombConfig;
use crate::error::{Error, Result};

/// Destination for batches of finished spans.
///
/// Called only from the exporter task, one batch at a time. Errors are
/// logged and counted by the exporter; the batch is not retried.
pub trait SpanSink: Send + 'static {
    fn export(&mut self, batch: Vec<SpanEvent>) -> impl Future<Output = Result<()>> + Send;
}

/// Writes each span as a structured log line on target `weatherary::spans`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl SpanSink for LogSink {
    async fn export(&mut self, batch: Vec<SpanEvent>) -> Result<()> {
        for event in batch {
            let fields = Value::Object(event.fields);
            info!(
                target: "weatherary::spans",
                trace_id = %event.trace_id,
                span_id = %event.span_id,
                parent_id = event.parent_id.as_deref().unwrap_or(""),
                name = %event.name,
                service_name = %event.service_name,
                duration_ms = event.duration_ms,
                fields = %fields,
                "span finished"
            );
        }
        Ok(())
    }
}

/// Sends spans to the Honeycomb batch events API.
pub struct HoneycombSink {
    client: reqwest::Client,
    url: String,
    write_key: String,
}

impl HoneycombSink {
    pub fn new(config: &HoneycombConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(5))
            .user_agent(concat!("weatherary/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            url: format!(
                "{}/1/batch/{}",
                config.api_host.trim_end_matches('/'),
                config.dataset
            ),
            write_key: config.write_key.clone(),
        })
    }

    pub fn batch_url(&self) -> &str {
        &self.url
    }
}

impl fmt::Debug for HoneycombSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HoneycombSink")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl SpanSink for HoneycombSink {
    async fn export(&mut self, batch: Vec<SpanEvent>) -> Result<()> {
        let events: Vec<Value> = batch.iter().map(honeycomb_event).collect();

        let response = self
            .client
            .post(&self.url)
            .header("X-Honeycomb-Team", &self.write_key)
            .json(&events)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Export {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

/// Shape one span as a Honeycomb batch entry.
fn honeycomb_event(event: &SpanEvent) -> Value {
    let mut data = event.fields.clone();
    data.insert("trace.trace_id".to_string(), json!(event.trace_id));
    data.insert("trace.span_id".to_string(), json!(event.span_id));
    if let Some(parent_id) = &event.parent_id {
        data.insert("trace.parent_id".to_string(), json!(parent_id));
    }
    data.insert("name".to_string(), json!(event.name));
    data.insert("service_name".to_string(), json!(event.service_name));
    data.insert("duration_ms".to_string(), json!(event.duration_ms));

    json!({
        "time": event.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true),
        "data": data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::Map;

    fn event(parent_id: Option<&str>) -> SpanEvent {
        let mut fields = Map::new();
        fields.insert("planet".to_string(), json!("mars"));
        SpanEvent {
            trace_id: "t1".to_string(),
            span_id: "s1".to_string(),
            parent_id: parent_id.map(str::to_string),
            name: "getWeather".to_string(),
            service_name: "intergalactic-weatherary".to_string(),
            timestamp: Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap(),
            duration_ms: 1.5,
            fields,
        }
    }

    #[test]
    fn honeycomb_event_uses_trace_keys() {
        let value = honeycomb_event(&event(Some("p1")));

        assert_eq!(value["time"], "2026-01-02T03:04:05.000Z");
        assert_eq!(value["data"]["trace.trace_id"], "t1");
        assert_eq!(value["data"]["trace.span_id"], "s1");
        assert_eq!(value["data"]["trace.parent_id"], "p1");
        assert_eq!(value["data"]["name"], "getWeather");
        assert_eq!(value["data"]["planet"], "mars");
        assert_eq!(value["data"]["duration_ms"], 1.5);
    }

    #[test]
    fn root_events_have_no_parent_key() {
        let value = honeycomb_event(&event(None));
        assert!(value["data"].get("trace.parent_id").is_none());
    }

    #[test]
    fn batch_url_joins_host_and_dataset() {
        let sink = HoneycombSink::new(&HoneycombConfig {
            write_key: "secret".to_string(),
            dataset: "weatherary".to_string(),
            api_host: "https://api.honeycomb.io/".to_string(),
        })
        .unwrap();

        assert_eq!(sink.batch_url(), "https://api.honeycomb.io/1/batch/weatherary");
        assert!(!format!("{sink:?}").contains("secret"));
    }

    #[tokio::test]
    async fn log_sink_accepts_everything() {
        let mut sink = LogSink;
        assert!(sink.export(vec![event(None), event(Some("p"))]).await.is_ok());
    }
}
