//! Test utilities for Lambda handler testing.
//!
//! Payload builders shaped like API Gateway proxy events and a runtime wired
//! to an in-memory span sink.
//!
//! ```ignore
//! use weatherary_lambda_shared::test_utils::{memory_runtime, mock_request_id, proxy_payload};
//!
//! #[tokio::test]
//! async fn test_handler() {
//!     let (runtime, sink) = memory_runtime(&WeatherConfig::default());
//!     let response = runtime.handle_http(&mock_request_id("1"), proxy_payload(json!({"planet": "mars"})));
//!     // ... flush `runtime.tracing()` and inspect `sink.events()`
//! }
//! ```

use serde_json::{json, Value};

use weatherary_lib::test_utils::{memory_client, MemorySink};
use weatherary_lib::{WeatherConfig, TRACE_HEADER};

use crate::runtime::LambdaRuntime;

/// Create a mock Lambda request ID for testing.
pub fn mock_request_id(suffix: &str) -> String {
    format!("test-request-{}", suffix)
}

/// Proxy event carrying `body` serialized as JSON.
pub fn proxy_payload(body: Value) -> Value {
    json!({
        "httpMethod": "POST",
        "path": "/weather",
        "headers": {"Content-Type": "application/json"},
        "body": body.to_string(),
        "isBase64Encoded": false,
        "requestContext": {"stage": "test"}
    })
}

/// Proxy event with a propagation header continuing `trace_id` at `parent_id`.
pub fn traced_proxy_payload(body: Value, trace_id: &str, parent_id: &str) -> Value {
    let mut payload = proxy_payload(body);
    payload["headers"][TRACE_HEADER] = json!(format!("1;trace_id={trace_id},parent_id={parent_id}"));
    payload
}

/// Runtime for `config` exporting spans into a fresh [`MemorySink`].
///
/// Requires a Tokio runtime.
pub fn memory_runtime(config: &WeatherConfig) -> (LambdaRuntime, MemorySink) {
    let (client, sink) = memory_client();
    (LambdaRuntime::with_tracing(config, client), sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requests::{inbound_from_payload, is_http_payload};
    use weatherary_lib::HeaderCarrier;

    #[test]
    fn mock_request_id_has_prefix() {
        assert_eq!(mock_request_id("abc"), "test-request-abc");
    }

    #[test]
    fn proxy_payload_is_recognized() {
        let payload = proxy_payload(json!({"planet": "mars"}));
        assert!(is_http_payload(&payload));
        assert_eq!(inbound_from_payload(payload).planet().as_deref(), Some("mars"));
    }

    #[test]
    fn traced_payload_carries_header() {
        let request = inbound_from_payload(traced_proxy_payload(json!({}), "t1", "s1"));
        assert_eq!(request.header(TRACE_HEADER), Some("1;trace_id=t1,parent_id=s1"));
    }
}
