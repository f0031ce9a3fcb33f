//! Inbound payload shapes for Lambda endpoints.
//!
//! A function can be reached three ways: through API Gateway (proxy
//! integration), by direct invocation with the JSON body as the payload, or
//! by a background trigger. Only the first two are HTTP-style requests.

use std::collections::HashMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use weatherary_lib::InboundRequest;

/// API Gateway proxy integration request.
///
/// Only the fields the handlers read are modelled; everything else in the
/// event is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiGatewayProxyRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Single-value headers. API Gateway sends `null` when there are none.
    #[serde(default)]
    pub headers: Option<HashMap<String, String>>,

    /// Raw body, base64 encoded when `is_base64_encoded` is set.
    #[serde(default)]
    pub body: Option<String>,

    #[serde(default)]
    pub is_base64_encoded: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_context: Option<Value>,
}

impl ApiGatewayProxyRequest {
    /// Body as text, decoding base64 when flagged.
    ///
    /// An undecodable body is logged and treated as absent.
    pub fn decoded_body(&self) -> Option<String> {
        let body = self.body.as_deref()?;
        if !self.is_base64_encoded {
            return Some(body.to_string());
        }

        match STANDARD.decode(body).map(String::from_utf8) {
            Ok(Ok(text)) => Some(text),
            Ok(Err(e)) => {
                warn!(error = %e, "base64 request body is not UTF-8, ignoring body");
                None
            }
            Err(e) => {
                warn!(error = %e, "request body is not valid base64, ignoring body");
                None
            }
        }
    }

    pub fn into_inbound(self) -> InboundRequest {
        let body = self.decoded_body();
        let mut request = InboundRequest::new();
        for (name, value) in self.headers.unwrap_or_default() {
            request = request.with_header(name, value);
        }
        match body {
            Some(body) => request.with_body(body),
            None => request,
        }
    }
}

/// Whether `payload` is an API Gateway proxy event.
pub fn is_http_payload(payload: &Value) -> bool {
    payload.as_object().is_some_and(|event| {
        ["httpMethod", "requestContext", "headers"]
            .iter()
            .any(|key| event.contains_key(*key))
    })
}

/// Map a Lambda payload onto the core request type.
///
/// Proxy events keep their headers and body. Any other payload is a direct
/// invocation and becomes the JSON body itself.
pub fn inbound_from_payload(payload: Value) -> InboundRequest {
    if is_http_payload(&payload) {
        return match serde_json::from_value::<ApiGatewayProxyRequest>(payload) {
            Ok(request) => request.into_inbound(),
            Err(e) => {
                warn!(error = %e, "unreadable proxy event, treating as empty request");
                InboundRequest::new()
            }
        };
    }

    match payload {
        Value::Null => InboundRequest::new(),
        other => InboundRequest::new().with_body(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use weatherary_lib::{HeaderCarrier, TRACE_HEADER};

    #[test]
    fn parses_proxy_event() {
        let payload = json!({
            "httpMethod": "POST",
            "path": "/weather",
            "headers": {"X-Honeycomb-Trace": "1;trace_id=t,parent_id=p"},
            "body": "{\"planet\":\"mars\"}",
            "isBase64Encoded": false,
            "requestContext": {"requestId": "abc"}
        });

        let request = inbound_from_payload(payload);
        assert_eq!(request.planet().as_deref(), Some("mars"));
        assert_eq!(request.header(TRACE_HEADER), Some("1;trace_id=t,parent_id=p"));
    }

    #[test]
    fn null_headers_and_body_are_accepted() {
        let payload = json!({"httpMethod": "GET", "headers": null, "body": null});
        let request = inbound_from_payload(payload);
        assert!(request.headers().is_empty());
        assert!(request.body().is_none());
    }

    #[test]
    fn decodes_base64_body() {
        let request = ApiGatewayProxyRequest {
            body: Some(STANDARD.encode(r#"{"planet":"venus"}"#)),
            is_base64_encoded: true,
            ..ApiGatewayProxyRequest::default()
        };
        assert_eq!(request.into_inbound().planet().as_deref(), Some("venus"));
    }

    #[test]
    fn invalid_base64_body_is_dropped() {
        let request = ApiGatewayProxyRequest {
            body: Some("***".to_string()),
            is_base64_encoded: true,
            ..ApiGatewayProxyRequest::default()
        };
        assert!(request.decoded_body().is_none());
    }

    #[test]
    fn direct_invoke_payload_is_the_body() {
        let request = inbound_from_payload(json!({"planet": "jupiter"}));
        assert_eq!(request.planet().as_deref(), Some("jupiter"));
        assert!(request.headers().is_empty());
    }

    #[test]
    fn classifies_payloads() {
        assert!(is_http_payload(&json!({"httpMethod": "POST"})));
        assert!(is_http_payload(&json!({"requestContext": {}})));
        assert!(!is_http_payload(&json!({"planet": "mars"})));
        assert!(!is_http_payload(&json!({"Records": []})));
        assert!(!is_http_payload(&json!("scheduled")));
    }

    #[test]
    fn malformed_proxy_event_becomes_empty_request() {
        let request = inbound_from_payload(json!({"httpMethod": "POST", "headers": ["nope"]}));
        assert!(request.body().is_none());
        assert!(request.headers().is_empty());
    }
}
