//! Trace propagation header parsing and serialization.
//!
//! The header format is version 1 of the Honeycomb propagation header:
//!
//! ```text
//! x-honeycomb-trace: 1;trace_id=<id>,parent_id=<id>,dataset=<name>,context=<base64 JSON>
//! ```
//!
//! `dataset` and `context` are optional. `dataset` is percent-encoded, since
//! dataset names may contain `,` or `=`. Unknown keys are ignored so newer
//! callers can add fields without breaking continuation.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Conventional header key carrying the trace-continuation token.
pub const TRACE_HEADER: &str = "x-honeycomb-trace";

const HEADER_VERSION: &str = "1";

/// Anything that exposes request headers for trace propagation.
pub trait HeaderCarrier {
    /// Look up a header value. Implementations match `name` case-insensitively.
    fn header(&self, name: &str) -> Option<&str>;
}

impl HeaderCarrier for http::HeaderMap {
    fn header(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|value| value.to_str().ok())
    }
}

impl HeaderCarrier for HashMap<String, String> {
    fn header(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Caller-supplied trace continuation decoded from [`TRACE_HEADER`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropagationContext {
    /// Trace the new root span joins.
    pub trace_id: String,
    /// Span in the caller's process that the new root span is parented at.
    pub parent_span_id: String,
    /// Dataset the caller reports to, if it sent one.
    pub dataset: Option<String>,
    /// Trace-level fields the caller wants carried on every span.
    pub trace_fields: Map<String, Value>,
}

impl PropagationContext {
    pub fn new(trace_id: impl Into<String>, parent_span_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            parent_span_id: parent_span_id.into(),
            ..Self::default()
        }
    }

    /// Attach the dataset name advertised to downstream services.
    pub fn with_dataset(mut self, dataset: impl Into<String>) -> Self {
        self.dataset = Some(dataset.into());
        self
    }

    /// Extract and decode the propagation header from `carrier`.
    ///
    /// Returns `None` when the header is absent and `Some(Err(_))` when it is
    /// present but cannot be decoded.
    pub fn extract(carrier: &impl HeaderCarrier) -> Option<Result<Self>> {
        carrier.header(TRACE_HEADER).map(Self::parse)
    }

    /// Parse a serialized header value.
    pub fn parse(header: &str) -> Result<Self> {
        let header = header.trim();
        let (version, payload) = header.split_once(';').unwrap_or((header, ""));
        if version != HEADER_VERSION {
            return Err(Error::UnsupportedTraceVersion {
                version: version.to_string(),
            });
        }

        let mut context = Self::default();
        for pair in payload.split(',') {
            let Some((key, value)) = pair.split_once('=') else {
                continue;
            };
            let value = value.trim();
            match key.trim() {
                "trace_id" => context.trace_id = value.to_string(),
                "parent_id" => context.parent_span_id = value.to_string(),
                "dataset" if !value.is_empty() => context.dataset = Some(decode_dataset(value)?),
                "context" => context.trace_fields = decode_context(value)?,
                _ => {}
            }
        }

        if context.trace_id.is_empty() {
            return Err(Error::MissingTraceField { field: "trace_id" });
        }
        if context.parent_span_id.is_empty() {
            return Err(Error::MissingTraceField { field: "parent_id" });
        }

        Ok(context)
    }

    /// Serialize into a header value suitable for [`TRACE_HEADER`].
    pub fn to_header(&self) -> String {
        let mut header = format!(
            "{HEADER_VERSION};trace_id={},parent_id={}",
            self.trace_id, self.parent_span_id
        );
        if let Some(dataset) = &self.dataset {
            header.push_str(",dataset=");
            header.push_str(&urlencoding::encode(dataset));
        }
        if !self.trace_fields.is_empty() {
            let json = Value::Object(self.trace_fields.clone()).to_string();
            header.push_str(",context=");
            header.push_str(&STANDARD.encode(json));
        }
        header
    }
}

impl FromStr for PropagationContext {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for PropagationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_header())
    }
}

fn decode_dataset(encoded: &str) -> Result<String> {
    urlencoding::decode(encoded)
        .map(|dataset| dataset.into_owned())
        .map_err(|e| Error::MalformedTraceField {
            field: "dataset",
            reason: e.to_string(),
        })
}

fn decode_context(encoded: &str) -> Result<Map<String, Value>> {
    if encoded.is_empty() {
        return Ok(Map::new());
    }

    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| Error::MalformedTraceContext {
            reason: e.to_string(),
        })?;

    match serde_json::from_slice(&bytes) {
        Ok(Value::Object(fields)) => Ok(fields),
        Ok(_) => Err(Error::MalformedTraceContext {
            reason: "context is not a JSON object".to_string(),
        }),
        Err(e) => Err(Error::MalformedTraceContext {
            reason: e.to_string(),
        }),
    }
}
