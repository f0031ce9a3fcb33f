//! Fixed descriptors for traces and spans.

use serde::{Deserialize, Serialize};

/// Operation name of the root span opened for every inbound request.
pub const HANDLE_REQUEST: &str = "handleRequest";

/// Static tags identifying the deployed application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceIdentity {
    /// Application tag, also used as the span `service_name`.
    pub application: String,
    /// Hosting platform tag (e.g. `aws`, `azure`, `gcp`).
    pub platform: String,
}

impl ServiceIdentity {
    pub fn new(application: impl Into<String>, platform: impl Into<String>) -> Self {
        Self {
            application: application.into(),
            platform: platform.into(),
        }
    }

    /// Build the [`TraceInfo`] for one invocation of `operation`.
    pub fn trace_info(&self, operation: impl Into<String>) -> TraceInfo {
        TraceInfo {
            application: self.application.clone(),
            platform: self.platform.clone(),
            operation_name: operation.into(),
        }
    }
}

/// Immutable description of a trace, created once per invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceInfo {
    pub application: String,
    pub platform: String,
    pub operation_name: String,
}

/// Description of a nested unit of work within a trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpanInfo {
    /// Step name; becomes the span name and the `operation` tag.
    pub operation: String,
    /// Planet the step works on; echoed as the `planet` tag.
    pub planet: String,
}

impl SpanInfo {
    pub fn new(operation: impl Into<String>, planet: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            planet: planet.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trace_info_carries_identity_and_operation() {
        let identity = ServiceIdentity::new("intergalactic-weatherary", "aws");
        let info = identity.trace_info(HANDLE_REQUEST);

        assert_eq!(info.application, "intergalactic-weatherary");
        assert_eq!(info.platform, "aws");
        assert_eq!(info.operation_name, "handleRequest");
    }
}
