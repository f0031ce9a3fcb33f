//! Shared infrastructure for weatherary AWS Lambda functions.
//!
//! This crate provides common functionality used across all Lambda handlers:
//!
//! - [`LambdaRuntime`]: Explicitly built handler and tracing client, shared by all invocations
//! - [`init_tracing`]: JSON-formatted tracing for CloudWatch Logs
//! - [`ApiGatewayProxyRequest`] / [`ApiGatewayProxyResponse`]: API Gateway proxy wire shapes
//! - [`inbound_from_payload`]: Map proxy or direct-invoke payloads onto the core request type
//!
//! # Testing Support
//!
//! The [`test_utils`] module provides payload builders and a runtime wired to
//! an in-memory span sink. Enable the `test-utils` feature to access it from
//! dependent crates.

#![deny(warnings)]

mod requests;
mod response;
mod runtime;
mod tracing_init;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use requests::{inbound_from_payload, is_http_payload, ApiGatewayProxyRequest};
pub use response::ApiGatewayProxyResponse;
pub use runtime::{FunctionInfo, InitError, LambdaRuntime};
pub use tracing_init::init_tracing;
