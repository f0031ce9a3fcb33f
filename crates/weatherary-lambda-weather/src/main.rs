//! AWS Lambda function answering weather for a caller-supplied planet.
//!
//! Expects `{"planet": "..."}` in the request body and answers
//! `{"planet": "...", "weather": "..."}`, or 400 when no planet is given.

use std::sync::Arc;

use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde_json::Value;
use tracing::error;

use weatherary_lambda_shared::{init_tracing, ApiGatewayProxyResponse, LambdaRuntime};
use weatherary_lib::WeatherConfig;

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = WeatherConfig::from_env().inspect_err(|e| {
        error!(error = %e, "invalid configuration");
    })?;
    // Built once at cold start and shared by every invocation (logs init timing)
    let runtime = Arc::new(LambdaRuntime::init(&config)?);

    lambda_runtime::run(service_fn(move |event| {
        let runtime = Arc::clone(&runtime);
        async move { handler(&runtime, event).await }
    }))
    .await
}

async fn handler(
    runtime: &LambdaRuntime,
    event: LambdaEvent<Value>,
) -> Result<ApiGatewayProxyResponse, Error> {
    let request_id = event.context.request_id.clone();
    Ok(runtime.handle_http(&request_id, event.payload))
}
