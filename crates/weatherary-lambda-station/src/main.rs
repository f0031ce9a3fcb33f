//! AWS Lambda function for the Mars weather station.
//!
//! HTTP requests always get the station report for `mars`, whatever the
//! body says. Background triggers (no HTTP shape) are acknowledged without
//! doing any work.

use std::sync::Arc;

use lambda_runtime::{service_fn, Error, LambdaEvent};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use weatherary_lambda_shared::{
    init_tracing, is_http_payload, ApiGatewayProxyResponse, LambdaRuntime,
};
use weatherary_lib::{handle_event, WeatherConfig};

const STATION_PLANET: &str = "mars";
const STATION_REPORT: &str = "it's kinda cold here";

/// Lambda response: a proxy response for HTTP invocations, `null` otherwise.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Response {
    Http(ApiGatewayProxyResponse),
    Event(Option<()>),
}

fn station_config() -> Result<WeatherConfig, weatherary_lib::Error> {
    WeatherConfig::station(STATION_PLANET, STATION_REPORT).merge_env()
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = station_config().inspect_err(|e| {
        error!(error = %e, "invalid configuration");
    })?;
    let runtime = Arc::new(LambdaRuntime::init(&config)?);

    lambda_runtime::run(service_fn(move |event| {
        let runtime = Arc::clone(&runtime);
        async move { handler(&runtime, event).await }
    }))
    .await
}

async fn handler(runtime: &LambdaRuntime, event: LambdaEvent<Value>) -> Result<Response, Error> {
    let request_id = event.context.request_id.clone();

    if is_http_payload(&event.payload) {
        return Ok(Response::Http(
            runtime.handle_http(&request_id, event.payload),
        ));
    }

    handle_event(&event.payload, || {
        debug!(request_id = %request_id, "background event acknowledged");
    });
    Ok(Response::Event(None))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use serde_json::json;
    use weatherary_lambda_shared::test_utils::{memory_runtime, mock_request_id, proxy_payload};

    fn event(payload: Value, suffix: &str) -> LambdaEvent<Value> {
        let mut context = lambda_runtime::Context::default();
        context.request_id = mock_request_id(suffix);
        LambdaEvent::new(payload, context)
    }

    fn station() -> WeatherConfig {
        WeatherConfig::station(STATION_PLANET, STATION_REPORT)
    }

    #[tokio::test]
    async fn test_http_request_gets_station_report() {
        let (runtime, _sink) = memory_runtime(&station());

        let response = handler(&runtime, event(proxy_payload(json!({})), "1"))
            .await
            .unwrap();

        let Response::Http(response) = response else {
            panic!("expected an HTTP response");
        };
        assert_eq!(response.status_code, 200);
        let body: Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(body, json!({"planet": "mars", "weather": "it's kinda cold here"}));
    }

    #[tokio::test]
    async fn test_input_planet_is_ignored() {
        let (runtime, _sink) = memory_runtime(&station());

        let response = handler(&runtime, event(proxy_payload(json!({"planet": "pluto"})), "2"))
            .await
            .unwrap();

        let Response::Http(response) = response else {
            panic!("expected an HTTP response");
        };
        assert!(response.body.contains("\"planet\":\"mars\""));
    }

    #[tokio::test]
    async fn test_background_event_returns_null_without_tracing() {
        let (runtime, sink) = memory_runtime(&station());

        let response = handler(&runtime, event(json!({"Records": []}), "3"))
            .await
            .unwrap();

        assert_eq!(serde_json::to_value(&response).unwrap(), Value::Null);
        assert!(runtime.tracing().flush(Duration::from_secs(2)).await);
        assert!(sink.events().is_empty());
        assert_eq!(runtime.tracing().stats().traces_started, 0);
    }

    #[test]
    fn test_station_config_defaults() {
        let config = station();
        assert!(!config.require_input_planet);
        assert_eq!(config.fixed_planet.as_deref(), Some("mars"));
        assert!(config.catalog.contains(STATION_REPORT));
    }
}
