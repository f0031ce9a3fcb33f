mod common;

use serde_json::{json, Value};

use common::{drain, recorded_handler};
use weatherary_lib::{
    HandlerConfig, InboundRequest, RngSource, WeatherCatalog, DEFAULT_CATALOG,
    MISSING_PLANET_MESSAGE, TRACE_HEADER,
};

fn mars() -> InboundRequest {
    InboundRequest::new().with_body(r#"{"planet": "mars"}"#)
}

#[tokio::test]
async fn mars_gets_a_catalog_phrase() {
    let (handler, _sink) = recorded_handler(HandlerConfig::default());

    let response = handler.handle(&mars());
    assert_eq!(response.status, 200);

    let body: Value = serde_json::from_str(&response.body_string()).unwrap();
    assert_eq!(body["planet"], "mars");
    let weather = body["weather"].as_str().expect("weather is a string");
    assert!(DEFAULT_CATALOG.contains(&weather), "unexpected phrase {weather:?}");
}

#[tokio::test]
async fn missing_planet_is_rejected_with_exact_text() {
    let (handler, _sink) = recorded_handler(HandlerConfig::default());

    for request in [
        InboundRequest::new(),
        InboundRequest::new().with_body("{}"),
        InboundRequest::new().with_body(r#"{"city": "London"}"#),
    ] {
        let response = handler.handle(&request);
        assert_eq!(response.status, 400);
        assert_eq!(response.body_string(), "Please pass a planet in the request body");
        assert_eq!(response.body_string(), MISSING_PLANET_MESSAGE);
    }
}

#[tokio::test]
async fn opens_match_closes_on_both_paths() {
    let (handler, _sink) = recorded_handler(HandlerConfig::default());

    handler.handle(&mars());
    let stats = handler.tracing().stats();
    assert_eq!(stats.traces_started, 1);
    assert_eq!(stats.traces_finished, 1);
    assert_eq!(stats.spans_started, stats.spans_finished);

    handler.handle(&InboundRequest::new());
    let stats = handler.tracing().stats();
    assert_eq!(stats.traces_started, 2);
    assert_eq!(stats.traces_finished, 2);
    assert_eq!(stats.spans_started, stats.spans_finished);
}

#[tokio::test]
async fn fresh_trace_without_header() {
    let (handler, sink) = recorded_handler(HandlerConfig::default());

    handler.handle(&mars());
    handler.handle(&mars());
    drain(&handler).await;

    let roots: Vec<_> = sink
        .events()
        .into_iter()
        .filter(|event| event.name == "handleRequest")
        .collect();
    assert_eq!(roots.len(), 2);
    assert!(roots.iter().all(|root| root.parent_id.is_none()));
    assert_eq!(roots[0].trace_id.len(), 32);
    assert_ne!(roots[0].trace_id, roots[1].trace_id);
}

#[tokio::test]
async fn well_formed_header_continues_the_trace() {
    let (handler, sink) = recorded_handler(HandlerConfig::default());

    let request = mars().with_header(TRACE_HEADER, "1;trace_id=caller-trace,parent_id=caller-span");
    let response = handler.handle(&request);
    assert_eq!(response.status, 200);
    drain(&handler).await;

    let root = sink.span("handleRequest");
    assert_eq!(root.trace_id, "caller-trace");
    assert_eq!(root.parent_id.as_deref(), Some("caller-span"));
    assert!(sink.events().iter().all(|event| event.trace_id == "caller-trace"));
}

#[tokio::test]
async fn malformed_header_degrades_to_fresh_trace() {
    let (handler, sink) = recorded_handler(HandlerConfig::default());

    for header in ["garbage", "2;trace_id=a,parent_id=b", "1;parent_id=b", "1;trace_id=a,parent_id=b,context=!!"] {
        let response = handler.handle(&mars().with_header(TRACE_HEADER, header));
        assert_eq!(response.status, 200, "header {header:?}");
    }
    drain(&handler).await;

    let roots: Vec<_> = sink
        .events()
        .into_iter()
        .filter(|event| event.name == "handleRequest")
        .collect();
    assert_eq!(roots.len(), 4);
    assert!(roots.iter().all(|root| root.parent_id.is_none()));
    assert!(roots.iter().all(|root| root.trace_id != "a"));
}

#[tokio::test]
async fn spans_form_the_weather_call_tree() {
    let (handler, sink) = recorded_handler(HandlerConfig::default());

    handler.handle(&mars());
    drain(&handler).await;

    let root = sink.span("handleRequest");
    let weather = sink.span("getWeather");
    let distance = sink.span("getDistance");
    let station = sink.span("contactWeatherStation");

    assert_eq!(weather.parent_id.as_deref(), Some(root.span_id.as_str()));
    assert_eq!(distance.parent_id.as_deref(), Some(weather.span_id.as_str()));
    assert_eq!(station.parent_id.as_deref(), Some(weather.span_id.as_str()));

    assert_eq!(weather.fields["operation"], "getWeather");
    assert_eq!(weather.fields["planet"], "mars");
    assert_eq!(station.fields["planet"], "mars");
    assert_eq!(distance.fields["distance"], 10_000);
    assert_eq!(station.fields["weather"], weather.fields["weather"]);

    // static tags ride on every span of the trace
    for event in sink.events() {
        assert_eq!(event.fields["application"], "intergalactic-weatherary");
        assert_eq!(event.fields["platform"], "aws");
        assert_eq!(event.service_name, "intergalactic-weatherary");
    }
    assert_eq!(root.fields["response.status_code"], 200);
}

#[tokio::test]
async fn rejected_request_still_exports_a_closed_root() {
    let (handler, sink) = recorded_handler(HandlerConfig::default());

    handler.handle(&InboundRequest::new().with_attribute("function_name", "weatherary"));
    drain(&handler).await;

    let events = sink.events();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].name, "handleRequest");
    assert_eq!(events[0].fields["response.status_code"], 400);
    assert_eq!(events[0].fields["function_name"], "weatherary");
}

#[tokio::test]
async fn seeded_selection_is_reproducible() {
    let config = HandlerConfig {
        rng: RngSource::Seeded(2024),
        ..HandlerConfig::default()
    };
    let (first, _) = recorded_handler(config.clone());
    let (second, _) = recorded_handler(config);

    let answers: Vec<String> = (0..5)
        .map(|_| first.handle(&mars()).body_string())
        .chain((0..5).map(|_| second.handle(&mars()).body_string()))
        .collect();
    assert!(answers.windows(2).all(|pair| pair[0] == pair[1]));
}

#[tokio::test]
async fn station_variant_answers_without_input() {
    let (handler, _sink) = recorded_handler(HandlerConfig {
        require_input_planet: false,
        fixed_planet: Some("mars".to_string()),
        catalog: WeatherCatalog::fixed("it's kinda cold here"),
        rng: RngSource::Entropy,
    });

    let response = handler.handle(&InboundRequest::new());
    assert_eq!(response.status, 200);
    let body: Value = serde_json::from_str(&response.body_string()).unwrap();
    assert_eq!(body, json!({"planet": "mars", "weather": "it's kinda cold here"}));
}
