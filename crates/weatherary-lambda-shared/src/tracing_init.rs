//! Tracing initialization for Lambda functions.
//!
//! Configures JSON-formatted tracing output suitable for CloudWatch Logs, with
//! a human-readable fallback for local runs.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Initialize tracing for a Lambda function.
///
/// This should be called once at the start of the Lambda `main` function,
/// before the runtime is built, so cold-start timing is captured.
///
/// - `RUST_LOG` controls the filter; defaults to `info`.
/// - `LOG_FORMAT=text` (or `pretty`) switches from JSON to text output.
///
/// # Example
///
/// ```no_run
/// use weatherary_lambda_shared::init_tracing;
///
/// #[tokio::main]
/// async fn main() -> Result<(), lambda_runtime::Error> {
///     init_tracing();
///     // ... rest of Lambda setup
///     Ok(())
/// }
/// ```
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let fmt_layer = if text_format_requested(std::env::var("LOG_FORMAT").ok().as_deref()) {
        fmt::layer().with_target(true).boxed()
    } else {
        // CloudWatch parses one flattened JSON object per line
        fmt::layer()
            .json()
            .with_target(true)
            .with_level(true)
            .with_thread_ids(false)
            .with_thread_names(false)
            .flatten_event(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn text_format_requested(format: Option<&str>) -> bool {
    format.is_some_and(|format| matches!(format.to_lowercase().as_str(), "text" | "pretty"))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Subscriber installation is global state, so only the format switch is
    // tested here.

    #[test]
    fn json_is_the_default_format() {
        assert!(!text_format_requested(None));
        assert!(!text_format_requested(Some("json")));
        assert!(!text_format_requested(Some("yaml")));
    }

    #[test]
    fn text_and_pretty_select_text() {
        assert!(text_format_requested(Some("text")));
        assert!(text_format_requested(Some("PRETTY")));
    }
}
