//! Static configuration, read once at process start.
//!
//! # Environment Variables
//!
//! - `WEATHERARY_APPLICATION`: application tag (default `intergalactic-weatherary`)
//! - `WEATHERARY_PLATFORM`: platform tag (default `aws`)
//! - `WEATHERARY_REQUIRE_PLANET`: whether the request body must name a planet
//! - `WEATHERARY_PLANET`: fixed planet answered regardless of input
//! - `WEATHERARY_CATALOG`: `|`-separated weather phrases
//! - `WEATHERARY_SEED`: seed for phrase selection (entropy when unset)
//! - `WEATHERARY_TRACE_QUEUE`: span exporter queue capacity
//! - `HONEYCOMB_KEY`: write key; enables the Honeycomb exporter
//! - `HONEYCOMB_DATASET`: dataset (defaults to the application name)
//! - `HONEYCOMB_API_HOST`: API host (default `https://api.honeycomb.io`)
//!
//! # Example
//!
//! ```
//! use weatherary_lib::WeatherConfig;
//!
//! let config = WeatherConfig::station("mars", "it's kinda cold here")
//!     .merge_lookup(|key| match key {
//!         "WEATHERARY_PLATFORM" => Some("gcp".to_string()),
//!         _ => None,
//!     })
//!     .unwrap();
//! assert_eq!(config.identity.platform, "gcp");
//! assert_eq!(config.fixed_planet.as_deref(), Some("mars"));
//! ```

use crate::error::{Error, Result};
use crate::handler::HandlerConfig;
use crate::trace::{ServiceIdentity, TracingOptions};
use crate::weather::{RngSource, WeatherCatalog};

const DEFAULT_APPLICATION: &str = "intergalactic-weatherary";
const DEFAULT_PLATFORM: &str = "aws";
const DEFAULT_HONEYCOMB_HOST: &str = "https://api.honeycomb.io";

/// Where finished spans are sent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum BackendConfig {
    /// Structured log lines only.
    #[default]
    Log,
    /// Honeycomb batch events API.
    Honeycomb(HoneycombConfig),
}

/// Honeycomb credentials and destination.
#[derive(Clone, PartialEq, Eq)]
pub struct HoneycombConfig {
    pub write_key: String,
    pub dataset: String,
    pub api_host: String,
}

impl std::fmt::Debug for HoneycombConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HoneycombConfig")
            .field("dataset", &self.dataset)
            .field("api_host", &self.api_host)
            .finish_non_exhaustive()
    }
}

/// Complete configuration for one deployed handler variant.
#[derive(Debug, Clone)]
pub struct WeatherConfig {
    pub identity: ServiceIdentity,
    pub require_input_planet: bool,
    pub fixed_planet: Option<String>,
    pub catalog: WeatherCatalog,
    pub rng: RngSource,
    pub backend: BackendConfig,
    pub tracing: TracingOptions,
}

impl Default for WeatherConfig {
    /// Input-driven variant: the caller must name a planet.
    fn default() -> Self {
        Self {
            identity: ServiceIdentity::new(DEFAULT_APPLICATION, DEFAULT_PLATFORM),
            require_input_planet: true,
            fixed_planet: None,
            catalog: WeatherCatalog::default(),
            rng: RngSource::Entropy,
            backend: BackendConfig::Log,
            tracing: TracingOptions::default(),
        }
    }
}

impl WeatherConfig {
    /// Fixed-planet variant answering `weather` for `planet` without input.
    pub fn station(planet: impl Into<String>, weather: impl Into<String>) -> Self {
        Self {
            require_input_planet: false,
            fixed_planet: Some(planet.into()),
            catalog: WeatherCatalog::fixed(weather),
            ..Self::default()
        }
    }

    /// Input-driven defaults overridden from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::default().merge_env()
    }

    /// Override fields from the process environment.
    pub fn merge_env(self) -> Result<Self> {
        self.merge_lookup(|key| std::env::var(key).ok())
    }

    /// Override fields from `lookup`, which maps variable names to values.
    pub fn merge_lookup<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(application) = get("WEATHERARY_APPLICATION") {
            self.identity.application = application;
        }
        if let Some(platform) = get("WEATHERARY_PLATFORM") {
            self.identity.platform = platform;
        }
        if let Some(value) = get("WEATHERARY_REQUIRE_PLANET") {
            self.require_input_planet = parse_bool("WEATHERARY_REQUIRE_PLANET", &value)?;
        }
        if let Some(planet) = get("WEATHERARY_PLANET") {
            self.fixed_planet = Some(planet);
        }
        if let Some(catalog) = get("WEATHERARY_CATALOG") {
            self.catalog = WeatherCatalog::new(catalog.split('|').map(str::trim))?;
        }
        if let Some(seed) = get("WEATHERARY_SEED") {
            self.rng = RngSource::Seeded(parse_number("WEATHERARY_SEED", &seed)?);
        }
        if let Some(capacity) = get("WEATHERARY_TRACE_QUEUE") {
            self.tracing.queue_capacity = parse_number("WEATHERARY_TRACE_QUEUE", &capacity)?;
        }
        if let Some(write_key) = get("HONEYCOMB_KEY") {
            self.backend = BackendConfig::Honeycomb(HoneycombConfig {
                write_key,
                dataset: get("HONEYCOMB_DATASET")
                    .unwrap_or_else(|| self.identity.application.clone()),
                api_host: get("HONEYCOMB_API_HOST")
                    .unwrap_or_else(|| DEFAULT_HONEYCOMB_HOST.to_string()),
            });
        }

        Ok(self)
    }

    /// Handler settings derived from this configuration.
    pub fn handler_config(&self) -> HandlerConfig {
        HandlerConfig {
            require_input_planet: self.require_input_planet,
            fixed_planet: self.fixed_planet.clone(),
            catalog: self.catalog.clone(),
            rng: self.rng,
        }
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(Error::InvalidConfig {
            key,
            value: value.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| Error::InvalidConfig {
        key,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
