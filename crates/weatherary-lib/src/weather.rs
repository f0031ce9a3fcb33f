//! Weather Responder.
//!
//! Answers a planet's weather inside a `getWeather` span with two nested
//! steps, `getDistance` and `contactWeatherStation`. The planet is only ever
//! a tag and an echo value; it is not checked against any catalog of real
//! planets.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::trace::{SpanInfo, SpanParent};

/// Span name of the weather lookup.
pub const GET_WEATHER: &str = "getWeather";
/// Span name of the distance step.
pub const GET_DISTANCE: &str = "getDistance";
/// Span name of the phrase selection step.
pub const CONTACT_WEATHER_STATION: &str = "contactWeatherStation";

/// Distance reported by the `getDistance` step, for every planet.
pub const STATION_DISTANCE: u64 = 10_000;

/// Phrases used when no catalog is configured, in selection order.
pub const DEFAULT_CATALOG: &[&str] = &[
    "fine",
    "it's kinda cold here",
    "dusty, with a chance of more dust",
    "clear skies, no atmosphere to speak of",
    "methane drizzle",
];

/// Output payload of a successful request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherResult {
    pub planet: String,
    pub weather: String,
}

/// Ordered, non-empty list of weather phrases.
///
/// A single-phrase catalog makes selection deterministic; otherwise each
/// phrase is equally likely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherCatalog {
    phrases: Vec<String>,
}

impl WeatherCatalog {
    /// Build a catalog, skipping blank phrases.
    pub fn new<I, S>(phrases: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let phrases: Vec<String> = phrases
            .into_iter()
            .map(Into::into)
            .filter(|phrase| !phrase.trim().is_empty())
            .collect();

        if phrases.is_empty() {
            return Err(Error::EmptyCatalog);
        }
        Ok(Self { phrases })
    }

    /// Catalog that always answers `phrase`.
    pub fn fixed(phrase: impl Into<String>) -> Self {
        Self {
            phrases: vec![phrase.into()],
        }
    }

    pub fn phrases(&self) -> &[String] {
        &self.phrases
    }

    pub fn contains(&self, phrase: &str) -> bool {
        self.phrases.iter().any(|p| p == phrase)
    }

    /// Pick a phrase uniformly at random.
    pub fn select<R: Rng>(&self, rng: &mut R) -> &str {
        &self.phrases[rng.gen_range(0..self.phrases.len())]
    }
}

impl Default for WeatherCatalog {
    fn default() -> Self {
        Self {
            phrases: DEFAULT_CATALOG.iter().map(|p| p.to_string()).collect(),
        }
    }
}

/// Source of randomness for phrase selection.
///
/// A fresh generator is built per invocation, so invocations share no RNG
/// state. `Seeded` makes every invocation pick the same phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RngSource {
    #[default]
    Entropy,
    Seeded(u64),
}

impl RngSource {
    pub fn rng(&self) -> StdRng {
        match *self {
            RngSource::Entropy => StdRng::from_entropy(),
            RngSource::Seeded(seed) => StdRng::seed_from_u64(seed),
        }
    }
}

/// Computes weather strings inside nested spans.
#[derive(Debug, Clone, Default)]
pub struct WeatherResponder {
    catalog: WeatherCatalog,
}

impl WeatherResponder {
    pub fn new(catalog: WeatherCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &WeatherCatalog {
        &self.catalog
    }

    /// Weather for `planet`, traced as a child of `parent`.
    ///
    /// Never fails; an empty planet is just an empty tag.
    pub fn get_weather<R: Rng>(
        &self,
        parent: &impl SpanParent,
        planet: &str,
        rng: &mut R,
    ) -> String {
        let mut span = parent.start_span(SpanInfo::new(GET_WEATHER, planet));

        let distance = self.get_distance(&span, planet);
        let weather = self.contact_weather_station(&span, planet, rng);

        span.add_field("distance", distance);
        span.add_field("weather", weather.clone());
        span.finish();
        weather
    }

    fn get_distance(&self, parent: &impl SpanParent, planet: &str) -> u64 {
        let mut span = parent.start_span(SpanInfo::new(GET_DISTANCE, planet));
        span.add_field("distance", STATION_DISTANCE);
        span.finish();
        STATION_DISTANCE
    }

    fn contact_weather_station<R: Rng>(
        &self,
        parent: &impl SpanParent,
        planet: &str,
        rng: &mut R,
    ) -> String {
        let mut span = parent.start_span(SpanInfo::new(CONTACT_WEATHER_STATION, planet));
        let weather = self.catalog.select(rng).to_string();
        span.add_field("weather", weather.clone());
        span.finish();
        weather
    }
}

#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use super::*;
    use crate::trace::{ServiceIdentity, TracingClient};

    #[test]
    fn catalog_skips_blank_phrases() {
        let catalog = WeatherCatalog::new(["fine", "", "  ", "windy"]).unwrap();
        assert_eq!(catalog.phrases(), ["fine", "windy"]);
    }

    #[test]
    fn empty_catalog_is_an_error() {
        let empty: [&str; 0] = [];
        assert!(matches!(WeatherCatalog::new(empty), Err(Error::EmptyCatalog)));
    }

    #[test]
    fn same_seed_selects_same_phrase() {
        let catalog = WeatherCatalog::default();
        let first = catalog.select(&mut RngSource::Seeded(7).rng()).to_string();
        let second = catalog.select(&mut RngSource::Seeded(7).rng()).to_string();
        assert_eq!(first, second);
    }

    #[test]
    fn selection_covers_the_catalog() {
        let catalog = WeatherCatalog::default();
        let seen: HashSet<String> = (0..200)
            .map(|seed| catalog.select(&mut RngSource::Seeded(seed).rng()).to_string())
            .collect();
        assert_eq!(seen.len(), DEFAULT_CATALOG.len());
    }

    #[test]
    fn fixed_catalog_is_deterministic() {
        let catalog = WeatherCatalog::fixed("it's kinda cold here");
        for _ in 0..10 {
            assert_eq!(
                catalog.select(&mut RngSource::Entropy.rng()),
                "it's kinda cold here"
            );
        }
    }

    #[test]
    fn get_weather_answers_from_catalog() {
        let client = TracingClient::disabled();
        let info = ServiceIdentity::new("weatherary", "aws").trace_info("handleRequest");
        let trace = client.start_trace(&HashMap::<String, String>::new(), info);

        let responder = WeatherResponder::default();
        let weather = responder.get_weather(&trace, "mars", &mut RngSource::Seeded(1).rng());
        assert!(responder.catalog().contains(&weather));

        // getWeather plus its two steps
        let stats = client.stats();
        assert_eq!(stats.spans_started, 3);
        assert_eq!(stats.spans_finished, 3);
    }

    #[test]
    fn empty_planet_still_gets_weather() {
        let client = TracingClient::disabled();
        let info = ServiceIdentity::new("weatherary", "aws").trace_info("handleRequest");
        let trace = client.start_trace(&HashMap::<String, String>::new(), info);

        let weather =
            WeatherResponder::default().get_weather(&trace, "", &mut RngSource::Entropy.rng());
        assert!(!weather.is_empty());
    }
}
