//! Weather covariates for the sales regression.
//!
//! Past dates are looked up in a [`WeatherHistory`] built from daily
//! station records; today and the next few days come from a forecast
//! provider whose sub-daily blocks are collapsed with
//! [`forecast::aggregate_blocks`].

#[cfg(feature = "api")]
pub mod client;
pub mod forecast;
pub mod resolver;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Appeltern, where the park is located.
pub const DEFAULT_LATITUDE: f64 = 51.8731;
pub const DEFAULT_LONGITUDE: f64 = 5.5755;

/// OpenWeatherMap 2.5 API root.
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// Daily temperature (°C) and precipitation (mm) for one date.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct WeatherObservation {
    pub date: NaiveDate,
    pub temperature: f64,
    pub precipitation: f64,
}

/// How a resolved weather value was obtained.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherSource {
    Historical,
    Forecast,
    Fallback,
    Override,
}

/// Weather values for a target date together with their provenance.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct ResolvedWeather {
    pub temperature: f64,
    pub precipitation: f64,
    pub source: WeatherSource,
}

/// Settings for the forecast provider and the fallback policy.
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherConfig {
    pub latitude: f64,
    pub longitude: f64,
    pub base_url: String,
    pub api_key: Option<String>,
    /// Days after today the provider still covers.
    pub horizon_days: i64,
    pub timeout_secs: u64,
    /// Substituted when no weather can be resolved for a date.
    pub fallback_temperature: f64,
    pub fallback_precipitation: f64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            latitude: DEFAULT_LATITUDE,
            longitude: DEFAULT_LONGITUDE,
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            horizon_days: 5,
            timeout_secs: 10,
            fallback_temperature: 15.0,
            fallback_precipitation: 0.0,
        }
    }
}

impl WeatherConfig {
    pub fn fallback(&self) -> ResolvedWeather {
        ResolvedWeather {
            temperature: self.fallback_temperature,
            precipitation: self.fallback_precipitation,
            source: WeatherSource::Fallback,
        }
    }
}

/// Daily observations indexed by date.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherHistory {
    by_date: BTreeMap<NaiveDate, WeatherObservation>,
}

impl WeatherHistory {
    /// Build the history. A later observation for the same date replaces an
    /// earlier one.
    pub fn from_observations<I: IntoIterator<Item = WeatherObservation>>(observations: I) -> Self {
        let by_date = observations.into_iter().map(|o| (o.date, o)).collect();
        WeatherHistory { by_date }
    }

    /// Exact-date lookup.
    pub fn get(&self, date: &NaiveDate) -> Option<&WeatherObservation> {
        self.by_date.get(date)
    }

    pub fn len(&self) -> usize {
        self.by_date.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }
}
