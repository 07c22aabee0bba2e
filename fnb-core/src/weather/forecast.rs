//! Parsing and daily aggregation of sub-daily forecast blocks.
//!
//! The provider answers with 3-hour blocks:
//!
//! ```text
//! {"list": [{"dt": 1747656000, "main": {"temp": 18.4}, "rain": {"3h": 0.3}}, ...],
//!  "city": {"timezone": 7200}}
//! ```
//!
//! A block without a `rain` object is dry.

use crate::error::{FnbError, Result};
use crate::weather::WeatherObservation;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::Deserialize;

/// One forecast block in the park's local time.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct ForecastBlock {
    pub local_time: NaiveDateTime,
    pub temperature: f64,
    pub precipitation: f64,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    list: Vec<RawBlock>,
    #[serde(default)]
    city: Option<RawCity>,
}

#[derive(Debug, Deserialize)]
struct RawCity {
    #[serde(default)]
    timezone: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct RawBlock {
    dt: i64,
    main: RawMain,
    #[serde(default)]
    rain: Option<RawRain>,
}

#[derive(Debug, Deserialize)]
struct RawMain {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct RawRain {
    #[serde(rename = "1h", default)]
    one_hour: Option<f64>,
    #[serde(rename = "3h", default)]
    three_hours: Option<f64>,
}

impl RawRain {
    fn amount(&self) -> f64 {
        self.three_hours.or(self.one_hour).unwrap_or(0.0)
    }
}

/// Parse a forecast response body into blocks, shifted to the local time
/// given by `city.timezone` (UTC when absent).
pub fn parse_forecast_response(body: &str) -> Result<Vec<ForecastBlock>> {
    let response: ForecastResponse =
        serde_json::from_str(body).map_err(|e| FnbError::ResponseParse(e.to_string()))?;
    let offset_secs = response.city.and_then(|c| c.timezone).unwrap_or(0);
    let offset = FixedOffset::east_opt(offset_secs)
        .ok_or_else(|| FnbError::ResponseParse(format!("invalid timezone offset {offset_secs}")))?;
    response
        .list
        .into_iter()
        .map(|raw| {
            let utc = DateTime::from_timestamp(raw.dt, 0)
                .ok_or_else(|| FnbError::ResponseParse(format!("invalid timestamp {}", raw.dt)))?;
            Ok(ForecastBlock {
                local_time: utc.with_timezone(&offset).naive_local(),
                temperature: raw.main.temp,
                precipitation: raw.rain.as_ref().map_or(0.0, RawRain::amount),
            })
        })
        .collect()
}

/// Collapse the blocks of `date` into one daily observation: the peak block
/// temperature and the summed block precipitation. `None` when no block
/// falls on `date`.
pub fn aggregate_blocks(blocks: &[ForecastBlock], date: NaiveDate) -> Option<WeatherObservation> {
    let mut day_blocks = blocks.iter().filter(|b| b.local_time.date() == date).peekable();
    day_blocks.peek()?;
    let (temperature, precipitation) = day_blocks.fold(
        (f64::NEG_INFINITY, 0.0),
        |(max_temp, rain_sum), block| {
            (max_temp.max(block.temperature), rain_sum + block.precipitation.max(0.0))
        },
    );
    Some(WeatherObservation {
        date,
        temperature,
        precipitation,
    })
}
