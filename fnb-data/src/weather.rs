//! KNMI daily station records.
//!
//! ```text
//! # STN,YYYYMMDD,DDVEC,FHVEC,   FG,  FHX, FHXH,  FHN, FHNH,  FXX, FXXH,   TG,   TN,  TNH,   TX,  TXH,   RH
//! #
//!   375,20250501,  225,   31,   35,   60,   14,   10,    1,  110,   14,  142,   71,    5,  208,   15,    4
//! ```
//!
//! `TG` is the daily mean temperature in 0.1 °C and `RH` the daily
//! precipitation in 0.1 mm, with `-1` meaning less than 0.05 mm.

use crate::read_source;
use fnb_core::error::FnbError;
use fnb_core::weather::{WeatherHistory, WeatherObservation};
use fnb_utils::columns::find_column;
use fnb_utils::dates::parse_date_compact;
use std::path::Path;

const TABLE: &str = "weather history";
const DATE_COLUMNS: [&str; 2] = ["yyyymmdd", "date"];
const TEMPERATURE_COLUMNS: [&str; 1] = ["tg"];
const PRECIPITATION_COLUMNS: [&str; 1] = ["rh"];

fn is_header(line: &str) -> bool {
    line.to_ascii_uppercase().contains("YYYYMMDD")
}

/// Parse a KNMI daily station file into a [`WeatherHistory`].
///
/// The header is the last line naming `YYYYMMDD`, commented out or not.
/// Days with a blank `TG` or `RH` are skipped. Negative precipitation is
/// clamped to zero before scaling.
pub fn parse_weather_history(text: &str) -> anyhow::Result<WeatherHistory> {
    let header = text
        .lines()
        .filter(|l| is_header(l))
        .last()
        .ok_or_else(|| FnbError::schema(TABLE, "YYYYMMDD"))?;
    let header_fields: Vec<&str> = header.trim_start_matches('#').split(',').collect();
    let date_idx = find_column(header_fields.iter().copied(), &DATE_COLUMNS)
        .ok_or_else(|| FnbError::schema(TABLE, "YYYYMMDD"))?;
    let tg_idx = find_column(header_fields.iter().copied(), &TEMPERATURE_COLUMNS)
        .ok_or_else(|| FnbError::schema(TABLE, "TG"))?;
    let rh_idx = find_column(header_fields.iter().copied(), &PRECIPITATION_COLUMNS)
        .ok_or_else(|| FnbError::schema(TABLE, "RH"))?;

    let data: String = text
        .lines()
        .filter(|l| !l.trim_start().starts_with('#') && !is_header(l) && !l.trim().is_empty())
        .flat_map(|l| [l, "\n"])
        .collect();

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(data.as_bytes());

    let mut observations = Vec::new();
    let mut skipped = 0u32;
    for result in rdr.records() {
        let r = result.map_err(FnbError::from)?;
        let Some(date) = r.get(date_idx).and_then(|s| parse_date_compact(s).ok()) else {
            skipped += 1;
            continue;
        };
        let tg: Option<i64> = r.get(tg_idx).and_then(|s| s.parse().ok());
        let rh: Option<i64> = r.get(rh_idx).and_then(|s| s.parse().ok());
        match (tg, rh) {
            (Some(tg), Some(rh)) => observations.push(WeatherObservation {
                date,
                temperature: tg as f64 / 10.0,
                precipitation: rh.max(0) as f64 / 10.0,
            }),
            _ => skipped += 1,
        }
    }
    log::info!(
        "loader: Loaded {} weather days, skipped {} incomplete",
        observations.len(),
        skipped
    );
    Ok(WeatherHistory::from_observations(observations))
}

/// Read and parse the KNMI file at `path`.
pub fn load_weather_history(path: &Path) -> anyhow::Result<WeatherHistory> {
    parse_weather_history(&read_source(path)?)
}
