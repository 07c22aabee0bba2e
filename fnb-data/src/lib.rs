//! Loaders for the park's budget sheet, point-of-sale exports and daily
//! weather history.
//!
//! Every loader parses from a string slice (`parse_*`) and has a file-based
//! wrapper (`load_*`). Headers are normalized before lookup and a missing
//! required column is reported as [`fnb_core::error::FnbError::Schema`].
//!
//! # Formats
//!
//! - **Budget sheet** (CSV export, `;` or `,`):
//!   `Datum;Locatie;Begroot aantal bezoekers;Totaal aantal bezoekers`
//! - **Sales export** (one per location and day, `;`, comma decimals):
//!   `{sales_dir}/{location}/{YYYY-MM-DD}.csv` with `Productgroep;Product;Aantal;Netto omzet`
//! - **Weather history** (KNMI daily station file): `# STN,YYYYMMDD,...,TG,...,RH,...`
//!
//! Files are read as bytes; content that is not valid UTF-8 (Windows-1252
//! exports from the tills) is decoded lossily with a warning.

mod sales;
mod visitors;
mod weather;

pub use sales::{load_sales_records, parse_sales_csv, sales_file_path};
pub use visitors::{load_visitor_records, parse_visitor_csv};
pub use weather::{load_weather_history, parse_weather_history};

use anyhow::Context;
use fnb_core::error::FnbError;
use std::path::Path;

/// Read a source file, replacing invalid UTF-8 sequences.
pub(crate) fn read_source(path: &Path) -> anyhow::Result<String> {
    let bytes = std::fs::read(path)
        .map_err(FnbError::from)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => {
            log::warn!("{} is not valid UTF-8; decoding lossily", path.display());
            Ok(String::from_utf8_lossy(e.as_bytes()).into_owned())
        }
    }
}

/// Pick `;` when the header line uses it, `,` otherwise.
pub(crate) fn detect_delimiter(csv_data: &str) -> u8 {
    let header = csv_data.lines().next().unwrap_or("");
    if header.contains(';') {
        b';'
    } else {
        b','
    }
}
