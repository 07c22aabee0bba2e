//! `weather`: show the weather the forecast would use.

use crate::args::{OutputFormat, ProviderArgs};
use crate::output::{source_name, weather_line};
use chrono::NaiveDate;
use fnb_core::date_range::DateRange;
use fnb_core::weather::client::OpenWeatherClient;
use fnb_core::weather::resolver::WeatherResolver;
use fnb_core::weather::ResolvedWeather;
use fnb_data::load_weather_history;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct WeatherRow {
    date: NaiveDate,
    weather: Option<ResolvedWeather>,
    warning: Option<String>,
}

pub async fn run_weather(
    weather_history: &Path,
    provider: &ProviderArgs,
    date: Option<NaiveDate>,
    to: Option<NaiveDate>,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let today = provider.today();
    let from = date.unwrap_or(today);
    let to = to.unwrap_or(from);
    if to < from {
        anyhow::bail!("--to {} is before --date {}", to, from);
    }
    let history = load_weather_history(weather_history)?;
    let config = provider.weather_config();
    let client = OpenWeatherClient::new(&config)?;
    let resolver = WeatherResolver::new(&history, &client, &config, today);

    let mut rows = Vec::new();
    for date in DateRange(from, to) {
        let (weather, warning) = resolver.resolve_or_fallback(date).await;
        rows.push(WeatherRow { date, weather, warning });
    }

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&rows)?),
        OutputFormat::Table => {
            for row in &rows {
                println!("{}", weather_line(row.date, row.weather.as_ref()));
                if let Some(warning) = &row.warning {
                    println!("  warning: {}", warning);
                }
            }
        }
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout().lock());
            wtr.write_record(["date", "temperature", "precipitation", "source"])?;
            for row in &rows {
                let (temperature, precipitation, source) = match &row.weather {
                    Some(w) => (
                        format!("{:.1}", w.temperature),
                        format!("{:.1}", w.precipitation),
                        source_name(w.source),
                    ),
                    None => (String::new(), String::new(), "unavailable"),
                };
                wtr.write_record([
                    row.date.to_string(),
                    temperature,
                    precipitation,
                    source.to_string(),
                ])?;
            }
            wtr.flush()?;
        }
    }
    Ok(())
}
