//! Arguments shared by several subcommands.

use chrono::{Local, NaiveDate};
use clap::{Args, ValueEnum};
use fnb_core::weather::{WeatherConfig, DEFAULT_BASE_URL, DEFAULT_LATITUDE, DEFAULT_LONGITUDE};
use fnb_forecast::ForecastConfig;
use fnb_utils::dates::parse_date_flexible;
use std::path::PathBuf;

/// Outlets whose sales are forecast when no `--location` is given.
pub const DEFAULT_LOCATIONS: [&str; 3] = ["Entree", "Oranjerie", "Bloemenkas"];

/// Accept any date format the exports use.
pub fn parse_date_arg(s: &str) -> Result<NaiveDate, String> {
    parse_date_flexible(s).map_err(|e| e.to_string())
}

/// The given locations, or the default outlets.
pub fn locations_or_default(locations: &[String]) -> Vec<String> {
    if locations.is_empty() {
        DEFAULT_LOCATIONS.iter().map(|l| l.to_string()).collect()
    } else {
        locations.to_vec()
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

/// Where the historical exports live.
#[derive(Args, Debug, Clone)]
pub struct SourceArgs {
    /// CSV export of the budget sheet (visitors per date)
    #[arg(long, env = "FNB_BUDGET_CSV", value_name = "FILE")]
    pub budget_csv: PathBuf,

    /// Directory with one sub-directory of daily sales exports per location
    #[arg(long, env = "FNB_SALES_DIR", value_name = "DIR")]
    pub sales_dir: PathBuf,

    /// KNMI daily weather file
    #[arg(long, env = "FNB_WEATHER_HISTORY", value_name = "FILE")]
    pub weather_history: PathBuf,
}

/// Forecast provider settings.
#[derive(Args, Debug, Clone)]
pub struct ProviderArgs {
    /// OpenWeatherMap API key; without it future dates use the fallback weather
    #[arg(long, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, default_value_t = DEFAULT_LATITUDE, allow_negative_numbers = true)]
    pub latitude: f64,

    #[arg(long, default_value_t = DEFAULT_LONGITUDE, allow_negative_numbers = true)]
    pub longitude: f64,

    #[arg(long, default_value = DEFAULT_BASE_URL)]
    pub weather_url: String,

    /// Days after today the forecast covers
    #[arg(long, default_value_t = 5)]
    pub horizon_days: i64,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 10)]
    pub timeout_secs: u64,

    /// Treat this date as today
    #[arg(long, value_parser = parse_date_arg, value_name = "DATE")]
    pub today: Option<NaiveDate>,
}

impl ProviderArgs {
    pub fn weather_config(&self) -> WeatherConfig {
        WeatherConfig {
            latitude: self.latitude,
            longitude: self.longitude,
            base_url: self.weather_url.clone(),
            api_key: self.api_key.clone(),
            horizon_days: self.horizon_days,
            timeout_secs: self.timeout_secs,
            ..WeatherConfig::default()
        }
    }

    pub fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }
}

/// Forecast policy settings.
#[derive(Args, Debug, Clone)]
pub struct PolicyArgs {
    /// Training days a product needs before it is forecast
    #[arg(long, default_value_t = 3)]
    pub min_training_rows: usize,

    /// Multiplier on the budgeted visitors for dates without an actual count
    #[arg(long, default_value_t = 1.0)]
    pub budget_factor: f64,

    /// Average spend per visitor in euro, for the rule-of-thumb revenue
    #[arg(long, default_value_t = 4.50)]
    pub spend_per_visitor: f64,

    /// Only forecast quantities
    #[arg(long)]
    pub no_revenue: bool,
}

impl PolicyArgs {
    pub fn forecast_config(&self) -> ForecastConfig {
        ForecastConfig {
            min_training_rows: self.min_training_rows,
            include_revenue: !self.no_revenue,
            budget_factor: self.budget_factor,
            spend_per_visitor: self.spend_per_visitor,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn date_args_accept_export_formats() {
        let expected = NaiveDate::from_ymd_opt(2025, 5, 19).unwrap();
        assert_eq!(parse_date_arg("2025-05-19"), Ok(expected));
        assert_eq!(parse_date_arg("19-05-2025"), Ok(expected));
        assert!(parse_date_arg("morgen").is_err());
    }

    #[test]
    fn default_locations() {
        assert_eq!(locations_or_default(&[]), vec!["Entree", "Oranjerie", "Bloemenkas"]);
        let one = vec!["Oranjerie".to_string()];
        assert_eq!(locations_or_default(&one), one);
    }

    #[test]
    fn policy_maps_to_config() {
        let policy = PolicyArgs {
            min_training_rows: 8,
            budget_factor: 1.05,
            spend_per_visitor: 4.5,
            no_revenue: true,
        };
        let config = policy.forecast_config();
        assert_eq!(config.min_training_rows, 8);
        assert!(!config.include_revenue);
    }
}
