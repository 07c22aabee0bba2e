//! Command implementations for the FNB forecasting CLI.
//!
//! Provides subcommands to forecast food-and-beverage sales per product,
//! inspect the weather inputs, and backtest the forecasts against past
//! sales.

use chrono::NaiveDate;
use clap::Subcommand;
use fnb_forecast::Granularity;
use std::path::PathBuf;

pub mod args;
pub mod backtest;
pub mod output;
pub mod predict;
pub mod weather;

use args::{parse_date_arg, OutputFormat, PolicyArgs, ProviderArgs, SourceArgs};

#[derive(Subcommand)]
pub enum Command {
    /// Forecast sales per product (or product group) for one or more dates
    Predict {
        #[command(flatten)]
        sources: SourceArgs,

        #[command(flatten)]
        provider: ProviderArgs,

        #[command(flatten)]
        policy: PolicyArgs,

        /// First date to forecast (default: today)
        #[arg(short, long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,

        /// Last date to forecast (default: --date)
        #[arg(long, value_parser = parse_date_arg)]
        to: Option<NaiveDate>,

        /// Outlet to include; repeat for several (default: all outlets)
        #[arg(short, long = "location")]
        locations: Vec<String>,

        /// Forecast per product or per product group
        #[arg(short, long, default_value_t = Granularity::Product)]
        granularity: Granularity,

        /// Use this visitor count instead of the budget sheet
        #[arg(long)]
        visitors: Option<u32>,

        /// Use this temperature (°C) instead of resolving the weather
        #[arg(long, allow_negative_numbers = true)]
        temperature: Option<f64>,

        /// Use this precipitation (mm) instead of resolving the weather
        #[arg(long)]
        precipitation: Option<f64>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Show the temperature and precipitation used for a date
    Weather {
        /// KNMI daily weather file
        #[arg(long, env = "FNB_WEATHER_HISTORY", value_name = "FILE")]
        weather_history: PathBuf,

        #[command(flatten)]
        provider: ProviderArgs,

        #[arg(short, long, value_parser = parse_date_arg)]
        date: Option<NaiveDate>,

        #[arg(long, value_parser = parse_date_arg)]
        to: Option<NaiveDate>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Replay past days and report the mean absolute error per product
    Backtest {
        #[command(flatten)]
        sources: SourceArgs,

        #[command(flatten)]
        policy: PolicyArgs,

        #[arg(long, value_parser = parse_date_arg)]
        from: NaiveDate,

        #[arg(long, value_parser = parse_date_arg)]
        to: NaiveDate,

        #[arg(short, long = "location")]
        locations: Vec<String>,

        #[arg(short, long, default_value_t = Granularity::Product)]
        granularity: Granularity,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    match command {
        Command::Predict {
            sources,
            provider,
            policy,
            date,
            to,
            locations,
            granularity,
            visitors,
            temperature,
            precipitation,
            format,
        } => {
            predict::run_predict(predict::PredictOptions {
                sources,
                provider,
                policy,
                date,
                to,
                locations,
                granularity,
                visitors,
                temperature,
                precipitation,
                format,
            })
            .await
        }
        Command::Weather {
            weather_history,
            provider,
            date,
            to,
            format,
        } => weather::run_weather(&weather_history, &provider, date, to, format).await,
        Command::Backtest {
            sources,
            policy,
            from,
            to,
            locations,
            granularity,
            format,
        } => backtest::run_backtest(&sources, &policy, from, to, &locations, granularity, format),
    }
}
