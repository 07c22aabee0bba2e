//! `backtest`: how well would past days have been forecast.

use crate::args::{locations_or_default, OutputFormat, PolicyArgs, SourceArgs};
use crate::output::print_backtest;
use crate::predict::load_context;
use chrono::NaiveDate;
use fnb_core::date_range::DateRange;
use fnb_forecast::{backtest, Granularity};

pub fn run_backtest(
    sources: &SourceArgs,
    policy: &PolicyArgs,
    from: NaiveDate,
    to: NaiveDate,
    locations: &[String],
    granularity: Granularity,
    format: OutputFormat,
) -> anyhow::Result<()> {
    if to < from {
        anyhow::bail!("--to {} is before --from {}", to, from);
    }
    let locations = locations_or_default(locations);
    let ctx = load_context(sources, to, &locations)?;
    let config = policy.forecast_config();
    let report = backtest(&ctx, DateRange(from, to), &locations, granularity, &config);
    print_backtest(&report, format)
}
