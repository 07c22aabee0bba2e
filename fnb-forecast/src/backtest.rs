//! Replay past days: predict each from the data before it and compare with
//! what was sold.

use crate::context::PipelineContext;
use crate::engine::{predict_key, ForecastConfig};
use crate::ols::Features;
use crate::training::{daily_totals, ForecastKey, Granularity, TrainingSet};
use chrono::NaiveDate;
use fnb_core::date_range::DateRange;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyAccuracy {
    pub key: ForecastKey,
    pub days: usize,
    pub mean_absolute_error: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub days_evaluated: usize,
    /// Days in the range skipped for lack of sales, visitors or weather.
    pub days_skipped: usize,
    pub keys: Vec<KeyAccuracy>,
    /// Mean absolute error over every evaluated key-day.
    pub overall_mae: Option<f64>,
}

/// Evaluate every day of `range` that has in-scope sales, a visitor count
/// and recorded weather.
///
/// Each day is predicted with the observed visitor count and weather of
/// that day and a model trained only on the days before it. A key that
/// has a prediction but no sales that day counts as zero sold.
pub fn backtest(
    ctx: &PipelineContext,
    range: DateRange,
    locations: &[String],
    granularity: Granularity,
    config: &ForecastConfig,
) -> BacktestReport {
    let mut errors: BTreeMap<ForecastKey, Vec<f64>> = BTreeMap::new();
    let mut days_evaluated = 0;
    let mut days_skipped = 0;

    for date in range {
        let (Some(visitors), Some(weather)) = (ctx.visitors.get(&date), ctx.weather.get(&date))
        else {
            days_skipped += 1;
            continue;
        };
        let actuals = daily_totals(
            ctx.sales_in_scope(locations).filter(|r| r.date == date),
            granularity,
        );
        if actuals.is_empty() {
            days_skipped += 1;
            continue;
        }
        days_evaluated += 1;

        let inputs = Features::new(
            visitors.training_visitors(),
            weather.temperature,
            weather.precipitation,
        );
        let training = TrainingSet::build(ctx, date, locations, granularity);
        for (key, rows) in &training.rows {
            let Some(predicted) = predict_key(key, rows, &inputs, config).quantity() else {
                continue;
            };
            let sold = actuals
                .get(key)
                .and_then(|days| days.get(&date))
                .map(|t| t.quantity)
                .unwrap_or(0.0);
            errors.entry(key.clone()).or_default().push((predicted as f64 - sold).abs());
        }
    }

    let keys: Vec<KeyAccuracy> = errors
        .into_iter()
        .map(|(key, errs)| KeyAccuracy {
            key,
            days: errs.len(),
            mean_absolute_error: errs.iter().sum::<f64>() / errs.len() as f64,
        })
        .collect();
    let total_days: usize = keys.iter().map(|k| k.days).sum();
    let overall_mae = (total_days > 0).then(|| {
        keys.iter()
            .map(|k| k.mean_absolute_error * k.days as f64)
            .sum::<f64>()
            / total_days as f64
    });

    match overall_mae {
        Some(mae) => log::info!(
            "backtest: {} to {}: {} days, {} keys, MAE {:.2}",
            range.0,
            range.1,
            days_evaluated,
            keys.len(),
            mae
        ),
        None => log::warn!("backtest: {} to {}: nothing to evaluate", range.0, range.1),
    }

    BacktestReport {
        from: range.0,
        to: range.1,
        days_evaluated,
        days_skipped,
        keys,
        overall_mae,
    }
}
