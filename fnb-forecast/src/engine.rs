use crate::ols::{Features, LinearModel};
use crate::training::{ForecastKey, TrainingRow};
use serde::Serialize;
use std::collections::BTreeMap;

/// Policy constants of the forecast engine.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastConfig {
    /// Complete training rows a key needs before a model is fitted.
    pub min_training_rows: usize,
    /// Also fit and report revenue.
    pub include_revenue: bool,
    /// Multiplier on the budgeted visitor count for dates without an
    /// observed count.
    pub budget_factor: f64,
    /// Average food-and-beverage spend per visitor, in euro.
    pub spend_per_visitor: f64,
}

impl Default for ForecastConfig {
    fn default() -> Self {
        Self {
            min_training_rows: 3,
            include_revenue: true,
            budget_factor: 1.0,
            spend_per_visitor: 4.50,
        }
    }
}

/// Result of forecasting one key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ForecastOutcome {
    Predicted {
        quantity: u64,
        revenue: Option<f64>,
        training_rows: usize,
        r_squared: f64,
    },
    InsufficientData {
        available: usize,
        required: usize,
    },
    /// An input needed for the prediction itself is missing.
    Unavailable { missing: String },
}

impl ForecastOutcome {
    pub fn quantity(&self) -> Option<u64> {
        match self {
            ForecastOutcome::Predicted { quantity, .. } => Some(*quantity),
            _ => None,
        }
    }

    pub fn revenue(&self) -> Option<f64> {
        match self {
            ForecastOutcome::Predicted { revenue, .. } => *revenue,
            _ => None,
        }
    }
}

/// Forecast of one key, with what was actually sold when known.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeyForecast {
    pub key: ForecastKey,
    pub outcome: ForecastOutcome,
    pub actual_quantity: Option<f64>,
    pub actual_revenue: Option<f64>,
}

/// Non-negative, rounded quantity.
pub fn clamp_quantity(raw: f64) -> u64 {
    if raw.is_finite() {
        raw.max(0.0).round() as u64
    } else {
        0
    }
}

/// Non-negative revenue, kept to the cent.
pub fn clamp_revenue(raw: f64) -> f64 {
    (raw.max(0.0) * 100.0).round() / 100.0
}

/// Fit the key's rows and predict at `inputs`.
///
/// A key below the row threshold, or whose quantity fit fails, reports
/// [`ForecastOutcome::InsufficientData`]. A failed revenue fit only drops the
/// revenue.
pub fn predict_key(
    key: &ForecastKey,
    rows: &[TrainingRow],
    inputs: &Features,
    config: &ForecastConfig,
) -> ForecastOutcome {
    let insufficient = ForecastOutcome::InsufficientData {
        available: rows.len(),
        required: config.min_training_rows,
    };
    if rows.is_empty() || rows.len() < config.min_training_rows {
        return insufficient;
    }
    let features: Vec<Features> = rows.iter().map(|r| r.features).collect();
    let quantities: Vec<f64> = rows.iter().map(|r| r.quantity).collect();

    let model = match LinearModel::fit(&features, &quantities) {
        Ok(model) => model,
        Err(e) => {
            log::warn!("forecast: fit failed for {}: {}", key, e);
            return insufficient;
        }
    };
    let raw = model.predict(inputs);
    if !raw.is_finite() {
        log::warn!("forecast: non-finite prediction for {}", key);
        return insufficient;
    }
    log::debug!(
        "forecast: {} raw {:.2} from {} rows (r2 {:.3})",
        key,
        raw,
        model.n_observations,
        model.r_squared
    );

    let revenue = if config.include_revenue {
        let revenues: Vec<f64> = rows.iter().map(|r| r.revenue).collect();
        match LinearModel::fit(&features, &revenues) {
            Ok(m) => Some(m.predict(inputs)).filter(|r| r.is_finite()).map(clamp_revenue),
            Err(e) => {
                log::warn!("forecast: revenue fit failed for {}: {}", key, e);
                None
            }
        }
    } else {
        None
    };

    ForecastOutcome::Predicted {
        quantity: clamp_quantity(raw),
        revenue,
        training_rows: rows.len(),
        r_squared: model.r_squared,
    }
}

/// Per-group totals of product forecasts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupSummary {
    pub product_group: String,
    /// Sum over the products with a prediction; `None` if there are none.
    pub predicted_quantity: Option<u64>,
    pub predicted_revenue: Option<f64>,
    pub predicted_products: usize,
    /// Products reported without a prediction.
    pub missing_products: usize,
    pub actual_quantity: Option<f64>,
    pub actual_revenue: Option<f64>,
}

fn add_option(total: Option<f64>, value: Option<f64>) -> Option<f64> {
    match (total, value) {
        (Some(t), Some(v)) => Some(t + v),
        (None, v) => v,
        (t, None) => t,
    }
}

/// Roll product forecasts up to their product groups.
pub fn summarize_by_group(forecasts: &[KeyForecast]) -> Vec<GroupSummary> {
    let mut groups: BTreeMap<&str, GroupSummary> = BTreeMap::new();
    for forecast in forecasts {
        let group = forecast.key.product_group.as_str();
        let summary = groups.entry(group).or_insert_with(|| GroupSummary {
            product_group: group.to_string(),
            predicted_quantity: None,
            predicted_revenue: None,
            predicted_products: 0,
            missing_products: 0,
            actual_quantity: None,
            actual_revenue: None,
        });
        match &forecast.outcome {
            ForecastOutcome::Predicted { quantity, revenue, .. } => {
                summary.predicted_quantity =
                    Some(summary.predicted_quantity.unwrap_or(0) + quantity);
                summary.predicted_revenue = add_option(summary.predicted_revenue, *revenue);
                summary.predicted_products += 1;
            }
            _ => summary.missing_products += 1,
        }
        summary.actual_quantity = add_option(summary.actual_quantity, forecast.actual_quantity);
        summary.actual_revenue = add_option(summary.actual_revenue, forecast.actual_revenue);
    }
    groups
        .into_values()
        .map(|mut s| {
            s.predicted_revenue = s.predicted_revenue.map(clamp_revenue);
            s
        })
        .collect()
}
