use crate::context::PipelineContext;
use crate::engine::{
    predict_key, summarize_by_group, ForecastConfig, ForecastOutcome, GroupSummary, KeyForecast,
};
use crate::ols::Features;
use crate::training::{daily_totals, Granularity, TrainingSet};
use chrono::NaiveDate;
use fnb_core::visitor::{VisitorEstimate, VisitorSource};
use fnb_core::weather::ResolvedWeather;
use serde::Serialize;

/// What to forecast.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    pub date: NaiveDate,
    /// The day the request is made; decides whether observed visitor
    /// counts may be used for `date`.
    pub today: NaiveDate,
    /// Locations in scope; empty means all.
    pub locations: Vec<String>,
    pub granularity: Granularity,
    pub visitor_override: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisitorMetrics {
    pub budgeted: Option<u32>,
    pub actual: Option<u32>,
    /// The figure the predictions were made with.
    pub estimate: Option<VisitorEstimate>,
}

/// Everything reported for one date.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayReport {
    pub date: NaiveDate,
    pub granularity: Granularity,
    pub visitors: VisitorMetrics,
    /// `None` for a past date missing from the weather history.
    pub weather: Option<ResolvedWeather>,
    /// Visitor estimate times the average spend per visitor.
    pub baseline_revenue: Option<f64>,
    pub forecasts: Vec<KeyForecast>,
    /// Only filled at product granularity.
    pub groups: Vec<GroupSummary>,
    pub warnings: Vec<String>,
}

impl DayReport {
    pub fn predicted_count(&self) -> usize {
        self.forecasts.iter().filter(|f| f.outcome.quantity().is_some()).count()
    }
}

fn visitor_metrics(
    ctx: &PipelineContext,
    request: &ForecastRequest,
    config: &ForecastConfig,
) -> VisitorMetrics {
    let record = ctx.visitors.get(&request.date);
    let estimate = match request.visitor_override {
        Some(count) => Some(VisitorEstimate {
            count,
            source: VisitorSource::Override,
        }),
        None => record.map(|r| r.estimate_for(request.today, config.budget_factor)),
    };
    VisitorMetrics {
        budgeted: record.map(|r| r.budgeted),
        actual: record.and_then(|r| r.actual),
        estimate,
    }
}

/// Build the report for one date.
///
/// `weather` has already been resolved by the caller (with the fallback
/// substituted when needed); a warning about it goes in `weather_warning`.
/// Missing inputs never fail the report: they surface as warnings and as
/// per-key outcomes.
pub fn build_day_report(
    ctx: &PipelineContext,
    request: &ForecastRequest,
    weather: Option<ResolvedWeather>,
    weather_warning: Option<String>,
    config: &ForecastConfig,
) -> DayReport {
    let mut warnings: Vec<String> = weather_warning.into_iter().collect();
    if weather.is_none() && warnings.is_empty() {
        warnings.push(format!("no weather for {}", request.date));
    }

    let visitors = visitor_metrics(ctx, request, config);
    if visitors.estimate.is_none() {
        warnings.push(format!("no visitor figure for {}", request.date));
    }

    let training = TrainingSet::build(ctx, request.date, &request.locations, request.granularity);
    let actuals = daily_totals(
        ctx.sales_in_scope(&request.locations).filter(|r| r.date == request.date),
        request.granularity,
    );
    if request.date < request.today && !ctx.has_sales_on(request.date, &request.locations) {
        warnings.push(format!("no sales recorded for {}", request.date));
    }

    let inputs = match (visitors.estimate, weather) {
        (Some(e), Some(w)) => Ok(Features::new(f64::from(e.count), w.temperature, w.precipitation)),
        (None, _) => Err("visitor count"),
        (Some(_), None) => Err("weather"),
    };

    let mut keys: Vec<_> = training.rows.keys().chain(actuals.keys()).cloned().collect();
    keys.sort();
    keys.dedup();

    let forecasts: Vec<KeyForecast> = keys
        .into_iter()
        .map(|key| {
            let rows = training.rows.get(&key).map(Vec::as_slice).unwrap_or(&[]);
            let outcome = match &inputs {
                Ok(inputs) => predict_key(&key, rows, inputs, config),
                Err(missing) => ForecastOutcome::Unavailable {
                    missing: missing.to_string(),
                },
            };
            let actual = actuals.get(&key).and_then(|days| days.get(&request.date));
            KeyForecast {
                key,
                outcome,
                actual_quantity: actual.map(|a| a.quantity),
                actual_revenue: actual.map(|a| a.revenue),
            }
        })
        .collect();

    let groups = match request.granularity {
        Granularity::Product => summarize_by_group(&forecasts),
        Granularity::Group => Vec::new(),
    };
    let baseline_revenue = visitors
        .estimate
        .map(|e| f64::from(e.count) * config.spend_per_visitor);

    let report = DayReport {
        date: request.date,
        granularity: request.granularity,
        visitors,
        weather,
        baseline_revenue,
        forecasts,
        groups,
        warnings,
    };
    log::info!(
        "forecast: {} predicted {} of {} keys ({} training rows)",
        report.date,
        report.predicted_count(),
        report.forecasts.len(),
        training.len()
    );
    report
}
