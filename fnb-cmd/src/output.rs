//! Rendering of reports as text tables, JSON or CSV.

use crate::args::OutputFormat;
use fnb_core::weather::{ResolvedWeather, WeatherSource};
use fnb_forecast::{BacktestReport, DayReport, ForecastOutcome, KeyForecast};
use serde::Serialize;
use std::fmt::Write as _;
use std::io::Write;

fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

fn money(value: Option<f64>) -> String {
    value.map(|v| format!("{:.2}", v)).unwrap_or_else(|| "-".to_string())
}

pub(crate) fn source_name(source: WeatherSource) -> &'static str {
    match source {
        WeatherSource::Historical => "historical",
        WeatherSource::Forecast => "forecast",
        WeatherSource::Fallback => "fallback",
        WeatherSource::Override => "override",
    }
}

pub fn weather_line(date: chrono::NaiveDate, weather: Option<&ResolvedWeather>) -> String {
    match weather {
        Some(w) => format!(
            "{}  {:.1} °C  {:.1} mm  ({})",
            date,
            w.temperature,
            w.precipitation,
            source_name(w.source)
        ),
        None => format!("{}  unavailable", date),
    }
}

fn status(outcome: &ForecastOutcome) -> String {
    match outcome {
        ForecastOutcome::Predicted { training_rows, r_squared, .. } => {
            format!("{} days, r2 {:.2}", training_rows, r_squared)
        }
        ForecastOutcome::InsufficientData { available, required } => {
            format!("insufficient data ({}/{})", available, required)
        }
        ForecastOutcome::Unavailable { missing } => format!("no {}", missing),
    }
}

fn forecast_row(out: &mut String, f: &KeyForecast) {
    let _ = writeln!(
        out,
        "  {:<18} {:<28} {:>9} {:>10} {:>8} {:>10}  {}",
        f.key.product_group,
        f.key.product.as_deref().unwrap_or("*"),
        or_dash(f.outcome.quantity()),
        money(f.outcome.revenue()),
        or_dash(f.actual_quantity),
        money(f.actual_revenue),
        status(&f.outcome)
    );
}

/// Plain-text rendering of one day.
pub fn render_day_report(report: &DayReport) -> String {
    let mut out = String::new();
    let visitors = match report.visitors.estimate {
        Some(e) => format!("{} ({:?})", e.count, e.source).to_lowercase(),
        None => "-".to_string(),
    };
    let _ = writeln!(out, "== {} ==", report.date);
    let _ = writeln!(
        out,
        "visitors: {}  budgeted {}  actual {}",
        visitors,
        or_dash(report.visitors.budgeted),
        or_dash(report.visitors.actual)
    );
    let _ = writeln!(out, "weather:  {}", weather_line(report.date, report.weather.as_ref()));
    let _ = writeln!(out, "baseline revenue: {}", money(report.baseline_revenue));
    for warning in &report.warnings {
        let _ = writeln!(out, "warning: {}", warning);
    }
    let _ = writeln!(
        out,
        "  {:<18} {:<28} {:>9} {:>10} {:>8} {:>10}  {}",
        "GROUP", "PRODUCT", "PREDICTED", "REVENUE", "SOLD", "SOLD EUR", "MODEL"
    );
    for forecast in &report.forecasts {
        forecast_row(&mut out, forecast);
    }
    if !report.groups.is_empty() {
        let _ = writeln!(out, "  -- groups --");
        for g in &report.groups {
            let _ = writeln!(
                out,
                "  {:<18} {:<28} {:>9} {:>10} {:>8} {:>10}  {} without forecast",
                g.product_group,
                format!("{} products", g.predicted_products + g.missing_products),
                or_dash(g.predicted_quantity),
                money(g.predicted_revenue),
                or_dash(g.actual_quantity),
                money(g.actual_revenue),
                g.missing_products
            );
        }
    }
    out
}

/// One CSV row per forecast key.
#[derive(Serialize)]
struct ForecastCsvRow<'a> {
    date: String,
    product_group: &'a str,
    product: &'a str,
    status: &'static str,
    predicted_quantity: Option<u64>,
    predicted_revenue: Option<f64>,
    actual_quantity: Option<f64>,
    actual_revenue: Option<f64>,
}

fn status_name(outcome: &ForecastOutcome) -> &'static str {
    match outcome {
        ForecastOutcome::Predicted { .. } => "predicted",
        ForecastOutcome::InsufficientData { .. } => "insufficient_data",
        ForecastOutcome::Unavailable { .. } => "unavailable",
    }
}

pub fn write_reports_csv<W: Write>(writer: W, reports: &[DayReport]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    for report in reports {
        for f in &report.forecasts {
            wtr.serialize(ForecastCsvRow {
                date: report.date.to_string(),
                product_group: &f.key.product_group,
                product: f.key.product.as_deref().unwrap_or(""),
                status: status_name(&f.outcome),
                predicted_quantity: f.outcome.quantity(),
                predicted_revenue: f.outcome.revenue(),
                actual_quantity: f.actual_quantity,
                actual_revenue: f.actual_revenue,
            })?;
        }
    }
    wtr.flush()?;
    Ok(())
}

pub fn print_day_reports(reports: &[DayReport], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => {
            for report in reports {
                println!("{}", render_day_report(report));
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(reports)?),
        OutputFormat::Csv => write_reports_csv(std::io::stdout().lock(), reports)?,
    }
    Ok(())
}

pub fn render_backtest(report: &BacktestReport) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "backtest {} to {}: {} days evaluated, {} skipped",
        report.from, report.to, report.days_evaluated, report.days_skipped
    );
    let _ = writeln!(out, "  {:<18} {:<28} {:>5} {:>8}", "GROUP", "PRODUCT", "DAYS", "MAE");
    for k in &report.keys {
        let _ = writeln!(
            out,
            "  {:<18} {:<28} {:>5} {:>8.2}",
            k.key.product_group,
            k.key.product.as_deref().unwrap_or("*"),
            k.days,
            k.mean_absolute_error
        );
    }
    let _ = writeln!(
        out,
        "overall MAE: {}",
        report
            .overall_mae
            .map(|m| format!("{:.2}", m))
            .unwrap_or_else(|| "-".to_string())
    );
    out
}

#[derive(Serialize)]
struct BacktestCsvRow<'a> {
    product_group: &'a str,
    product: &'a str,
    days: usize,
    mean_absolute_error: f64,
}

pub fn print_backtest(report: &BacktestReport, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => print!("{}", render_backtest(report)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
        OutputFormat::Csv => {
            let mut wtr = csv::Writer::from_writer(std::io::stdout().lock());
            for k in &report.keys {
                wtr.serialize(BacktestCsvRow {
                    product_group: &k.key.product_group,
                    product: k.key.product.as_deref().unwrap_or(""),
                    days: k.days,
                    mean_absolute_error: k.mean_absolute_error,
                })?;
            }
            wtr.flush()?;
        }
    }
    Ok(())
}
