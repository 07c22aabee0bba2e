//! `predict`: forecast the sales of one or more dates.

use crate::args::{locations_or_default, OutputFormat, PolicyArgs, ProviderArgs, SourceArgs};
use crate::output::print_day_reports;
use chrono::NaiveDate;
use fnb_core::date_range::DateRange;
use fnb_core::visitor::VisitorTable;
use fnb_core::weather::client::OpenWeatherClient;
use fnb_core::weather::resolver::WeatherResolver;
use fnb_core::weather::{ResolvedWeather, WeatherSource};
use fnb_data::{load_sales_records, load_visitor_records, load_weather_history};
use fnb_forecast::{build_day_report, DayReport, ForecastRequest, Granularity, PipelineContext};
use log::info;

pub struct PredictOptions {
    pub sources: SourceArgs,
    pub provider: ProviderArgs,
    pub policy: PolicyArgs,
    pub date: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    pub locations: Vec<String>,
    pub granularity: Granularity,
    pub visitors: Option<u32>,
    pub temperature: Option<f64>,
    pub precipitation: Option<f64>,
    pub format: OutputFormat,
}

/// Load the tables needed to forecast up to `until`.
///
/// Sales are read from the first budget sheet date on; earlier days have
/// no visitor count to train with.
pub fn load_context(
    sources: &SourceArgs,
    until: NaiveDate,
    locations: &[String],
) -> anyhow::Result<PipelineContext> {
    let visitors = VisitorTable::from_records(load_visitor_records(&sources.budget_csv)?);
    let weather = load_weather_history(&sources.weather_history)?;
    let from = visitors
        .date_bounds()
        .map(|(first, _)| first)
        .unwrap_or(until)
        .min(until);
    let sales = load_sales_records(&sources.sales_dir, DateRange(from, until), locations)?;
    info!(
        "loader: {} visitor days, {} weather days, {} sales records",
        visitors.len(),
        weather.len(),
        sales.len()
    );
    Ok(PipelineContext::new(visitors, weather, sales))
}

fn weather_override(options: &PredictOptions) -> anyhow::Result<Option<ResolvedWeather>> {
    match (options.temperature, options.precipitation) {
        (Some(temperature), Some(precipitation)) => Ok(Some(ResolvedWeather {
            temperature,
            precipitation,
            source: WeatherSource::Override,
        })),
        (None, None) => Ok(None),
        _ => anyhow::bail!("--temperature and --precipitation must be given together"),
    }
}

pub async fn predict_reports(options: &PredictOptions) -> anyhow::Result<Vec<DayReport>> {
    let today = options.provider.today();
    let from = options.date.unwrap_or(today);
    let to = options.to.unwrap_or(from);
    if to < from {
        anyhow::bail!("--to {} is before --date {}", to, from);
    }
    let manual_weather = weather_override(options)?;
    let locations = locations_or_default(&options.locations);
    let config = options.policy.forecast_config();
    let weather_config = options.provider.weather_config();

    let ctx = load_context(&options.sources, to, &locations)?;
    let client = OpenWeatherClient::new(&weather_config)?;
    let resolver = WeatherResolver::new(&ctx.weather, &client, &weather_config, today);

    let mut reports = Vec::with_capacity(DateRange(from, to).num_days());
    for date in DateRange(from, to) {
        let (weather, warning) = match manual_weather {
            Some(weather) => (Some(weather), None),
            None => resolver.resolve_or_fallback(date).await,
        };
        let request = ForecastRequest {
            date,
            today,
            locations: locations.clone(),
            granularity: options.granularity,
            visitor_override: options.visitors,
        };
        reports.push(build_day_report(&ctx, &request, weather, warning, &config));
    }
    Ok(reports)
}

pub async fn run_predict(options: PredictOptions) -> anyhow::Result<()> {
    let reports = predict_reports(&options).await?;
    print_day_reports(&reports, options.format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
    }

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn fixture() -> TempDir {
        let dir = TempDir::new().unwrap();
        let mut budget = String::from("Datum;Begroot aantal bezoekers;Totaal aantal bezoekers\n");
        let mut knmi = String::from("# STN,YYYYMMDD,   TG,   RH\n");
        for d in 1..=6u32 {
            let visitors = 300 + 100 * d;
            budget.push_str(&format!("{:02}-05-2025;{};{}\n", d, visitors, visitors));
            knmi.push_str(&format!("  375,202505{:02},  {},   {}\n", d, 140 + 5 * d, d % 2 * 10));
            let sold = visitors / 10;
            write(
                &dir.path().join(format!("kassa/Entree/2025-05-{:02}.csv", d)),
                &format!(
                    "Productgroep;Product;Aantal;Netto omzet\nSoepen;Tomatensoep;{};{},00\n",
                    sold,
                    sold * 5
                ),
            );
        }
        budget.push_str("10-05-2025;800;\n");
        write(&dir.path().join("budget.csv"), &budget);
        write(&dir.path().join("knmi.txt"), &knmi);
        dir
    }

    fn options(dir: &Path) -> PredictOptions {
        PredictOptions {
            sources: SourceArgs {
                budget_csv: dir.join("budget.csv"),
                sales_dir: dir.join("kassa"),
                weather_history: dir.join("knmi.txt"),
            },
            provider: ProviderArgs {
                api_key: None,
                latitude: 51.8731,
                longitude: 5.5755,
                weather_url: "http://localhost".to_string(),
                horizon_days: 5,
                timeout_secs: 1,
                today: Some(day(9)),
            },
            policy: PolicyArgs {
                min_training_rows: 3,
                budget_factor: 1.0,
                spend_per_visitor: 4.5,
                no_revenue: false,
            },
            date: Some(day(10)),
            to: None,
            locations: vec!["Entree".to_string()],
            granularity: Granularity::Product,
            visitors: None,
            temperature: None,
            precipitation: None,
            format: OutputFormat::Json,
        }
    }

    #[tokio::test]
    async fn future_date_without_provider_uses_fallback() {
        let dir = fixture();
        let reports = predict_reports(&options(dir.path())).await.unwrap();
        assert_eq!(reports.len(), 1);
        let report = &reports[0];
        assert_eq!(report.weather.unwrap().source, WeatherSource::Fallback);
        assert!(!report.warnings.is_empty());
        assert_eq!(report.visitors.estimate.unwrap().count, 800);
        assert_eq!(report.forecasts[0].outcome.quantity(), Some(80));
    }

    #[tokio::test]
    async fn past_range_uses_history_and_actuals() {
        let dir = fixture();
        let mut opts = options(dir.path());
        opts.date = Some(day(5));
        opts.to = Some(day(6));
        opts.temperature = None;
        let reports = predict_reports(&opts).await.unwrap();
        assert_eq!(reports.len(), 2);
        assert!(reports
            .iter()
            .all(|r| r.weather.map(|w| w.source) == Some(WeatherSource::Historical)));
        assert_eq!(reports[1].forecasts[0].actual_quantity, Some(90.0));
        assert_eq!(reports[1].forecasts[0].outcome.quantity(), Some(90));
    }

    #[tokio::test]
    async fn manual_weather_needs_both_values() {
        let dir = fixture();
        let mut opts = options(dir.path());
        opts.temperature = Some(20.0);
        assert!(predict_reports(&opts).await.is_err());
        opts.precipitation = Some(0.0);
        let reports = predict_reports(&opts).await.unwrap();
        assert_eq!(reports[0].weather.unwrap().source, WeatherSource::Override);
    }

    #[tokio::test]
    async fn reversed_range_is_rejected() {
        let dir = fixture();
        let mut opts = options(dir.path());
        opts.to = Some(day(1));
        assert!(predict_reports(&opts).await.is_err());
    }

    #[tokio::test]
    async fn past_date_missing_from_weather_history_is_unavailable() {
        let dir = fixture();
        let budget = dir.path().join("budget.csv");
        let mut content = std::fs::read_to_string(&budget).unwrap();
        content.push_str("07-05-2025;1000;1000\n");
        std::fs::write(&budget, content).unwrap();
        let mut opts = options(dir.path());
        opts.date = Some(day(7));

        let reports = predict_reports(&opts).await.unwrap();
        let report = &reports[0];
        assert_eq!(report.weather, None);
        assert_eq!(report.visitors.estimate.unwrap().count, 1000);
        assert!(report.forecasts.iter().all(|f| f.outcome.quantity().is_none()));
        assert!(report.warnings.iter().any(|w| w.contains("no historical weather")));
    }

    #[tokio::test]
    async fn windows_1252_export_does_not_abort_the_run() {
        let dir = fixture();
        std::fs::write(
            dir.path().join("kassa/Entree/2025-05-07.csv"),
            b"Productgroep;Product;Aantal;Netto omzet\nDesserts;Cr\xE8me br\xFBl\xE9e;3;16,50\n",
        )
        .unwrap();
        let mut opts = options(dir.path());
        opts.date = Some(day(7));
        opts.temperature = Some(20.0);
        opts.precipitation = Some(0.0);

        let reports = predict_reports(&opts).await.unwrap();
        let dessert = reports[0]
            .forecasts
            .iter()
            .find(|f| f.key.product_group == "Desserts")
            .unwrap();
        assert_eq!(dessert.actual_quantity, Some(3.0));
    }
}
