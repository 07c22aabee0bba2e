use chrono::NaiveDate;
use fnb_core::sales::SalesRecord;
use fnb_core::visitor::{VisitorRecord, VisitorSource, VisitorTable};
use fnb_core::weather::{ResolvedWeather, WeatherHistory, WeatherObservation, WeatherSource};
use fnb_forecast::{
    build_day_report, Features, ForecastConfig, ForecastOutcome, ForecastRequest, Granularity,
    LinearModel, PipelineContext, TrainingSet,
};

fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 5, d).unwrap()
}

/// (visitors, temperature, rain, quantity) for five days of soup sales.
const SOUP_HISTORY: [(u32, f64, f64, f64); 5] = [
    (300, 14.0, 0.0, 31.0),
    (400, 16.0, 1.0, 40.0),
    (450, 12.0, 3.5, 46.0),
    (600, 19.0, 0.0, 59.0),
    (700, 17.0, 2.0, 71.0),
];

fn soup_context() -> PipelineContext {
    let mut visitors: Vec<VisitorRecord> = SOUP_HISTORY
        .iter()
        .enumerate()
        .map(|(i, &(v, ..))| VisitorRecord {
            date: date(i as u32 + 1),
            budgeted: v,
            actual: Some(v),
        })
        .collect();
    visitors.push(VisitorRecord {
        date: date(10),
        budgeted: 500,
        actual: None,
    });
    let weather = SOUP_HISTORY.iter().enumerate().map(|(i, &(_, t, p, _))| WeatherObservation {
        date: date(i as u32 + 1),
        temperature: t,
        precipitation: p,
    });
    let sales = SOUP_HISTORY
        .iter()
        .enumerate()
        .map(|(i, &(.., q))| SalesRecord {
            date: date(i as u32 + 1),
            location: "Entree".to_string(),
            product_group: "Soepen".to_string(),
            product: "Soup".to_string(),
            quantity: q,
            net_revenue: q * 4.75,
        })
        .collect();
    PipelineContext::new(
        VisitorTable::from_records(visitors),
        WeatherHistory::from_observations(weather),
        sales,
    )
}

fn target_weather() -> Option<ResolvedWeather> {
    Some(ResolvedWeather {
        temperature: 18.0,
        precipitation: 2.0,
        source: WeatherSource::Forecast,
    })
}

fn request(target: NaiveDate) -> ForecastRequest {
    ForecastRequest {
        date: target,
        today: date(9),
        locations: vec!["Entree".to_string()],
        granularity: Granularity::Product,
        visitor_override: None,
    }
}

#[test]
fn soup_prediction_follows_fitted_line() {
    let ctx = soup_context();
    let config = ForecastConfig::default();
    let report = build_day_report(&ctx, &request(date(10)), target_weather(), None, &config);

    assert_eq!(report.forecasts.len(), 1);
    let soup = &report.forecasts[0];
    assert_eq!(soup.key.product.as_deref(), Some("Soup"));

    let features: Vec<Features> = SOUP_HISTORY
        .iter()
        .map(|&(v, t, p, _)| Features::new(f64::from(v), t, p))
        .collect();
    let quantities: Vec<f64> = SOUP_HISTORY.iter().map(|&(.., q)| q).collect();
    let line = LinearModel::fit(&features, &quantities).unwrap();
    let expected = line.predict(&Features::new(500.0, 18.0, 2.0)).max(0.0).round() as u64;

    match &soup.outcome {
        ForecastOutcome::Predicted { quantity, training_rows, .. } => {
            assert_eq!(*quantity, expected);
            assert_eq!(*training_rows, 5);
            // roughly one soup per ten visitors
            assert!((45..=55).contains(quantity));
        }
        other => panic!("expected a prediction, got {:?}", other),
    }
    assert_eq!(report.visitors.estimate.unwrap().count, 500);
    assert_eq!(report.visitors.estimate.unwrap().source, VisitorSource::Budget);
}

#[test]
fn repeated_requests_are_identical() {
    let ctx = soup_context();
    let config = ForecastConfig::default();
    let first = build_day_report(&ctx, &request(date(10)), target_weather(), None, &config);
    let second = build_day_report(&ctx, &request(date(10)), target_weather(), None, &config);
    assert_eq!(first, second);
}

#[test]
fn no_training_row_on_or_after_target() {
    let ctx = soup_context();
    for target in 1..=6 {
        let set = TrainingSet::build(&ctx, date(target), &[], Granularity::Product);
        assert!(set.rows.values().flatten().all(|row| row.date < date(target)));
        assert_eq!(set.len(), (target - 1).min(5) as usize);
    }
}

#[test]
fn insufficient_history_is_marked_not_zero() {
    let ctx = soup_context();
    let config = ForecastConfig::default();
    let report = build_day_report(&ctx, &request(date(3)), target_weather(), None, &config);
    assert_eq!(
        report.forecasts[0].outcome,
        ForecastOutcome::InsufficientData {
            available: 2,
            required: 3
        }
    );
    assert_eq!(report.forecasts[0].outcome.quantity(), None);
}

#[test]
fn missing_sales_file_still_reports_metrics() {
    // no sales at all on the 10th; history from the days before still trains
    let ctx = soup_context();
    let mut req = request(date(10));
    req.today = date(11);
    let entered = ResolvedWeather {
        temperature: 15.0,
        precipitation: 0.0,
        source: WeatherSource::Override,
    };
    let config = ForecastConfig::default();
    let report = build_day_report(&ctx, &req, Some(entered), None, &config);
    assert_eq!(report.visitors.budgeted, Some(500));
    assert_eq!(report.weather.map(|w| w.source), Some(WeatherSource::Override));
    assert_eq!(report.forecasts[0].actual_quantity, None);
    assert!(report.forecasts[0].outcome.quantity().is_some());
    assert_eq!(report.warnings, vec!["no sales recorded for 2025-05-10".to_string()]);
}

#[test]
fn past_date_missing_from_weather_history_is_not_guessed() {
    let ctx = soup_context();
    let mut req = request(date(10));
    req.today = date(11);
    let warning = Some("weather unavailable (no historical weather for 2025-05-10)".to_string());
    let report = build_day_report(&ctx, &req, None, warning, &ForecastConfig::default());
    assert_eq!(report.weather, None);
    assert_eq!(report.visitors.budgeted, Some(500));
    assert_eq!(
        report.forecasts[0].outcome,
        ForecastOutcome::Unavailable {
            missing: "weather".to_string()
        }
    );
    assert_eq!(report.warnings.len(), 2);
}
