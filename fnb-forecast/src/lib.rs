//! Sales forecasting for the park's food-and-beverage outlets.
//!
//! For a target date every product (or product group) gets its own linear
//! model of quantity sold on visitors, temperature and precipitation, fitted
//! on the days strictly before the target. Models are refitted on every
//! request.

pub mod backtest;
pub mod context;
pub mod engine;
pub mod ols;
pub mod report;
pub mod training;

pub use backtest::{backtest, BacktestReport, KeyAccuracy};
pub use context::PipelineContext;
pub use engine::{
    predict_key, summarize_by_group, ForecastConfig, ForecastOutcome, GroupSummary, KeyForecast,
};
pub use ols::{Features, FitError, LinearModel};
pub use report::{build_day_report, DayReport, ForecastRequest, VisitorMetrics};
pub use training::{ForecastKey, Granularity, TrainingRow, TrainingSet};
