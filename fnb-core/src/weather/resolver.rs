use crate::error::{FnbError, Result};
use crate::weather::forecast::{aggregate_blocks, ForecastBlock};
use crate::weather::{ResolvedWeather, WeatherConfig, WeatherHistory, WeatherSource};
use chrono::{NaiveDate, TimeDelta};
use log::{debug, warn};
use std::cell::RefCell;

/// A provider of sub-daily forecast blocks around today.
#[allow(async_fn_in_trait)]
pub trait ForecastSource {
    async fn forecast_blocks(&self) -> Result<Vec<ForecastBlock>>;
}

/// Forecast source used when no provider is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoForecast;

impl ForecastSource for NoForecast {
    async fn forecast_blocks(&self) -> Result<Vec<ForecastBlock>> {
        Err(FnbError::MissingData(
            "no forecast provider configured".to_string(),
        ))
    }
}

impl<F: ForecastSource> ForecastSource for Option<F> {
    async fn forecast_blocks(&self) -> Result<Vec<ForecastBlock>> {
        match self {
            Some(source) => source.forecast_blocks().await,
            None => NoForecast.forecast_blocks().await,
        }
    }
}

/// Resolves the weather covariates for a target date.
///
/// Dates before `today` are exact-date lookups in the history; today up to
/// `today + horizon_days` use the forecast source. The forecast source is
/// asked at most once per resolver; a failure is remembered as well.
pub struct WeatherResolver<'a, F: ForecastSource> {
    history: &'a WeatherHistory,
    forecast: &'a F,
    config: &'a WeatherConfig,
    today: NaiveDate,
    blocks: RefCell<Option<std::result::Result<Vec<ForecastBlock>, String>>>,
}

impl<'a, F: ForecastSource> WeatherResolver<'a, F> {
    pub fn new(
        history: &'a WeatherHistory,
        forecast: &'a F,
        config: &'a WeatherConfig,
        today: NaiveDate,
    ) -> Self {
        Self {
            history,
            forecast,
            config,
            today,
            blocks: RefCell::new(None),
        }
    }

    /// Resolve the weather for `date`, or explain why it is unavailable.
    pub async fn resolve(&self, date: NaiveDate) -> Result<ResolvedWeather> {
        if date < self.today {
            return self
                .history
                .get(&date)
                .map(|o| ResolvedWeather {
                    temperature: o.temperature,
                    precipitation: o.precipitation,
                    source: WeatherSource::Historical,
                })
                .ok_or_else(|| FnbError::MissingData(format!("no historical weather for {date}")));
        }
        let horizon_end = self.today + TimeDelta::days(self.config.horizon_days);
        if date > horizon_end {
            return Err(FnbError::MissingData(format!(
                "{date} is beyond the {}-day forecast horizon",
                self.config.horizon_days
            )));
        }
        let blocks = self.cached_blocks().await?;
        aggregate_blocks(&blocks, date)
            .map(|o| ResolvedWeather {
                temperature: o.temperature,
                precipitation: o.precipitation,
                source: WeatherSource::Forecast,
            })
            .ok_or_else(|| FnbError::MissingData(format!("forecast has no blocks for {date}")))
    }

    /// Resolve the weather for `date`, substituting the configured fallback
    /// when today or a later date cannot be resolved. A past date without a
    /// history row has no weather at all. The second value is a warning to
    /// surface to the user whenever the resolved weather was not used.
    pub async fn resolve_or_fallback(
        &self,
        date: NaiveDate,
    ) -> (Option<ResolvedWeather>, Option<String>) {
        match self.resolve(date).await {
            Ok(weather) => (Some(weather), None),
            Err(e) if date < self.today => {
                warn!("Weather unavailable for {}: {}", date, e);
                (None, Some(format!("weather unavailable ({e})")))
            }
            Err(e) => {
                let fallback = self.config.fallback();
                warn!("Weather unavailable for {}: {}; using fallback", date, e);
                let message = format!(
                    "weather unavailable ({e}); using fallback {:.1} °C / {:.1} mm",
                    fallback.temperature, fallback.precipitation
                );
                (Some(fallback), Some(message))
            }
        }
    }

    async fn cached_blocks(&self) -> Result<Vec<ForecastBlock>> {
        if let Some(cached) = self.blocks.borrow().as_ref() {
            return cached
                .clone()
                .map_err(|e| FnbError::MissingData(format!("forecast unavailable: {e}")));
        }
        let fetched = self.forecast.forecast_blocks().await;
        match &fetched {
            Ok(blocks) => {
                debug!("Fetched {} forecast blocks", blocks.len());
                *self.blocks.borrow_mut() = Some(Ok(blocks.clone()));
            }
            Err(e) => *self.blocks.borrow_mut() = Some(Err(e.to_string())),
        }
        fetched
    }
}
