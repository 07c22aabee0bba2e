//! OpenWeatherMap forecast client.

use crate::error::{FnbError, Result};
use crate::weather::forecast::{parse_forecast_response, ForecastBlock};
use crate::weather::resolver::ForecastSource;
use crate::weather::WeatherConfig;
use log::{info, warn};
use reqwest::Client;
use std::time::Duration;

/// Fetches the 5-day/3-hour forecast for the park's coordinates.
///
/// A single attempt is made per call; callers substitute a fallback when it
/// fails.
pub struct OpenWeatherClient {
    client: Client,
    config: WeatherConfig,
    api_key: String,
}

impl OpenWeatherClient {
    /// Build a client. Returns `None` when no API key is configured.
    pub fn new(config: &WeatherConfig) -> Result<Option<Self>> {
        let Some(api_key) = config.api_key.clone().filter(|k| !k.trim().is_empty()) else {
            return Ok(None);
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FnbError::HttpRequest(e.to_string()))?;
        Ok(Some(Self {
            client,
            config: config.clone(),
            api_key,
        }))
    }

    fn forecast_url(&self) -> String {
        format!(
            "{}/forecast?lat={}&lon={}&units=metric&appid={}",
            self.config.base_url.trim_end_matches('/'),
            self.config.latitude,
            self.config.longitude,
            self.api_key
        )
    }
}

impl ForecastSource for OpenWeatherClient {
    async fn forecast_blocks(&self) -> Result<Vec<ForecastBlock>> {
        info!(
            "Fetching forecast for ({}, {})",
            self.config.latitude, self.config.longitude
        );
        let response = self
            .client
            .get(self.forecast_url())
            .send()
            .await
            .map_err(|e| {
                warn!("Forecast request failed: {}", e);
                FnbError::HttpRequest(e.to_string())
            })?;
        if !response.status().is_success() {
            warn!("Bad forecast response status: {}", response.status());
            return Err(FnbError::ProviderStatus(response.status().as_u16()));
        }
        let body = response
            .text()
            .await
            .map_err(|e| FnbError::HttpRequest(e.to_string()))?;
        parse_forecast_response(&body)
    }
}
