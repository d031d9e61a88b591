use super::types::{Coordinates, ForecastResponse, WeatherSnapshot};
use super::WeatherSource;
use crate::config::Config;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

const CURRENT_FIELDS: &str =
    "temperature_2m,apparent_temperature,precipitation,weather_code,wind_speed_10m,wind_direction_10m";
const HOURLY_FIELDS: &str = "temperature_2m,precipitation";
const DAILY_FIELDS: &str =
    "temperature_2m_max,temperature_2m_min,precipitation_sum,weather_code,sunrise,sunset";

/// Every way a forecast call can go wrong collapses into one user-facing case.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WeatherError {
    #[error("weather data unavailable: {0}")]
    Unavailable(String),
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        "Wetterdaten nicht verfügbar"
    }
}

impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        WeatherError::Unavailable(err.to_string())
    }
}

impl From<serde_json::Error> for WeatherError {
    fn from(err: serde_json::Error) -> Self {
        WeatherError::Unavailable(format!("malformed body: {}", err))
    }
}

pub struct OpenMeteoClient {
    client: Client,
    forecast_url: String,
    timezone: String,
}

impl OpenMeteoClient {
    pub fn new(config: &Config) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .user_agent(config.http_user_agent.clone())
            .timeout(Duration::from_secs(config.weather_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            forecast_url: format!(
                "{}{}",
                config.open_meteo_base_url, config.open_meteo_forecast_path
            ),
            timezone: config.app_timezone.name().to_string(),
        })
    }
}

/// Decode a forecast body into a snapshot.
pub fn parse_forecast(body: &[u8]) -> Result<WeatherSnapshot, WeatherError> {
    let response: ForecastResponse = serde_json::from_slice(body)?;
    Ok(WeatherSnapshot::from(response))
}

#[async_trait]
impl WeatherSource for OpenMeteoClient {
    async fn fetch_weather(&self, coordinates: Coordinates) -> Result<WeatherSnapshot, WeatherError> {
        if !coordinates.is_valid() {
            return Err(WeatherError::Unavailable("invalid coordinates".to_string()));
        }

        tracing::debug!(
            "Fetching forecast for ({:.4}, {:.4})",
            coordinates.latitude,
            coordinates.longitude
        );

        let response = self
            .client
            .get(&self.forecast_url)
            .query(&[
                ("latitude", coordinates.latitude.to_string()),
                ("longitude", coordinates.longitude.to_string()),
                ("current", CURRENT_FIELDS.to_string()),
                ("hourly", HOURLY_FIELDS.to_string()),
                ("daily", DAILY_FIELDS.to_string()),
                ("timezone", self.timezone.clone()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(WeatherError::Unavailable(format!(
                "HTTP {}: {}",
                status, error_text
            )));
        }

        let body = response.bytes().await?;
        parse_forecast(&body)
    }
}
