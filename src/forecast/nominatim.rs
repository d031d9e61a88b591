use super::types::{Coordinates, NominatimPlace};
use super::Geocoder;
use crate::config::Config;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeoError {
    #[error("no German place matches the query")]
    NotFound,
    #[error("geocoding request failed: {0}")]
    ConnectionFailed(String),
}

impl GeoError {
    /// Status line shown on the dashboard.
    pub fn user_message(&self) -> &'static str {
        match self {
            GeoError::NotFound => "Stadt nicht gefunden",
            GeoError::ConnectionFailed(_) => "Verbindungsfehler",
        }
    }
}

impl From<reqwest::Error> for GeoError {
    fn from(err: reqwest::Error) -> Self {
        GeoError::ConnectionFailed(err.to_string())
    }
}

pub struct NominatimClient {
    client: Client,
    search_url: String,
}

impl NominatimClient {
    pub fn new(config: &Config) -> Result<Self, GeoError> {
        let client = Client::builder()
            .user_agent(config.http_user_agent.clone())
            .timeout(Duration::from_secs(config.geocode_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            search_url: format!("{}{}", config.nominatim_base_url, config.nominatim_search_path),
        })
    }
}

/// Take the single best hit out of a Nominatim search body.
pub fn best_match(places: &[NominatimPlace]) -> Result<Coordinates, GeoError> {
    let place = places.first().ok_or(GeoError::NotFound)?;
    place.coordinates().ok_or_else(|| {
        GeoError::ConnectionFailed(format!("unparsable coordinates {:?}/{:?}", place.lat, place.lon))
    })
}

#[async_trait]
impl Geocoder for NominatimClient {
    async fn geocode(&self, city: &str) -> Result<Coordinates, GeoError> {
        tracing::debug!("Geocoding {:?}", city);

        let response = self
            .client
            .get(&self.search_url)
            .query(&[
                ("q", city),
                ("countrycodes", "de"),
                ("format", "json"),
                ("limit", "1"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GeoError::ConnectionFailed(format!("HTTP {}", status)));
        }

        let places: Vec<NominatimPlace> = response.json().await?;
        best_match(&places)
    }
}
