pub mod mock;
pub mod nominatim;
pub mod openmeteo;
pub mod types;

use async_trait::async_trait;
use nominatim::GeoError;
use openmeteo::WeatherError;
use types::{Coordinates, WeatherSnapshot};

/// Resolves a free-text German city name to coordinates.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, city: &str) -> Result<Coordinates, GeoError>;
}

/// Fetches current, hourly and daily weather for a coordinate pair.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch_weather(&self, coordinates: Coordinates) -> Result<WeatherSnapshot, WeatherError>;
}
