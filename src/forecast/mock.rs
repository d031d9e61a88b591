use super::nominatim::GeoError;
use super::openmeteo::WeatherError;
use super::types::*;
use super::{Geocoder, WeatherSource};
use crate::catalog::{ContrastClass, WeatherCondition};
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;

/// Readings shown while test mode is active, whatever the city input says.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TestReadings {
    pub temperature: f64,
    pub apparent_temperature: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub description: &'static str,
    pub icon: &'static str,
}

pub const TEST_READINGS: TestReadings = TestReadings {
    temperature: 12.0,
    apparent_temperature: 10.0,
    wind_speed: 15.0,
    wind_direction: 225.0,
    description: "Test Wetter",
    icon: "ÜberwiegendKlar.png",
};

/// Canned theme per test button, indexed 0..7.
pub const TEST_SCENARIOS: [(WeatherCondition, ContrastClass); 8] = [
    (WeatherCondition::Default, ContrastClass::LightText),
    (WeatherCondition::Clear, ContrastClass::LightText),
    (WeatherCondition::PartlyCloudy, ContrastClass::LightText),
    (WeatherCondition::Cloudy, ContrastClass::LightText),
    (WeatherCondition::Foggy, ContrastClass::DarkText),
    (WeatherCondition::Rain, ContrastClass::LightText),
    (WeatherCondition::Snow, ContrastClass::DarkText),
    (WeatherCondition::Thunder, ContrastClass::LightText),
];

pub fn test_scenario(index: usize) -> Option<(WeatherCondition, ContrastClass)> {
    TEST_SCENARIOS.get(index).copied()
}

const KNOWN_CITIES: &[(&str, f64, f64)] = &[
    ("berlin", 52.5200, 13.4050),
    ("hamburg", 53.5511, 9.9937),
    ("münchen", 48.1351, 11.5820),
    ("köln", 50.9375, 6.9603),
    ("frankfurt am main", 50.1109, 8.6821),
    ("stuttgart", 48.7758, 9.1829),
    ("düsseldorf", 51.2277, 6.7735),
    ("leipzig", 51.3397, 12.3731),
];

/// Geocoder over a fixed list of large German cities.
#[derive(Debug, Clone, Default)]
pub struct MockGeocoder {
    failure: Option<GeoError>,
}

impl MockGeocoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every lookup fails with `error`.
    pub fn failing(error: GeoError) -> Self {
        Self {
            failure: Some(error),
        }
    }
}

#[async_trait]
impl Geocoder for MockGeocoder {
    async fn geocode(&self, city: &str) -> Result<Coordinates, GeoError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let wanted = city.trim().to_lowercase();
        KNOWN_CITIES
            .iter()
            .find(|(name, _, _)| *name == wanted)
            .map(|&(_, latitude, longitude)| Coordinates {
                latitude,
                longitude,
            })
            .ok_or(GeoError::NotFound)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Behaviour {
    Normal,
    MissingCurrent,
    Unavailable,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Start {
    Fixed(NaiveDate),
    /// Today in the given timezone, read on every fetch.
    Today(Tz),
}

/// Deterministic forecast: `days` daily rows and 24 hourly rows per day, starting at the start date.
#[derive(Debug, Clone)]
pub struct MockWeatherSource {
    start: Start,
    days: usize,
    weather_code: i64,
    readings: Option<(f64, f64)>,
    sun: bool,
    behaviour: Behaviour,
}

impl MockWeatherSource {
    pub fn new(start: NaiveDate) -> Self {
        Self {
            start: Start::Fixed(start),
            days: 7,
            weather_code: 2,
            readings: None,
            sun: true,
            behaviour: Behaviour::Normal,
        }
    }

    /// Forecast that always starts on the current day in `timezone`.
    pub fn following_today(timezone: Tz) -> Self {
        Self {
            start: Start::Today(timezone),
            ..Self::new(NaiveDate::MIN)
        }
    }

    pub fn start_date(&self) -> NaiveDate {
        match self.start {
            Start::Fixed(date) => date,
            Start::Today(timezone) => Utc::now().with_timezone(&timezone).date_naive(),
        }
    }

    pub fn with_weather_code(mut self, code: i64) -> Self {
        self.weather_code = code;
        self
    }

    pub fn with_days(mut self, days: usize) -> Self {
        self.days = days;
        self
    }

    /// Current temperature and apparent temperature, used as given.
    pub fn with_readings(mut self, temperature: f64, apparent_temperature: f64) -> Self {
        self.readings = Some((temperature, apparent_temperature));
        self
    }

    /// First daily row has no sunrise or sunset.
    pub fn with_missing_sun(mut self) -> Self {
        self.sun = false;
        self
    }

    /// Answers with a body that has no current block.
    pub fn without_current(mut self) -> Self {
        self.behaviour = Behaviour::MissingCurrent;
        self
    }

    pub fn unavailable(mut self) -> Self {
        self.behaviour = Behaviour::Unavailable;
        self
    }

    pub fn snapshot(&self, coordinates: Coordinates) -> WeatherSnapshot {
        // colder up north
        let offset = (50.0 - coordinates.latitude) * 0.8;
        let start = self.start_date();
        let midnight = start.and_time(NaiveTime::MIN);

        let hourly = (0..self.days * 24)
            .map(|hour| {
                let phase = (hour % 24) as f64 / 24.0 * std::f64::consts::TAU;
                HourlyRow {
                    time: midnight + Duration::hours(hour as i64),
                    temperature: Some(((12.0 + offset - 5.0 * phase.cos()) * 10.0).round() / 10.0),
                    precipitation: Some(if hour % 6 == 3 { 0.4 } else { 0.0 }),
                }
            })
            .collect();

        let daily = (0..self.days)
            .map(|day| {
                let date = start + Duration::days(day as i64);
                let swing = (day % 3) as f64;
                let sun = self.sun || day > 0;
                DailyRow {
                    date,
                    temperature_max: Some(17.0 + offset + swing),
                    temperature_min: Some(7.0 + offset + swing),
                    precipitation_sum: Some(if day % 2 == 0 { 1.2 } else { 0.0 }),
                    weather_code: Some(if day == 0 { self.weather_code } else { [0, 2, 3, 61][day % 4] }),
                    sunrise: date.and_hms_opt(5, 12, 0).filter(|_| sun),
                    sunset: date.and_hms_opt(21, 30, 0).filter(|_| sun),
                }
            })
            .collect();

        let (temperature, apparent_temperature) =
            self.readings.unwrap_or((14.6 + offset, 13.2 + offset));

        WeatherSnapshot {
            current: Some(CurrentConditions {
                temperature,
                apparent_temperature,
                precipitation: 0.4,
                wind_speed: 17.8,
                wind_direction: 250.0,
                weather_code: self.weather_code,
            }),
            hourly,
            daily,
        }
    }
}

#[async_trait]
impl WeatherSource for MockWeatherSource {
    async fn fetch_weather(&self, coordinates: Coordinates) -> Result<WeatherSnapshot, WeatherError> {
        match self.behaviour {
            Behaviour::Unavailable => Err(WeatherError::Unavailable("mock upstream down".to_string())),
            _ if !coordinates.is_valid() => {
                Err(WeatherError::Unavailable("invalid coordinates".to_string()))
            }
            Behaviour::MissingCurrent => Ok(WeatherSnapshot {
                current: None,
                ..self.snapshot(coordinates)
            }),
            Behaviour::Normal => Ok(self.snapshot(coordinates)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BERLIN: Coordinates = Coordinates {
        latitude: 52.52,
        longitude: 13.405,
    };

    #[tokio::test]
    async fn test_mock_geocoder() {
        let geocoder = MockGeocoder::new();
        assert!(geocoder.geocode("  berlin ").await.is_ok());
        assert!(geocoder.geocode("München").await.is_ok());
        assert_eq!(geocoder.geocode("Xyzzyqqq").await, Err(GeoError::NotFound));

        let down = MockGeocoder::failing(GeoError::ConnectionFailed("timeout".to_string()));
        assert!(matches!(
            down.geocode("Berlin").await,
            Err(GeoError::ConnectionFailed(_))
        ));
    }

    #[tokio::test]
    async fn test_mock_weather_shapes() {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let snapshot = MockWeatherSource::new(start)
            .with_weather_code(61)
            .with_days(5)
            .fetch_weather(BERLIN)
            .await
            .unwrap();

        assert_eq!(snapshot.current.as_ref().map(|c| c.weather_code), Some(61));
        assert_eq!(snapshot.daily.len(), 5);
        assert_eq!(snapshot.hourly.len(), 5 * 24);
        assert_eq!(snapshot.daily[0].date, start);
        assert!(snapshot.daily.iter().all(|row| row.sunrise < row.sunset));
    }

    #[tokio::test]
    async fn test_mock_weather_failures() {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let missing = MockWeatherSource::new(start)
            .without_current()
            .fetch_weather(BERLIN)
            .await
            .unwrap();
        assert!(missing.current.is_none());

        assert!(MockWeatherSource::new(start)
            .unavailable()
            .fetch_weather(BERLIN)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_following_today_starts_today() {
        let source = MockWeatherSource::following_today(chrono_tz::Europe::Berlin);
        let before = Utc::now().with_timezone(&chrono_tz::Europe::Berlin).date_naive();
        let snapshot = source.fetch_weather(BERLIN).await.unwrap();
        let after = Utc::now().with_timezone(&chrono_tz::Europe::Berlin).date_naive();

        assert!(snapshot.daily[0].date == before || snapshot.daily[0].date == after);
        assert_eq!(snapshot.hourly[0].time.date(), snapshot.daily[0].date);
    }

    #[tokio::test]
    async fn test_missing_sun_only_on_first_day() {
        let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let snapshot = MockWeatherSource::new(start)
            .with_missing_sun()
            .with_readings(12.5, 11.04)
            .fetch_weather(BERLIN)
            .await
            .unwrap();

        assert!(snapshot.daily[0].sunrise.is_none() && snapshot.daily[0].sunset.is_none());
        assert!(snapshot.daily[1].sunrise.is_some());
        let current = snapshot.current.unwrap();
        assert_eq!((current.temperature, current.apparent_temperature), (12.5, 11.04));
    }

    #[test]
    fn test_scenario_table() {
        assert_eq!(test_scenario(0), Some((WeatherCondition::Default, ContrastClass::LightText)));
        assert_eq!(test_scenario(6), Some((WeatherCondition::Snow, ContrastClass::DarkText)));
        assert_eq!(test_scenario(8), None);
    }
}
