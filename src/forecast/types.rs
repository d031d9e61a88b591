use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

const OPEN_METEO_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// One hit of the Nominatim search endpoint. Coordinates arrive as strings.
#[derive(Debug, Clone, Deserialize)]
pub struct NominatimPlace {
    pub lat: String,
    pub lon: String,
}

impl NominatimPlace {
    pub fn coordinates(&self) -> Option<Coordinates> {
        let coordinates = Coordinates {
            latitude: self.lat.trim().parse().ok()?,
            longitude: self.lon.trim().parse().ok()?,
        };
        coordinates.is_valid().then_some(coordinates)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub current: Option<CurrentBlock>,
    #[serde(default)]
    pub hourly: Option<HourlyBlock>,
    #[serde(default)]
    pub daily: Option<DailyBlock>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CurrentBlock {
    pub temperature_2m: Option<f64>,
    pub apparent_temperature: Option<f64>,
    pub precipitation: Option<f64>,
    pub weather_code: Option<f64>,
    pub wind_speed_10m: Option<f64>,
    pub wind_direction_10m: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HourlyBlock {
    #[serde(default)]
    pub time: Vec<String>,
    pub temperature_2m: Option<Vec<Option<f64>>>,
    pub precipitation: Option<Vec<Option<f64>>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DailyBlock {
    #[serde(default)]
    pub time: Vec<String>,
    pub temperature_2m_max: Option<Vec<Option<f64>>>,
    pub temperature_2m_min: Option<Vec<Option<f64>>>,
    pub precipitation_sum: Option<Vec<Option<f64>>>,
    pub weather_code: Option<Vec<Option<f64>>>,
    pub sunrise: Option<Vec<Option<String>>>,
    pub sunset: Option<Vec<Option<String>>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentConditions {
    pub temperature: f64,
    pub apparent_temperature: f64,
    pub precipitation: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub weather_code: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyRow {
    pub time: NaiveDateTime,
    pub temperature: Option<f64>,
    pub precipitation: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRow {
    pub date: NaiveDate,
    pub temperature_max: Option<f64>,
    pub temperature_min: Option<f64>,
    pub precipitation_sum: Option<f64>,
    pub weather_code: Option<i64>,
    pub sunrise: Option<NaiveDateTime>,
    pub sunset: Option<NaiveDateTime>,
}

/// Everything one forecast call yields. `current` is `None` when the upstream
/// body had no current block, which callers treat like a failed call.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WeatherSnapshot {
    pub current: Option<CurrentConditions>,
    pub hourly: Vec<HourlyRow>,
    pub daily: Vec<DailyRow>,
}

fn column<T: Clone>(values: &Option<Vec<Option<T>>>, index: usize) -> Option<T> {
    values.as_ref().and_then(|v| v.get(index)).cloned().flatten()
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw, OPEN_METEO_TIME_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(raw).map(|ts| ts.date()))
}

impl From<&CurrentBlock> for CurrentConditions {
    fn from(current: &CurrentBlock) -> Self {
        let temperature = current.temperature_2m.unwrap_or(0.0);
        Self {
            temperature,
            apparent_temperature: current
                .apparent_temperature
                .unwrap_or_else(|| temperature.round_ties_even()),
            precipitation: current.precipitation.unwrap_or(0.0),
            wind_speed: current.wind_speed_10m.unwrap_or(0.0),
            wind_direction: current.wind_direction_10m.unwrap_or(0.0),
            weather_code: current.weather_code.map(|code| code as i64).unwrap_or(0),
        }
    }
}

impl HourlyBlock {
    pub fn rows(&self) -> Vec<HourlyRow> {
        self.time
            .iter()
            .enumerate()
            .filter_map(|(i, raw)| {
                Some(HourlyRow {
                    time: parse_timestamp(raw)?,
                    temperature: column(&self.temperature_2m, i),
                    precipitation: column(&self.precipitation, i),
                })
            })
            .collect()
    }
}

impl DailyBlock {
    pub fn rows(&self) -> Vec<DailyRow> {
        self.time
            .iter()
            .enumerate()
            .filter_map(|(i, raw)| {
                Some(DailyRow {
                    date: parse_date(raw)?,
                    temperature_max: column(&self.temperature_2m_max, i),
                    temperature_min: column(&self.temperature_2m_min, i),
                    precipitation_sum: column(&self.precipitation_sum, i),
                    weather_code: column(&self.weather_code, i).map(|code| code as i64),
                    sunrise: column(&self.sunrise, i).as_deref().and_then(parse_timestamp),
                    sunset: column(&self.sunset, i).as_deref().and_then(parse_timestamp),
                })
            })
            .collect()
    }
}

impl From<ForecastResponse> for WeatherSnapshot {
    fn from(response: ForecastResponse) -> Self {
        Self {
            current: response.current.as_ref().map(CurrentConditions::from),
            hourly: response.hourly.as_ref().map(HourlyBlock::rows).unwrap_or_default(),
            daily: response.daily.as_ref().map(DailyBlock::rows).unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_from_open_meteo_body() {
        let body = serde_json::json!({
            "current": {
                "time": "2024-05-01T12:00",
                "temperature_2m": 17.6,
                "apparent_temperature": 16.2,
                "precipitation": 0.4,
                "weather_code": 61,
                "wind_speed_10m": 12.3,
                "wind_direction_10m": 250
            },
            "hourly": {
                "time": ["2024-05-01T00:00", "2024-05-01T01:00"],
                "temperature_2m": [11.0, null],
                "precipitation": [0.0, 0.2]
            },
            "daily": {
                "time": ["2024-05-01"],
                "temperature_2m_max": [19.1],
                "temperature_2m_min": [8.4],
                "precipitation_sum": [1.2],
                "weather_code": [61],
                "sunrise": ["2024-05-01T05:35"],
                "sunset": ["2024-05-01T20:37"]
            }
        });

        let response: ForecastResponse = serde_json::from_value(body).unwrap();
        let snapshot = WeatherSnapshot::from(response);

        let current = snapshot.current.unwrap();
        assert_eq!(current.weather_code, 61);
        assert_eq!(current.wind_direction, 250.0);

        assert_eq!(snapshot.hourly.len(), 2);
        assert_eq!(snapshot.hourly[1].temperature, None);
        assert_eq!(snapshot.hourly[1].precipitation, Some(0.2));

        let today = &snapshot.daily[0];
        assert_eq!(today.date, NaiveDate::from_ymd_opt(2024, 5, 1).unwrap());
        assert_eq!(today.weather_code, Some(61));
        assert_eq!(today.sunset.unwrap().format("%H:%M").to_string(), "20:37");
    }

    #[test]
    fn test_missing_current_fields_default_to_zero() {
        let current = CurrentConditions::from(&CurrentBlock {
            temperature_2m: Some(7.5),
            ..Default::default()
        });

        assert_eq!(current.wind_speed, 0.0);
        assert_eq!(current.wind_direction, 0.0);
        assert_eq!(current.weather_code, 0);
        assert_eq!(current.apparent_temperature, 8.0);
    }

    #[test]
    fn test_body_without_current_block() {
        let response: ForecastResponse = serde_json::from_str(r#"{"error": true}"#).unwrap();
        let snapshot = WeatherSnapshot::from(response);
        assert!(snapshot.current.is_none());
        assert!(snapshot.hourly.is_empty());
        assert!(snapshot.daily.is_empty());
    }

    #[test]
    fn test_nominatim_place_coordinates() {
        let place = NominatimPlace {
            lat: "52.5170365".to_string(),
            lon: "13.3888599".to_string(),
        };
        let coordinates = place.coordinates().unwrap();
        assert!((coordinates.latitude - 52.517).abs() < 0.001);

        let broken = NominatimPlace {
            lat: "north".to_string(),
            lon: "13.4".to_string(),
        };
        assert!(broken.coordinates().is_none());
    }
}
