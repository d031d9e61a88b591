use chrono_tz::Tz;
use std::env;
use std::str::FromStr;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub nominatim_base_url: String,
    pub nominatim_search_path: String,
    pub open_meteo_base_url: String,
    pub open_meteo_forecast_path: String,
    pub geocode_timeout_secs: u64,
    pub weather_timeout_secs: u64,
    pub http_user_agent: String,
    pub app_timezone: Tz,
    pub default_city: String,
    pub weather_mock: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: 8050,
            nominatim_base_url: "https://nominatim.openstreetmap.org".to_string(),
            nominatim_search_path: "/search".to_string(),
            open_meteo_base_url: "https://api.open-meteo.com".to_string(),
            open_meteo_forecast_path: "/v1/forecast".to_string(),
            geocode_timeout_secs: 5,
            weather_timeout_secs: 10,
            http_user_agent: "WetterDashboardDeutschland/1.0".to_string(),
            app_timezone: chrono_tz::Europe::Berlin,
            default_city: "Berlin".to_string(),
            weather_mock: false,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup; unset keys fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        Ok(Config {
            port: parse_or(&lookup, "PORT", defaults.port)?,
            nominatim_base_url: lookup("NOMINATIM_BASE_URL")
                .unwrap_or(defaults.nominatim_base_url),
            nominatim_search_path: lookup("NOMINATIM_SEARCH_PATH")
                .unwrap_or(defaults.nominatim_search_path),
            open_meteo_base_url: lookup("OPEN_METEO_BASE_URL")
                .unwrap_or(defaults.open_meteo_base_url),
            open_meteo_forecast_path: lookup("OPEN_METEO_FORECAST_PATH")
                .unwrap_or(defaults.open_meteo_forecast_path),
            geocode_timeout_secs: parse_or(&lookup, "GEOCODE_TIMEOUT_SECS", defaults.geocode_timeout_secs)?,
            weather_timeout_secs: parse_or(&lookup, "WEATHER_TIMEOUT_SECS", defaults.weather_timeout_secs)?,
            http_user_agent: lookup("HTTP_USER_AGENT").unwrap_or(defaults.http_user_agent),
            app_timezone: match lookup("APP_TIMEZONE") {
                Some(raw) => raw
                    .parse::<Tz>()
                    .map_err(|_| anyhow::anyhow!("APP_TIMEZONE is not a valid timezone: {}", raw))?,
                None => defaults.app_timezone,
            },
            default_city: lookup("DEFAULT_CITY").unwrap_or(defaults.default_city),
            weather_mock: match lookup("WEATHER_MOCK") {
                Some(raw) => matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"),
                None => defaults.weather_mock,
            },
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} has an invalid value: {}", key, raw)),
        None => Ok(default),
    }
}
