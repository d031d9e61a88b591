use serde::{Deserialize, Serialize};

use self::ContrastClass::{DarkText, LightText};
use self::WeatherCondition::{Clear, Cloudy, Foggy, PartlyCloudy, Rain, Snow, Thunder};

/// Coarse weather category used to pick the background theme and the ambient animation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeatherCondition {
    Clear,
    PartlyCloudy,
    Cloudy,
    Foggy,
    Rain,
    Snow,
    Thunder,
    Default,
}

impl WeatherCondition {
    pub fn css_class(self) -> &'static str {
        match self {
            WeatherCondition::Clear => "clear",
            WeatherCondition::PartlyCloudy => "partly-cloudy",
            WeatherCondition::Cloudy => "cloudy",
            WeatherCondition::Foggy => "foggy",
            WeatherCondition::Rain => "rain",
            WeatherCondition::Snow => "snow",
            WeatherCondition::Thunder => "thunder",
            WeatherCondition::Default => "default",
        }
    }

    /// Recover the condition from a theme class such as `weather-bg rain light-text`.
    pub fn from_theme_class(theme_class: &str) -> Self {
        theme_class
            .split_whitespace()
            .find_map(|token| match token {
                "clear" => Some(WeatherCondition::Clear),
                "partly-cloudy" => Some(WeatherCondition::PartlyCloudy),
                "cloudy" => Some(WeatherCondition::Cloudy),
                "foggy" => Some(WeatherCondition::Foggy),
                "rain" => Some(WeatherCondition::Rain),
                "snow" => Some(WeatherCondition::Snow),
                "thunder" => Some(WeatherCondition::Thunder),
                _ => None,
            })
            .unwrap_or(WeatherCondition::Default)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContrastClass {
    LightText,
    DarkText,
}

impl ContrastClass {
    pub fn css_class(self) -> &'static str {
        match self {
            ContrastClass::LightText => "light-text",
            ContrastClass::DarkText => "dark-text",
        }
    }

    pub fn is_dark(self) -> bool {
        self == ContrastClass::DarkText
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeatherCodeEntry {
    pub code: i64,
    pub description: &'static str,
    pub icon: &'static str,
    pub condition: WeatherCondition,
    pub contrast: ContrastClass,
}

impl WeatherCodeEntry {
    pub fn theme_class(&self) -> String {
        theme_class(self.condition, self.contrast)
    }
}

pub fn theme_class(condition: WeatherCondition, contrast: ContrastClass) -> String {
    format!("weather-bg {} {}", condition.css_class(), contrast.css_class())
}

pub const DEFAULT_THEME_CLASS: &str = "weather-bg default light-text";

const fn entry(
    code: i64,
    description: &'static str,
    icon: &'static str,
    condition: WeatherCondition,
    contrast: ContrastClass,
) -> WeatherCodeEntry {
    WeatherCodeEntry {
        code,
        description,
        icon,
        condition,
        contrast,
    }
}

static CATALOG: &[WeatherCodeEntry] = &[
    entry(0, "Klarer Himmel", "KlarerHimmel.png", Clear, LightText),
    entry(1, "Überwiegend klar", "ÜberwiegendKlar.png", Clear, LightText),
    entry(2, "Teilweise bewölkt", "TeilweiseBewölkt.png", PartlyCloudy, LightText),
    entry(3, "Bewölkt", "Bewölkt.png", Cloudy, LightText),
    entry(45, "Nebel", "Nebel.png", Foggy, DarkText),
    entry(48, "Nebel mit Reif", "NebelMitReif.png", Foggy, DarkText),
    entry(51, "Leichter Nieselregen", "LeichterNieselregen.png", Rain, LightText),
    entry(53, "Mäßiger Nieselregen", "MäßigerNieselregen.png", Rain, LightText),
    entry(55, "Starker Nieselregen", "StarkerNieselregen.png", Rain, LightText),
    entry(56, "Leichter gefrierender Nieselregen", "LeichterNieselregen.png", Rain, LightText),
    entry(57, "Starker gefrierender Nieselregen", "StarkerNieselregen.png", Rain, LightText),
    entry(61, "Leichter Regen", "LeichterRegen.png", Rain, LightText),
    entry(63, "Mäßiger Regen", "MäßigerRegen.png", Rain, LightText),
    entry(65, "Starker Regen", "StarkerRegen.png", Rain, LightText),
    entry(66, "Leichter gefrierender Regen", "LeichterRegen.png", Rain, LightText),
    entry(67, "Starker gefrierender Regen", "StarkerRegen.png", Rain, LightText),
    entry(80, "Leichter Regenschauer", "LeichterRegenschauer.png", Rain, LightText),
    entry(81, "Mäßiger Regenschauer", "MäßigerRegenschauer.png", Rain, LightText),
    entry(82, "Heftiger Regenschauer", "HeftigerRegenschauer.png", Rain, LightText),
    entry(71, "Leichter Schneefall", "LeichterSchneefall.png", Snow, DarkText),
    entry(73, "Mäßiger Schneefall", "MäßigerSchneefall.png", Snow, DarkText),
    entry(75, "Starker Schneefall", "StarkerSchneefall.png", Snow, DarkText),
    entry(77, "Schneegriesel", "StarkerSchneefall.png", Snow, DarkText),
    entry(85, "Leichte Schneeschauer", "LeichterSchneefall.png", Snow, DarkText),
    entry(86, "Starke Schneeschauer", "StarkerSchneefall.png", Snow, DarkText),
    entry(95, "Gewitter", "Gewitter.png", Thunder, LightText),
    entry(96, "Gewitter mit leichtem Hagel", "GewitterMitLeichtemHagel.png", Thunder, LightText),
    entry(99, "Gewitter mit starkem Hagel", "GewitterMitStarkemHagel.png", Thunder, LightText),
];

const UNKNOWN: WeatherCodeEntry = entry(
    -1,
    "Unbekannt",
    "Unbekannt.png",
    WeatherCondition::Default,
    ContrastClass::LightText,
);

/// Look up a WMO weather code. Unmapped codes resolve to the "Unbekannt" entry.
pub fn lookup(code: i64) -> WeatherCodeEntry {
    CATALOG
        .iter()
        .find(|entry| entry.code == code)
        .copied()
        .unwrap_or(WeatherCodeEntry { code, ..UNKNOWN })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemperatureBucket {
    Cold,
    Mild,
    Hot,
}

impl TemperatureBucket {
    pub fn icon(self) -> &'static str {
        match self {
            TemperatureBucket::Cold => "cold_temp.png",
            TemperatureBucket::Mild => "mild_temp.png",
            TemperatureBucket::Hot => "hot_temp.png",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindBucket {
    Low,
    Mild,
    Strong,
    VeryStrong,
}

impl WindBucket {
    pub fn icon(self) -> &'static str {
        match self {
            WindBucket::Low => "low_wind.png",
            WindBucket::Mild => "mild_wind.png",
            WindBucket::Strong => "strong_wind.png",
            WindBucket::VeryStrong => "very_strong_wind.png",
        }
    }
}

pub fn classify_temperature(celsius: f64) -> TemperatureBucket {
    if celsius < 5.0 {
        TemperatureBucket::Cold
    } else if celsius < 20.0 {
        TemperatureBucket::Mild
    } else {
        TemperatureBucket::Hot
    }
}

pub fn classify_wind(kmh: f64) -> WindBucket {
    if kmh < 10.0 {
        WindBucket::Low
    } else if kmh < 20.0 {
        WindBucket::Mild
    } else if kmh < 35.0 {
        WindBucket::Strong
    } else {
        WindBucket::VeryStrong
    }
}

const COMPASS_LABELS: [&str; 8] = ["N", "NO", "O", "SO", "S", "SW", "W", "NW"];

/// Map a bearing in degrees to one of eight German compass labels.
///
/// Each label owns a 45° sector centered on its bearing. Exact sector edges
/// round half to even, so 22.5° is "N" and 67.5° is "O".
pub fn compass_label(degrees: f64) -> &'static str {
    let sector = 360.0 / COMPASS_LABELS.len() as f64;
    let index = (degrees / sector).round_ties_even() as i64;
    COMPASS_LABELS[index.rem_euclid(COMPASS_LABELS.len() as i64) as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_codes() {
        let rain = lookup(61);
        assert_eq!(rain.description, "Leichter Regen");
        assert_eq!(rain.condition, WeatherCondition::Rain);
        assert_eq!(rain.theme_class(), "weather-bg rain light-text");

        let snow = lookup(77);
        assert_eq!(snow.icon, "StarkerSchneefall.png");
        assert_eq!(snow.contrast, ContrastClass::DarkText);
    }

    #[test]
    fn test_lookup_is_total() {
        for code in [-5, 4, 50, 100, 9999] {
            let entry = lookup(code);
            assert_eq!(entry.description, "Unbekannt");
            assert_eq!(entry.icon, "Unbekannt.png");
            assert_eq!(entry.condition, WeatherCondition::Default);
            assert_eq!(entry.contrast, ContrastClass::LightText);
        }
        assert_eq!(lookup(9999).theme_class(), DEFAULT_THEME_CLASS);
    }

    #[test]
    fn test_catalog_codes_are_unique() {
        for (i, a) in CATALOG.iter().enumerate() {
            assert!(CATALOG[i + 1..].iter().all(|b| b.code != a.code), "duplicate code {}", a.code);
        }
    }

    #[test]
    fn test_compass_label() {
        assert_eq!(compass_label(0.0), "N");
        assert_eq!(compass_label(22.0), "N");
        assert_eq!(compass_label(23.0), "NO");
        assert_eq!(compass_label(44.0), "NO");
        assert_eq!(compass_label(45.0), "NO");
        assert_eq!(compass_label(90.0), "O");
        assert_eq!(compass_label(225.0), "SW");
        assert_eq!(compass_label(337.0), "NW");
        assert_eq!(compass_label(359.0), "N");
        assert_eq!(compass_label(360.0), compass_label(0.0));
        assert_eq!(compass_label(-90.0), "W");
    }

    #[test]
    fn test_temperature_thresholds() {
        assert_eq!(classify_temperature(4.9), TemperatureBucket::Cold);
        assert_ne!(classify_temperature(5.0), TemperatureBucket::Cold);
        assert_eq!(classify_temperature(19.999), TemperatureBucket::Mild);
        assert_eq!(classify_temperature(20.0), TemperatureBucket::Hot);
    }

    #[test]
    fn test_wind_thresholds() {
        assert_eq!(classify_wind(9.0), WindBucket::Low);
        assert_eq!(classify_wind(10.0), WindBucket::Mild);
        assert_eq!(classify_wind(20.0), WindBucket::Strong);
        assert_eq!(classify_wind(35.0), WindBucket::VeryStrong);
        assert_eq!(classify_wind(15.0).icon(), "mild_wind.png");
    }

    #[test]
    fn test_condition_from_theme_class() {
        assert_eq!(
            WeatherCondition::from_theme_class("weather-bg partly-cloudy light-text"),
            WeatherCondition::PartlyCloudy
        );
        assert_eq!(
            WeatherCondition::from_theme_class("weather-bg cloudy light-text"),
            WeatherCondition::Cloudy
        );
        assert_eq!(
            WeatherCondition::from_theme_class(DEFAULT_THEME_CLASS),
            WeatherCondition::Default
        );
    }
}
