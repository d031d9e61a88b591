//! The render pipeline: one event in, one complete `RenderOutput` out.
//!
//! `SessionState::apply` folds a trigger into the persisted UI state and
//! `DashboardService::render` derives every visible output from that state and
//! the city text. Upstream failures never escape; they become status messages.

use crate::catalog::{self, ContrastClass, WeatherCondition, DEFAULT_THEME_CLASS};
use crate::charts::{build_charts, ChartUpdate};
use crate::forecast::mock::{test_scenario, TEST_READINGS};
use crate::forecast::types::{CurrentConditions, DailyRow, WeatherSnapshot};
use crate::forecast::{Geocoder, WeatherSource};
use crate::widgets::{self, TimeMark};
use chrono::{DateTime, Datelike, TimeZone, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

const TEST_SCENARIO_COUNT: usize = 8;
const BUTTON: &str = "view-btn";
const BUTTON_ACTIVE: &str = "view-btn active";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ViewMode {
    #[serde(rename = "today")]
    Today,
    #[default]
    #[serde(rename = "7days")]
    SevenDays,
}

impl ViewMode {
    pub fn label(self) -> &'static str {
        match self {
            ViewMode::Today => "Heute",
            ViewMode::SevenDays => "7 Tage",
        }
    }

    /// Classes of the (today, 7 days) buttons.
    pub fn button_classes(self) -> (&'static str, &'static str) {
        match self {
            ViewMode::Today => (BUTTON_ACTIVE, BUTTON),
            ViewMode::SevenDays => (BUTTON, BUTTON_ACTIVE),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TestModeState {
    pub active: bool,
    pub index: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SessionState {
    pub view_mode: ViewMode,
    pub test_mode: TestModeState,
}

/// The UI event that caused a render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Trigger {
    CityChanged,
    Today,
    SevenDays,
    TestMode { index: usize },
    StopTest,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DashboardError {
    #[error("test mode index {0} is out of range 0..8")]
    InvalidTestIndex(usize),
}

impl SessionState {
    pub fn apply(&self, trigger: Trigger) -> Result<SessionState, DashboardError> {
        let mut next = *self;
        match trigger {
            Trigger::CityChanged => {}
            Trigger::Today => next.view_mode = ViewMode::Today,
            Trigger::SevenDays => next.view_mode = ViewMode::SevenDays,
            Trigger::TestMode { index } => {
                if index >= TEST_SCENARIO_COUNT {
                    return Err(DashboardError::InvalidTestIndex(index));
                }
                next.test_mode = TestModeState {
                    active: true,
                    index,
                };
            }
            Trigger::StopTest => next.test_mode = TestModeState::default(),
        }
        Ok(next)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CardElement {
    Icon {
        src: String,
        class_name: &'static str,
    },
    Value {
        text: String,
    },
    Subtitle {
        text: String,
        class_name: &'static str,
    },
    Graphic {
        src: String,
        class_name: &'static str,
    },
    TimePairs {
        items: Vec<TimeMark>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    pub title: String,
    pub class_name: &'static str,
    pub animation_delay: String,
    pub elements: Vec<CardElement>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CardTree {
    pub summary: Vec<Card>,
    pub forecast: Vec<Card>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderOutput {
    pub status_message: String,
    pub city_label: String,
    pub city_separator_visible: bool,
    pub cards: CardTree,
    pub temperature_chart: ChartUpdate,
    pub precipitation_chart: ChartUpdate,
    pub today_button_class: &'static str,
    pub seven_days_button_class: &'static str,
    pub view_mode: ViewMode,
    pub theme_class: String,
    pub hourly_visible: bool,
}

impl RenderOutput {
    /// Blank dashboard. Charts are kept when the blanking comes from a failed upstream call.
    fn neutral(view: ViewMode, status: &str, charts: ChartUpdate) -> Self {
        Self {
            status_message: status.to_string(),
            city_label: String::new(),
            city_separator_visible: false,
            cards: CardTree::default(),
            temperature_chart: charts.clone(),
            precipitation_chart: charts,
            today_button_class: BUTTON,
            seven_days_button_class: BUTTON_ACTIVE,
            view_mode: view,
            theme_class: DEFAULT_THEME_CLASS.to_string(),
            hourly_visible: false,
        }
    }
}

fn asset(file: &str) -> String {
    format!("/assets/{}", file)
}

/// Half-to-even, like the dashboard has always displayed.
fn round_display(value: f64) -> i64 {
    value.round_ties_even() as i64
}

fn capitalize(city: &str) -> String {
    let mut chars = city.chars();
    match chars.next() {
        Some(first) => {
            let mut out: String = first.to_uppercase().collect();
            out.push_str(&chars.as_str().to_lowercase());
            out
        }
        None => String::new(),
    }
}

fn weekday_abbrev(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "Mo",
        Weekday::Tue => "Di",
        Weekday::Wed => "Mi",
        Weekday::Thu => "Do",
        Weekday::Fri => "Fr",
        Weekday::Sat => "Sa",
        Weekday::Sun => "So",
    }
}

fn summary_cards(
    temperature: i64,
    apparent: String,
    wind_speed: i64,
    wind_direction: f64,
    description: &str,
    icon: &str,
) -> Vec<Card> {
    let compass = widgets::wind_compass(wind_speed as f64, wind_direction);

    vec![
        Card {
            title: "Temperatur".to_string(),
            class_name: "card card-animate",
            animation_delay: "0.1s".to_string(),
            elements: vec![
                CardElement::Icon {
                    src: asset(catalog::classify_temperature(temperature as f64).icon()),
                    class_name: "card-icon",
                },
                CardElement::Value {
                    text: format!("{} °C", temperature),
                },
                CardElement::Subtitle {
                    text: format!("Gefühlt: {} °C", apparent),
                    class_name: "feels-like",
                },
            ],
        },
        Card {
            title: "Windgeschwindigkeit".to_string(),
            class_name: "card card-animate wind-card-content",
            animation_delay: "0.2s".to_string(),
            elements: vec![
                CardElement::Icon {
                    src: asset(catalog::classify_wind(wind_speed as f64).icon()),
                    class_name: "card-icon wind-speed-icon",
                },
                CardElement::Graphic {
                    src: compass.to_data_uri(),
                    class_name: "wind-compass-wrapper",
                },
                CardElement::Value {
                    text: format!("{} km/h", wind_speed),
                },
                CardElement::Subtitle {
                    text: catalog::compass_label(wind_direction).to_string(),
                    class_name: "card-subtitle",
                },
            ],
        },
        Card {
            title: "Wetterlage".to_string(),
            class_name: "card card-animate",
            animation_delay: "0.3s".to_string(),
            elements: vec![
                CardElement::Icon {
                    src: asset(icon),
                    class_name: "card-icon",
                },
                CardElement::Value {
                    text: description.to_string(),
                },
            ],
        },
    ]
}

fn sun_card(first_day: &DailyRow, timezone: Tz, now: DateTime<Tz>) -> Option<Card> {
    let sunrise = timezone.from_local_datetime(&first_day.sunrise?).earliest()?;
    let sunset = timezone.from_local_datetime(&first_day.sunset?).earliest()?;
    let arc = widgets::day_night_arc(sunrise, sunset, now);

    Some(Card {
        title: arc.title.to_string(),
        class_name: "card card-animate",
        animation_delay: "0.4s".to_string(),
        elements: vec![
            CardElement::Graphic {
                src: arc.drawing.to_data_uri(),
                class_name: "sun-moon-graph",
            },
            CardElement::Value {
                text: arc.duration_text,
            },
            CardElement::Subtitle {
                text: arc.duration_label.to_string(),
                class_name: "card-subtitle",
            },
            CardElement::TimePairs {
                items: vec![arc.first, arc.second],
            },
        ],
    })
}

fn degrees(value: Option<f64>) -> String {
    value
        .map(|v| round_display(v).to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// The six days after today, only when a full week is available.
fn forecast_strip(daily: &[DailyRow]) -> Vec<Card> {
    if daily.len() < 7 {
        return Vec::new();
    }

    daily[1..7]
        .iter()
        .enumerate()
        .map(|(i, row)| {
            let entry = catalog::lookup(row.weather_code.unwrap_or(0));
            Card {
                title: format!(
                    "{} {}",
                    weekday_abbrev(row.date.weekday()),
                    row.date.format("%d.%m")
                ),
                class_name: "card card-animate forecast-card",
                animation_delay: format!("{:.1}s", 0.4 + i as f64 * 0.1),
                elements: vec![
                    CardElement::Icon {
                        src: asset(entry.icon),
                        class_name: "card-icon",
                    },
                    CardElement::Value {
                        text: format!(
                            "{}° / {}°",
                            degrees(row.temperature_min),
                            degrees(row.temperature_max)
                        ),
                    },
                ],
            }
        })
        .collect()
}

/// Canned rendering for the test buttons. Ignores city and weather entirely.
pub fn render_test_mode(state: &SessionState) -> RenderOutput {
    let (condition, contrast) = test_scenario(state.test_mode.index)
        .unwrap_or((WeatherCondition::Default, ContrastClass::LightText));
    let readings = TEST_READINGS;

    RenderOutput {
        status_message: "Test Modus aktiv".to_string(),
        city_label: "Test Stadt".to_string(),
        city_separator_visible: true,
        cards: CardTree {
            summary: summary_cards(
                round_display(readings.temperature),
                round_display(readings.apparent_temperature).to_string(),
                round_display(readings.wind_speed),
                readings.wind_direction,
                readings.description,
                readings.icon,
            ),
            forecast: Vec::new(),
        },
        temperature_chart: ChartUpdate::empty(),
        precipitation_chart: ChartUpdate::empty(),
        today_button_class: BUTTON,
        seven_days_button_class: BUTTON_ACTIVE,
        view_mode: state.view_mode,
        theme_class: catalog::theme_class(condition, contrast),
        hourly_visible: false,
    }
}

/// Full rendering of a successful forecast.
pub fn render_forecast(
    city: &str,
    current: &CurrentConditions,
    snapshot: &WeatherSnapshot,
    view: ViewMode,
    timezone: Tz,
    now: DateTime<Tz>,
) -> RenderOutput {
    let entry = catalog::lookup(current.weather_code);

    let mut summary = summary_cards(
        round_display(current.temperature),
        format!("{:.1}", current.apparent_temperature),
        round_display(current.wind_speed),
        current.wind_direction,
        entry.description,
        entry.icon,
    );
    if let Some(card) = snapshot
        .daily
        .first()
        .and_then(|day| sun_card(day, timezone, now))
    {
        summary.push(card);
    }

    let charts = build_charts(&snapshot.hourly, view, entry.contrast, now.date_naive());
    let (today_button_class, seven_days_button_class) = view.button_classes();

    RenderOutput {
        status_message: String::new(),
        city_label: format!("Wetterdaten für: {}", capitalize(city)),
        city_separator_visible: true,
        cards: CardTree {
            summary,
            forecast: forecast_strip(&snapshot.daily),
        },
        temperature_chart: ChartUpdate::Replace(charts.temperature),
        precipitation_chart: ChartUpdate::Replace(charts.precipitation),
        today_button_class,
        seven_days_button_class,
        view_mode: view,
        theme_class: entry.theme_class(),
        hourly_visible: true,
    }
}

/// Owns the two upstream clients and runs the pipeline against them.
#[derive(Clone)]
pub struct DashboardService {
    geocoder: Arc<dyn Geocoder>,
    weather: Arc<dyn WeatherSource>,
    timezone: Tz,
}

impl DashboardService {
    pub fn new(geocoder: Arc<dyn Geocoder>, weather: Arc<dyn WeatherSource>, timezone: Tz) -> Self {
        Self {
            geocoder,
            weather,
            timezone,
        }
    }

    pub fn geocoder(&self) -> &dyn Geocoder {
        self.geocoder.as_ref()
    }

    pub fn weather(&self) -> &dyn WeatherSource {
        self.weather.as_ref()
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn now(&self) -> DateTime<Tz> {
        Utc::now().with_timezone(&self.timezone)
    }

    pub async fn handle_at(
        &self,
        state: &SessionState,
        trigger: Trigger,
        city: &str,
        now: DateTime<Tz>,
    ) -> Result<(SessionState, RenderOutput), DashboardError> {
        let next = state.apply(trigger)?;
        let output = self.render(&next, city, now).await;
        Ok((next, output))
    }

    pub async fn render(&self, state: &SessionState, city: &str, now: DateTime<Tz>) -> RenderOutput {
        let view = state.view_mode;

        if state.test_mode.active {
            return render_test_mode(state);
        }

        let city = city.trim();
        if city.is_empty() {
            return RenderOutput::neutral(view, "", ChartUpdate::empty());
        }

        let coordinates = match self.geocoder.geocode(city).await {
            Ok(coordinates) => coordinates,
            Err(e) => {
                tracing::warn!("Geocoding {:?} failed: {}", city, e);
                return RenderOutput::neutral(view, e.user_message(), ChartUpdate::Keep);
            }
        };

        let snapshot = match self.weather.fetch_weather(coordinates).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Weather for {:?} unavailable: {}", city, e);
                return RenderOutput::neutral(view, e.user_message(), ChartUpdate::Keep);
            }
        };

        match &snapshot.current {
            Some(current) => render_forecast(city, current, &snapshot, view, self.timezone, now),
            None => {
                tracing::warn!("Forecast for {:?} has no current block", city);
                RenderOutput::neutral(view, "Wetterdaten nicht verfügbar", ChartUpdate::Keep)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::mock::{MockGeocoder, MockWeatherSource};
    use crate::forecast::nominatim::GeoError;
    use chrono_tz::Europe::Berlin;

    fn noon() -> DateTime<Tz> {
        Berlin.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn service_with(weather: MockWeatherSource) -> DashboardService {
        DashboardService::new(Arc::new(MockGeocoder::new()), Arc::new(weather), Berlin)
    }

    fn service() -> DashboardService {
        service_with(MockWeatherSource::new(noon().date_naive()).with_weather_code(61))
    }

    fn texts(card: &Card) -> Vec<&str> {
        card.elements
            .iter()
            .filter_map(|element| match element {
                CardElement::Value { text } | CardElement::Subtitle { text, .. } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_apply_triggers() {
        let state = SessionState::default();
        assert_eq!(state.view_mode, ViewMode::SevenDays);

        let today = state.apply(Trigger::Today).unwrap();
        assert_eq!(today.view_mode, ViewMode::Today);
        assert_eq!(today.apply(Trigger::CityChanged).unwrap().view_mode, ViewMode::Today);

        let testing = today.apply(Trigger::TestMode { index: 3 }).unwrap();
        assert_eq!(testing.test_mode, TestModeState { active: true, index: 3 });
        assert_eq!(testing.view_mode, ViewMode::Today);

        let stopped = testing.apply(Trigger::StopTest).unwrap();
        assert_eq!(stopped.test_mode, TestModeState { active: false, index: 0 });

        assert_eq!(
            state.apply(Trigger::TestMode { index: 8 }),
            Err(DashboardError::InvalidTestIndex(8))
        );
    }

    #[test]
    fn test_trigger_wire_format() {
        let trigger: Trigger = serde_json::from_str(r#"{"type":"test_mode","index":6}"#).unwrap();
        assert_eq!(trigger, Trigger::TestMode { index: 6 });
        let trigger: Trigger = serde_json::from_str(r#"{"type":"seven_days"}"#).unwrap();
        assert_eq!(trigger, Trigger::SevenDays);
        assert_eq!(serde_json::to_value(ViewMode::SevenDays).unwrap(), "7days");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("berlin"), "Berlin");
        assert_eq!(capitalize("hAMBURG"), "Hamburg");
        assert_eq!(capitalize("münchen"), "München");
        assert_eq!(capitalize(""), "");
    }

    #[tokio::test]
    async fn test_successful_render_with_full_week() {
        let (state, output) = service()
            .handle_at(&SessionState::default(), Trigger::CityChanged, "Berlin", noon())
            .await
            .unwrap();

        assert_eq!(state, SessionState::default());
        assert_eq!(output.status_message, "");
        assert_eq!(output.city_label, "Wetterdaten für: Berlin");
        assert!(output.city_separator_visible);
        assert_eq!(output.theme_class, "weather-bg rain light-text");
        assert!(output.hourly_visible);
        assert_eq!(output.cards.forecast.len(), 6);
        assert_eq!(
            (output.today_button_class, output.seven_days_button_class),
            ("view-btn", "view-btn active")
        );

        // temperature, wind, weather, sun
        assert_eq!(output.cards.summary.len(), 4);
        assert_eq!(output.cards.summary[3].title, "Sonne");
        assert_eq!(output.cards.forecast[0].title, "So 02.06");
        assert_eq!(output.cards.forecast[5].animation_delay, "0.9s");

        match &output.temperature_chart {
            ChartUpdate::Replace(chart) => {
                assert_eq!(chart.title, "Temperaturverlauf - 7 Tage");
                assert_eq!(chart.points.len(), 7 * 24);
            }
            ChartUpdate::Keep => panic!("chart should be replaced"),
        }
    }

    #[tokio::test]
    async fn test_missing_sun_drops_only_the_sun_card() {
        let weather = MockWeatherSource::new(noon().date_naive())
            .with_weather_code(61)
            .with_missing_sun();
        let output = service_with(weather)
            .render(&SessionState::default(), "Berlin", noon())
            .await;

        assert_eq!(output.status_message, "");
        assert_eq!(output.cards.summary.len(), 3);
        assert!(output.cards.summary.iter().all(|card| card.title != "Sonne"));
        assert_eq!(output.cards.forecast.len(), 6);
    }

    #[tokio::test]
    async fn test_live_temperature_formatting() {
        let weather = MockWeatherSource::new(noon().date_naive()).with_readings(12.5, 11.04);
        let output = service_with(weather)
            .render(&SessionState::default(), "Berlin", noon())
            .await;
        // ties go to the even neighbour
        assert_eq!(texts(&output.cards.summary[0]), vec!["12 °C", "Gefühlt: 11.0 °C"]);

        let weather = MockWeatherSource::new(noon().date_naive()).with_readings(13.5, -3.26);
        let output = service_with(weather)
            .render(&SessionState::default(), "Berlin", noon())
            .await;
        assert_eq!(texts(&output.cards.summary[0]), vec!["14 °C", "Gefühlt: -3.3 °C"]);
    }

    #[tokio::test]
    async fn test_unknown_city_keeps_charts() {
        let output = service()
            .render(&SessionState::default(), "Xyzzyqqq", noon())
            .await;

        assert_eq!(output.status_message, "Stadt nicht gefunden");
        assert_eq!(output.theme_class, "weather-bg default light-text");
        assert!(!output.hourly_visible);
        assert_eq!(output.temperature_chart, ChartUpdate::Keep);
        assert_eq!(output.precipitation_chart, ChartUpdate::Keep);
        assert!(output.cards.summary.is_empty());
    }

    #[tokio::test]
    async fn test_test_mode_overrides_city() {
        let service = service();
        let (state, output) = service
            .handle_at(&SessionState::default(), Trigger::TestMode { index: 6 }, "Berlin", noon())
            .await
            .unwrap();

        assert_eq!(output.theme_class, "weather-bg snow dark-text");
        assert_eq!(output.status_message, "Test Modus aktiv");
        assert_eq!(output.city_label, "Test Stadt");
        assert!(!output.hourly_visible);
        assert_eq!(output.temperature_chart, ChartUpdate::empty());
        assert_eq!(texts(&output.cards.summary[0]), vec!["12 °C", "Gefühlt: 10 °C"]);
        assert_eq!(texts(&output.cards.summary[1]), vec!["15 km/h", "SW"]);
        assert!(output.cards.forecast.is_empty());

        let (state, output) = service
            .handle_at(&state, Trigger::StopTest, "Berlin", noon())
            .await
            .unwrap();
        assert_eq!(state.test_mode, TestModeState { active: false, index: 0 });
        assert_eq!(output.city_label, "Wetterdaten für: Berlin");
        assert_eq!(output.theme_class, "weather-bg rain light-text");
    }

    #[tokio::test]
    async fn test_short_week_has_no_forecast_strip() {
        let service = service_with(MockWeatherSource::new(noon().date_naive()).with_days(5));
        let output = service.render(&SessionState::default(), "Hamburg", noon()).await;

        assert!(output.cards.forecast.is_empty());
        assert_eq!(output.status_message, "");
        assert!(output.hourly_visible);
    }

    #[tokio::test]
    async fn test_empty_city_is_neutral() {
        let state = SessionState::default().apply(Trigger::Today).unwrap();
        let output = service().render(&state, "   ", noon()).await;

        assert_eq!(output.status_message, "");
        assert_eq!(output.city_label, "");
        assert!(!output.city_separator_visible);
        assert_eq!(output.temperature_chart, ChartUpdate::empty());
        assert_eq!(output.view_mode, ViewMode::Today);
        assert_eq!(output.today_button_class, "view-btn");
    }

    #[tokio::test]
    async fn test_upstream_failures() {
        let down = DashboardService::new(
            Arc::new(MockGeocoder::failing(GeoError::ConnectionFailed("timeout".to_string()))),
            Arc::new(MockWeatherSource::new(noon().date_naive())),
            Berlin,
        );
        let output = down.render(&SessionState::default(), "Berlin", noon()).await;
        assert_eq!(output.status_message, "Verbindungsfehler");
        assert_eq!(output.temperature_chart, ChartUpdate::Keep);

        let unavailable = service_with(MockWeatherSource::new(noon().date_naive()).unavailable());
        let output = unavailable.render(&SessionState::default(), "Berlin", noon()).await;
        assert_eq!(output.status_message, "Wetterdaten nicht verfügbar");
        assert_eq!(output.precipitation_chart, ChartUpdate::Keep);

        let no_current = service_with(MockWeatherSource::new(noon().date_naive()).without_current());
        let output = no_current.render(&SessionState::default(), "Berlin", noon()).await;
        assert_eq!(output.status_message, "Wetterdaten nicht verfügbar");
        assert!(!output.hourly_visible);
    }

    #[tokio::test]
    async fn test_today_view() {
        let state = SessionState::default().apply(Trigger::Today).unwrap();
        let output = service().render(&state, " köln ", noon()).await;

        assert_eq!(output.city_label, "Wetterdaten für: Köln");
        assert_eq!(
            (output.today_button_class, output.seven_days_button_class),
            ("view-btn active", "view-btn")
        );
        match &output.temperature_chart {
            ChartUpdate::Replace(chart) => {
                assert_eq!(chart.title, "Temperaturverlauf - Heute");
                assert_eq!(chart.points.len(), 24);
            }
            ChartUpdate::Keep => panic!("chart should be replaced"),
        }
    }
}
