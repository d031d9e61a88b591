use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    ambient::{self, AmbientScene},
    catalog::DEFAULT_THEME_CLASS,
    config::Config,
    dashboard::{DashboardService, RenderOutput, SessionState, Trigger},
    forecast::{
        nominatim::GeoError,
        types::{Coordinates, WeatherSnapshot},
    },
    session::{SessionError, SessionStore},
    widgets,
};

const WIDGET_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";
const SVG_CONTENT_TYPE: &str = "image/svg+xml";

// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub service: Arc<DashboardService>,
    pub sessions: Arc<SessionStore>,
}

impl AppState {
    pub fn new(config: Config, service: DashboardService) -> Self {
        Self {
            config: Arc::new(config),
            service: Arc::new(service),
            sessions: Arc::new(SessionStore::new()),
        }
    }
}

// Request/Response types
#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(default)]
    pub city: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub seq: u64,
    pub output: RenderOutput,
    pub ambient: Option<AmbientScene>,
}

#[derive(Debug, Deserialize)]
pub struct EventRequest {
    #[serde(default)]
    pub city: String,
    pub trigger: Trigger,
    pub seq: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct EventResponse {
    pub seq: u64,
    pub output: RenderOutput,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ambient: Option<AmbientScene>,
}

#[derive(Debug, Deserialize)]
pub struct AmbientQuery {
    pub theme: Option<String>,
    pub seed: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub struct CompassQuery {
    pub speed: f64,
    pub direction: f64,
}

#[derive(Debug, Deserialize)]
pub struct DaylightQuery {
    pub sunrise: String,
    pub sunset: String,
    pub now: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GeocodeQuery {
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct ForecastQuery {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
}

fn session_status(err: &SessionError) -> StatusCode {
    match err {
        SessionError::NotFound(_) => StatusCode::NOT_FOUND,
        SessionError::Stale { .. } => StatusCode::CONFLICT,
        SessionError::Dashboard(_) => StatusCode::BAD_REQUEST,
    }
}

fn local_time(raw: &str, timezone: Tz) -> Option<DateTime<Tz>> {
    let naive = NaiveDateTime::parse_from_str(raw.trim(), WIDGET_TIME_FORMAT).ok()?;
    timezone.from_local_datetime(&naive).earliest()
}

fn svg(body: String) -> impl IntoResponse {
    ([(header::CONTENT_TYPE, SVG_CONTENT_TYPE)], body)
}

// Route handlers
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>, StatusCode> {
    let city = request
        .city
        .unwrap_or_else(|| state.config.default_city.clone());
    let session_id = state.sessions.create().await;

    match state
        .sessions
        .dispatch(&state.service, session_id, None, Trigger::CityChanged, &city)
        .await
    {
        Ok(outcome) => Ok(Json(CreateSessionResponse {
            session_id,
            seq: outcome.seq,
            output: outcome.output,
            ambient: outcome.ambient,
        })),
        Err(e) => {
            tracing::error!("Initial render for session {} failed: {}", session_id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionState>, StatusCode> {
    match state.sessions.state(session_id).await {
        Ok(session) => Ok(Json(session)),
        Err(e) => Err(session_status(&e)),
    }
}

pub async fn post_event(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<EventRequest>,
) -> Result<Json<EventResponse>, StatusCode> {
    match state
        .sessions
        .dispatch(
            &state.service,
            session_id,
            request.seq,
            request.trigger,
            &request.city,
        )
        .await
    {
        Ok(outcome) => Ok(Json(EventResponse {
            seq: outcome.seq,
            output: outcome.output,
            ambient: outcome.ambient,
        })),
        Err(e) => {
            tracing::error!("Event for session {} rejected: {}", session_id, e);
            Err(session_status(&e))
        }
    }
}

pub async fn get_ambient(Query(params): Query<AmbientQuery>) -> Json<AmbientScene> {
    let theme = params.theme.as_deref().unwrap_or(DEFAULT_THEME_CLASS);
    let seed = params.seed.unwrap_or_else(ambient::fresh_seed);
    Json(ambient::generate_for_theme(theme, seed))
}

pub async fn compass_svg(Query(params): Query<CompassQuery>) -> Result<impl IntoResponse, StatusCode> {
    if !params.speed.is_finite() || !params.direction.is_finite() {
        return Err(StatusCode::BAD_REQUEST);
    }
    Ok(svg(widgets::wind_compass(params.speed, params.direction).to_svg()))
}

pub async fn daylight_svg(
    State(state): State<AppState>,
    Query(params): Query<DaylightQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    let timezone = state.service.timezone();
    let sunrise = local_time(&params.sunrise, timezone).ok_or(StatusCode::BAD_REQUEST)?;
    let sunset = local_time(&params.sunset, timezone).ok_or(StatusCode::BAD_REQUEST)?;
    let now = match params.now.as_deref() {
        Some(raw) => local_time(raw, timezone).ok_or(StatusCode::BAD_REQUEST)?,
        None => state.service.now(),
    };

    if sunset <= sunrise {
        tracing::error!("Daylight widget requested with sunset {} before sunrise {}", sunset, sunrise);
        return Err(StatusCode::BAD_REQUEST);
    }

    Ok(svg(widgets::day_night_arc(sunrise, sunset, now).drawing.to_svg()))
}

pub async fn geocode(
    State(state): State<AppState>,
    Query(params): Query<GeocodeQuery>,
) -> Result<Json<Coordinates>, StatusCode> {
    match state.service.geocoder().geocode(params.q.trim()).await {
        Ok(coordinates) => Ok(Json(coordinates)),
        Err(GeoError::NotFound) => Err(StatusCode::NOT_FOUND),
        Err(e) => {
            tracing::error!("Geocoding failed: {}", e);
            Err(StatusCode::BAD_GATEWAY)
        }
    }
}

pub async fn get_forecast(
    State(state): State<AppState>,
    Query(params): Query<ForecastQuery>,
) -> Result<Json<WeatherSnapshot>, StatusCode> {
    let coordinates = Coordinates {
        latitude: params.lat,
        longitude: params.lon,
    };

    match state.service.weather().fetch_weather(coordinates).await {
        Ok(snapshot) => Ok(Json(snapshot)),
        Err(e) => {
            tracing::error!("Failed to fetch weather data: {}", e);
            Err(StatusCode::BAD_GATEWAY)
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/sessions", post(create_session))
        .route("/sessions/:session_id", get(get_session))
        .route("/sessions/:session_id/events", post(post_event))
        .route("/ambient", get(get_ambient))
        .route("/widgets/compass.svg", get(compass_svg))
        .route("/widgets/daylight.svg", get(daylight_svg))
        .route("/geocode", get(geocode))
        .route("/forecast", get(get_forecast))
        .with_state(state)
}
