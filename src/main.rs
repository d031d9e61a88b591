use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use std::sync::Arc;

mod ambient;
mod catalog;
mod charts;
mod config;
mod dashboard;
mod forecast;
mod routes;
mod session;
mod widgets;

use config::Config;
use dashboard::DashboardService;
use forecast::mock::{MockGeocoder, MockWeatherSource};
use forecast::nominatim::NominatimClient;
use forecast::openmeteo::OpenMeteoClient;
use forecast::{Geocoder, WeatherSource};
use routes::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "weather_dashboard_server=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let (geocoder, weather): (Arc<dyn Geocoder>, Arc<dyn WeatherSource>) = if config.weather_mock {
        tracing::info!("WEATHER_MOCK set, serving canned upstream data");
        (
            Arc::new(MockGeocoder::new()),
            Arc::new(MockWeatherSource::following_today(config.app_timezone)),
        )
    } else {
        (
            Arc::new(NominatimClient::new(&config)?),
            Arc::new(OpenMeteoClient::new(&config)?),
        )
    };

    let service = DashboardService::new(geocoder, weather, config.app_timezone);
    let port = config.port;
    let state = AppState::new(config, service);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server starting on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
