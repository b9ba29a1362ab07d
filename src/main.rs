// Climate Planner API v0.1
use axum::http::Method;
use axum::{
    routing::{get, post},
    Router,
};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod config;
mod db;
mod errors;
mod helpers;
mod models;
mod routes;
mod services;

use config::AppConfig;
use routes::analysis::AppState;
use services::analysis::AnalysisEngine;
use services::geocode::NominatimClient;
use services::holidays::{HolidayService, NagerHolidayClient};
use services::nasa_power::NasaPowerClient;

/// Maximum number of connections in the holiday cache pool.
const DB_POOL_MAX_CONNECTIONS: u32 = 5;
/// Minimum number of connections kept alive in the holiday cache pool.
const DB_POOL_MIN_CONNECTIONS: u32 = 1;

/// Climate Planner API: OpenAPI document.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Climate Planner API",
        version = "0.1.0",
        description = "Event-planning API. Scores a date at one or more locations from \
            twenty years of NASA POWER daily observations, computes a Personal Comfort \
            Index, flags decadal rain trends, ranks nearby alternative dates, adds \
            public-holiday context and, for timed events, recommends better time slots.",
        license(name = "MIT"),
    ),
    tags(
        (name = "Health", description = "Service health check"),
        (name = "Climate", description = "Historical climate analysis for event planning"),
    ),
    paths(
        routes::health::health_check,
        routes::analysis::climate_analysis,
    ),
    components(
        schemas(
            routes::health::HealthResponse,
            routes::analysis::ClimateAnalysisRequest,
            routes::analysis::AnalysisResponse,
            services::analysis::LocationInput,
            services::analysis::EventTime,
            services::analysis::LocationAnalysis,
            services::analysis::LocationReport,
            services::analysis::LocationFailure,
            services::analysis::DataSource,
            services::hourly::HourlySample,
            services::hourly::HourlySlotAnalysis,
            services::hourly::RecommendedTimeSlot,
            services::holidays::HolidayContext,
            services::holidays::NearbyHoliday,
            models::DateResult,
            errors::ErrorResponse,
        )
    )
)]
struct ApiDoc;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = AppConfig::from_env();

    if config.nasa_api_key.is_none() {
        tracing::warn!("NASA_API_KEY is not set; climate analysis requests will fail");
    }

    // Optional holiday cache
    let pool = match &config.database_url {
        Some(url) => Some(connect_holiday_cache(url).await),
        None => {
            tracing::info!("DATABASE_URL not set; holiday cache disabled");
            None
        }
    };

    // Upstream clients
    let nasa_client = NasaPowerClient::new(
        &config.nasa_power_base_url,
        config.nasa_api_key.clone(),
        config.historical_fetch_timeout_secs,
    );
    let holiday_service = HolidayService::new(
        NagerHolidayClient::new(&config.nager_base_url),
        pool.clone(),
        &config.holiday_country_code,
    );
    let geocoder = NominatimClient::new(&config.nominatim_base_url, &config.geocoder_user_agent);

    // Build shared application state
    let app_state = AppState {
        engine: AnalysisEngine::new(Arc::new(nasa_client), Arc::new(holiday_service)),
        geocoder,
        historical_key_configured: config.nasa_api_key.is_some(),
    };

    // CORS: browsers call the API directly
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    let analysis_routes = Router::new()
        .route(
            "/api/v1/climate-analysis",
            post(routes::analysis::climate_analysis),
        )
        .with_state(app_state);

    // Health check probes the holiday cache when one is configured
    let health_routes = Router::new()
        .route("/api/v1/health", get(routes::health::health_check))
        .with_state(pool);

    let app = Router::new()
        .merge(health_routes)
        .merge(analysis_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("API server listening on {}", addr);
    tracing::info!(
        "Swagger UI available at http://localhost:{}/swagger-ui/",
        config.port
    );

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind TCP listener");
    axum::serve(listener, app)
        .await
        .expect("Server terminated unexpectedly");
}

/// `LOG_FORMAT=json` switches to JSON lines; anything else is human-readable.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "climate_planner_api=debug,tower_http=debug".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn connect_holiday_cache(url: &str) -> PgPool {
    let pool = PgPoolOptions::new()
        .max_connections(DB_POOL_MAX_CONNECTIONS)
        .min_connections(DB_POOL_MIN_CONNECTIONS)
        .connect(url)
        .await
        .expect("Failed to connect to database");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    tracing::info!("Holiday cache ready, migrations completed");
    pool
}
