/// Application configuration, parsed from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    /// Credential for the historical climate provider. Checked per request so
    /// the service can still answer health checks when it is missing.
    pub nasa_api_key: Option<String>,
    pub nasa_power_base_url: String,
    /// Upper bound for a single historical-data request.
    pub historical_fetch_timeout_secs: u64,
    /// Enables the Postgres holiday cache when set.
    pub database_url: Option<String>,
    pub holiday_country_code: String,
    pub nager_base_url: String,
    pub nominatim_base_url: String,
    pub geocoder_user_agent: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("PORT must be a valid u16"),
            nasa_api_key: non_empty_var("NASA_API_KEY"),
            nasa_power_base_url: std::env::var("NASA_POWER_BASE_URL")
                .unwrap_or_else(|_| "https://power.larc.nasa.gov".to_string()),
            historical_fetch_timeout_secs: std::env::var("HISTORICAL_FETCH_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .expect("HISTORICAL_FETCH_TIMEOUT_SECS must be a whole number of seconds"),
            database_url: non_empty_var("DATABASE_URL"),
            holiday_country_code: std::env::var("HOLIDAY_COUNTRY_CODE")
                .unwrap_or_else(|_| "BR".to_string()),
            nager_base_url: std::env::var("NAGER_BASE_URL")
                .unwrap_or_else(|_| "https://date.nager.at".to_string()),
            nominatim_base_url: std::env::var("NOMINATIM_BASE_URL")
                .unwrap_or_else(|_| "https://nominatim.openstreetmap.org".to_string()),
            geocoder_user_agent: std::env::var("GEOCODER_USER_AGENT")
                .unwrap_or_else(|_| "ClimatePlanner/0.1".to_string()),
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
