use axum::extract::State;
use axum::Json;
use serde::Serialize;
use sqlx::PgPool;
use utoipa::ToSchema;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// "ok", or "degraded" when the holiday cache is configured but unreachable
    pub status: String,
    /// API version
    pub version: String,
    /// "disabled", "ok" or "unreachable"
    pub holiday_cache: String,
}

/// Health check endpoint.
///
/// Returns the API status and version. When a holiday cache database is
/// configured it is probed with a trivial query; an unreachable cache marks
/// the service "degraded" (still 200) since analyses keep working without it.
#[utoipa::path(
    get,
    path = "/api/v1/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is up", body = HealthResponse),
    )
)]
pub async fn health_check(State(pool): State<Option<PgPool>>) -> Json<HealthResponse> {
    let cache = match &pool {
        None => CacheStatus::Disabled,
        Some(pool) => {
            let ok = sqlx::query_scalar::<_, i32>("SELECT 1")
                .fetch_one(pool)
                .await
                .is_ok();
            if ok {
                CacheStatus::Ok
            } else {
                CacheStatus::Unreachable
            }
        }
    };

    Json(health_response(cache))
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum CacheStatus {
    Disabled,
    Ok,
    Unreachable,
}

fn health_response(cache: CacheStatus) -> HealthResponse {
    let (status, holiday_cache) = match cache {
        CacheStatus::Disabled => ("ok", "disabled"),
        CacheStatus::Ok => ("ok", "ok"),
        CacheStatus::Unreachable => ("degraded", "unreachable"),
    };
    HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        holiday_cache: holiday_cache.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_health_without_cache() {
        let Json(response) = health_check(State(None)).await;
        assert_eq!(response.status, "ok");
        assert_eq!(response.holiday_cache, "disabled");
        assert_eq!(response.version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_unreachable_cache_is_degraded() {
        let response = health_response(CacheStatus::Unreachable);
        assert_eq!(response.status, "degraded");
        assert_eq!(response.holiday_cache, "unreachable");

        let json = serde_json::to_value(health_response(CacheStatus::Ok)).unwrap();
        assert_eq!(json["holidayCache"], "ok");
    }
}
