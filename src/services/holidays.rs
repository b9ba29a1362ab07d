//! Nearby public holidays from Nager.Date, with an optional Postgres cache.
//!
//! Holiday context is enrichment: every failure here is logged and turns into
//! an empty list, never an error for the caller.
//! See: https://date.nager.at/Api

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use utoipa::ToSchema;

use crate::db;
use crate::db::models::CachedHoliday;
use crate::errors::AppError;
use crate::models::ClimateStatistics;

/// Holidays further out than this are not reported.
pub const LOOKAHEAD_DAYS: i64 = 180;
/// Holidays this close get practical warnings.
const NEAR_DAYS: i64 = 14;
/// Holidays this close get weather-specific messages.
const VERY_NEAR_DAYS: i64 = 7;

const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Names that mark a major national holiday, in Portuguese and English.
const MAJOR_HOLIDAY_NAMES: [&str; 12] = [
    "Natal",
    "Ano Novo",
    "Páscoa",
    "Independência",
    "Proclamação da República",
    "Carnaval",
    "Christmas",
    "New Year",
    "Easter",
    "Independence",
    "Republic",
    "Carnival",
];

/// One entry of the Nager.Date `PublicHolidays` response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicHoliday {
    pub date: NaiveDate,
    pub local_name: String,
    pub name: String,
    #[serde(default = "default_global")]
    pub global: bool,
    #[serde(default)]
    pub types: Option<Vec<String>>,
}

fn default_global() -> bool {
    true
}

impl PublicHoliday {
    /// Holiday types, `["Public"]` when the provider gave none.
    pub fn types_or_default(&self) -> Vec<String> {
        match &self.types {
            Some(types) if !types.is_empty() => types.clone(),
            _ => vec!["Public".to_string()],
        }
    }
}

impl From<CachedHoliday> for PublicHoliday {
    fn from(row: CachedHoliday) -> Self {
        Self {
            date: row.holiday_date,
            local_name: row.local_name,
            name: row.name_en,
            global: row.is_global,
            types: Some(row.holiday_types),
        }
    }
}

/// A holiday on or after the target date.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NearbyHoliday {
    pub date: NaiveDate,
    /// Local-language name
    pub name: String,
    pub name_en: String,
    pub is_global: bool,
    pub types: Vec<String>,
    /// Whole days from the target date (0 = same day)
    pub days_from_target: i64,
}

/// Holiday block of a location report.
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct HolidayContext {
    pub count: usize,
    pub nearby: Vec<NearbyHoliday>,
    pub messages: Vec<String>,
}

impl HolidayContext {
    pub fn new(nearby: Vec<NearbyHoliday>, stats: &ClimateStatistics) -> Self {
        let messages = holiday_messages(&nearby, stats);
        Self {
            count: nearby.len(),
            nearby,
            messages,
        }
    }
}

/// Anything that can list holidays around a target date.
#[async_trait]
pub trait HolidaySource: Send + Sync {
    async fn nearby_holidays(&self, target: NaiveDate) -> Vec<NearbyHoliday>;
}

/// Client for the Nager.Date API.
#[derive(Debug, Clone)]
pub struct NagerHolidayClient {
    client: reqwest::Client,
    base_url: String,
}

impl NagerHolidayClient {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("Failed to build HTTP client");
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub async fn fetch_year(
        &self,
        year: i32,
        country_code: &str,
    ) -> Result<Vec<PublicHoliday>, AppError> {
        let url = format!(
            "{}/api/v3/PublicHolidays/{}/{}",
            self.base_url, year, country_code
        );

        let response = self.client.get(&url).send().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Nager.Date request failed: {}", e))
        })?;

        if !response.status().is_success() {
            return Err(AppError::ExternalServiceError(format!(
                "Nager.Date returned HTTP {}",
                response.status()
            )));
        }

        response.json().await.map_err(|e| {
            AppError::ExternalServiceError(format!("Nager.Date JSON parse error: {}", e))
        })
    }
}

/// Holiday lookup for one country, reading through the cache when configured.
#[derive(Debug, Clone)]
pub struct HolidayService {
    client: NagerHolidayClient,
    pool: Option<PgPool>,
    country_code: String,
}

impl HolidayService {
    pub fn new(client: NagerHolidayClient, pool: Option<PgPool>, country_code: &str) -> Self {
        Self {
            client,
            pool,
            country_code: country_code.to_uppercase(),
        }
    }

    /// All holidays of `year`: cache first, then the API. Never fails.
    async fn holidays_for_year(&self, year: i32) -> Vec<PublicHoliday> {
        if let Some(pool) = &self.pool {
            match db::queries::get_cached_holidays(pool, &self.country_code, year).await {
                Ok(rows) if !rows.is_empty() => {
                    tracing::debug!(
                        "Using {} cached holidays for {} {}",
                        rows.len(),
                        self.country_code,
                        year
                    );
                    return rows.into_iter().map(PublicHoliday::from).collect();
                }
                Ok(_) => {}
                Err(e) => tracing::warn!("Holiday cache read failed: {}", e),
            }
        }

        let holidays = match self.client.fetch_year(year, &self.country_code).await {
            Ok(h) => h,
            Err(e) => {
                tracing::warn!(
                    "Holiday lookup for {} {} failed: {}",
                    self.country_code,
                    year,
                    e
                );
                return Vec::new();
            }
        };

        if let Some(pool) = &self.pool {
            if !holidays.is_empty() {
                match db::queries::upsert_holidays(pool, &self.country_code, year, &holidays)
                    .await
                {
                    Ok(n) => tracing::debug!(
                        "Cached {} holidays for {} {}",
                        n,
                        self.country_code,
                        year
                    ),
                    Err(e) => tracing::warn!("Holiday cache write failed: {}", e),
                }
            }
        }

        holidays
    }
}

#[async_trait]
impl HolidaySource for HolidayService {
    async fn nearby_holidays(&self, target: NaiveDate) -> Vec<NearbyHoliday> {
        // The lookahead can cross into next year.
        let years = [target.year(), target.year() + 1];
        let all: Vec<PublicHoliday> =
            futures::future::join_all(years.iter().map(|&y| self.holidays_for_year(y)))
                .await
                .into_iter()
                .flatten()
                .collect();

        select_nearby(&all, target)
    }
}

/// Holidays `0..=LOOKAHEAD_DAYS` days after `target`, nearest first.
pub fn select_nearby(holidays: &[PublicHoliday], target: NaiveDate) -> Vec<NearbyHoliday> {
    let mut nearby: Vec<NearbyHoliday> = holidays
        .iter()
        .filter_map(|h| {
            let days = (h.date - target).num_days();
            (0..=LOOKAHEAD_DAYS).contains(&days).then(|| NearbyHoliday {
                date: h.date,
                name: h.local_name.clone(),
                name_en: h.name.clone(),
                is_global: h.global,
                types: h.types_or_default(),
                days_from_target: days,
            })
        })
        .collect();

    nearby.sort_by_key(|h| h.days_from_target);
    nearby
}

/// Human-readable notes for each nearby holiday, tuned by the day's climate.
pub fn holiday_messages(nearby: &[NearbyHoliday], stats: &ClimateStatistics) -> Vec<String> {
    let mut messages = Vec::new();

    for holiday in nearby {
        let when = match holiday.days_from_target {
            0 => "on the same day".to_string(),
            1 => "in 1 day".to_string(),
            n => format!("in {} days", n),
        };
        messages.push(format!("📅 {} is {}", holiday.name, when));

        if holiday.days_from_target > NEAR_DAYS {
            continue;
        }

        let is_major = MAJOR_HOLIDAY_NAMES
            .iter()
            .any(|m| holiday.name.contains(m) || holiday.name_en.contains(m));
        if is_major && holiday.is_global {
            messages.push(
                "⚠️ National holiday: shops closed, lighter traffic, high demand for services"
                    .to_string(),
            );
        }

        if holiday.days_from_target <= VERY_NEAR_DAYS {
            let rain = stats.rain_probability;
            let temp = stats.avg_temperature;
            if rain > 60 {
                messages.push(format!(
                    "🌧️ Holiday with a {}% chance of rain: plan covered activities",
                    rain
                ));
            } else if rain < 20 && temp > 20 && temp < 30 {
                messages.push(format!(
                    "✅ Excellent weather to enjoy the holiday outdoors ({}°C)",
                    temp
                ));
            }
            if temp > 35 {
                messages.push(format!(
                    "🌡️ Intense heat expected ({}°C): stay hydrated and avoid strong sun",
                    temp
                ));
            }
        }

        if holiday.name.contains("Carnaval") || holiday.name_en.contains("Carnival") {
            messages.push(
                "🎭 Carnival: expect big crowds, street parties and celebrations".to_string(),
            );
        }
    }

    messages
}
