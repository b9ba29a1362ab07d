use chrono::{DateTime, NaiveDate, Utc};
use sqlx::FromRow;

/// A cached public holiday, one row per country/date/local name.
#[derive(Debug, Clone, FromRow)]
#[allow(dead_code)] // All fields populated by FromRow; some only kept for inspection
pub struct CachedHoliday {
    pub id: i64,
    pub country_code: String,
    pub year: i32,
    pub holiday_date: NaiveDate,
    pub local_name: String,
    pub name_en: String,
    pub is_global: bool,
    pub holiday_types: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
