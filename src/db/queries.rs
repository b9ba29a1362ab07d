use sqlx::PgPool;

use super::models::CachedHoliday;
use crate::services::holidays::PublicHoliday;

/// Cached holidays for a country and year, ordered by date.
pub async fn get_cached_holidays(
    pool: &PgPool,
    country_code: &str,
    year: i32,
) -> Result<Vec<CachedHoliday>, sqlx::Error> {
    sqlx::query_as::<_, CachedHoliday>(
        "SELECT id, country_code, year, holiday_date, local_name, name_en,
                is_global, holiday_types, created_at, updated_at
         FROM holidays_cache
         WHERE country_code = $1 AND year = $2
         ORDER BY holiday_date, local_name",
    )
    .bind(country_code)
    .bind(year)
    .fetch_all(pool)
    .await
}

/// Insert or refresh a year of holidays in one transaction.
///
/// Upserts on `(country_code, holiday_date, local_name)`, so concurrent
/// writers for the same year converge on the same rows.
pub async fn upsert_holidays(
    pool: &PgPool,
    country_code: &str,
    year: i32,
    holidays: &[PublicHoliday],
) -> Result<u64, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let mut written = 0;

    for holiday in holidays {
        let result = sqlx::query(
            "INSERT INTO holidays_cache (
                country_code, year, holiday_date, local_name, name_en,
                is_global, holiday_types, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, NOW(), NOW())
            ON CONFLICT (country_code, holiday_date, local_name) DO UPDATE SET
                year = EXCLUDED.year,
                name_en = EXCLUDED.name_en,
                is_global = EXCLUDED.is_global,
                holiday_types = EXCLUDED.holiday_types,
                updated_at = NOW()",
        )
        .bind(country_code)
        .bind(year)
        .bind(holiday.date)
        .bind(&holiday.local_name)
        .bind(&holiday.name)
        .bind(holiday.global)
        .bind(holiday.types_or_default())
        .execute(&mut *tx)
        .await?;
        written += result.rows_affected();
    }

    tx.commit().await?;
    Ok(written)
}
