use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// Subjective tag a user can attach to a day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum DayType {
    Normal,
    SpecialOccasion,
    OffDay,
}

/// One row per (user, calendar date). Upserted with set semantics so a
/// retried write with the same payload is a no-op; the engine never deletes
/// these rows.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DailyObservation {
    pub user_id: Uuid,
    #[serde(with = "crate::dates::iso_date")]
    pub obs_date: Date,
    pub consumed_kcal: f64,
    pub burned_kcal: f64,
    pub day_type: Option<DayType>,
    pub updated_at: OffsetDateTime,
}

const COLUMNS: &str = "user_id, obs_date, consumed_kcal, burned_kcal, day_type, updated_at";

impl DailyObservation {
    pub async fn find(db: &PgPool, user_id: Uuid, date: Date) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {COLUMNS} FROM daily_observations WHERE user_id = $1 AND obs_date = $2"
        ))
        .bind(user_id)
        .bind(date)
        .fetch_optional(db)
        .await
    }

    /// Observations in `[from, to]`, ordered by date.
    pub async fn list_range(
        db: &PgPool,
        user_id: Uuid,
        from: Date,
        to: Date,
    ) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM daily_observations
            WHERE user_id = $1 AND obs_date >= $2 AND obs_date <= $3
            ORDER BY obs_date ASC
            "#
        ))
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(db)
        .await
    }

    /// Replaces the day's consumed total (and tag, when given). Burned
    /// calories on the row are left untouched.
    pub async fn upsert_consumed(
        db: &PgPool,
        user_id: Uuid,
        date: Date,
        consumed_kcal: f64,
        day_type: Option<DayType>,
    ) -> sqlx::Result<Self> {
        sqlx::query_as::<_, Self>(&format!(
            r#"
            INSERT INTO daily_observations
                (user_id, obs_date, consumed_kcal, burned_kcal, day_type, updated_at)
            VALUES ($1, $2, $3, 0, $4, now())
            ON CONFLICT (user_id, obs_date) DO UPDATE SET
                consumed_kcal = EXCLUDED.consumed_kcal,
                day_type = COALESCE(EXCLUDED.day_type, daily_observations.day_type),
                updated_at = now()
            RETURNING {COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(date)
        .bind(consumed_kcal)
        .bind(day_type)
        .fetch_one(db)
        .await
    }

    /// Replaces the day's burned total, creating the row with zero consumed
    /// calories when absent.
    pub async fn upsert_burned(
        db: &PgPool,
        user_id: Uuid,
        date: Date,
        burned_kcal: f64,
    ) -> sqlx::Result<Self> {
        sqlx::query_as::<_, Self>(&format!(
            r#"
            INSERT INTO daily_observations
                (user_id, obs_date, consumed_kcal, burned_kcal, day_type, updated_at)
            VALUES ($1, $2, 0, $3, NULL, now())
            ON CONFLICT (user_id, obs_date) DO UPDATE SET
                burned_kcal = EXCLUDED.burned_kcal,
                updated_at = now()
            RETURNING {COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(date)
        .bind(burned_kcal)
        .fetch_one(db)
        .await
    }
}
