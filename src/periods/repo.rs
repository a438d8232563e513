use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum PeriodStatus {
    Active,
    Completed,
}

/// Distinguishes the first period derived from a baseline week from
/// steady-state weeks.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum PeriodKind {
    Baseline,
    Standard,
}

/// A Monday-Sunday tracking window. Invariant: at most one `active` row per
/// user, windows never overlap for the same user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WeeklyPeriod {
    pub id: Uuid,
    pub user_id: Uuid,
    #[serde(with = "crate::dates::iso_date")]
    pub start_date: Date,
    #[serde(with = "crate::dates::iso_date")]
    pub end_date: Date,
    pub baseline_daily_avg: f64,
    pub weekly_budget_kcal: f64,
    pub status: PeriodStatus,
    pub kind: PeriodKind,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewPeriod {
    pub user_id: Uuid,
    pub start_date: Date,
    pub end_date: Date,
    pub baseline_daily_avg: f64,
    pub weekly_budget_kcal: f64,
    pub kind: PeriodKind,
}

const COLUMNS: &str = "id, user_id, start_date, end_date, baseline_daily_avg, \
                       weekly_budget_kcal, status, kind, created_at";

impl WeeklyPeriod {
    pub async fn find_active(db: &PgPool, user_id: Uuid) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {COLUMNS} FROM weekly_periods WHERE user_id = $1 AND status = $2"
        ))
        .bind(user_id)
        .bind(PeriodStatus::Active)
        .fetch_optional(db)
        .await
    }

    /// The active period whose window contains `date`.
    pub async fn find_covering(db: &PgPool, user_id: Uuid, date: Date) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            r#"
            SELECT {COLUMNS} FROM weekly_periods
            WHERE user_id = $1 AND status = $2
              AND start_date <= $3 AND end_date >= $3
            "#
        ))
        .bind(user_id)
        .bind(PeriodStatus::Active)
        .bind(date)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_start(db: &PgPool, user_id: Uuid, start_date: Date) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {COLUMNS} FROM weekly_periods WHERE user_id = $1 AND start_date = $2"
        ))
        .bind(user_id)
        .bind(start_date)
        .fetch_optional(db)
        .await
    }

    /// Most recent period for the user regardless of status.
    pub async fn latest(db: &PgPool, user_id: Uuid) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            r#"
            SELECT {COLUMNS} FROM weekly_periods
            WHERE user_id = $1
            ORDER BY start_date DESC
            LIMIT 1
            "#
        ))
        .bind(user_id)
        .fetch_optional(db)
        .await
    }

    /// Idempotent create keyed on (user, week start). Returns the row and
    /// whether this call inserted it; a duplicate create is a no-op success.
    pub async fn insert_idempotent(db: &PgPool, new: &NewPeriod) -> sqlx::Result<(Self, bool)> {
        let inserted = sqlx::query_as::<_, Self>(&format!(
            r#"
            INSERT INTO weekly_periods
                (id, user_id, start_date, end_date, baseline_daily_avg,
                 weekly_budget_kcal, status, kind, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now())
            ON CONFLICT (user_id, start_date) DO NOTHING
            RETURNING {COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(new.user_id)
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(new.baseline_daily_avg)
        .bind(new.weekly_budget_kcal)
        .bind(PeriodStatus::Active)
        .bind(new.kind)
        .fetch_optional(db)
        .await?;

        match inserted {
            Some(row) => Ok((row, true)),
            None => {
                let existing = Self::find_by_start(db, new.user_id, new.start_date)
                    .await?
                    .ok_or(sqlx::Error::RowNotFound)?;
                Ok((existing, false))
            }
        }
    }

    pub async fn mark_completed(db: &PgPool, id: Uuid) -> sqlx::Result<()> {
        sqlx::query("UPDATE weekly_periods SET status = $1 WHERE id = $2")
            .bind(PeriodStatus::Completed)
            .bind(id)
            .execute(db)
            .await?;
        Ok(())
    }

    /// Every user's active period whose end date is already past.
    pub async fn find_due(db: &PgPool, as_of: Date) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            r#"
            SELECT {COLUMNS} FROM weekly_periods
            WHERE status = $1 AND end_date < $2
            ORDER BY user_id, start_date
            "#
        ))
        .bind(PeriodStatus::Active)
        .bind(as_of)
        .fetch_all(db)
        .await
    }

    /// Users whose active period covers `date` (scheduled metrics batch).
    pub async fn users_tracking(db: &PgPool, date: Date) -> sqlx::Result<Vec<Uuid>> {
        let rows: Vec<(Uuid,)> = sqlx::query_as(
            r#"
            SELECT user_id FROM weekly_periods
            WHERE status = $1 AND start_date <= $2 AND end_date >= $2
            ORDER BY user_id
            "#,
        )
        .bind(PeriodStatus::Active)
        .bind(date)
        .fetch_all(db)
        .await?;
        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
