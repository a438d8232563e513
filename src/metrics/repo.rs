use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// One row per (user, period, calculation date). Strict upsert on that
/// triple everywhere; recalculation overwrites, never appends, and nothing
/// ever selects "the latest row" by recency.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct WeeklyMetricSnapshot {
    pub user_id: Uuid,
    pub period_id: Uuid,
    #[serde(with = "crate::dates::iso_date")]
    pub calc_date: Date,
    pub consumed_kcal: f64,
    pub burned_kcal: f64,
    pub remaining_kcal: f64,
    pub reserved_kcal: f64,
    pub balance_score: i32,
    pub consistency_score: i32,
    pub drift_score: i32,
    pub updated_at: OffsetDateTime,
}

const COLUMNS: &str = "user_id, period_id, calc_date, consumed_kcal, burned_kcal, \
                       remaining_kcal, reserved_kcal, balance_score, consistency_score, \
                       drift_score, updated_at";

pub struct SnapshotValues {
    pub consumed_kcal: f64,
    pub burned_kcal: f64,
    pub remaining_kcal: f64,
    pub reserved_kcal: f64,
    pub balance_score: i32,
    pub consistency_score: i32,
    pub drift_score: i32,
}

impl WeeklyMetricSnapshot {
    pub async fn upsert(
        db: &PgPool,
        user_id: Uuid,
        period_id: Uuid,
        calc_date: Date,
        v: &SnapshotValues,
    ) -> sqlx::Result<Self> {
        sqlx::query_as::<_, Self>(&format!(
            r#"
            INSERT INTO weekly_metric_snapshots
                (user_id, period_id, calc_date, consumed_kcal, burned_kcal,
                 remaining_kcal, reserved_kcal, balance_score, consistency_score,
                 drift_score, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, now())
            ON CONFLICT (user_id, period_id, calc_date) DO UPDATE SET
                consumed_kcal = EXCLUDED.consumed_kcal,
                burned_kcal = EXCLUDED.burned_kcal,
                remaining_kcal = EXCLUDED.remaining_kcal,
                reserved_kcal = EXCLUDED.reserved_kcal,
                balance_score = EXCLUDED.balance_score,
                consistency_score = EXCLUDED.consistency_score,
                drift_score = EXCLUDED.drift_score,
                updated_at = now()
            RETURNING {COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(period_id)
        .bind(calc_date)
        .bind(v.consumed_kcal)
        .bind(v.burned_kcal)
        .bind(v.remaining_kcal)
        .bind(v.reserved_kcal)
        .bind(v.balance_score)
        .bind(v.consistency_score)
        .bind(v.drift_score)
        .fetch_one(db)
        .await
    }

    pub async fn find(
        db: &PgPool,
        user_id: Uuid,
        period_id: Uuid,
        calc_date: Date,
    ) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM weekly_metric_snapshots
            WHERE user_id = $1 AND period_id = $2 AND calc_date = $3
            "#
        ))
        .bind(user_id)
        .bind(period_id)
        .bind(calc_date)
        .fetch_optional(db)
        .await
    }
}
