use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// A planned exception day: the user pre-commits a calorie amount for a
/// future date. Unique per (user, date); past rows stay as history.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Reservation {
    pub user_id: Uuid,
    #[serde(with = "crate::dates::iso_date")]
    pub reserved_date: Date,
    pub planned_kcal: f64,
    pub note: Option<String>,
    pub updated_at: OffsetDateTime,
}

const COLUMNS: &str = "user_id, reserved_date, planned_kcal, note, updated_at";

impl Reservation {
    /// Upsert by (user, date); a conflicting reservation on the same date is
    /// overwritten, never duplicated.
    pub async fn upsert(
        db: &PgPool,
        user_id: Uuid,
        reserved_date: Date,
        planned_kcal: f64,
        note: Option<&str>,
    ) -> sqlx::Result<Self> {
        sqlx::query_as::<_, Self>(&format!(
            r#"
            INSERT INTO reservations (user_id, reserved_date, planned_kcal, note, updated_at)
            VALUES ($1, $2, $3, $4, now())
            ON CONFLICT (user_id, reserved_date) DO UPDATE SET
                planned_kcal = EXCLUDED.planned_kcal,
                note = EXCLUDED.note,
                updated_at = now()
            RETURNING {COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(reserved_date)
        .bind(planned_kcal)
        .bind(note)
        .fetch_one(db)
        .await
    }

    /// Reservations dated within `[from, to]`, ordered by date.
    pub async fn list_range(
        db: &PgPool,
        user_id: Uuid,
        from: Date,
        to: Date,
    ) -> sqlx::Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            r#"
            SELECT {COLUMNS}
            FROM reservations
            WHERE user_id = $1 AND reserved_date >= $2 AND reserved_date <= $3
            ORDER BY reserved_date ASC
            "#
        ))
        .bind(user_id)
        .bind(from)
        .bind(to)
        .fetch_all(db)
        .await
    }
}
