use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum BaselineStatus {
    Active,
    Completed,
    Abandoned,
}

/// The one-shot 7-day observation window used to bootstrap measurement.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BaselinePeriod {
    pub user_id: Uuid,
    #[serde(with = "crate::dates::iso_date")]
    pub start_date: Date,
    pub status: BaselineStatus,
    pub started_at: OffsetDateTime,
}

const COLUMNS: &str = "user_id, start_date, status, started_at";

impl BaselinePeriod {
    pub async fn find(db: &PgPool, user_id: Uuid) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(&format!(
            "SELECT {COLUMNS} FROM baseline_periods WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(db)
        .await
    }

    /// One baseline per user; a repeat start returns the existing window.
    pub async fn start(db: &PgPool, user_id: Uuid, start_date: Date) -> sqlx::Result<Self> {
        let inserted = sqlx::query_as::<_, Self>(&format!(
            r#"
            INSERT INTO baseline_periods (user_id, start_date, status, started_at)
            VALUES ($1, $2, $3, now())
            ON CONFLICT (user_id) DO NOTHING
            RETURNING {COLUMNS}
            "#
        ))
        .bind(user_id)
        .bind(start_date)
        .bind(BaselineStatus::Active)
        .fetch_optional(db)
        .await?;

        match inserted {
            Some(row) => Ok(row),
            None => Self::find(db, user_id)
                .await?
                .ok_or(sqlx::Error::RowNotFound),
        }
    }

    pub async fn set_status(db: &PgPool, user_id: Uuid, status: BaselineStatus) -> sqlx::Result<()> {
        sqlx::query("UPDATE baseline_periods SET status = $1 WHERE user_id = $2")
            .bind(status)
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(())
    }
}
