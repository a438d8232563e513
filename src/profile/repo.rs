use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use crate::budget::estimator::{DeclaredActivity, Goal, SexCategory};
use crate::profile::dto::ProfilePayload;

/// Physical profile owned by the user. Mutated only through onboarding and
/// profile edits; an active period's budget never tracks it automatically.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MetabolicProfile {
    pub user_id: Uuid,
    pub sex: SexCategory,
    pub weight_lb: f64,
    pub height_in: f64,
    #[serde(with = "crate::dates::iso_date")]
    pub birth_date: Date,
    pub activity_level: DeclaredActivity,
    pub goal: Goal,
    pub target_weight_lb: f64,
    pub updated_at: OffsetDateTime,
}

impl MetabolicProfile {
    pub async fn find(db: &PgPool, user_id: Uuid) -> sqlx::Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT user_id, sex, weight_lb, height_in, birth_date,
                   activity_level, goal, target_weight_lb, updated_at
            FROM metabolic_profiles
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(db)
        .await
    }

    pub async fn upsert(db: &PgPool, user_id: Uuid, p: &ProfilePayload) -> sqlx::Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO metabolic_profiles
                (user_id, sex, weight_lb, height_in, birth_date,
                 activity_level, goal, target_weight_lb, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, now())
            ON CONFLICT (user_id) DO UPDATE SET
                sex = EXCLUDED.sex,
                weight_lb = EXCLUDED.weight_lb,
                height_in = EXCLUDED.height_in,
                birth_date = EXCLUDED.birth_date,
                activity_level = EXCLUDED.activity_level,
                goal = EXCLUDED.goal,
                target_weight_lb = EXCLUDED.target_weight_lb,
                updated_at = now()
            RETURNING user_id, sex, weight_lb, height_in, birth_date,
                      activity_level, goal, target_weight_lb, updated_at
            "#,
        )
        .bind(user_id)
        .bind(p.sex)
        .bind(p.weight_lb)
        .bind(p.height_in)
        .bind(p.birth_date)
        .bind(p.activity_level)
        .bind(p.goal)
        .bind(p.target_weight_lb)
        .fetch_one(db)
        .await
    }
}
