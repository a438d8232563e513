use serde::Serialize;
use sqlx::PgPool;
use time::{Date, Duration};
use tracing::{error, info};
use uuid::Uuid;

use crate::dates::{days_remaining_in_week, week_end, week_start};
use crate::error::EngineError;
use crate::periods::repo::{NewPeriod, PeriodKind, WeeklyPeriod};

/// Below this many days left in the calendar week, the first period is
/// deferred to next Monday instead of opening as a stub partial week.
pub const MIN_DAYS_FOR_IMMEDIATE_START: i64 = 3;

/// Window for the first steady-state period after baseline completion.
///
/// With fewer than 3 days remaining in the current week (the completion day
/// included) the period starts next Monday as a fresh full week; otherwise
/// it starts immediately and covers only the rest of the current week.
pub fn first_period_window(completion_date: Date) -> (Date, Date) {
    if days_remaining_in_week(completion_date) < MIN_DAYS_FOR_IMMEDIATE_START {
        let start = week_start(completion_date) + Duration::weeks(1);
        (start, start + Duration::days(6))
    } else {
        (completion_date, week_end(completion_date))
    }
}

/// Creates an active period, refusing to ever hold two active windows for
/// one user. A call that lands on an existing (user, week-start) row is a
/// no-op success.
pub async fn create_active_period(db: &PgPool, new: NewPeriod) -> Result<WeeklyPeriod, EngineError> {
    if let Some(active) = WeeklyPeriod::find_active(db, new.user_id).await? {
        if active.start_date == new.start_date {
            return Ok(active);
        }
        // Invariant violation upstream; refuse rather than silently
        // deactivating the existing window.
        return Err(EngineError::PeriodConflict {
            start: active.start_date,
            end: active.end_date,
        });
    }

    let (period, inserted) = WeeklyPeriod::insert_idempotent(db, &new).await?;
    if inserted {
        info!(
            user_id = %period.user_id,
            start = %period.start_date,
            end = %period.end_date,
            kind = ?period.kind,
            budget = period.weekly_budget_kcal,
            "weekly period created"
        );
    }
    Ok(period)
}

/// Completes an expired period and opens its successor for the week
/// containing `as_of`, carrying the budget and baseline average forward.
/// Budgets are never recomputed here; that only happens via re-baseline.
async fn rotate_expired(
    db: &PgPool,
    period: &WeeklyPeriod,
    as_of: Date,
) -> Result<WeeklyPeriod, EngineError> {
    WeeklyPeriod::mark_completed(db, period.id).await?;

    let start = week_start(as_of);
    let (next, inserted) = WeeklyPeriod::insert_idempotent(
        db,
        &NewPeriod {
            user_id: period.user_id,
            start_date: start,
            end_date: start + Duration::days(6),
            baseline_daily_avg: period.baseline_daily_avg,
            weekly_budget_kcal: period.weekly_budget_kcal,
            kind: PeriodKind::Standard,
        },
    )
    .await?;
    if inserted {
        info!(
            user_id = %period.user_id,
            completed = %period.start_date,
            next = %next.start_date,
            "period rotated"
        );
    }
    Ok(next)
}

/// `createOrRotatePeriod`: idempotent per (user, week). An expired active
/// period rotates; a current one is returned as-is. With no period history
/// at all this fails with `MissingBaselineData` — the first period only ever
/// comes out of the baseline flow, never out of a fabricated budget.
pub async fn create_or_rotate(
    db: &PgPool,
    user_id: Uuid,
    as_of: Date,
) -> Result<WeeklyPeriod, EngineError> {
    if let Some(active) = WeeklyPeriod::find_active(db, user_id).await? {
        if active.end_date >= as_of {
            return Ok(active);
        }
        return rotate_expired(db, &active, as_of).await;
    }

    match WeeklyPeriod::latest(db, user_id).await? {
        Some(prev) => {
            // No active window but history exists (e.g. rotation raced or a
            // week was skipped): resume from the current week.
            let start = week_start(as_of).max(prev.end_date + Duration::days(1));
            let new = NewPeriod {
                user_id,
                start_date: start,
                end_date: start + Duration::days(6),
                baseline_daily_avg: prev.baseline_daily_avg,
                weekly_budget_kcal: prev.weekly_budget_kcal,
                kind: PeriodKind::Standard,
            };
            create_active_period(db, new).await
        }
        None => Err(EngineError::MissingBaselineData),
    }
}

#[derive(Debug, Default, Serialize)]
pub struct RotationStats {
    pub rotated: usize,
    pub failed: usize,
}

/// Daily batch: rotate every user whose active period has lapsed. Individual
/// failures are logged and skipped so one user cannot wedge the batch.
pub async fn rotate_due(db: &PgPool, as_of: Date) -> Result<RotationStats, EngineError> {
    let due = WeeklyPeriod::find_due(db, as_of).await?;
    let mut stats = RotationStats::default();
    for period in &due {
        match rotate_expired(db, period, as_of).await {
            Ok(_) => stats.rotated += 1,
            Err(e) => {
                error!(user_id = %period.user_id, error = %e, "rotation failed");
                stats.failed += 1;
            }
        }
    }
    info!(rotated = stats.rotated, failed = stats.failed, %as_of, "rotation batch done");
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    #[test]
    fn saturday_completion_defers_to_next_monday() {
        // 2024-07-06 is a Saturday: 2 days left -> start 2024-07-08.
        let (start, end) = first_period_window(date!(2024 - 07 - 06));
        assert_eq!(start, date!(2024 - 07 - 08));
        assert_eq!(end, date!(2024 - 07 - 14));
    }

    #[test]
    fn sunday_completion_defers_to_next_monday() {
        let (start, end) = first_period_window(date!(2024 - 07 - 07));
        assert_eq!(start, date!(2024 - 07 - 08));
        assert_eq!(end, date!(2024 - 07 - 14));
    }

    #[test]
    fn friday_completion_starts_immediately_as_partial_week() {
        // Friday: 3 days left, period covers Fri-Sun only.
        let (start, end) = first_period_window(date!(2024 - 07 - 05));
        assert_eq!(start, date!(2024 - 07 - 05));
        assert_eq!(end, date!(2024 - 07 - 07));
    }

    #[test]
    fn monday_completion_covers_the_full_week() {
        let (start, end) = first_period_window(date!(2024 - 07 - 01));
        assert_eq!(start, date!(2024 - 07 - 01));
        assert_eq!(end, date!(2024 - 07 - 07));
    }
}
