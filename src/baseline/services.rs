use serde::Serialize;
use sqlx::PgPool;
use time::{Date, Duration};
use tracing::info;
use uuid::Uuid;

use crate::baseline::repo::{BaselinePeriod, BaselineStatus};
use crate::budget::estimator::{self, ActivityTier};
use crate::budget::synthesizer::{synthesize, BudgetBreakdown};
use crate::error::EngineError;
use crate::observations::repo::DailyObservation;
use crate::periods::repo::{NewPeriod, PeriodKind, WeeklyPeriod};
use crate::periods::services::{create_active_period, first_period_window};
use crate::profile::repo::MetabolicProfile;

pub const BASELINE_WINDOW_DAYS: i64 = 7;
pub const MIN_QUALIFYING_DAYS: usize = 5;

// Cumulative window burn below these marks lands in tiers 1..3; anything
// higher is tier 4.
const TIER_2_BURN_KCAL: f64 = 500.0;
const TIER_3_BURN_KCAL: f64 = 1200.0;
const TIER_4_BURN_KCAL: f64 = 2000.0;

#[derive(Debug, Clone, Copy, Serialize)]
pub struct BaselineMeasurement {
    pub qualifying_days: usize,
    pub measured_daily_avg: f64,
    pub total_burn_kcal: f64,
    pub measured_tier: ActivityTier,
}

/// Measured activity tier from a week's cumulative exercise burn.
pub fn classify_burn_tier(total_burn_kcal: f64) -> ActivityTier {
    if total_burn_kcal < TIER_2_BURN_KCAL {
        ActivityTier::Sedentary
    } else if total_burn_kcal < TIER_3_BURN_KCAL {
        ActivityTier::LightlyActive
    } else if total_burn_kcal < TIER_4_BURN_KCAL {
        ActivityTier::ModeratelyActive
    } else {
        ActivityTier::VeryActive
    }
}

/// Aggregates one baseline window of observations.
///
/// A day qualifies only with strictly positive intake — zero-intake days are
/// excluded as non-representative, not averaged in as zeros. Burn is summed
/// over the whole window regardless of intake.
pub fn aggregate(observations: &[DailyObservation]) -> Result<BaselineMeasurement, EngineError> {
    let qualifying: Vec<&DailyObservation> = observations
        .iter()
        .filter(|o| o.consumed_kcal > 0.0)
        .collect();

    if qualifying.len() < MIN_QUALIFYING_DAYS {
        return Err(EngineError::InsufficientBaselineData {
            qualifying: qualifying.len(),
            required: MIN_QUALIFYING_DAYS,
        });
    }

    let total_consumed: f64 = qualifying.iter().map(|o| o.consumed_kcal).sum();
    let total_burn_kcal: f64 = observations.iter().map(|o| o.burned_kcal).sum();

    Ok(BaselineMeasurement {
        qualifying_days: qualifying.len(),
        measured_daily_avg: total_consumed / qualifying.len() as f64,
        total_burn_kcal,
        measured_tier: classify_burn_tier(total_burn_kcal),
    })
}

/// Outcome of either baseline exit path. `measurement` is absent on the
/// declared-only (abandon) path.
#[derive(Debug, Serialize)]
pub struct BaselineOutcome {
    pub measurement: Option<BaselineMeasurement>,
    #[serde(flatten)]
    pub budget: BudgetBreakdown,
    pub period: WeeklyPeriod,
}

/// Completes the baseline: aggregate the window, re-run the formula at the
/// *measured* tier, blend with the measured average, and open the first
/// tracking period. Safe to retry; every step upserts.
pub async fn complete(db: &PgPool, user_id: Uuid, as_of: Date) -> Result<BaselineOutcome, EngineError> {
    let baseline = BaselinePeriod::find(db, user_id)
        .await?
        .ok_or(EngineError::NotFound("baseline period"))?;
    let profile = MetabolicProfile::find(db, user_id)
        .await?
        .ok_or(EngineError::NotFound("metabolic profile"))?;

    let window_end = baseline.start_date + Duration::days(BASELINE_WINDOW_DAYS - 1);
    let observations =
        DailyObservation::list_range(db, user_id, baseline.start_date, window_end).await?;
    let measurement = aggregate(&observations)?;

    let basal = estimator::basal_rate(
        profile.sex,
        profile.weight_lb,
        profile.height_in,
        profile.birth_date,
        as_of,
    )?;
    let corrected_formula = basal * measurement.measured_tier.multiplier();

    let budget = synthesize(
        corrected_formula,
        Some(measurement.measured_daily_avg),
        profile.goal,
        profile.weight_lb,
        profile.target_weight_lb,
    )?;

    let (start_date, end_date) = first_period_window(as_of);
    let period = create_active_period(
        db,
        NewPeriod {
            user_id,
            start_date,
            end_date,
            baseline_daily_avg: measurement.measured_daily_avg,
            weekly_budget_kcal: budget.weekly_budget_kcal,
            kind: PeriodKind::Baseline,
        },
    )
    .await?;

    BaselinePeriod::set_status(db, user_id, BaselineStatus::Completed).await?;
    info!(
        %user_id,
        qualifying_days = measurement.qualifying_days,
        tier = ?measurement.measured_tier,
        daily_target = budget.daily_target_kcal,
        "baseline completed"
    );

    Ok(BaselineOutcome {
        measurement: Some(measurement),
        budget,
        period,
    })
}

/// Declared-only fallback when the user opts out of waiting for 5 qualifying
/// days: no blend, the formula estimate at the self-declared level stands
/// alone, and the period's baseline average carries the daily target.
pub async fn abandon(db: &PgPool, user_id: Uuid, as_of: Date) -> Result<BaselineOutcome, EngineError> {
    let _baseline = BaselinePeriod::find(db, user_id)
        .await?
        .ok_or(EngineError::NotFound("baseline period"))?;
    let profile = MetabolicProfile::find(db, user_id)
        .await?
        .ok_or(EngineError::NotFound("metabolic profile"))?;

    let formula = estimator::formula_expenditure(
        profile.sex,
        profile.weight_lb,
        profile.height_in,
        profile.birth_date,
        as_of,
        profile.activity_level.multiplier(),
    )?;
    let budget = synthesize(
        formula.maintenance_kcal,
        None,
        profile.goal,
        profile.weight_lb,
        profile.target_weight_lb,
    )?;

    let (start_date, end_date) = first_period_window(as_of);
    let period = create_active_period(
        db,
        NewPeriod {
            user_id,
            start_date,
            end_date,
            baseline_daily_avg: budget.daily_target_kcal,
            weekly_budget_kcal: budget.weekly_budget_kcal,
            kind: PeriodKind::Baseline,
        },
    )
    .await?;

    BaselinePeriod::set_status(db, user_id, BaselineStatus::Abandoned).await?;
    info!(%user_id, daily_target = budget.daily_target_kcal, "baseline abandoned for declared-only estimate");

    Ok(BaselineOutcome {
        measurement: None,
        budget,
        period,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;
    use time::OffsetDateTime;

    fn obs(day: u8, consumed: f64, burned: f64) -> DailyObservation {
        DailyObservation {
            user_id: Uuid::new_v4(),
            obs_date: Date::from_calendar_date(2024, time::Month::July, day).unwrap(),
            consumed_kcal: consumed,
            burned_kcal: burned,
            day_type: None,
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn aggregates_measured_week() {
        // 12,600 kcal over 6 qualifying days plus one zero-intake day;
        // 900 kcal of burn lands in the lightly-active tier.
        let week = vec![
            obs(1, 2000.0, 300.0),
            obs(2, 2200.0, 0.0),
            obs(3, 0.0, 200.0),
            obs(4, 2100.0, 0.0),
            obs(5, 2150.0, 400.0),
            obs(6, 2050.0, 0.0),
            obs(7, 2100.0, 0.0),
        ];
        let m = aggregate(&week).unwrap();
        assert_eq!(m.qualifying_days, 6);
        assert!((m.measured_daily_avg - 2100.0).abs() < 0.001);
        assert!((m.total_burn_kcal - 900.0).abs() < 0.001);
        assert_eq!(m.measured_tier, ActivityTier::LightlyActive);
    }

    #[test]
    fn four_qualifying_days_is_insufficient() {
        let week = vec![
            obs(1, 1800.0, 0.0),
            obs(2, 1900.0, 0.0),
            obs(3, 0.0, 0.0),
            obs(4, 2000.0, 0.0),
            obs(5, 1850.0, 0.0),
        ];
        match aggregate(&week) {
            Err(EngineError::InsufficientBaselineData {
                qualifying,
                required,
            }) => {
                assert_eq!(qualifying, 4);
                assert_eq!(required, 5);
            }
            other => panic!("expected InsufficientBaselineData, got {other:?}"),
        }
    }

    #[test]
    fn five_qualifying_days_is_enough() {
        let week: Vec<_> = (1..=5).map(|d| obs(d, 2000.0, 0.0)).collect();
        let m = aggregate(&week).unwrap();
        assert_eq!(m.qualifying_days, 5);
        assert!((m.measured_daily_avg - 2000.0).abs() < 0.001);
    }

    #[test]
    fn burn_tier_thresholds() {
        assert_eq!(classify_burn_tier(0.0), ActivityTier::Sedentary);
        assert_eq!(classify_burn_tier(499.9), ActivityTier::Sedentary);
        assert_eq!(classify_burn_tier(500.0), ActivityTier::LightlyActive);
        assert_eq!(classify_burn_tier(1199.9), ActivityTier::LightlyActive);
        assert_eq!(classify_burn_tier(1200.0), ActivityTier::ModeratelyActive);
        assert_eq!(classify_burn_tier(1999.9), ActivityTier::ModeratelyActive);
        assert_eq!(classify_burn_tier(2000.0), ActivityTier::VeryActive);
    }

    #[test]
    fn burn_counts_even_on_zero_intake_days() {
        let week = vec![
            obs(1, 2000.0, 0.0),
            obs(2, 2000.0, 0.0),
            obs(3, 0.0, 600.0),
            obs(4, 2000.0, 0.0),
            obs(5, 2000.0, 0.0),
            obs(6, 2000.0, 0.0),
        ];
        let m = aggregate(&week).unwrap();
        assert!((m.total_burn_kcal - 600.0).abs() < 0.001);
        assert_eq!(m.measured_tier, ActivityTier::LightlyActive);
    }

    #[test]
    fn window_end_is_six_days_after_start() {
        let start = date!(2024 - 07 - 01);
        assert_eq!(start + Duration::days(BASELINE_WINDOW_DAYS - 1), date!(2024 - 07 - 07));
    }
}
