use std::collections::HashMap;

use serde::Serialize;
use sqlx::PgPool;
use time::{Date, Duration};
use uuid::Uuid;

use crate::error::EngineError;
use crate::observations::repo::DailyObservation;
use crate::periods::repo::WeeklyPeriod;
use crate::reservations::repo::Reservation;

/// Minimum pleasant daily allowance after overage redistribution. Distinct
/// from the medical safety floor used at synthesis time.
pub const COMFORT_FLOOR_KCAL: f64 = 1200.0;

/// Contract shape consumed by the client and the metric snapshotter.
/// `adjusted_budget_kcal == base_budget_kcal + adjustment_kcal` always.
#[derive(Debug, Clone, Serialize)]
pub struct AdjustedBudget {
    #[serde(with = "crate::dates::iso_date")]
    pub date: Date,
    pub base_budget_kcal: f64,
    pub adjustment_kcal: f64,
    pub adjusted_budget_kcal: f64,
    pub is_reserved_day: bool,
    pub reserved_kcal: Option<f64>,
    pub remaining_ordinary_days: i64,
    pub cumulative_overage_kcal: f64,
}

/// Redistributes realized overspend across the rest of the period.
///
/// Cumulative overage is the running sum of `max(0, consumed - base)` over
/// already-elapsed non-reserved days; under-eating banks no credit. The sum
/// spreads evenly over the remaining ordinary days (today included when
/// unreserved), never pushing a day below the comfort floor. Reserved days
/// are exempt on both sides: their overspend is drift, not overage, and
/// their allowance is exactly the preset amount.
pub fn distribute(
    period: &WeeklyPeriod,
    observations: &[DailyObservation],
    reservations: &[Reservation],
    as_of: Date,
) -> AdjustedBudget {
    let base = period.weekly_budget_kcal / 7.0;

    let consumed: HashMap<Date, f64> = observations
        .iter()
        .map(|o| (o.obs_date, o.consumed_kcal))
        .collect();
    let reserved: HashMap<Date, f64> = reservations
        .iter()
        .filter(|r| r.reserved_date >= period.start_date && r.reserved_date <= period.end_date)
        .map(|r| (r.reserved_date, r.planned_kcal))
        .collect();

    let mut cumulative_overage = 0.0;
    let mut day = period.start_date;
    while day < as_of && day <= period.end_date {
        if !reserved.contains_key(&day) {
            let eaten = consumed.get(&day).copied().unwrap_or(0.0);
            cumulative_overage += (eaten - base).max(0.0);
        }
        day = day + Duration::days(1);
    }

    let mut remaining_ordinary_days = 0i64;
    let mut day = as_of.max(period.start_date);
    while day <= period.end_date {
        if !reserved.contains_key(&day) {
            remaining_ordinary_days += 1;
        }
        day = day + Duration::days(1);
    }

    let (adjusted, reserved_kcal) = match reserved.get(&as_of) {
        Some(&planned) => (planned, Some(planned)),
        None => {
            let spread = if remaining_ordinary_days > 0 {
                cumulative_overage / remaining_ordinary_days as f64
            } else {
                0.0
            };
            ((base - spread).max(COMFORT_FLOOR_KCAL), None)
        }
    };

    AdjustedBudget {
        date: as_of,
        base_budget_kcal: base,
        adjustment_kcal: adjusted - base,
        adjusted_budget_kcal: adjusted,
        is_reserved_day: reserved_kcal.is_some(),
        reserved_kcal,
        remaining_ordinary_days,
        cumulative_overage_kcal: cumulative_overage,
    }
}

/// Reserve(date, plannedCalories, note): future or present dates only.
pub async fn reserve(
    db: &PgPool,
    user_id: Uuid,
    date: Date,
    planned_kcal: f64,
    note: Option<&str>,
    as_of: Date,
) -> Result<Reservation, EngineError> {
    if planned_kcal <= 0.0 {
        return Err(EngineError::Validation(
            "planned calories must be positive".into(),
        ));
    }
    if date < as_of {
        return Err(EngineError::Validation(
            "cannot reserve a date in the past".into(),
        ));
    }
    Ok(Reservation::upsert(db, user_id, date, planned_kcal, note).await?)
}

/// Loads the active period covering `date` and computes its adjusted budget.
/// Reads are one pass over the window; second-level staleness is fine.
pub async fn adjusted_budget(
    db: &PgPool,
    user_id: Uuid,
    date: Date,
) -> Result<AdjustedBudget, EngineError> {
    let period = WeeklyPeriod::find_covering(db, user_id, date)
        .await?
        .ok_or(EngineError::NotFound("active period"))?;
    let observations =
        DailyObservation::list_range(db, user_id, period.start_date, period.end_date).await?;
    let reservations =
        Reservation::list_range(db, user_id, period.start_date, period.end_date).await?;
    Ok(distribute(&period, &observations, &reservations, date))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::periods::repo::{PeriodKind, PeriodStatus};
    use time::macros::date;
    use time::OffsetDateTime;

    fn period(weekly_budget: f64) -> WeeklyPeriod {
        WeeklyPeriod {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            start_date: date!(2024 - 07 - 01),
            end_date: date!(2024 - 07 - 07),
            baseline_daily_avg: 2000.0,
            weekly_budget_kcal: weekly_budget,
            status: PeriodStatus::Active,
            kind: PeriodKind::Standard,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    fn obs(day: u8, consumed: f64) -> DailyObservation {
        DailyObservation {
            user_id: Uuid::new_v4(),
            obs_date: Date::from_calendar_date(2024, time::Month::July, day).unwrap(),
            consumed_kcal: consumed,
            burned_kcal: 0.0,
            day_type: None,
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    fn resv(day: u8, planned: f64) -> Reservation {
        Reservation {
            user_id: Uuid::new_v4(),
            reserved_date: Date::from_calendar_date(2024, time::Month::July, day).unwrap(),
            planned_kcal: planned,
            note: None,
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn reserved_day_keeps_its_preset_exactly() {
        // Base 2000/day. Wednesday overspent by 300; Thursday is reserved at
        // 2500. Thursday's budget must stay 2500 -- redistribution never
        // touches reservations.
        let p = period(14000.0);
        let observations = vec![obs(1, 2000.0), obs(2, 2000.0), obs(3, 2300.0)];
        let reservations = vec![resv(4, 2500.0)];

        let thursday = distribute(&p, &observations, &reservations, date!(2024 - 07 - 04));
        assert!(thursday.is_reserved_day);
        assert_eq!(thursday.reserved_kcal, Some(2500.0));
        assert!((thursday.adjusted_budget_kcal - 2500.0).abs() < 0.001);
        assert!((thursday.cumulative_overage_kcal - 300.0).abs() < 0.001);
    }

    #[test]
    fn overage_spreads_over_ordinary_days_only() {
        // Same setup, asking for Friday: the 300 kcal spreads over the three
        // ordinary days left (Fri, Sat, Sun), 100 each.
        let p = period(14000.0);
        let observations = vec![obs(1, 2000.0), obs(2, 2000.0), obs(3, 2300.0)];
        let reservations = vec![resv(4, 2500.0)];

        let friday = distribute(&p, &observations, &reservations, date!(2024 - 07 - 05));
        assert!(!friday.is_reserved_day);
        assert_eq!(friday.remaining_ordinary_days, 3);
        assert!((friday.cumulative_overage_kcal - 300.0).abs() < 0.001);
        assert!((friday.adjustment_kcal + 100.0).abs() < 0.001);
        assert!((friday.adjusted_budget_kcal - 1900.0).abs() < 0.001);
    }

    #[test]
    fn under_eating_banks_no_credit() {
        // Monday 500 under, Tuesday 200 over: only the overspend counts.
        let p = period(14000.0);
        let observations = vec![obs(1, 1500.0), obs(2, 2200.0)];

        let wednesday = distribute(&p, &observations, &[], date!(2024 - 07 - 03));
        assert!((wednesday.cumulative_overage_kcal - 200.0).abs() < 0.001);
        // 200 over 5 remaining days.
        assert!((wednesday.adjustment_kcal + 40.0).abs() < 0.001);
    }

    #[test]
    fn reserved_day_overspend_is_not_overage() {
        // The reserved day blew past its preset; that is drift, not overage.
        let p = period(14000.0);
        let observations = vec![obs(1, 2000.0), obs(2, 3200.0)];
        let reservations = vec![resv(2, 2500.0)];

        let wednesday = distribute(&p, &observations, &reservations, date!(2024 - 07 - 03));
        assert!((wednesday.cumulative_overage_kcal - 0.0).abs() < 0.001);
        assert!((wednesday.adjusted_budget_kcal - 2000.0).abs() < 0.001);
    }

    #[test]
    fn comfort_floor_bounds_the_adjustment() {
        // Monday lands 6000 kcal over. Spread across the 6 remaining days
        // that is -1000/day, which would drop the allowance to 1000; the
        // comfort floor holds it at 1200.
        let p = period(14000.0);
        let observations = vec![obs(1, 8000.0)];

        let tuesday = distribute(&p, &observations, &[], date!(2024 - 07 - 02));
        // overage = 6000; spread over 6 days = 1000; 2000-1000 = 1000 < floor
        assert!((tuesday.cumulative_overage_kcal - 6000.0).abs() < 0.001);
        assert!((tuesday.adjusted_budget_kcal - COMFORT_FLOOR_KCAL).abs() < 0.001);
    }

    #[test]
    fn missing_days_count_as_zero_consumed() {
        // No observations at all: no overage, full base allowance.
        let p = period(14000.0);
        let thursday = distribute(&p, &[], &[], date!(2024 - 07 - 04));
        assert!((thursday.cumulative_overage_kcal - 0.0).abs() < 0.001);
        assert!((thursday.adjusted_budget_kcal - 2000.0).abs() < 0.001);
        assert_eq!(thursday.remaining_ordinary_days, 4);
    }

    #[test]
    fn invariant_adjusted_equals_base_plus_adjustment() {
        let p = period(14000.0);
        let observations = vec![obs(1, 2600.0), obs(2, 2100.0)];
        let reservations = vec![resv(6, 2800.0)];
        for day in 3..=7u8 {
            let d = Date::from_calendar_date(2024, time::Month::July, day).unwrap();
            let r = distribute(&p, &observations, &reservations, d);
            assert!(
                (r.base_budget_kcal + r.adjustment_kcal - r.adjusted_budget_kcal).abs() < 1e-9,
                "shape invariant broke on {d}"
            );
        }
    }
}
