use std::collections::HashMap;

use serde::Serialize;
use sqlx::PgPool;
use time::{Date, Duration};
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::error::EngineError;
use crate::metrics::repo::{SnapshotValues, WeeklyMetricSnapshot};
use crate::observations::repo::DailyObservation;
use crate::periods::repo::WeeklyPeriod;
use crate::reservations::repo::Reservation;

pub const NEUTRAL_SCORE: i32 = 50;

/// Why a recalculation was requested. Every call site — interactive client,
/// scheduled job, observation write — funnels through [`recalculate`] so the
/// ordering and idempotency rules live in exactly one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecalcReason {
    Interactive,
    Scheduled,
    ObservationWrite,
}

/// Balance: today's implied daily allowance (remaining budget over days
/// left) compared to the baseline average. Quantized tiers are intentional;
/// users read these as grades, not as a continuous gauge.
pub fn balance_score(remaining_kcal: f64, days_left: i64, baseline_daily_avg: f64) -> i32 {
    if days_left <= 0 {
        return NEUTRAL_SCORE;
    }
    let implied_daily = remaining_kcal / days_left as f64;
    let ratio = implied_daily / baseline_daily_avg;
    if ratio >= 1.0 {
        100
    } else if ratio >= 0.7 {
        65
    } else {
        30
    }
}

/// Consistency: coefficient of variation (population standard deviation over
/// mean, as a percent) of daily intake. Needs 3 observed days; below that
/// the neutral default applies.
pub fn consistency_score(daily_consumed: &[f64]) -> i32 {
    if daily_consumed.len() < 3 {
        return NEUTRAL_SCORE;
    }
    let n = daily_consumed.len() as f64;
    let mean = daily_consumed.iter().sum::<f64>() / n;
    if mean <= 0.0 {
        return NEUTRAL_SCORE;
    }
    let variance = daily_consumed
        .iter()
        .map(|v| (v - mean) * (v - mean))
        .sum::<f64>()
        / n;
    let cv_percent = variance.sqrt() / mean * 100.0;
    if cv_percent < 15.0 {
        85
    } else if cv_percent < 30.0 {
        55
    } else {
        25
    }
}

/// Drift: average per-day overspend against each *elapsed* reservation's
/// planned amount, under-spend clamped to zero before averaging. No elapsed
/// reservations means no signal yet.
pub fn drift_score(elapsed: &[(f64, f64)]) -> i32 {
    if elapsed.is_empty() {
        return NEUTRAL_SCORE;
    }
    let total_overspend: f64 = elapsed
        .iter()
        .map(|(consumed, planned)| (consumed - planned).max(0.0))
        .sum();
    let avg = total_overspend / elapsed.len() as f64;
    if avg < 200.0 {
        80
    } else if avg < 500.0 {
        50
    } else {
        20
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub period_id: Uuid,
    #[serde(with = "crate::dates::iso_date")]
    pub calc_date: Date,
    pub consumed_kcal: f64,
    pub burned_kcal: f64,
    pub net_kcal: f64,
    pub remaining_kcal: f64,
    pub reserved_kcal: f64,
    pub balance_score: i32,
    pub consistency_score: i32,
    pub drift_score: i32,
    /// False when the previous-day guard skipped the snapshot write.
    pub persisted: bool,
}

/// The single recalculation entry point.
///
/// Computes period totals through `date`, the three adherence scores, and
/// upserts exactly one snapshot row keyed (user, period, date). The write is
/// skipped — computed values still return — when the previous day has no
/// strictly-positive consumption record, since a day with no new intake
/// information changes nothing worth persisting.
pub async fn recalculate(
    db: &PgPool,
    user_id: Uuid,
    date: Date,
    reason: RecalcReason,
) -> Result<MetricsReport, EngineError> {
    let period = WeeklyPeriod::find_covering(db, user_id, date)
        .await?
        .ok_or(EngineError::NotFound("active period"))?;

    let observations =
        DailyObservation::list_range(db, user_id, period.start_date, date).await?;
    let reservations =
        Reservation::list_range(db, user_id, period.start_date, period.end_date).await?;

    let consumed_kcal: f64 = observations.iter().map(|o| o.consumed_kcal).sum();
    let burned_kcal: f64 = observations.iter().map(|o| o.burned_kcal).sum();
    let net_kcal = consumed_kcal - burned_kcal;
    let remaining_kcal = period.weekly_budget_kcal - net_kcal;
    let reserved_kcal: f64 = reservations
        .iter()
        .filter(|r| r.reserved_date >= date)
        .map(|r| r.planned_kcal)
        .sum();

    let days_left = (period.end_date - date).whole_days() + 1;
    let balance = balance_score(remaining_kcal, days_left, period.baseline_daily_avg);

    let intake_days: Vec<f64> = observations
        .iter()
        .filter(|o| o.consumed_kcal > 0.0)
        .map(|o| o.consumed_kcal)
        .collect();
    let consistency = consistency_score(&intake_days);

    let consumed_by_date: HashMap<Date, f64> = observations
        .iter()
        .map(|o| (o.obs_date, o.consumed_kcal))
        .collect();
    let elapsed: Vec<(f64, f64)> = reservations
        .iter()
        .filter(|r| r.reserved_date < date)
        .map(|r| {
            let eaten = consumed_by_date.get(&r.reserved_date).copied().unwrap_or(0.0);
            (eaten, r.planned_kcal)
        })
        .collect();
    let drift = drift_score(&elapsed);

    let mut report = MetricsReport {
        period_id: period.id,
        calc_date: date,
        consumed_kcal,
        burned_kcal,
        net_kcal,
        remaining_kcal,
        reserved_kcal,
        balance_score: balance,
        consistency_score: consistency,
        drift_score: drift,
        persisted: false,
    };

    let prev = DailyObservation::find(db, user_id, date - Duration::days(1)).await?;
    let has_new_information = prev.map(|o| o.consumed_kcal > 0.0).unwrap_or(false);
    if !has_new_information && reason != RecalcReason::ObservationWrite {
        debug!(%user_id, %date, ?reason, "previous day unlogged; snapshot left as-is");
        return Ok(report);
    }

    WeeklyMetricSnapshot::upsert(
        db,
        user_id,
        period.id,
        date,
        &SnapshotValues {
            consumed_kcal,
            burned_kcal,
            remaining_kcal,
            reserved_kcal,
            balance_score: balance,
            consistency_score: consistency,
            drift_score: drift,
        },
    )
    .await?;
    report.persisted = true;
    debug!(%user_id, %date, ?reason, balance, consistency, drift, "metrics recalculated");
    Ok(report)
}

#[derive(Debug, Default, Serialize)]
pub struct SnapshotStats {
    pub persisted: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Daily batch over every user with an active period covering `as_of`.
pub async fn snapshot_all(db: &PgPool, as_of: Date) -> Result<SnapshotStats, EngineError> {
    let users = WeeklyPeriod::users_tracking(db, as_of).await?;
    let mut stats = SnapshotStats::default();
    for user_id in users {
        match recalculate(db, user_id, as_of, RecalcReason::Scheduled).await {
            Ok(report) if report.persisted => stats.persisted += 1,
            Ok(_) => stats.skipped += 1,
            Err(e) => {
                error!(%user_id, error = %e, "scheduled metrics recalculation failed");
                stats.failed += 1;
            }
        }
    }
    info!(
        persisted = stats.persisted,
        skipped = stats.skipped,
        failed = stats.failed,
        %as_of,
        "metric snapshot batch done"
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_tiers() {
        // 6000 left over 3 days = 2000/day vs 2000 baseline: full marks.
        assert_eq!(balance_score(6000.0, 3, 2000.0), 100);
        // 1400/day vs 2000 = exactly 70%.
        assert_eq!(balance_score(4200.0, 3, 2000.0), 65);
        // Just under 70%.
        assert_eq!(balance_score(4197.0, 3, 2000.0), 30);
    }

    #[test]
    fn consistency_score_of_steady_week_is_85() {
        let week = [1800.0, 1900.0, 1850.0, 1820.0, 1880.0, 1790.0, 1860.0];
        assert_eq!(consistency_score(&week), 85);
    }

    #[test]
    fn consistency_needs_three_days() {
        assert_eq!(consistency_score(&[2000.0, 2100.0]), NEUTRAL_SCORE);
        assert_eq!(consistency_score(&[]), NEUTRAL_SCORE);
    }

    #[test]
    fn consistency_middle_and_low_tiers() {
        // CV = 20%: std dev 400 around mean 2000.
        let wobbly = [1600.0, 2400.0, 1600.0, 2400.0];
        assert_eq!(consistency_score(&wobbly), 55);
        // CV well past 30%.
        let chaotic = [500.0, 3500.0, 500.0, 3500.0];
        assert_eq!(consistency_score(&chaotic), 25);
    }

    #[test]
    fn drift_neutral_without_elapsed_reservations() {
        assert_eq!(drift_score(&[]), NEUTRAL_SCORE);
    }

    #[test]
    fn drift_tiers_average_clamped_overspend() {
        // 150 over on one day, 100 under on another: avg = 75 -> 80.
        assert_eq!(drift_score(&[(2650.0, 2500.0), (2400.0, 2500.0)]), 80);
        // avg 300 -> 50.
        assert_eq!(drift_score(&[(2800.0, 2500.0)]), 50);
        // avg 600 -> 20.
        assert_eq!(drift_score(&[(3100.0, 2500.0)]), 20);
    }

    #[test]
    fn drift_clamps_under_spend_before_averaging() {
        // A single massively-under day cannot mask an overspent one.
        assert_eq!(drift_score(&[(1000.0, 2500.0), (3100.0, 2500.0)]), 50);
    }
}
