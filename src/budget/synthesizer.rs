//! Blends the formula expenditure with the measured baseline average into a
//! final daily/weekly target, applies the goal adjustment and the safety
//! floor, and derives macro targets.

use serde::Serialize;

use crate::budget::estimator::Goal;
use crate::error::EngineError;

/// Minimum safe daily intake. Synthesis below this fails rather than clamps;
/// the caller must prompt for a less aggressive goal.
pub const SAFETY_FLOOR_KCAL: f64 = 1500.0;

/// Fixed daily surplus for a weight-gain goal.
pub const GAIN_SURPLUS_KCAL: f64 = 500.0;

const PROTEIN_SPLIT: f64 = 0.30;
const CARB_SPLIT: f64 = 0.40;
const FAT_SPLIT: f64 = 0.30;
const KCAL_PER_G_PROTEIN: f64 = 4.0;
const KCAL_PER_G_CARB: f64 = 4.0;
const KCAL_PER_G_FAT: f64 = 9.0;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct MacroTargets {
    pub protein_g: i64,
    pub carbs_g: i64,
    pub fat_g: i64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct BudgetBreakdown {
    pub daily_target_kcal: f64,
    pub weekly_budget_kcal: f64,
    pub macros: MacroTargets,
}

/// Daily deficit for a weight-loss goal, stepped by total weight left to
/// lose. Deliberately conservative for small remaining losses.
pub fn loss_deficit_kcal(lb_to_lose: f64) -> f64 {
    if lb_to_lose >= 50.0 {
        750.0
    } else if lb_to_lose >= 25.0 {
        625.0
    } else if lb_to_lose >= 15.0 {
        500.0
    } else {
        375.0
    }
}

/// Macro gram targets from fixed percentage splits of weekly calories,
/// rounded to the nearest gram.
pub fn macro_targets(weekly_budget_kcal: f64) -> MacroTargets {
    MacroTargets {
        protein_g: (weekly_budget_kcal * PROTEIN_SPLIT / KCAL_PER_G_PROTEIN).round() as i64,
        carbs_g: (weekly_budget_kcal * CARB_SPLIT / KCAL_PER_G_CARB).round() as i64,
        fat_g: (weekly_budget_kcal * FAT_SPLIT / KCAL_PER_G_FAT).round() as i64,
    }
}

/// Synthesizes the final budget.
///
/// `formula_kcal` is the activity-corrected (or declared-level) formula
/// expenditure; `measured_daily_avg` is the baseline week's measured intake
/// average when one exists. The two are blended with an unweighted mean:
/// the formula captures physiology, the measurement captures behavior, and
/// averaging damps both idiosyncratic error and formula bias.
pub fn synthesize(
    formula_kcal: f64,
    measured_daily_avg: Option<f64>,
    goal: Goal,
    weight_lb: f64,
    target_weight_lb: f64,
) -> Result<BudgetBreakdown, EngineError> {
    let blended = match measured_daily_avg {
        Some(measured) => (formula_kcal + measured) / 2.0,
        None => formula_kcal,
    };

    let daily_target_kcal = match goal {
        Goal::Maintain => blended,
        Goal::Gain => blended + GAIN_SURPLUS_KCAL,
        Goal::Lose => {
            let lb_to_lose = (weight_lb - target_weight_lb).max(0.0);
            blended - loss_deficit_kcal(lb_to_lose)
        }
    };

    if daily_target_kcal < SAFETY_FLOOR_KCAL {
        return Err(EngineError::UnsafeBudgetFloor {
            target_kcal: daily_target_kcal,
            floor_kcal: SAFETY_FLOOR_KCAL,
        });
    }

    let weekly_budget_kcal = daily_target_kcal * 7.0;
    Ok(BudgetBreakdown {
        daily_target_kcal,
        weekly_budget_kcal,
        macros: macro_targets(weekly_budget_kcal),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blend_is_unweighted_mean() {
        let b = synthesize(2400.0, Some(2100.0), Goal::Maintain, 180.0, 180.0).unwrap();
        assert!((b.daily_target_kcal - 2250.0).abs() < 0.001);
        assert!((b.weekly_budget_kcal - 15750.0).abs() < 0.001);
    }

    #[test]
    fn no_measurement_uses_formula_alone() {
        let b = synthesize(2400.0, None, Goal::Maintain, 180.0, 180.0).unwrap();
        assert!((b.daily_target_kcal - 2400.0).abs() < 0.001);
    }

    #[test]
    fn deficit_tiers_resolve_by_weight_to_lose() {
        assert_eq!(loss_deficit_kcal(60.0), 750.0);
        assert_eq!(loss_deficit_kcal(50.0), 750.0);
        // 40 lb to lose resolves to the 625 tier, not 500 or 750.
        assert_eq!(loss_deficit_kcal(40.0), 625.0);
        assert_eq!(loss_deficit_kcal(25.0), 625.0);
        assert_eq!(loss_deficit_kcal(20.0), 500.0);
        assert_eq!(loss_deficit_kcal(15.0), 500.0);
        assert_eq!(loss_deficit_kcal(10.0), 375.0);
    }

    #[test]
    fn loss_goal_subtracts_tiered_deficit() {
        // 220 -> 180 lb: 40 lb to lose, 625/day deficit.
        let b = synthesize(2800.0, Some(2800.0), Goal::Lose, 220.0, 180.0).unwrap();
        assert!((b.daily_target_kcal - 2175.0).abs() < 0.001);
    }

    #[test]
    fn gain_goal_adds_fixed_surplus() {
        let b = synthesize(2000.0, Some(2000.0), Goal::Gain, 150.0, 160.0).unwrap();
        assert!((b.daily_target_kcal - 2500.0).abs() < 0.001);
    }

    #[test]
    fn floor_blocks_at_1499_and_passes_at_1500() {
        // Maintain goal so the blended value is the target itself.
        let err = synthesize(1499.0, None, Goal::Maintain, 150.0, 150.0).unwrap_err();
        assert!(matches!(err, EngineError::UnsafeBudgetFloor { .. }));

        let ok = synthesize(1500.0, None, Goal::Maintain, 150.0, 150.0).unwrap();
        assert!((ok.daily_target_kcal - 1500.0).abs() < 0.001);
    }

    #[test]
    fn floor_failure_reports_target_and_floor() {
        match synthesize(1800.0, Some(1000.0), Goal::Lose, 160.0, 150.0) {
            Err(EngineError::UnsafeBudgetFloor {
                target_kcal,
                floor_kcal,
            }) => {
                // (1800+1000)/2 - 375 = 1025
                assert!((target_kcal - 1025.0).abs() < 0.001);
                assert_eq!(floor_kcal, SAFETY_FLOOR_KCAL);
            }
            other => panic!("expected UnsafeBudgetFloor, got {other:?}"),
        }
    }

    #[test]
    fn macros_split_weekly_calories() {
        // 2000/day -> 14000/week: 1050 g protein, 1400 g carbs, 467 g fat.
        let m = macro_targets(14000.0);
        assert_eq!(
            m,
            MacroTargets {
                protein_g: 1050,
                carbs_g: 1400,
                fat_g: 467,
            }
        );
    }

    #[test]
    fn synthesis_is_deterministic() {
        let a = synthesize(2400.0, Some(2100.0), Goal::Lose, 200.0, 170.0).unwrap();
        let b = synthesize(2400.0, Some(2100.0), Goal::Lose, 200.0, 170.0).unwrap();
        assert_eq!(a.daily_target_kcal, b.daily_target_kcal);
        assert_eq!(a.macros, b.macros);
    }
}
