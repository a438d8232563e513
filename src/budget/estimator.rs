//! Formula-based energy expenditure from a physical profile
//! (Mifflin-St Jeor basal rate times a fixed activity multiplier).

use serde::{Deserialize, Serialize};
use time::Date;

use crate::dates::age_on;
use crate::error::EngineError;

pub const KG_PER_LB: f64 = 0.45359237;
pub const CM_PER_IN: f64 = 2.54;

const MALE_OFFSET: f64 = 5.0;
const FEMALE_OFFSET: f64 = -161.0;

/// Sex category recorded at calculation time.
///
/// `Unspecified` maps to the female offset (-161) as the conservative
/// default; callers relying on the basal rate should surface that mapping.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum SexCategory {
    Male,
    Female,
    Unspecified,
}

impl SexCategory {
    fn offset(self) -> f64 {
        match self {
            SexCategory::Male => MALE_OFFSET,
            SexCategory::Female | SexCategory::Unspecified => FEMALE_OFFSET,
        }
    }
}

/// Self-declared activity level, five tiers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum DeclaredActivity {
    Sedentary,
    LightlyActive,
    ModeratelyActive,
    VeryActive,
    ExtraActive,
}

impl DeclaredActivity {
    pub fn multiplier(self) -> f64 {
        match self {
            DeclaredActivity::Sedentary => 1.20,
            DeclaredActivity::LightlyActive => 1.375,
            DeclaredActivity::ModeratelyActive => 1.55,
            DeclaredActivity::VeryActive => 1.725,
            DeclaredActivity::ExtraActive => 1.90,
        }
    }
}

/// Activity tier measured from a baseline week's cumulative exercise burn.
/// Four tiers only; the top declared multiplier (1.90) is never assigned
/// from measurement.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ActivityTier {
    Sedentary,
    LightlyActive,
    ModeratelyActive,
    VeryActive,
}

impl ActivityTier {
    pub fn multiplier(self) -> f64 {
        match self {
            ActivityTier::Sedentary => 1.20,
            ActivityTier::LightlyActive => 1.375,
            ActivityTier::ModeratelyActive => 1.55,
            ActivityTier::VeryActive => 1.725,
        }
    }
}

/// Weight-change goal declared on the profile.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Goal {
    Lose,
    Maintain,
    Gain,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FormulaEstimate {
    pub basal_kcal: f64,
    pub multiplier: f64,
    pub maintenance_kcal: f64,
}

/// Mifflin-St Jeor basal rate: `10*kg + 6.25*cm - 5*age + offset`.
///
/// Profile measurements are stored imperial; conversion happens here and
/// nowhere else.
pub fn basal_rate(
    sex: SexCategory,
    weight_lb: f64,
    height_in: f64,
    birth_date: Date,
    on: Date,
) -> Result<f64, EngineError> {
    if weight_lb <= 0.0 {
        return Err(EngineError::InvalidProfileInput(
            "weight must be positive".into(),
        ));
    }
    if height_in <= 0.0 {
        return Err(EngineError::InvalidProfileInput(
            "height must be positive".into(),
        ));
    }
    let age = age_on(birth_date, on);
    if age < 0 {
        return Err(EngineError::InvalidProfileInput(
            "birth date is in the future".into(),
        ));
    }
    let weight_kg = weight_lb * KG_PER_LB;
    let height_cm = height_in * CM_PER_IN;
    Ok(10.0 * weight_kg + 6.25 * height_cm - 5.0 * age as f64 + sex.offset())
}

/// Basal rate scaled by an activity multiplier, yielding total expenditure.
pub fn formula_expenditure(
    sex: SexCategory,
    weight_lb: f64,
    height_in: f64,
    birth_date: Date,
    on: Date,
    multiplier: f64,
) -> Result<FormulaEstimate, EngineError> {
    let basal_kcal = basal_rate(sex, weight_lb, height_in, birth_date, on)?;
    Ok(FormulaEstimate {
        basal_kcal,
        multiplier,
        maintenance_kcal: basal_kcal * multiplier,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::date;

    fn lb(kg: f64) -> f64 {
        kg / KG_PER_LB
    }

    fn inches(cm: f64) -> f64 {
        cm / CM_PER_IN
    }

    #[test]
    fn male_basal_rate_matches_mifflin() {
        // 80 kg, 180 cm, age 30: 800 + 1125 - 150 + 5 = 1780
        let basal = basal_rate(
            SexCategory::Male,
            lb(80.0),
            inches(180.0),
            date!(1994 - 01 - 15),
            date!(2024 - 06 - 10),
        )
        .unwrap();
        assert!((basal - 1780.0).abs() < 0.01);
    }

    #[test]
    fn female_basal_rate_matches_mifflin() {
        // 60 kg, 165 cm, age 25: 600 + 1031.25 - 125 - 161 = 1345.25
        let basal = basal_rate(
            SexCategory::Female,
            lb(60.0),
            inches(165.0),
            date!(1999 - 03 - 01),
            date!(2024 - 06 - 10),
        )
        .unwrap();
        assert!((basal - 1345.25).abs() < 0.01);
    }

    #[test]
    fn unspecified_sex_uses_female_offset() {
        let args = (lb(60.0), inches(165.0), date!(1999 - 03 - 01), date!(2024 - 06 - 10));
        let female = basal_rate(SexCategory::Female, args.0, args.1, args.2, args.3).unwrap();
        let unspecified =
            basal_rate(SexCategory::Unspecified, args.0, args.1, args.2, args.3).unwrap();
        assert_eq!(female, unspecified);
    }

    #[test]
    fn age_decrements_before_birthday_in_basal_rate() {
        // Same person, one day before vs on the birthday: 5 kcal difference.
        let before = basal_rate(
            SexCategory::Male,
            lb(80.0),
            inches(180.0),
            date!(1994 - 06 - 11),
            date!(2024 - 06 - 10),
        )
        .unwrap();
        let on = basal_rate(
            SexCategory::Male,
            lb(80.0),
            inches(180.0),
            date!(1994 - 06 - 10),
            date!(2024 - 06 - 10),
        )
        .unwrap();
        assert!((before - on - 5.0).abs() < 0.01);
    }

    #[test]
    fn rejects_nonpositive_measurements() {
        let birth = date!(1994 - 01 - 15);
        let on = date!(2024 - 06 - 10);
        assert!(matches!(
            basal_rate(SexCategory::Male, 0.0, 70.0, birth, on),
            Err(EngineError::InvalidProfileInput(_))
        ));
        assert!(matches!(
            basal_rate(SexCategory::Male, 170.0, -1.0, birth, on),
            Err(EngineError::InvalidProfileInput(_))
        ));
    }

    #[test]
    fn multipliers_are_the_five_fixed_values() {
        let got: Vec<f64> = [
            DeclaredActivity::Sedentary,
            DeclaredActivity::LightlyActive,
            DeclaredActivity::ModeratelyActive,
            DeclaredActivity::VeryActive,
            DeclaredActivity::ExtraActive,
        ]
        .iter()
        .map(|a| a.multiplier())
        .collect();
        assert_eq!(got, vec![1.20, 1.375, 1.55, 1.725, 1.90]);
    }

    #[test]
    fn expenditure_scales_basal_by_multiplier() {
        let est = formula_expenditure(
            SexCategory::Male,
            lb(80.0),
            inches(180.0),
            date!(1994 - 01 - 15),
            date!(2024 - 06 - 10),
            DeclaredActivity::LightlyActive.multiplier(),
        )
        .unwrap();
        assert!((est.maintenance_kcal - 1780.0 * 1.375).abs() < 0.01);
    }
}
