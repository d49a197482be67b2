use std::collections::BTreeMap;

use strum::IntoEnumIterator;

use kondate_shared::{Nutrient, NutrientTarget, NutrientVector};

use crate::plan::{DishPortion, NutrientWarning};

/// Default achievement threshold below which a warning is raised.
pub const WARNING_THRESHOLD: f64 = 80.0;

/// Nutrients important enough to warn about when under-achieved.
const IMPORTANT_NUTRIENTS: [Nutrient; 8] = [
    Nutrient::Protein,
    Nutrient::Fiber,
    Nutrient::Calcium,
    Nutrient::Iron,
    Nutrient::VitaminD,
    Nutrient::VitaminB12,
    Nutrient::Folate,
    Nutrient::VitaminC,
];

/// Nutrient arithmetic over dish portions: totals, achievement rates and
/// deficiency warnings.
pub struct NutrientCalculator;

impl NutrientCalculator {
    /// Sum of per-serving nutrients over the given portions.
    pub fn meal_totals(portions: &[DishPortion]) -> NutrientVector {
        let mut totals = NutrientVector::zero();
        for portion in portions {
            totals.add_scaled(&portion.dish.nutrients, portion.servings);
        }
        totals
    }

    /// Achievement rate per nutrient, in percent.
    ///
    /// Sodium is an upper target: the rate is `max / max(intake, 1) * 100`
    /// capped at 100, so overshooting drags the rate down. Everything else
    /// is `intake / min * 100`, uncapped.
    pub fn achievement_rate(
        nutrients: &NutrientVector,
        target: &NutrientTarget,
    ) -> BTreeMap<Nutrient, f64> {
        let mut achievement = BTreeMap::new();
        for n in Nutrient::iter() {
            let value = nutrients.get(n);
            let rate = match n {
                Nutrient::Sodium => {
                    if value > 0.0 {
                        (target.sodium_max / value.max(1.0) * 100.0).min(100.0)
                    } else {
                        100.0
                    }
                }
                _ => {
                    let target_val = target.min_for(n).unwrap_or(0.0);
                    if target_val > 0.0 {
                        value / target_val * 100.0
                    } else {
                        100.0
                    }
                }
            };
            achievement.insert(n, rate);
        }
        achievement
    }

    /// Warnings for important nutrients whose achievement falls below
    /// `threshold` percent.
    pub fn warnings(
        nutrients: &NutrientVector,
        target: &NutrientTarget,
        threshold: f64,
    ) -> Vec<NutrientWarning> {
        let achievement = Self::achievement_rate(nutrients, target);
        let mut warnings = Vec::new();
        for n in IMPORTANT_NUTRIENTS {
            let rate = achievement.get(&n).copied().unwrap_or(100.0);
            if rate < threshold {
                let target_val = target.reference_for(n);
                let current = nutrients.get(n);
                warnings.push(NutrientWarning {
                    nutrient: n,
                    message: format!("{}が目標の{:.0}%です", n.display_name_ja(), rate),
                    current_value: (current * 10.0).round() / 10.0,
                    target_value: (target_val * 10.0).round() / 10.0,
                    deficit_percent: ((100.0 - rate) * 10.0).round() / 10.0,
                });
            }
        }
        warnings
    }
}
