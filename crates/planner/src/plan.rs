use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use kondate_catalog::Dish;
use kondate_shared::{MealType, Nutrient, NutrientVector};

use crate::shopping::ShoppingItem;

/// A dish together with the number of portions served or cooked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DishPortion {
    pub dish: Dish,
    pub servings: f64,
}

impl DishPortion {
    pub fn nutrient_total(&self, nutrient: Nutrient) -> f64 {
        self.dish.nutrient(nutrient) * self.servings
    }
}

/// One day of the plan: the portions served per meal plus per-person totals
/// and achievement rates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyPlan {
    pub day: u32,
    pub breakfast: Vec<DishPortion>,
    pub lunch: Vec<DishPortion>,
    pub dinner: Vec<DishPortion>,
    /// Per-person nutrient totals for the day.
    pub total_nutrients: NutrientVector,
    /// Per-nutrient achievement in percent.
    pub achievement_rate: BTreeMap<Nutrient, f64>,
}

impl DailyPlan {
    pub fn meal(&self, meal: MealType) -> &[DishPortion] {
        match meal {
            MealType::Breakfast => &self.breakfast,
            MealType::Lunch => &self.lunch,
            MealType::Dinner => &self.dinner,
        }
    }

    pub fn dish_count(&self) -> usize {
        self.breakfast.len() + self.lunch.len() + self.dinner.len()
    }
}

/// A single cooking action: cook `servings` portions of `dish` on
/// `cook_day`, consume them on `consume_days` (all within the shelf-life
/// window).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CookingTask {
    pub cook_day: u32,
    pub dish: Dish,
    pub servings: u32,
    pub consume_days: Vec<u32>,
}

/// Warning attached to a plan when an important nutrient lands below its
/// threshold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientWarning {
    pub nutrient: Nutrient,
    pub message: String,
    pub current_value: f64,
    pub target_value: f64,
    pub deficit_percent: f64,
}

/// The planner's result. Ephemeral: nothing here is persisted by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiDayMenuPlan {
    pub plan_id: String,
    pub days: u32,
    pub people: u32,
    pub daily_plans: Vec<DailyPlan>,
    pub cooking_tasks: Vec<CookingTask>,
    pub shopping_list: Vec<ShoppingItem>,
    /// Cumulative per-person nutrients across all days (not averaged).
    pub overall_nutrients: NutrientVector,
    /// Achievement of the per-day average against the per-day target.
    pub overall_achievement: BTreeMap<Nutrient, f64>,
    pub warnings: Vec<NutrientWarning>,
    pub created_at: DateTime<Utc>,
}

impl MultiDayMenuPlan {
    /// Smallest achievement rate across the constrained nutrients; the
    /// staged scheduler retries below 85%.
    pub fn min_achievement(&self) -> Option<(Nutrient, f64)> {
        self.overall_achievement
            .iter()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(n, v)| (*n, *v))
    }

    /// All dish ids appearing anywhere in the daily plans.
    pub fn dish_ids(&self) -> Vec<u32> {
        let mut ids: Vec<u32> = self
            .daily_plans
            .iter()
            .flat_map(|d| {
                d.breakfast
                    .iter()
                    .chain(d.lunch.iter())
                    .chain(d.dinner.iter())
                    .map(|p| p.dish.id)
            })
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}
