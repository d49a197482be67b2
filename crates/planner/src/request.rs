use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use kondate_shared::{
    Allergen, BatchCookingLevel, HouseholdType, MealSettings, MealType, Nutrient, NutrientTarget,
    SchedulingMode, VarietyLevel, VolumeLevel,
};
use strum::IntoEnumIterator;

use crate::error::PlanningError;

pub const MAX_DAYS: u32 = 7;
pub const MAX_PEOPLE: u32 = 6;

/// Everything the planner needs for one optimization run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanRequest {
    pub days: u32,
    pub people: u32,
    pub target: NutrientTarget,
    pub excluded_dish_ids: HashSet<u32>,
    pub excluded_ingredient_ids: HashSet<u32>,
    pub keep_dish_ids: HashSet<u32>,
    pub preferred_ingredient_ids: HashSet<u32>,
    pub preferred_dish_ids: HashSet<u32>,
    pub excluded_allergens: Vec<Allergen>,
    pub batch_cooking_level: BatchCookingLevel,
    pub volume_level: VolumeLevel,
    pub variety_level: VarietyLevel,
    pub meal_settings: MealSettings,
    /// Subset of nutrients the optimizer constrains. `None` means all 24.
    pub enabled_nutrients: Option<HashSet<Nutrient>>,
    pub scheduling_mode: SchedulingMode,
    pub household_type: HouseholdType,
    /// Seed for the staged scheduler; tests pin this for reproducibility.
    pub scheduler_seed: Option<u64>,
}

impl Default for PlanRequest {
    fn default() -> Self {
        PlanRequest {
            days: 1,
            people: 1,
            target: NutrientTarget::default(),
            excluded_dish_ids: HashSet::new(),
            excluded_ingredient_ids: HashSet::new(),
            keep_dish_ids: HashSet::new(),
            preferred_ingredient_ids: HashSet::new(),
            preferred_dish_ids: HashSet::new(),
            excluded_allergens: Vec::new(),
            batch_cooking_level: BatchCookingLevel::default(),
            volume_level: VolumeLevel::default(),
            variety_level: VarietyLevel::default(),
            meal_settings: MealSettings::default(),
            enabled_nutrients: None,
            scheduling_mode: SchedulingMode::default(),
            household_type: HouseholdType::default(),
            scheduler_seed: None,
        }
    }
}

impl PlanRequest {
    pub fn validate(&self) -> Result<(), PlanningError> {
        if self.days == 0 || self.days > MAX_DAYS {
            return Err(PlanningError::InvalidRequest(format!(
                "days must be between 1 and {MAX_DAYS}, got {}",
                self.days
            )));
        }
        if self.people == 0 || self.people > MAX_PEOPLE {
            return Err(PlanningError::InvalidRequest(format!(
                "people must be between 1 and {MAX_PEOPLE}, got {}",
                self.people
            )));
        }
        if self.meal_settings.enabled_meals().is_empty() {
            return Err(PlanningError::InvalidRequest(
                "at least one meal must be enabled".to_string(),
            ));
        }
        Ok(())
    }

    /// The nutrients the optimizer actually constrains. The range group and
    /// sodium are always kept so a degenerate subset cannot produce an
    /// unbounded menu; an empty subset falls back to the full set.
    pub fn active_nutrients(&self) -> Vec<Nutrient> {
        match &self.enabled_nutrients {
            None => Nutrient::iter().collect(),
            Some(set) if set.is_empty() => Nutrient::iter().collect(),
            Some(set) => Nutrient::iter()
                .filter(|n| {
                    set.contains(n)
                        || matches!(
                            n,
                            Nutrient::Calories
                                | Nutrient::Fat
                                | Nutrient::Carbohydrate
                                | Nutrient::Sodium
                        )
                })
                .collect(),
        }
    }

    /// Daily target adjusted for the requested volume level.
    pub fn adjusted_target(&self) -> NutrientTarget {
        self.target.scaled_for_volume(self.volume_level)
    }

    pub fn enabled_meals(&self) -> Vec<MealType> {
        self.meal_settings.enabled_meals()
    }
}

/// Resolved, validated inputs handed to the individual strategies: the
/// filtered candidate set, the volume-adjusted target and the enabled meals.
#[derive(Debug, Clone)]
pub(crate) struct PlanContext {
    pub dishes: Vec<kondate_catalog::Dish>,
    pub days: u32,
    pub people: u32,
    pub target: NutrientTarget,
    pub meals: Vec<MealType>,
    pub settings: MealSettings,
    pub batch_cooking_level: BatchCookingLevel,
    pub variety_level: VarietyLevel,
    pub household_type: HouseholdType,
    pub keep_dish_ids: HashSet<u32>,
    pub preferred_dish_ids: HashSet<u32>,
    pub preferred_ingredient_ids: HashSet<u32>,
    pub nutrients: Vec<Nutrient>,
    pub solver: crate::solver::SolverConfig,
}
