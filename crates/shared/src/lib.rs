pub mod meal_template;
pub mod nutrient;
pub mod types;

pub use meal_template::{CategoryRange, MealPreset, MealSetting, MealSettings, MealTemplate};
pub use nutrient::{
    Nutrient, NutrientGroup, NutrientTarget, NutrientVector, OVER_PENALTY, SATURATION_THRESHOLD,
    UNDER_PENALTY, UPPER_LIMIT_PENALTY,
};
pub use types::{
    Allergen, BatchCookingLevel, CookingMethod, DishCategory, FlavorProfile, HouseholdType,
    MealType, SchedulingMode, VarietyLevel, VolumeLevel,
};
