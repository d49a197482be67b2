use serde::{Deserialize, Serialize};
use thiserror::Error;

use kondate_shared::{
    CookingMethod, DishCategory, FlavorProfile, MealType, Nutrient, NutrientVector,
};

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("invalid dish {id} ({name}): {reason}")]
    InvalidDish {
        id: u32,
        name: String,
        reason: String,
    },
}

/// One ingredient line inside a dish: the food-table entry, the grams used to
/// compute the per-serving nutrients, and an optional link to the normalized
/// basic ingredient used for shopping aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DishIngredient {
    pub food_id: u32,
    #[serde(default)]
    pub food_name: Option<String>,
    #[serde(default)]
    pub ingredient_id: Option<u32>,
    #[serde(default)]
    pub ingredient_name: Option<String>,
    /// Grams per serving.
    pub amount: f64,
    #[serde(default)]
    pub display_amount: String,
    #[serde(default = "default_unit")]
    pub unit: String,
    #[serde(default)]
    pub cooking_method: CookingMethod,
}

fn default_unit() -> String {
    "g".to_string()
}

impl DishIngredient {
    /// Best available human name for this line.
    pub fn name(&self) -> Option<&str> {
        self.ingredient_name
            .as_deref()
            .or(self.food_name.as_deref())
    }
}

/// A dish as produced by the repository. Immutable once loaded; the planner
/// never mutates dishes, it only selects and portions them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dish {
    pub id: u32,
    pub name: String,
    pub category: DishCategory,
    pub meal_types: Vec<MealType>,
    #[serde(default = "default_serving_size")]
    pub serving_size: f64,
    /// Shelf life: 0 = same-day only, k = cook on day t, consume t..=t+k.
    #[serde(default = "default_storage_days")]
    pub storage_days: u32,
    #[serde(default = "default_min_servings")]
    pub min_servings: u32,
    #[serde(default = "default_max_servings")]
    pub max_servings: u32,
    #[serde(default)]
    pub flavor_profile: FlavorProfile,
    /// Per-serving nutrient vector over the 24-nutrient set.
    #[serde(default)]
    pub nutrients: NutrientVector,
    #[serde(default)]
    pub ingredients: Vec<DishIngredient>,
}

fn default_serving_size() -> f64 {
    1.0
}

fn default_storage_days() -> u32 {
    1
}

fn default_min_servings() -> u32 {
    1
}

fn default_max_servings() -> u32 {
    4
}

impl Dish {
    pub fn nutrient(&self, nutrient: Nutrient) -> f64 {
        self.nutrients.get(nutrient)
    }

    pub fn eligible_for(&self, meal: MealType) -> bool {
        self.meal_types.contains(&meal)
    }

    pub fn contains_ingredient(&self, ingredient_id: u32) -> bool {
        self.ingredients
            .iter()
            .any(|ing| ing.ingredient_id == Some(ingredient_id))
    }

    /// True if any ingredient (or the dish name itself) carries the given
    /// allergen label.
    pub fn contains_allergen_label(&self, label: &str) -> bool {
        self.name.contains(label)
            || self.ingredients.iter().any(|ing| {
                ing.name().is_some_and(|n| n.contains(label))
            })
    }

    pub fn validate(&self) -> Result<(), CatalogError> {
        let fail = |reason: String| CatalogError::InvalidDish {
            id: self.id,
            name: self.name.clone(),
            reason,
        };
        if self.meal_types.is_empty() {
            return Err(fail("meal_types must not be empty".into()));
        }
        if self.serving_size < 0.1 {
            return Err(fail(format!(
                "serving_size must be >= 0.1, got {}",
                self.serving_size
            )));
        }
        if self.min_servings < 1 {
            return Err(fail("min_servings must be >= 1".into()));
        }
        if self.max_servings < self.min_servings {
            return Err(fail(format!(
                "max_servings {} < min_servings {}",
                self.max_servings, self.min_servings
            )));
        }
        if self.nutrients.has_negative() {
            return Err(fail("nutrient values must be non-negative".into()));
        }
        if self.ingredients.iter().any(|ing| ing.amount < 0.0) {
            return Err(fail("ingredient amounts must be non-negative".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn sample_dish(id: u32, name: &str, category: DishCategory) -> Dish {
        let mut nutrients = NutrientVector::zero();
        nutrients.set(Nutrient::Calories, 300.0);
        nutrients.set(Nutrient::Protein, 12.0);
        Dish {
            id,
            name: name.to_string(),
            category,
            meal_types: vec![MealType::Breakfast, MealType::Lunch, MealType::Dinner],
            serving_size: 1.0,
            storage_days: 1,
            min_servings: 1,
            max_servings: 4,
            flavor_profile: FlavorProfile::Japanese,
            nutrients,
            ingredients: vec![DishIngredient {
                food_id: 1,
                food_name: Some("精白米".to_string()),
                ingredient_id: Some(10),
                ingredient_name: Some("白米".to_string()),
                amount: 150.0,
                display_amount: String::new(),
                unit: "g".to_string(),
                cooking_method: CookingMethod::Boil,
            }],
        }
    }

    #[test]
    fn test_valid_dish_passes() {
        assert!(sample_dish(1, "ご飯", DishCategory::Staple).validate().is_ok());
    }

    #[test]
    fn test_empty_meal_types_rejected() {
        let mut dish = sample_dish(2, "ご飯", DishCategory::Staple);
        dish.meal_types.clear();
        assert!(dish.validate().is_err());
    }

    #[test]
    fn test_serving_size_lower_bound() {
        let mut dish = sample_dish(3, "ご飯", DishCategory::Staple);
        dish.serving_size = 0.05;
        assert!(dish.validate().is_err());
    }

    #[test]
    fn test_servings_ordering() {
        let mut dish = sample_dish(4, "ご飯", DishCategory::Staple);
        dish.min_servings = 3;
        dish.max_servings = 2;
        assert!(dish.validate().is_err());
    }

    #[test]
    fn test_allergen_label_match_on_ingredient() {
        let mut dish = sample_dish(5, "オムレツ", DishCategory::Main);
        dish.ingredients[0].ingredient_name = Some("卵".to_string());
        assert!(dish.contains_allergen_label("卵"));
        assert!(!dish.contains_allergen_label("えび"));
    }

    #[test]
    fn test_dish_json_roundtrip() {
        let dish = sample_dish(6, "味噌汁", DishCategory::Soup);
        let json = serde_json::to_string(&dish).unwrap();
        let back: Dish = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dish);
        assert!(json.contains("汁物"));
    }
}
