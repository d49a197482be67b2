use kondate_shared::{Allergen, DishCategory, MealType};

use crate::dish::{CatalogError, Dish};

/// Read-only access to the dish master data. The planner only ever consumes
/// this interface; persistence lives with the host application.
pub trait DishRepository: Send + Sync {
    fn find_all(
        &self,
        category: Option<DishCategory>,
        meal_type: Option<MealType>,
        skip: usize,
        limit: usize,
    ) -> Vec<Dish>;

    fn find_by_ids(&self, ids: &[u32]) -> Vec<Dish>;

    /// Dishes that carry none of the given allergens.
    fn find_excluding_allergens(&self, allergens: &[Allergen]) -> Vec<Dish>;
}

/// In-memory repository backed by a validated dish list. Used by the CLI
/// (JSON catalog) and the test suites.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDishRepository {
    dishes: Vec<Dish>,
}

impl InMemoryDishRepository {
    pub fn new(dishes: Vec<Dish>) -> Result<Self, CatalogError> {
        for dish in &dishes {
            dish.validate()?;
        }
        tracing::debug!(count = dishes.len(), "loaded dish catalog");
        Ok(InMemoryDishRepository { dishes })
    }

    pub fn len(&self) -> usize {
        self.dishes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dishes.is_empty()
    }
}

impl DishRepository for InMemoryDishRepository {
    fn find_all(
        &self,
        category: Option<DishCategory>,
        meal_type: Option<MealType>,
        skip: usize,
        limit: usize,
    ) -> Vec<Dish> {
        self.dishes
            .iter()
            .filter(|d| category.is_none_or(|c| d.category == c))
            .filter(|d| meal_type.is_none_or(|m| d.eligible_for(m)))
            .skip(skip)
            .take(limit)
            .cloned()
            .collect()
    }

    fn find_by_ids(&self, ids: &[u32]) -> Vec<Dish> {
        self.dishes
            .iter()
            .filter(|d| ids.contains(&d.id))
            .cloned()
            .collect()
    }

    fn find_excluding_allergens(&self, allergens: &[Allergen]) -> Vec<Dish> {
        let filtered: Vec<Dish> = self
            .dishes
            .iter()
            .filter(|d| {
                !allergens
                    .iter()
                    .any(|a| d.contains_allergen_label(a.label()))
            })
            .cloned()
            .collect();
        tracing::debug!(
            before = self.dishes.len(),
            after = filtered.len(),
            "allergen filter applied"
        );
        filtered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dish::DishIngredient;
    use kondate_shared::CookingMethod;

    fn dish(id: u32, name: &str, category: DishCategory, ingredient: &str) -> Dish {
        Dish {
            id,
            name: name.to_string(),
            category,
            meal_types: vec![MealType::Lunch, MealType::Dinner],
            serving_size: 1.0,
            storage_days: 0,
            min_servings: 1,
            max_servings: 2,
            flavor_profile: Default::default(),
            nutrients: Default::default(),
            ingredients: vec![DishIngredient {
                food_id: id * 100,
                food_name: Some(ingredient.to_string()),
                ingredient_id: Some(id),
                ingredient_name: Some(ingredient.to_string()),
                amount: 100.0,
                display_amount: String::new(),
                unit: "g".to_string(),
                cooking_method: CookingMethod::Raw,
            }],
        }
    }

    fn repo() -> InMemoryDishRepository {
        InMemoryDishRepository::new(vec![
            dish(1, "白ご飯", DishCategory::Staple, "白米"),
            dish(2, "オムレツ", DishCategory::Main, "卵"),
            dish(3, "焼き鮭", DishCategory::Main, "鮭"),
            dish(4, "ほうれん草のおひたし", DishCategory::Side, "ほうれん草"),
        ])
        .unwrap()
    }

    #[test]
    fn test_find_all_with_category() {
        let mains = repo().find_all(Some(DishCategory::Main), None, 0, 100);
        assert_eq!(mains.len(), 2);
    }

    #[test]
    fn test_find_all_pagination() {
        let page = repo().find_all(None, None, 1, 2);
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].id, 2);
    }

    #[test]
    fn test_find_by_ids() {
        let found = repo().find_by_ids(&[1, 4, 99]);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_find_excluding_allergens_drops_egg_dishes() {
        let dishes = repo().find_excluding_allergens(&[Allergen::Egg]);
        assert!(dishes.iter().all(|d| d.id != 2));
        assert_eq!(dishes.len(), 3);
    }

    #[test]
    fn test_invalid_dish_rejected_on_load() {
        let mut bad = dish(5, "bad", DishCategory::Side, "x");
        bad.meal_types.clear();
        assert!(InMemoryDishRepository::new(vec![bad]).is_err());
    }
}
