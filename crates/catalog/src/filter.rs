use std::collections::HashSet;

use crate::dish::Dish;

/// Drop the explicitly excluded dishes.
pub fn exclude_dishes(dishes: Vec<Dish>, excluded_ids: &HashSet<u32>) -> Vec<Dish> {
    if excluded_ids.is_empty() {
        return dishes;
    }
    dishes
        .into_iter()
        .filter(|d| !excluded_ids.contains(&d.id))
        .collect()
}

/// Drop every dish containing any of the excluded (disliked) ingredients.
pub fn exclude_ingredients(dishes: Vec<Dish>, excluded_ingredient_ids: &HashSet<u32>) -> Vec<Dish> {
    if excluded_ingredient_ids.is_empty() {
        return dishes;
    }
    let before = dishes.len();
    let filtered: Vec<Dish> = dishes
        .into_iter()
        .filter(|d| {
            !d.ingredients
                .iter()
                .filter_map(|ing| ing.ingredient_id)
                .any(|id| excluded_ingredient_ids.contains(&id))
        })
        .collect();
    tracing::debug!(before, after = filtered.len(), "excluded-ingredient filter");
    filtered
}
