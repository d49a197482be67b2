//! Turns raw per-day dish portions and cooking tasks into a finished
//! [`MultiDayMenuPlan`]: per-day totals and achievement, overall aggregates,
//! warnings, shopping list and a fresh plan id.

use std::collections::{BTreeMap, HashSet};

use kondate_catalog::Dish;
use kondate_shared::{MealType, NutrientTarget, NutrientVector};

use crate::calculator::{NutrientCalculator, WARNING_THRESHOLD};
use crate::plan::{CookingTask, DailyPlan, DishPortion, MultiDayMenuPlan};
use crate::shopping;

pub(crate) struct AssembleInput<'a> {
    pub days: u32,
    pub people: u32,
    pub target: &'a NutrientTarget,
    /// Index 0 = day 1; per day, the portions served at each meal.
    pub day_meals: Vec<BTreeMap<MealType, Vec<DishPortion>>>,
    pub cooking_tasks: Vec<CookingTask>,
    pub preferred_ingredient_ids: &'a HashSet<u32>,
}

pub(crate) fn assemble(input: AssembleInput) -> MultiDayMenuPlan {
    let people = input.people.max(1) as f64;
    let mut daily_plans = Vec::with_capacity(input.days as usize);
    let mut overall_nutrients = NutrientVector::zero();

    for (index, meals) in input.day_meals.iter().enumerate() {
        let day = index as u32 + 1;
        let empty = Vec::new();
        let breakfast = meals.get(&MealType::Breakfast).unwrap_or(&empty).clone();
        let lunch = meals.get(&MealType::Lunch).unwrap_or(&empty).clone();
        let dinner = meals.get(&MealType::Dinner).unwrap_or(&empty).clone();

        let mut day_total = NutrientVector::zero();
        for portion in breakfast.iter().chain(lunch.iter()).chain(dinner.iter()) {
            day_total.add_scaled(&portion.dish.nutrients, portion.servings);
        }
        let per_person = day_total.scaled(1.0 / people);
        let achievement = NutrientCalculator::achievement_rate(&per_person, input.target);
        overall_nutrients.add_scaled(&per_person, 1.0);

        daily_plans.push(DailyPlan {
            day,
            breakfast,
            lunch,
            dinner,
            total_nutrients: per_person,
            achievement_rate: achievement,
        });
    }

    let avg_nutrients = overall_nutrients.scaled(1.0 / input.days.max(1) as f64);
    let overall_achievement = NutrientCalculator::achievement_rate(&avg_nutrients, input.target);
    let warnings = NutrientCalculator::warnings(&avg_nutrients, input.target, WARNING_THRESHOLD);
    let shopping_list =
        shopping::generate_shopping_list(&input.cooking_tasks, input.preferred_ingredient_ids);

    MultiDayMenuPlan {
        plan_id: uuid::Uuid::new_v4().to_string(),
        days: input.days,
        people: input.people,
        daily_plans,
        cooking_tasks: input.cooking_tasks,
        shopping_list,
        overall_nutrients,
        overall_achievement,
        warnings,
        created_at: chrono::Utc::now(),
    }
}

/// Split a dish's usage days into cooking tasks that respect the shelf-life
/// window: a new batch starts whenever the next usage day falls outside
/// `cook_day + storage_days`.
///
/// `usage` maps each usage day to the number of portions served that day
/// (across all meals of the day).
pub(crate) fn batch_cooking_tasks(dish: &Dish, usage: &BTreeMap<u32, u32>) -> Vec<CookingTask> {
    let mut tasks: Vec<CookingTask> = Vec::new();
    let mut batch_days: Vec<u32> = Vec::new();
    let mut batch_servings: u32 = 0;

    for (&day, &portions) in usage {
        let fits = batch_days
            .first()
            .is_some_and(|&start| day <= start + dish.storage_days);
        if !fits && !batch_days.is_empty() {
            tasks.push(CookingTask {
                cook_day: batch_days[0],
                dish: dish.clone(),
                servings: batch_servings.max(1),
                consume_days: std::mem::take(&mut batch_days),
            });
            batch_servings = 0;
        }
        batch_days.push(day);
        batch_servings += portions;
    }

    if !batch_days.is_empty() {
        tasks.push(CookingTask {
            cook_day: batch_days[0],
            dish: dish.clone(),
            servings: batch_servings.max(1),
            consume_days: batch_days,
        });
    }

    tasks
}
