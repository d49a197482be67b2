//! Last-resort planner: one small MIP per enabled meal, day by day, with no
//! cross-day batching. Used when the classic and staged strategies both
//! fail. Used dish ids are pushed forward to keep some variety; a meal that
//! cannot be filled is retried without that exclusion.

use std::collections::{BTreeMap, HashMap, HashSet};

use good_lp::{Constraint, Expression, Solution, Variable, constraint, variable, variables};

use kondate_catalog::Dish;
use kondate_shared::{
    MealType, Nutrient, NutrientGroup, NutrientTarget, OVER_PENALTY, SATURATION_THRESHOLD,
    UNDER_PENALTY,
};

use crate::assembler::{self, AssembleInput};
use crate::plan::{CookingTask, DishPortion, MultiDayMenuPlan};
use crate::request::PlanContext;
use crate::solver::{self, sum_vars};

/// Per-meal target for one nutrient: the daily target scaled by the meal's
/// calorie ratio, with saturation applied on the lower-bound side.
fn meal_target(nutrient: Nutrient, target: &NutrientTarget, ratio: f64) -> Option<f64> {
    match nutrient.group() {
        NutrientGroup::UpperTarget => target.max_for(nutrient).map(|max| max * ratio),
        NutrientGroup::Range => {
            let min = target.min_for(nutrient)?;
            let max = target.max_for(nutrient)?;
            Some((min + max) / 2.0 * ratio * SATURATION_THRESHOLD)
        }
        NutrientGroup::LowerBound => target
            .min_for(nutrient)
            .map(|min| min * ratio * SATURATION_THRESHOLD),
    }
}

/// Plan every day independently. `None` only when some day ends up with no
/// dishes at all.
pub(crate) fn solve_greedy(ctx: &PlanContext) -> Option<MultiDayMenuPlan> {
    let mut day_meals: Vec<BTreeMap<MealType, Vec<DishPortion>>> = Vec::new();
    let mut cooking_tasks: Vec<CookingTask> = Vec::new();
    let mut used_dish_ids: HashSet<u32> = HashSet::new();

    for day in 1..=ctx.days {
        let mut meals_map: BTreeMap<MealType, Vec<DishPortion>> = BTreeMap::new();
        for &meal in &ctx.meals {
            let selected = optimize_meal(ctx, meal, &used_dish_ids)
                .or_else(|| optimize_meal(ctx, meal, &HashSet::new()));
            match selected {
                Some(dishes) => {
                    let mut portions = Vec::with_capacity(dishes.len());
                    for dish in dishes {
                        used_dish_ids.insert(dish.id);
                        cooking_tasks.push(CookingTask {
                            cook_day: day,
                            dish: dish.clone(),
                            servings: ctx.people,
                            consume_days: vec![day],
                        });
                        portions.push(DishPortion {
                            dish,
                            servings: ctx.people as f64,
                        });
                    }
                    meals_map.insert(meal, portions);
                }
                None => {
                    tracing::warn!(day, meal = %meal, "greedy fallback left a meal empty");
                    meals_map.insert(meal, Vec::new());
                }
            }
        }
        day_meals.push(meals_map);
    }

    if day_meals
        .iter()
        .any(|meals| meals.values().all(|portions| portions.is_empty()))
    {
        tracing::warn!("greedy fallback produced an empty day, giving up");
        return None;
    }

    Some(assembler::assemble(AssembleInput {
        days: ctx.days,
        people: ctx.people,
        target: &ctx.target,
        day_meals,
        cooking_tasks,
        preferred_ingredient_ids: &ctx.preferred_ingredient_ids,
    }))
}

/// Optimize a single meal: binary selection per dish against meal-scaled
/// targets and the meal's category template. Every selected dish is served
/// to the whole household, so per-person intake equals per-serving values.
fn optimize_meal(ctx: &PlanContext, meal: MealType, used: &HashSet<u32>) -> Option<Vec<Dish>> {
    let available: Vec<&Dish> = ctx
        .dishes
        .iter()
        .filter(|d| d.eligible_for(meal) && !used.contains(&d.id))
        .collect();
    if available.is_empty() {
        return None;
    }

    let ratio = meal.calorie_ratio();
    let mut vars = variables!();
    let select: Vec<Variable> = available
        .iter()
        .map(|_| vars.add(variable().binary()))
        .collect();

    let mut dev_pos: HashMap<Nutrient, Variable> = HashMap::new();
    let mut dev_neg: HashMap<Nutrient, Variable> = HashMap::new();
    let mut targets: HashMap<Nutrient, f64> = HashMap::new();
    for &n in &ctx.nutrients {
        if let Some(value) = meal_target(n, &ctx.target, ratio) {
            targets.insert(n, value);
            dev_pos.insert(n, vars.add(variable().min(0.0)));
            dev_neg.insert(n, vars.add(variable().min(0.0)));
        }
    }

    let objective: Expression = targets
        .iter()
        .map(|(&n, &value)| {
            let scale = n.weight() / value.max(1.0);
            dev_pos[&n] * (OVER_PENALTY * scale) + dev_neg[&n] * (UNDER_PENALTY * scale)
        })
        .sum();

    let mut constraints: Vec<Constraint> = Vec::new();
    for (&n, &value) in &targets {
        let intake: Expression = available
            .iter()
            .zip(&select)
            .map(|(dish, &y)| y * dish.nutrient(n))
            .sum();
        if n == Nutrient::Sodium {
            constraints.push(constraint!(intake - dev_neg[&n] <= value));
        } else {
            constraints.push(constraint!(intake + dev_neg[&n] - dev_pos[&n] == value));
        }
    }

    // Hard calorie window with a tolerance band around the meal's share.
    let calorie_intake: Expression = available
        .iter()
        .zip(&select)
        .map(|(dish, &y)| y * dish.nutrient(Nutrient::Calories))
        .sum();
    constraints.push(constraint!(
        calorie_intake.clone() >= ctx.target.calories_min * ratio * 0.8
    ));
    constraints.push(constraint!(
        calorie_intake <= ctx.target.calories_max * ratio * 1.2
    ));

    let template = &ctx.settings.get(meal).template;
    for (category, range) in template.iter() {
        let members: Vec<Variable> = available
            .iter()
            .zip(&select)
            .filter(|(dish, _)| dish.category.counting_category() == category)
            .map(|(_, &y)| y)
            .collect();
        if !members.is_empty() {
            let count = sum_vars(members);
            constraints.push(constraint!(count.clone() >= range.min as f64));
            constraints.push(constraint!(count <= range.max as f64));
        }
    }

    let solution = match solver::minimize(vars, objective, constraints, &ctx.solver) {
        Ok(solution) => solution,
        Err(err) => {
            tracing::debug!(meal = %meal, error = %err, "per-meal solve failed");
            return None;
        }
    };

    let chosen: Vec<Dish> = available
        .iter()
        .zip(&select)
        .filter(|&(_, &y)| solution.value(y) > 0.5)
        .map(|(dish, _)| (*dish).clone())
        .collect();
    if chosen.is_empty() {
        None
    } else {
        Some(chosen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meal_targets_scale_and_saturate() {
        let target = NutrientTarget::default();
        let ratio = MealType::Lunch.calorie_ratio();

        // Range group: midpoint x ratio x saturation.
        let calories = meal_target(Nutrient::Calories, &target, ratio).unwrap();
        assert!((calories - 2000.0 * ratio * SATURATION_THRESHOLD).abs() < 1e-9);

        // Lower bound: min x ratio x saturation.
        let protein = meal_target(Nutrient::Protein, &target, ratio).unwrap();
        assert!((protein - 58.0 * ratio * SATURATION_THRESHOLD).abs() < 1e-9);

        // Upper target: max x ratio, no saturation.
        let sodium = meal_target(Nutrient::Sodium, &target, ratio).unwrap();
        assert!((sodium - 2500.0 * ratio).abs() < 1e-9);
    }
}
