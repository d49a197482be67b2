//! Full multi-day MIP: batch cooking, shelf-life flow and the three-group
//! nutrient penalty model in a single problem.
//!
//! Variables follow the time-indexed formulation: `x[d,t]` cook dish d on
//! day t, `s[d,t]` how many servings, and for each day t' inside the
//! shelf-life window and each enabled meal m, `c[d,t,t',m]` / `q[d,t,t',m]`
//! whether and how many of those servings are eaten there.

use std::collections::{BTreeMap, HashMap, HashSet};

use good_lp::{Constraint, Expression, Solution, Variable, constraint, variable, variables};

use kondate_catalog::Dish;
use kondate_shared::{
    DishCategory, MealType, Nutrient, NutrientGroup, NutrientTarget, OVER_PENALTY,
    SATURATION_THRESHOLD, UNDER_PENALTY, UPPER_LIMIT_PENALTY,
};

use crate::assembler::{self, AssembleInput};
use crate::plan::{CookingTask, DishPortion, MultiDayMenuPlan};
use crate::progress::{OptimizePhase, Progress};
use crate::request::PlanContext;
use crate::solver::{self, sum_vars};

/// Dishes kept per category when the candidate set is large.
pub(crate) const PREFILTER_TOP_N: usize = 30;

type ConsumeKey = (usize, u32, u32, MealType);

struct ModelVars {
    cook: HashMap<(usize, u32), Variable>,
    servings: HashMap<(usize, u32), Variable>,
    consume: HashMap<ConsumeKey, Variable>,
    quantity: HashMap<ConsumeKey, Variable>,
    dev_pos: HashMap<(u32, Nutrient), Variable>,
    dev_neg: HashMap<(u32, Nutrient), Variable>,
}

/// Days on which a batch cooked on `cook_day` may still be eaten.
fn consume_window(dish: &Dish, cook_day: u32, days: u32) -> std::ops::RangeInclusive<u32> {
    cook_day..=days.min(cook_day + dish.storage_days)
}

/// Cook days whose batch may still be eaten on `day`.
fn source_window(dish: &Dish, day: u32) -> std::ops::RangeInclusive<u32> {
    day.saturating_sub(dish.storage_days).max(1)..=day
}

/// Weighted penalty expression for one (day, nutrient) deviation pair,
/// normalized by the target magnitude so units stay comparable.
pub(crate) fn deviation_penalty(
    nutrient: Nutrient,
    dev_pos: Variable,
    dev_neg: Variable,
    target: &NutrientTarget,
) -> Expression {
    let weight = nutrient.weight();
    let normalizer = target.min_for(nutrient).unwrap_or(1.0).max(1.0);
    match nutrient.group() {
        NutrientGroup::UpperTarget => {
            dev_pos * (weight * UNDER_PENALTY / normalizer)
                + dev_neg * (weight * OVER_PENALTY / normalizer)
        }
        NutrientGroup::Range => {
            dev_neg * (weight * UNDER_PENALTY / normalizer)
                + dev_pos * (weight * UNDER_PENALTY / normalizer)
        }
        NutrientGroup::LowerBound => {
            let over_penalty = if nutrient.upper_limit_ratio().is_some() {
                UPPER_LIMIT_PENALTY
            } else {
                OVER_PENALTY
            };
            dev_neg * (weight * UNDER_PENALTY / normalizer)
                + dev_pos * (weight * over_penalty / normalizer)
        }
    }
}

/// Nutrient-density score used by the pre-filter: per-calorie weighted
/// contribution toward each enabled target, sodium scored inversely.
pub(crate) fn dish_score(dish: &Dish, target: &NutrientTarget, nutrients: &[Nutrient]) -> f64 {
    let calories = dish.nutrient(Nutrient::Calories).max(1.0);
    let mut score = 0.0;
    for &n in nutrients {
        let value = dish.nutrient(n);
        match n {
            Nutrient::Calories => continue,
            Nutrient::Sodium => {
                if target.sodium_max > 0.0 && value < target.sodium_max {
                    score += n.weight() * (1.0 - value / target.sodium_max);
                }
            }
            _ => {
                if let Some(min) = target.min_for(n) {
                    if min > 0.0 {
                        score += (value / calories) * (100.0 / min) * n.weight();
                    }
                }
            }
        }
    }
    score
}

/// Keep the top-N dishes per category by density score. Preferred and kept
/// dishes always survive. Small catalogs pass through untouched.
pub(crate) fn prefilter_dishes(
    dishes: Vec<Dish>,
    target: &NutrientTarget,
    nutrients: &[Nutrient],
    must_keep: &HashSet<u32>,
    top_n: usize,
) -> Vec<Dish> {
    if dishes.len() <= top_n * 5 {
        return dishes;
    }
    let before = dishes.len();
    let mut by_category: BTreeMap<DishCategory, Vec<(Dish, f64)>> = BTreeMap::new();
    for dish in dishes {
        let score = dish_score(&dish, target, nutrients);
        by_category
            .entry(dish.category)
            .or_default()
            .push((dish, score));
    }

    let mut filtered = Vec::new();
    for (_, mut scored) in by_category {
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        let mut selected = 0usize;
        for (dish, _) in scored {
            if must_keep.contains(&dish.id) {
                filtered.push(dish);
            } else if selected < top_n {
                selected += 1;
                filtered.push(dish);
            }
        }
    }
    tracing::info!(before, after = filtered.len(), "dish pre-filtering");
    filtered
}

/// Solve the classic full MIP. `None` means infeasible or solver failure;
/// the orchestrator falls through to the per-day greedy planner.
pub(crate) fn solve_classic(ctx: &PlanContext, progress: Progress) -> Option<MultiDayMenuPlan> {
    let dishes = &ctx.dishes;
    let days = ctx.days;

    progress.report(OptimizePhase::BuildingModel);

    let mut vars = variables!();
    let mut model = ModelVars {
        cook: HashMap::new(),
        servings: HashMap::new(),
        consume: HashMap::new(),
        quantity: HashMap::new(),
        dev_pos: HashMap::new(),
        dev_neg: HashMap::new(),
    };

    for (di, dish) in dishes.iter().enumerate() {
        for t in 1..=days {
            model.cook.insert((di, t), vars.add(variable().binary()));
            model.servings.insert(
                (di, t),
                vars.add(
                    variable()
                        .integer()
                        .min(0.0)
                        .max(dish.max_servings as f64),
                ),
            );
            for t_prime in consume_window(dish, t, days) {
                for &meal in &ctx.meals {
                    if dish.eligible_for(meal) {
                        let key = (di, t, t_prime, meal);
                        model.consume.insert(key, vars.add(variable().binary()));
                        model.quantity.insert(
                            key,
                            vars.add(variable().integer().min(0.0).max(ctx.people as f64)),
                        );
                    }
                }
            }
        }
    }

    for day in 1..=days {
        for &n in &ctx.nutrients {
            model.dev_pos.insert((day, n), vars.add(variable().min(0.0)));
            model.dev_neg.insert((day, n), vars.add(variable().min(0.0)));
        }
    }

    let objective = build_objective(ctx, &model);

    progress.report(OptimizePhase::ApplyingConstraints);
    let constraints = build_constraints(ctx, &model);

    progress.report(OptimizePhase::Solving);
    let solution = match solver::minimize(vars, objective, constraints, &ctx.solver) {
        Ok(solution) => solution,
        Err(err) => {
            tracing::warn!(error = %err, "classic multi-day solve failed");
            return None;
        }
    };

    progress.report(OptimizePhase::Finalizing);
    Some(extract(ctx, &model, &solution))
}

fn build_objective(ctx: &PlanContext, model: &ModelVars) -> Expression {
    let mut terms: Vec<Expression> = Vec::new();

    for day in 1..=ctx.days {
        for &n in &ctx.nutrients {
            terms.push(deviation_penalty(
                n,
                model.dev_pos[&(day, n)],
                model.dev_neg[&(day, n)],
                &ctx.target,
            ));
        }
    }

    // Every cooking event costs a little; batch level scales how much.
    let cooking_weight = ctx.batch_cooking_level.cooking_weight();
    for cook_var in model.cook.values() {
        terms.push(*cook_var * cooking_weight);
    }

    let mut bonus_terms: Vec<Expression> = Vec::new();
    for (di, dish) in ctx.dishes.iter().enumerate() {
        let matching = dish
            .ingredients
            .iter()
            .filter(|ing| ctx.preferred_ingredient_ids.contains(&ing.food_id))
            .count();
        let mut bonus = 0.5 * matching as f64;
        if ctx.preferred_dish_ids.contains(&dish.id) {
            bonus += 0.3;
        }
        if bonus > 0.0 {
            for t in 1..=ctx.days {
                bonus_terms.push(model.cook[&(di, t)] * bonus);
            }
        }
    }

    let penalty: Expression = terms.into_iter().sum();
    let bonus: Expression = bonus_terms.into_iter().sum();
    penalty - bonus
}

fn build_constraints(ctx: &PlanContext, model: &ModelVars) -> Vec<Constraint> {
    let mut constraints = Vec::new();
    let dishes = &ctx.dishes;
    let days = ctx.days;
    let people = ctx.people as f64;

    // Servings are zero unless the dish is cooked, and at least one
    // serving when it is.
    for (di, dish) in dishes.iter().enumerate() {
        for t in 1..=days {
            let cook = model.cook[&(di, t)];
            let servings = model.servings[&(di, t)];
            constraints.push(constraint!(servings <= cook * (dish.max_servings as f64)));
            constraints.push(constraint!(servings >= cook));
        }
    }

    // Everything cooked is consumed before the shelf life runs out.
    for (di, dish) in dishes.iter().enumerate() {
        for t in 1..=days {
            let consumed: Vec<Variable> = consume_window(dish, t, days)
                .flat_map(|t_prime| {
                    ctx.meals
                        .iter()
                        .filter_map(move |&m| model.quantity.get(&(di, t, t_prime, m)).copied())
                })
                .collect();
            if !consumed.is_empty() {
                let servings = model.servings[&(di, t)];
                constraints.push(constraint!(sum_vars(consumed) == servings));
            }
        }
    }

    // Portion counts and the consume indicator stay linked.
    for (key, quantity) in &model.quantity {
        let consume = model.consume[key];
        constraints.push(constraint!(*quantity <= consume * people));
        constraints.push(constraint!(*quantity >= consume));
    }

    // Per-day nutrient constraints by group, per person.
    for day in 1..=days {
        for &n in &ctx.nutrients {
            let mut intake_terms: Vec<Expression> = Vec::new();
            for (di, dish) in dishes.iter().enumerate() {
                let per_person = dish.nutrient(n) / people;
                if per_person == 0.0 {
                    continue;
                }
                for t in source_window(dish, day) {
                    for &m in &ctx.meals {
                        if let Some(quantity) = model.quantity.get(&(di, t, day, m)) {
                            intake_terms.push(*quantity * per_person);
                        }
                    }
                }
            }
            if intake_terms.is_empty() {
                continue;
            }
            let intake: Expression = intake_terms.into_iter().sum();
            let dev_pos = model.dev_pos[&(day, n)];
            let dev_neg = model.dev_neg[&(day, n)];
            nutrient_constraints(n, intake, dev_pos, dev_neg, &ctx.target, &mut constraints);
        }
    }

    // Category counts per meal template.
    for day in 1..=days {
        for &m in &ctx.meals {
            let template = &ctx.settings.get(m).template;
            for (category, range) in template.iter() {
                let selected: Vec<Variable> = dishes
                    .iter()
                    .enumerate()
                    .filter(|(_, d)| {
                        d.category.counting_category() == category && d.eligible_for(m)
                    })
                    .flat_map(|(di, d)| {
                        source_window(d, day)
                            .filter_map(move |t| model.consume.get(&(di, t, day, m)).copied())
                    })
                    .collect();
                if !selected.is_empty() {
                    let count = sum_vars(selected);
                    constraints.push(constraint!(count.clone() >= range.min as f64));
                    constraints.push(constraint!(count <= range.max as f64));
                }
            }
        }
    }

    // Variety.
    match ctx.variety_level {
        kondate_shared::VarietyLevel::Small => {}
        kondate_shared::VarietyLevel::Normal => {
            for (di, dish) in dishes.iter().enumerate() {
                for &m in &ctx.meals {
                    for day in 1..days {
                        let today: Vec<Variable> = source_window(dish, day)
                            .filter_map(|t| model.consume.get(&(di, t, day, m)).copied())
                            .collect();
                        let tomorrow: Vec<Variable> = source_window(dish, day + 1)
                            .filter_map(|t| model.consume.get(&(di, t, day + 1, m)).copied())
                            .collect();
                        if !today.is_empty() && !tomorrow.is_empty() {
                            let pair = sum_vars(today) + sum_vars(tomorrow);
                            constraints.push(constraint!(pair <= 1.0));
                        }
                    }
                }
            }
        }
        kondate_shared::VarietyLevel::Large => {
            for (di, _) in dishes.iter().enumerate() {
                let all: Vec<Variable> = model
                    .consume
                    .iter()
                    .filter(|((d, _, _, _), _)| *d == di)
                    .map(|(_, v)| *v)
                    .collect();
                if !all.is_empty() {
                    constraints.push(constraint!(sum_vars(all) <= 1.0));
                }
            }
        }
    }

    // Kept dishes must be cooked at least once.
    for &dish_id in &ctx.keep_dish_ids {
        if let Some(di) = dishes.iter().position(|d| d.id == dish_id) {
            let cooked: Vec<Variable> = (1..=days).map(|t| model.cook[&(di, t)]).collect();
            constraints.push(constraint!(sum_vars(cooked) >= 1.0));
        }
    }

    constraints
}

/// Append the group-specific deviation constraints for one (day, nutrient).
pub(crate) fn nutrient_constraints(
    nutrient: Nutrient,
    intake: Expression,
    dev_pos: Variable,
    dev_neg: Variable,
    target: &NutrientTarget,
    constraints: &mut Vec<Constraint>,
) {
    match nutrient.group() {
        NutrientGroup::UpperTarget => {
            let max_val = target.max_for(nutrient).unwrap_or(0.0);
            constraints.push(constraint!(intake - dev_pos <= max_val));
        }
        NutrientGroup::Range => {
            let min_val = target.min_for(nutrient).unwrap_or(0.0);
            let max_val = target.max_for(nutrient).unwrap_or(f64::INFINITY);
            constraints.push(constraint!(intake.clone() + dev_neg >= min_val));
            constraints.push(constraint!(intake - dev_pos <= max_val));
        }
        NutrientGroup::LowerBound => {
            let Some(min_val) = target.min_for(nutrient) else {
                return;
            };
            constraints.push(constraint!(
                intake.clone() + dev_neg >= min_val * SATURATION_THRESHOLD
            ));
            if let Some(ratio) = nutrient.upper_limit_ratio() {
                constraints.push(constraint!(intake - dev_pos <= min_val * ratio));
            }
        }
    }
}

fn extract(ctx: &PlanContext, model: &ModelVars, solution: &impl Solution) -> MultiDayMenuPlan {
    let dishes = &ctx.dishes;
    let days = ctx.days;

    let mut cooking_tasks: Vec<CookingTask> = Vec::new();
    for (di, dish) in dishes.iter().enumerate() {
        for t in 1..=days {
            if solution.value(model.cook[&(di, t)]) < 0.5 {
                continue;
            }
            let servings = solution.value(model.servings[&(di, t)]).round().max(1.0) as u32;
            let mut consume_days: Vec<u32> = Vec::new();
            for t_prime in consume_window(dish, t, days) {
                let eaten = ctx.meals.iter().any(|&m| {
                    model
                        .consume
                        .get(&(di, t, t_prime, m))
                        .is_some_and(|v| solution.value(*v) > 0.5)
                });
                if eaten {
                    consume_days.push(t_prime);
                }
            }
            if !consume_days.is_empty() {
                cooking_tasks.push(CookingTask {
                    cook_day: t,
                    dish: dish.clone(),
                    servings,
                    consume_days,
                });
            }
        }
    }

    let mut day_meals: Vec<BTreeMap<MealType, Vec<DishPortion>>> = Vec::with_capacity(days as usize);
    for day in 1..=days {
        let mut meals: BTreeMap<MealType, Vec<DishPortion>> = BTreeMap::new();
        for &m in &ctx.meals {
            let mut portions = Vec::new();
            for (di, dish) in dishes.iter().enumerate() {
                for t in source_window(dish, day) {
                    if let Some(quantity) = model.quantity.get(&(di, t, day, m)) {
                        let qty = solution.value(*quantity);
                        if qty > 0.5 {
                            portions.push(DishPortion {
                                dish: dish.clone(),
                                servings: qty.round(),
                            });
                        }
                    }
                }
            }
            meals.insert(m, portions);
        }
        day_meals.push(meals);
    }

    assembler::assemble(AssembleInput {
        days,
        people: ctx.people,
        target: &ctx.target,
        day_meals,
        cooking_tasks,
        preferred_ingredient_ids: &ctx.preferred_ingredient_ids,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kondate_shared::NutrientVector;

    fn dish(id: u32, category: DishCategory, calories: f64) -> Dish {
        let mut nutrients = NutrientVector::zero();
        nutrients.set(Nutrient::Calories, calories);
        nutrients.set(Nutrient::Protein, calories / 20.0);
        Dish {
            id,
            name: format!("dish-{id}"),
            category,
            meal_types: vec![MealType::Breakfast, MealType::Lunch, MealType::Dinner],
            serving_size: 1.0,
            storage_days: 1,
            min_servings: 1,
            max_servings: 4,
            flavor_profile: Default::default(),
            nutrients,
            ingredients: vec![],
        }
    }

    #[test]
    fn test_windows() {
        let d = dish(1, DishCategory::Staple, 300.0);
        assert_eq!(consume_window(&d, 2, 3).collect::<Vec<_>>(), vec![2, 3]);
        assert_eq!(consume_window(&d, 3, 3).collect::<Vec<_>>(), vec![3]);
        assert_eq!(source_window(&d, 1).collect::<Vec<_>>(), vec![1]);
        assert_eq!(source_window(&d, 3).collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn test_dish_score_rewards_density() {
        let target = NutrientTarget::default();
        let nutrients: Vec<Nutrient> = vec![Nutrient::Protein, Nutrient::Calories];
        let lean = {
            let mut d = dish(1, DishCategory::Main, 100.0);
            d.nutrients.set(Nutrient::Protein, 20.0);
            d
        };
        let heavy = {
            let mut d = dish(2, DishCategory::Main, 800.0);
            d.nutrients.set(Nutrient::Protein, 20.0);
            d
        };
        assert!(
            dish_score(&lean, &target, &nutrients) > dish_score(&heavy, &target, &nutrients)
        );
    }

    #[test]
    fn test_prefilter_keeps_small_catalogs() {
        let dishes: Vec<Dish> = (1..=10)
            .map(|i| dish(i, DishCategory::Side, 100.0))
            .collect();
        let target = NutrientTarget::default();
        let kept = prefilter_dishes(dishes.clone(), &target, &[Nutrient::Protein], &HashSet::new(), 2);
        assert_eq!(kept.len(), 10);
    }

    #[test]
    fn test_prefilter_trims_large_catalogs_and_keeps_musts() {
        let dishes: Vec<Dish> = (1..=30)
            .map(|i| dish(i, DishCategory::Side, 100.0 + i as f64))
            .collect();
        let target = NutrientTarget::default();
        let must = HashSet::from([30]);
        let kept = prefilter_dishes(dishes, &target, &[Nutrient::Protein], &must, 3);
        assert!(kept.len() <= 4);
        assert!(kept.iter().any(|d| d.id == 30));
    }
}
