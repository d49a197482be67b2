//! Staged mode: staples and mains are fixed by rules (Phases 0-2), a
//! reduced MIP fills sides, soups and desserts (Phase 3), and a low overall
//! achievement triggers one retry with a fresh set of mains (Phase 4).

use std::collections::{BTreeMap, HashMap, HashSet};

use good_lp::{Constraint, Expression, Solution, Variable, constraint, variable, variables};

use kondate_catalog::Dish;
use kondate_shared::{DishCategory, MealType, VarietyLevel};

use crate::assembler::{self, AssembleInput};
use crate::mip;
use crate::plan::{CookingTask, DishPortion, MultiDayMenuPlan};
use crate::progress::{OptimizePhase, Progress};
use crate::request::PlanContext;
use crate::scheduler::{MealScheduler, ProteinClassifier, SlotSchedule};
use crate::solver::{self, sum_vars};

/// Retry threshold: below this minimum overall achievement the mains are
/// rescheduled once.
const RETRY_THRESHOLD: f64 = 85.0;

/// Run the staged pipeline. `None` means Phase 3 was infeasible; the
/// orchestrator then falls back to the classic full MIP.
pub(crate) fn solve_staged(
    ctx: &PlanContext,
    classifier: &ProteinClassifier,
    seed: Option<u64>,
    progress: Progress,
) -> Option<MultiDayMenuPlan> {
    let dishes = &ctx.dishes;
    let days = ctx.days;
    let meals = &ctx.meals;

    let mut scheduler = MealScheduler::new(seed);

    // Phase 0: kept dishes are pre-placed into the earliest open slots and
    // frozen for the rest of the pipeline.
    let mut keep_staples: Vec<&Dish> = Vec::new();
    let mut keep_mains: Vec<&Dish> = Vec::new();
    for dish in dishes {
        if ctx.keep_dish_ids.contains(&dish.id) {
            match dish.category {
                DishCategory::Staple | DishCategory::StapleMain => keep_staples.push(dish),
                DishCategory::Main => keep_mains.push(dish),
                _ => {}
            }
        }
    }

    let mut fixed_staples = SlotSchedule::new();
    let mut staple_iter = keep_staples.iter();
    'staple_placement: for day in 1..=days {
        for &meal in meals {
            match staple_iter.next() {
                Some(dish) => {
                    tracing::debug!(day, meal = %meal, dish = %dish.name, "fixed staple");
                    fixed_staples.insert((day, meal), (*dish).clone());
                }
                None => break 'staple_placement,
            }
        }
    }

    let mut fixed_mains = SlotSchedule::new();
    let mut main_iter = keep_mains.iter().peekable();
    'main_placement: for day in 1..=days {
        for &meal in meals {
            if main_iter.peek().is_none() {
                break 'main_placement;
            }
            // A STAPLE_MAIN already covers the main role here.
            if fixed_staples
                .get(&(day, meal))
                .is_some_and(|d| d.category == DishCategory::StapleMain)
            {
                continue;
            }
            if let Some(dish) = main_iter.next() {
                tracing::debug!(day, meal = %meal, dish = %dish.name, "fixed main");
                fixed_mains.insert((day, meal), (*dish).clone());
            }
        }
    }
    if main_iter.peek().is_some() {
        tracing::warn!("not every kept main could be placed into a slot");
    }

    // Phase 1: staples.
    let mut staples = scheduler.schedule_staples(dishes, days, meals, ctx.household_type);
    for (slot, dish) in &fixed_staples {
        staples.insert(*slot, dish.clone());
    }

    // Phase 2: mains on the protein rotation.
    let mut mains = scheduler.schedule_mains(
        dishes,
        days,
        meals,
        &staples,
        &HashSet::new(),
        ctx.variety_level,
        classifier,
    );
    for (slot, dish) in &fixed_mains {
        mains.insert(*slot, dish.clone());
    }

    // Phase 3: fill the remaining categories with a reduced MIP.
    let mut result = optimize_sides(ctx, &staples, &mains, progress)?;

    // Phase 4: one retry with the used mains excluded when the weakest
    // nutrient lands too low. Frozen mains stay.
    if let Some((nutrient, min_rate)) = result.min_achievement() {
        if min_rate < RETRY_THRESHOLD {
            tracing::info!(
                nutrient = %nutrient,
                rate = format!("{min_rate:.1}"),
                "low achievement, rescheduling mains"
            );
            let fixed_ids: HashSet<u32> = fixed_mains.values().map(|d| d.id).collect();
            let used_main_ids: HashSet<u32> = mains
                .values()
                .filter(|d| !fixed_ids.contains(&d.id))
                .map(|d| d.id)
                .collect();
            let mut mains_retry = scheduler.schedule_mains(
                dishes,
                days,
                meals,
                &staples,
                &used_main_ids,
                ctx.variety_level,
                classifier,
            );
            for (slot, dish) in &fixed_mains {
                mains_retry.insert(*slot, dish.clone());
            }
            if let Some(retry) = optimize_sides(ctx, &staples, &mains_retry, Progress::new(None)) {
                if let Some((_, retry_min)) = retry.min_achievement() {
                    if retry_min > min_rate {
                        tracing::info!(
                            from = format!("{min_rate:.1}"),
                            to = format!("{retry_min:.1}"),
                            "retry improved minimum achievement"
                        );
                        result = retry;
                    }
                }
            }
        }
    }

    Some(result)
}

/// Phase 3: with staples and mains frozen, choose sides/soups/desserts per
/// (day, meal) to close the nutrient gaps.
fn optimize_sides(
    ctx: &PlanContext,
    staples: &SlotSchedule,
    mains: &SlotSchedule,
    progress: Progress,
) -> Option<MultiDayMenuPlan> {
    let days = ctx.days;
    let sides: Vec<&Dish> = ctx
        .dishes
        .iter()
        .filter(|d| d.category.is_side_class())
        .collect();
    if sides.is_empty() {
        tracing::warn!("no side dishes available, serving staples and mains only");
        return Some(build_result(ctx, staples, mains, &HashMap::new()));
    }

    progress.report(OptimizePhase::BuildingModel);

    let mut vars = variables!();
    let mut select: HashMap<(usize, u32, MealType), Variable> = HashMap::new();
    for (si, dish) in sides.iter().enumerate() {
        for day in 1..=days {
            for &meal in &ctx.meals {
                if dish.eligible_for(meal) {
                    select.insert((si, day, meal), vars.add(variable().binary()));
                }
            }
        }
    }

    let mut dev_pos = HashMap::new();
    let mut dev_neg = HashMap::new();
    for day in 1..=days {
        for &n in &ctx.nutrients {
            dev_pos.insert((day, n), vars.add(variable().min(0.0)));
            dev_neg.insert((day, n), vars.add(variable().min(0.0)));
        }
    }
    let dish_used: Vec<Variable> = sides
        .iter()
        .map(|_| vars.add(variable().binary()))
        .collect();

    let objective: Expression = (1..=days)
        .flat_map(|day| {
            ctx.nutrients.iter().map(move |&n| (day, n))
        })
        .map(|(day, n)| {
            mip::deviation_penalty(n, dev_pos[&(day, n)], dev_neg[&(day, n)], &ctx.target)
        })
        .sum();

    let mut constraints: Vec<Constraint> = Vec::new();

    // Daily nutrients: the frozen dishes contribute a constant, sides the
    // variable part. Everything is per person; fixed dishes serve exactly
    // `people` portions so their per-person share is the per-serving value.
    for day in 1..=days {
        for &n in &ctx.nutrients {
            let mut fixed = 0.0;
            for &meal in &ctx.meals {
                if let Some(dish) = staples.get(&(day, meal)) {
                    fixed += dish.nutrient(n);
                }
                if let Some(dish) = mains.get(&(day, meal)) {
                    fixed += dish.nutrient(n);
                }
            }
            let mut side_terms: Vec<Expression> = Vec::new();
            for (si, dish) in sides.iter().enumerate() {
                let value = dish.nutrient(n);
                if value == 0.0 {
                    continue;
                }
                for &meal in &ctx.meals {
                    if let Some(v) = select.get(&(si, day, meal)) {
                        side_terms.push(*v * value);
                    }
                }
            }
            let intake: Expression = side_terms.into_iter().sum::<Expression>() + fixed;
            mip::nutrient_constraints(
                n,
                intake,
                dev_pos[&(day, n)],
                dev_neg[&(day, n)],
                &ctx.target,
                &mut constraints,
            );
        }
    }

    // Category counts for the side-class categories only.
    for day in 1..=days {
        for &meal in &ctx.meals {
            let template = &ctx.settings.get(meal).template;
            for (category, range) in template.iter() {
                if !category.is_side_class() {
                    continue;
                }
                let selected: Vec<Variable> = sides
                    .iter()
                    .enumerate()
                    .filter(|(_, d)| d.category == category)
                    .filter_map(|(si, _)| select.get(&(si, day, meal)).copied())
                    .collect();
                if !selected.is_empty() {
                    let count = sum_vars(selected);
                    constraints.push(constraint!(count.clone() >= range.min as f64));
                    constraints.push(constraint!(count <= range.max as f64));
                }
            }
        }
    }

    // Distinct-side cap: fewer distinct sides means more batch-cooked
    // repetition across the plan.
    for (si, _) in sides.iter().enumerate() {
        let mut uses: Vec<Variable> = Vec::new();
        for day in 1..=days {
            for &meal in &ctx.meals {
                if let Some(v) = select.get(&(si, day, meal)) {
                    uses.push(*v);
                }
            }
        }
        if !uses.is_empty() {
            let used = dish_used[si];
            let count = uses.len() as f64;
            constraints.push(constraint!(used * count >= sum_vars(uses.clone())));
            constraints.push(constraint!(used <= sum_vars(uses)));
        }
    }
    let max_distinct = match ctx.variety_level {
        VarietyLevel::Small => days as usize,
        VarietyLevel::Normal => days as usize + 3,
        VarietyLevel::Large => sides.len(),
    };
    constraints.push(constraint!(
        sum_vars(dish_used.iter().copied()) <= max_distinct as f64
    ));

    progress.report(OptimizePhase::ApplyingConstraints);

    // At the highest variety level a side never repeats on consecutive days
    // in the same meal.
    if ctx.variety_level == VarietyLevel::Large {
        for (si, _) in sides.iter().enumerate() {
            for &meal in &ctx.meals {
                for day in 1..days {
                    if let (Some(today), Some(tomorrow)) = (
                        select.get(&(si, day, meal)),
                        select.get(&(si, day + 1, meal)),
                    ) {
                        constraints.push(constraint!(*today + *tomorrow <= 1.0));
                    }
                }
            }
        }
    }

    progress.report(OptimizePhase::Solving);
    let solution = match solver::minimize(vars, objective, constraints, &ctx.solver) {
        Ok(solution) => solution,
        Err(err) => {
            tracing::warn!(error = %err, "staged sides solve failed");
            return None;
        }
    };

    progress.report(OptimizePhase::Finalizing);
    let mut chosen: HashMap<(u32, MealType), Vec<Dish>> = HashMap::new();
    for ((si, day, meal), variable) in &select {
        if solution.value(*variable) > 0.5 {
            chosen
                .entry((*day, *meal))
                .or_default()
                .push(sides[*si].clone());
        }
    }

    Some(build_result(ctx, staples, mains, &chosen))
}

/// Project the schedules into daily portions and shelf-life-respecting
/// cooking tasks, then assemble the plan.
fn build_result(
    ctx: &PlanContext,
    staples: &SlotSchedule,
    mains: &SlotSchedule,
    sides: &HashMap<(u32, MealType), Vec<Dish>>,
) -> MultiDayMenuPlan {
    let people = ctx.people;
    let mut day_meals: Vec<BTreeMap<MealType, Vec<DishPortion>>> = Vec::new();
    let mut usage: BTreeMap<u32, (Dish, BTreeMap<u32, u32>)> = BTreeMap::new();

    let mut record = |usage: &mut BTreeMap<u32, (Dish, BTreeMap<u32, u32>)>,
                      dish: &Dish,
                      day: u32| {
        let entry = usage
            .entry(dish.id)
            .or_insert_with(|| (dish.clone(), BTreeMap::new()));
        *entry.1.entry(day).or_insert(0) += people;
    };

    for day in 1..=ctx.days {
        let mut meals_map: BTreeMap<MealType, Vec<DishPortion>> = BTreeMap::new();
        for &meal in &ctx.meals {
            let mut portions: Vec<DishPortion> = Vec::new();
            if let Some(dish) = staples.get(&(day, meal)) {
                record(&mut usage, dish, day);
                portions.push(DishPortion {
                    dish: dish.clone(),
                    servings: people as f64,
                });
            }
            if let Some(dish) = mains.get(&(day, meal)) {
                record(&mut usage, dish, day);
                portions.push(DishPortion {
                    dish: dish.clone(),
                    servings: people as f64,
                });
            }
            if let Some(list) = sides.get(&(day, meal)) {
                for dish in list {
                    record(&mut usage, dish, day);
                    portions.push(DishPortion {
                        dish: dish.clone(),
                        servings: people as f64,
                    });
                }
            }
            meals_map.insert(meal, portions);
        }
        day_meals.push(meals_map);
    }

    let mut cooking_tasks: Vec<CookingTask> = Vec::new();
    for (_, (dish, days_used)) in usage {
        cooking_tasks.extend(assembler::batch_cooking_tasks(&dish, &days_used));
    }

    assembler::assemble(AssembleInput {
        days: ctx.days,
        people: ctx.people,
        target: &ctx.target,
        day_meals,
        cooking_tasks,
        preferred_ingredient_ids: &ctx.preferred_ingredient_ids,
    })
}
