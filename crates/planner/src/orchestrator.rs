//! Strategy selection and graceful degradation: the requested mode runs
//! first, then classic, then the per-day greedy planner. Solver failures
//! never reach the caller; an empty candidate set yields `Ok(None)`.

use std::sync::Arc;

use kondate_catalog::{DishRepository, filter};
use kondate_shared::SchedulingMode;

use crate::error::PlanningError;
use crate::greedy;
use crate::mip::{self, PREFILTER_TOP_N};
use crate::plan::MultiDayMenuPlan;
use crate::progress::{OptimizePhase, Progress};
use crate::request::{PlanContext, PlanRequest};
use crate::scheduler::ProteinClassifier;
use crate::solver::SolverConfig;
use crate::staged;

/// The planner facade. One instance serves many requests; each request
/// builds its own model, so no state is shared across calls.
pub struct MenuPlanner {
    repo: Arc<dyn DishRepository>,
    solver: SolverConfig,
    classifier: Option<ProteinClassifier>,
}

impl MenuPlanner {
    pub fn new(repo: Arc<dyn DishRepository>) -> Self {
        MenuPlanner {
            repo,
            solver: SolverConfig::default(),
            classifier: None,
        }
    }

    pub fn with_solver_config(mut self, solver: SolverConfig) -> Self {
        self.solver = solver;
        self
    }

    /// Install the ingredient-category table used by the staged protein
    /// classifier. Without it, categories are estimated from the ingredient
    /// names in the candidate set.
    pub fn with_classifier(mut self, classifier: ProteinClassifier) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Produce a multi-day plan, or `None` when no candidate dishes remain
    /// after filtering or every strategy came up empty.
    pub fn optimize_multi_day(
        &self,
        request: &PlanRequest,
    ) -> Result<Option<MultiDayMenuPlan>, PlanningError> {
        self.optimize_multi_day_with_progress(request, None)
    }

    /// Same as [`optimize_multi_day`](Self::optimize_multi_day) with a
    /// synchronous phase callback.
    pub fn optimize_multi_day_with_progress(
        &self,
        request: &PlanRequest,
        callback: Option<&dyn Fn(OptimizePhase)>,
    ) -> Result<Option<MultiDayMenuPlan>, PlanningError> {
        request.validate()?;
        let progress = Progress::new(callback);

        progress.report(OptimizePhase::FilteringNutrients);
        let nutrients = request.active_nutrients();
        tracing::info!(active = nutrients.len(), "nutrients selected");

        progress.report(OptimizePhase::FilteringDishes);
        let dishes = if request.excluded_allergens.is_empty() {
            self.repo.find_all(None, None, 0, 1000)
        } else {
            self.repo
                .find_excluding_allergens(&request.excluded_allergens)
        };
        let dishes = filter::exclude_dishes(dishes, &request.excluded_dish_ids);
        let dishes = filter::exclude_ingredients(dishes, &request.excluded_ingredient_ids);
        if dishes.is_empty() {
            tracing::warn!("no dishes left after filtering");
            return Ok(None);
        }

        let target = request.adjusted_target();
        let must_keep = request
            .keep_dish_ids
            .union(&request.preferred_dish_ids)
            .copied()
            .collect();
        let dishes = mip::prefilter_dishes(dishes, &target, &nutrients, &must_keep, PREFILTER_TOP_N);

        let ctx = PlanContext {
            dishes,
            days: request.days,
            people: request.people,
            target,
            meals: request.enabled_meals(),
            // Named presets expand to their category tables here, so the
            // strategies only ever see explicit templates.
            settings: request.meal_settings.resolved(),
            batch_cooking_level: request.batch_cooking_level,
            variety_level: request.variety_level,
            household_type: request.household_type,
            keep_dish_ids: request.keep_dish_ids.clone(),
            preferred_dish_ids: request.preferred_dish_ids.clone(),
            preferred_ingredient_ids: request.preferred_ingredient_ids.clone(),
            nutrients,
            solver: self.solver.clone(),
        };

        let plan = match request.scheduling_mode {
            SchedulingMode::Staged => {
                let classifier = self
                    .classifier
                    .clone()
                    .unwrap_or_else(|| ProteinClassifier::from_dishes(&ctx.dishes));
                staged::solve_staged(&ctx, &classifier, request.scheduler_seed, progress)
                    .or_else(|| {
                        tracing::warn!("staged mode failed, trying the full model");
                        mip::solve_classic(&ctx, progress)
                    })
                    .or_else(|| {
                        tracing::warn!("full model failed, trying per-day fallback");
                        greedy::solve_greedy(&ctx)
                    })
            }
            SchedulingMode::Classic => mip::solve_classic(&ctx, progress).or_else(|| {
                tracing::warn!("full model failed, trying per-day fallback");
                greedy::solve_greedy(&ctx)
            }),
        };

        if plan.is_none() {
            tracing::warn!("all strategies failed to produce a plan");
        }
        Ok(plan)
    }

    /// Re-optimize around an existing plan: dishes to keep enter as hard
    /// constraints (and staged pre-placements), dishes to drop are excluded
    /// from the candidate set before optimization. Semantics are otherwise
    /// identical to [`optimize_multi_day`](Self::optimize_multi_day).
    pub fn refine(
        &self,
        request: &PlanRequest,
    ) -> Result<Option<MultiDayMenuPlan>, PlanningError> {
        self.optimize_multi_day(request)
    }
}
