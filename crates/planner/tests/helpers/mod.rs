#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use kondate_catalog::{Dish, DishIngredient, InMemoryDishRepository};
use kondate_planner::{MenuPlanner, MultiDayMenuPlan, NutrientCalculator, PlanRequest, SolverConfig};
use kondate_shared::{
    DishCategory, FlavorProfile, MealType, Nutrient, NutrientVector,
};

pub fn ingredient(id: u32, name: &str, amount: f64) -> DishIngredient {
    DishIngredient {
        food_id: id,
        food_name: Some(name.to_string()),
        ingredient_id: Some(id),
        ingredient_name: Some(name.to_string()),
        amount,
        display_amount: String::new(),
        unit: "g".to_string(),
        cooking_method: Default::default(),
    }
}

#[allow(clippy::too_many_arguments)]
pub fn dish(
    id: u32,
    name: &str,
    category: DishCategory,
    meals: &[MealType],
    flavor: FlavorProfile,
    storage_days: u32,
    macros: (f64, f64, f64, f64),
    ingredients: Vec<DishIngredient>,
) -> Dish {
    let (calories, protein, fat, carbohydrate) = macros;
    let mut nutrients = NutrientVector::zero();
    nutrients.set(Nutrient::Calories, calories);
    nutrients.set(Nutrient::Protein, protein);
    nutrients.set(Nutrient::Fat, fat);
    nutrients.set(Nutrient::Carbohydrate, carbohydrate);
    nutrients.set(Nutrient::Fiber, 2.5);
    nutrients.set(Nutrient::Sodium, 300.0);
    nutrients.set(Nutrient::Potassium, 300.0);
    nutrients.set(Nutrient::Calcium, 80.0);
    nutrients.set(Nutrient::Magnesium, 40.0);
    nutrients.set(Nutrient::Iron, 1.2);
    nutrients.set(Nutrient::Zinc, 1.1);
    nutrients.set(Nutrient::VitaminA, 90.0);
    nutrients.set(Nutrient::VitaminD, 1.2);
    nutrients.set(Nutrient::VitaminE, 0.8);
    nutrients.set(Nutrient::VitaminK, 20.0);
    nutrients.set(Nutrient::VitaminB1, 0.15);
    nutrients.set(Nutrient::VitaminB2, 0.18);
    nutrients.set(Nutrient::VitaminB6, 0.16);
    nutrients.set(Nutrient::VitaminB12, 0.4);
    nutrients.set(Nutrient::Niacin, 1.8);
    nutrients.set(Nutrient::PantothenicAcid, 0.7);
    nutrients.set(Nutrient::Biotin, 6.0);
    nutrients.set(Nutrient::Folate, 35.0);
    nutrients.set(Nutrient::VitaminC, 14.0);
    Dish {
        id,
        name: name.to_string(),
        category,
        meal_types: meals.to_vec(),
        serving_size: 1.0,
        storage_days,
        min_servings: 1,
        max_servings: 6,
        flavor_profile: flavor,
        nutrients,
        ingredients,
    }
}

/// A small but realistic catalog: staples for every meal, mains over several
/// protein sources, sides, soups and one dessert.
pub fn sample_catalog() -> Vec<Dish> {
    use DishCategory::*;
    use FlavorProfile::*;
    use MealType::*;

    let all = [Breakfast, Lunch, Dinner];
    let ld = [Lunch, Dinner];

    vec![
        dish(1, "白ご飯", Staple, &all, Japanese, 1, (250.0, 4.0, 0.5, 55.0),
            vec![ingredient(101, "白米", 150.0)]),
        dish(2, "バタートースト", Staple, &[Breakfast, Lunch], Western, 0, (220.0, 6.0, 8.0, 30.0),
            vec![ingredient(102, "食パン", 60.0)]),
        dish(3, "玄米ご飯", Staple, &all, Japanese, 1, (240.0, 4.5, 1.0, 51.0),
            vec![ingredient(103, "玄米", 150.0)]),
        dish(4, "かけうどん", Staple, &ld, Japanese, 0, (320.0, 9.0, 1.5, 65.0),
            vec![ingredient(104, "うどん", 200.0)]),
        dish(10, "鶏の照り焼き", Main, &ld, Japanese, 1, (310.0, 24.0, 18.0, 8.0),
            vec![ingredient(110, "鶏肉", 120.0)]),
        dish(11, "鮭の塩焼き", Main, &ld, Japanese, 1, (200.0, 22.0, 10.0, 0.5),
            vec![ingredient(111, "鮭", 80.0)]),
        dish(12, "豚の生姜焼き", Main, &ld, Japanese, 0, (330.0, 21.0, 22.0, 7.0),
            vec![ingredient(112, "豚肉", 120.0), ingredient(113, "生姜", 10.0)]),
        dish(13, "だし巻き卵", Main, &all, Japanese, 0, (150.0, 11.0, 10.0, 2.0),
            vec![ingredient(114, "卵", 100.0)]),
        dish(14, "麻婆豆腐", Main, &ld, Chinese, 1, (280.0, 16.0, 18.0, 9.0),
            vec![ingredient(115, "木綿豆腐", 150.0), ingredient(112, "豚肉", 40.0)]),
        dish(20, "ほうれん草のおひたし", Side, &all, Japanese, 1, (25.0, 2.5, 0.3, 3.5),
            vec![ingredient(120, "ほうれん草", 80.0)]),
        dish(21, "きんぴらごぼう", Side, &ld, Japanese, 2, (90.0, 1.5, 3.5, 13.0),
            vec![ingredient(121, "ごぼう", 60.0), ingredient(122, "にんじん", 30.0)]),
        dish(22, "ポテトサラダ", Side, &all, Western, 1, (160.0, 3.0, 9.0, 16.0),
            vec![ingredient(123, "じゃがいも", 100.0), ingredient(124, "きゅうり", 20.0)]),
        dish(23, "トマトサラダ", Side, &all, Western, 0, (45.0, 1.0, 2.0, 5.0),
            vec![ingredient(125, "トマト", 120.0)]),
        dish(30, "豆腐とわかめの味噌汁", Soup, &all, Japanese, 1, (60.0, 4.0, 2.5, 5.0),
            vec![ingredient(115, "木綿豆腐", 50.0), ingredient(126, "わかめ", 5.0)]),
        dish(31, "野菜スープ", Soup, &ld, Western, 1, (70.0, 2.0, 2.0, 10.0),
            vec![ingredient(127, "キャベツ", 60.0), ingredient(122, "にんじん", 20.0)]),
        dish(40, "ヨーグルト", Dessert, &[Breakfast], Western, 2, (65.0, 3.5, 3.0, 5.5),
            vec![ingredient(128, "ヨーグルト", 100.0)]),
    ]
}

pub fn planner() -> MenuPlanner {
    planner_with(sample_catalog())
}

pub fn planner_with(dishes: Vec<Dish>) -> MenuPlanner {
    let repo = InMemoryDishRepository::new(dishes).expect("catalog should validate");
    MenuPlanner::new(Arc::new(repo)).with_solver_config(SolverConfig {
        time_limit: Duration::from_secs(30),
        gap_rel: Some(0.35),
    })
}

/// Invariants every non-null plan must satisfy.
pub fn assert_plan_invariants(plan: &MultiDayMenuPlan, request: &PlanRequest) {
    assert_eq!(plan.daily_plans.len(), plan.days as usize);

    // Cooking tasks stay inside the shelf-life window with integer servings.
    for task in &plan.cooking_tasks {
        assert!(task.servings >= 1, "task servings must be >= 1");
        assert!(!task.consume_days.is_empty(), "consume_days must be non-empty");
        let first = *task.consume_days.first().unwrap();
        let last = *task.consume_days.last().unwrap();
        assert!(task.cook_day <= first, "{}: cooked after first use", task.dish.name);
        assert!(
            last <= task.cook_day + task.dish.storage_days,
            "{}: consumed past shelf life",
            task.dish.name
        );
        let mut sorted = task.consume_days.clone();
        sorted.sort_unstable();
        assert_eq!(sorted, task.consume_days, "consume_days must be sorted");
    }

    // Excluded dishes never appear.
    for id in plan.dish_ids() {
        assert!(
            !request.excluded_dish_ids.contains(&id),
            "excluded dish {id} appeared in the plan"
        );
    }

    // Portions conservation: every cooked serving is served somewhere.
    let cooked: f64 = plan.cooking_tasks.iter().map(|t| t.servings as f64).sum();
    let served: f64 = plan
        .daily_plans
        .iter()
        .flat_map(|d| d.breakfast.iter().chain(d.lunch.iter()).chain(d.dinner.iter()))
        .map(|p| p.servings)
        .sum();
    assert!(
        (cooked - served).abs() < 1e-6,
        "cooked {cooked} servings but served {served}"
    );

    // Daily achievement rates recompute exactly from the stored totals.
    let target = request.target.scaled_for_volume(request.volume_level);
    for day in &plan.daily_plans {
        let recomputed = NutrientCalculator::achievement_rate(&day.total_nutrients, &target);
        for (n, rate) in &day.achievement_rate {
            let expected = recomputed[n];
            assert!(
                (rate - expected).abs() < 1e-6,
                "day {} nutrient {n}: stored {rate}, recomputed {expected}",
                day.day
            );
        }
    }
}

/// Count dishes of one counting-category served at a meal on a day.
pub fn category_count(plan: &MultiDayMenuPlan, day: usize, meal: MealType, category: DishCategory) -> usize {
    plan.daily_plans[day]
        .meal(meal)
        .iter()
        .filter(|p| p.dish.category.counting_category() == category)
        .count()
}

/// Per-meal portion tables, useful for debugging failed assertions.
#[allow(dead_code)]
pub fn describe(plan: &MultiDayMenuPlan) -> String {
    let mut out = String::new();
    for day in &plan.daily_plans {
        let mut meals: BTreeMap<&str, &Vec<_>> = BTreeMap::new();
        meals.insert("breakfast", &day.breakfast);
        meals.insert("lunch", &day.lunch);
        meals.insert("dinner", &day.dinner);
        for (name, portions) in meals {
            let dishes: Vec<String> = portions
                .iter()
                .map(|p: &kondate_planner::DishPortion| format!("{}x{}", p.dish.name, p.servings))
                .collect();
            out.push_str(&format!("day{} {name}: {}\n", day.day, dishes.join(", ")));
        }
    }
    out
}
