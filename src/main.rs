use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

use kondate_catalog::{Dish, InMemoryDishRepository};
use kondate_planner::{MenuPlanner, MultiDayMenuPlan, PlanRequest};
use kondate_shared::{
    BatchCookingLevel, HouseholdType, MealPreset, MealType, Nutrient, SchedulingMode, VarietyLevel,
    VolumeLevel,
};

/// kondate - Nutrition-aware multi-day menu planning
#[derive(Parser)]
#[command(name = "kondate")]
#[command(about = "Nutrition-aware multi-day menu planning", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a multi-day plan from a JSON dish catalog
    Plan {
        /// Path to the dish catalog (JSON array of dishes)
        #[arg(long)]
        catalog: PathBuf,

        #[arg(long, default_value_t = 1)]
        days: u32,

        #[arg(long, default_value_t = 1)]
        people: u32,

        /// Optimization strategy
        #[arg(long, value_enum, default_value = "classic")]
        mode: Mode,

        /// Repetition control: small repeats freely, large never repeats
        #[arg(long, value_enum, default_value = "normal")]
        variety: Level,

        /// Batch-cooking preference
        #[arg(long, value_enum, default_value = "normal")]
        batch: Level,

        /// Portion volume (scales energy targets)
        #[arg(long, value_enum, default_value = "normal")]
        volume: Level,

        /// Household heuristics used by the staged scheduler
        #[arg(long, value_enum, default_value = "single")]
        household: Household,

        /// Meal shape preset applied to every enabled meal (overrides the
        /// default per-meal templates)
        #[arg(long, value_enum)]
        preset: Option<Preset>,

        /// Pin the staged scheduler's RNG
        #[arg(long)]
        seed: Option<u64>,

        /// Emit the full plan as JSON instead of a summary
        #[arg(long)]
        json: bool,
    },
    /// Validate a dish catalog and print category counts
    Check {
        #[arg(long)]
        catalog: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Classic,
    Staged,
}

#[derive(Clone, Copy, ValueEnum)]
enum Level {
    Small,
    Normal,
    Large,
}

#[derive(Clone, Copy, ValueEnum)]
enum Household {
    Single,
    Couple,
    Family,
}

#[derive(Clone, Copy, ValueEnum)]
enum Preset {
    Minimal,
    Light,
    Standard,
    Full,
    Japanese,
}

impl Preset {
    fn meal_preset(self) -> MealPreset {
        match self {
            Preset::Minimal => MealPreset::Minimal,
            Preset::Light => MealPreset::Light,
            Preset::Standard => MealPreset::Standard,
            Preset::Full => MealPreset::Full,
            Preset::Japanese => MealPreset::Japanese,
        }
    }
}

impl Level {
    fn variety(self) -> VarietyLevel {
        match self {
            Level::Small => VarietyLevel::Small,
            Level::Normal => VarietyLevel::Normal,
            Level::Large => VarietyLevel::Large,
        }
    }

    fn batch(self) -> BatchCookingLevel {
        match self {
            Level::Small => BatchCookingLevel::Small,
            Level::Normal => BatchCookingLevel::Normal,
            Level::Large => BatchCookingLevel::Large,
        }
    }

    fn volume(self) -> VolumeLevel {
        match self {
            Level::Small => VolumeLevel::Small,
            Level::Normal => VolumeLevel::Normal,
            Level::Large => VolumeLevel::Large,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_filter(env_filter),
        )
        .try_init()?;

    match cli.command {
        Commands::Plan {
            catalog,
            days,
            people,
            mode,
            variety,
            batch,
            volume,
            household,
            preset,
            seed,
            json,
        } => {
            let dishes = load_catalog(&catalog)?;
            tracing::info!(count = dishes.len(), "catalog loaded");
            let repo = InMemoryDishRepository::new(dishes)?;
            let planner = MenuPlanner::new(Arc::new(repo));

            let mut request = PlanRequest::default();
            request.days = days;
            request.people = people;
            request.scheduling_mode = match mode {
                Mode::Classic => SchedulingMode::Classic,
                Mode::Staged => SchedulingMode::Staged,
            };
            request.variety_level = variety.variety();
            request.batch_cooking_level = batch.batch();
            request.volume_level = volume.volume();
            request.household_type = match household {
                Household::Single => HouseholdType::Single,
                Household::Couple => HouseholdType::Couple,
                Household::Family => HouseholdType::Family,
            };
            request.scheduler_seed = seed;
            if let Some(preset) = preset {
                let preset = preset.meal_preset();
                request.meal_settings.breakfast.preset = Some(preset);
                request.meal_settings.lunch.preset = Some(preset);
                request.meal_settings.dinner.preset = Some(preset);
            }

            match planner.optimize_multi_day(&request)? {
                Some(plan) => {
                    if json {
                        println!("{}", serde_json::to_string_pretty(&plan)?);
                    } else {
                        print_summary(&plan);
                    }
                    Ok(())
                }
                None => {
                    eprintln!("実行可能な献立が見つかりませんでした");
                    std::process::exit(1);
                }
            }
        }
        Commands::Check { catalog } => {
            let dishes = load_catalog(&catalog)?;
            let total = dishes.len();
            let repo = InMemoryDishRepository::new(dishes)?;
            println!("catalog ok: {total} dishes");
            let mut counts: Vec<(String, usize)> = Vec::new();
            for dish in kondate_catalog::DishRepository::find_all(&repo, None, None, 0, usize::MAX)
            {
                match counts.iter_mut().find(|(c, _)| *c == dish.category.to_string()) {
                    Some((_, n)) => *n += 1,
                    None => counts.push((dish.category.to_string(), 1)),
                }
            }
            for (category, count) in counts {
                println!("  {category}: {count}");
            }
            Ok(())
        }
    }
}

fn load_catalog(path: &PathBuf) -> Result<Vec<Dish>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read catalog {}", path.display()))?;
    let dishes: Vec<Dish> = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse catalog {}", path.display()))?;
    Ok(dishes)
}

fn print_summary(plan: &MultiDayMenuPlan) {
    println!("plan {} ({}日分 / {}人)", plan.plan_id, plan.days, plan.people);
    for day in &plan.daily_plans {
        println!("== day {} ==", day.day);
        for meal in [MealType::Breakfast, MealType::Lunch, MealType::Dinner] {
            let portions = day.meal(meal);
            if portions.is_empty() {
                continue;
            }
            let dishes: Vec<String> = portions
                .iter()
                .map(|p| format!("{} x{}", p.dish.name, p.servings))
                .collect();
            println!("  {meal}: {}", dishes.join(", "));
        }
        println!(
            "  カロリー {:.0} kcal / 達成率(最低) {:.0}%",
            day.total_nutrients.get(Nutrient::Calories),
            day.achievement_rate
                .values()
                .fold(f64::INFINITY, |a, b| a.min(*b))
        );
    }

    println!("== 調理計画 ==");
    for task in &plan.cooking_tasks {
        println!(
            "  day {}: {} を {} 人前 (消費日 {:?})",
            task.cook_day, task.dish.name, task.servings, task.consume_days
        );
    }

    println!("== 買い物リスト ==");
    for item in &plan.shopping_list {
        let owned = if item.is_owned { " (手持ち)" } else { "" };
        println!(
            "  {} {}{} ({:.0}g){owned}",
            item.food_name, item.display_amount, item.unit, item.total_amount
        );
    }

    for warning in &plan.warnings {
        println!("warning: {}", warning.message);
    }
}
