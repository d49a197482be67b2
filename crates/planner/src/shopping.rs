//! Shopping-list derivation: fold ingredient amounts across cooking tasks,
//! normalize food names and convert gram totals into practical display units.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::plan::CookingTask;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub food_name: String,
    /// Total grams across the plan.
    pub total_amount: f64,
    /// Practical amount, e.g. "2" with unit 本, or "1/2" with unit 束.
    pub display_amount: String,
    pub unit: String,
    /// True when the ingredient is already on hand (preferred ingredients).
    pub is_owned: bool,
}

/// Grams per household unit for common ingredients.
const UNIT_MAPPINGS: &[(&str, f64, &str)] = &[
    ("にんじん", 150.0, "本"),
    ("玉ねぎ", 200.0, "個"),
    ("じゃがいも", 150.0, "個"),
    ("キャベツ", 1000.0, "玉"),
    ("なす", 80.0, "本"),
    ("トマト", 150.0, "個"),
    ("ピーマン", 35.0, "個"),
    ("小松菜", 200.0, "束"),
    ("ほうれん草", 200.0, "束"),
    ("もやし", 200.0, "袋"),
    ("ねぎ", 100.0, "本"),
    ("大根", 900.0, "本"),
    ("ブロッコリー", 250.0, "株"),
    ("レタス", 600.0, "玉"),
    ("きゅうり", 100.0, "本"),
    ("白菜", 1200.0, "株"),
    ("生姜", 15.0, "かけ"),
    ("にんにく", 5.0, "片"),
    ("卵", 50.0, "個"),
    ("木綿豆腐", 350.0, "丁"),
    ("絹ごし豆腐", 350.0, "丁"),
    ("油揚げ", 30.0, "枚"),
    ("鶏肉", 250.0, "枚"),
    ("豚肉", 100.0, "g"),
    ("牛肉", 100.0, "g"),
    ("ベーコン", 18.0, "枚"),
    ("ウインナー", 20.0, "本"),
    ("鮭", 80.0, "切れ"),
    ("さば", 100.0, "切れ"),
    ("えび", 15.0, "尾"),
    ("白米", 150.0, "合"),
    ("パスタ", 100.0, "g"),
    ("うどん", 200.0, "玉"),
    ("そば", 130.0, "束"),
    ("食パン", 60.0, "枚"),
    ("牛乳", 200.0, "ml"),
];

/// Food-composition-table names mapped to shopping-friendly names.
const FOOD_NAME_MAPPINGS: &[(&str, &str)] = &[
    ("こめ", "白米"),
    ("こまつな", "小松菜"),
    ("だいず", "大豆"),
    ("たまねぎ", "玉ねぎ"),
    ("だいこん", "大根"),
    ("はくさい", "白菜"),
    ("ほうれんそう", "ほうれん草"),
    ("しょうが", "生姜"),
    ("ぶたにく", "豚肉"),
    ("豚肉", "豚肉"),
    ("ぎゅうにく", "牛肉"),
    ("牛肉", "牛肉"),
    ("とりにく", "鶏肉"),
    ("鶏肉", "鶏肉"),
    ("さけ", "鮭"),
    ("さば", "さば"),
    ("えび", "えび"),
    ("卵", "卵"),
];

/// Trailing cooking-state words stripped from composition-table names.
const TRAILING_STATES: &[&str] = &[
    "生", "ゆで", "茹で", "焼き", "油いため", "蒸し", "冷凍", "乾燥",
];

fn strip_bracketed(name: &str, open: char, close: char) -> String {
    let mut out = String::with_capacity(name.len());
    let mut depth = 0usize;
    for ch in name.chars() {
        if ch == open {
            depth += 1;
        } else if ch == close {
            depth = depth.saturating_sub(1);
        } else if depth == 0 {
            out.push(ch);
        }
    }
    out
}

/// Reduce a food-composition-table name to a short shopping name.
pub fn normalize_food_name(raw_name: &str) -> String {
    let mut name = strip_bracketed(raw_name, '＜', '＞');
    name = strip_bracketed(&name, '（', '）');
    name = strip_bracketed(&name, '［', '］');
    name = strip_bracketed(&name, '(', ')');

    for state in TRAILING_STATES {
        if let Some(stripped) = name.trim_end().strip_suffix(state) {
            name = stripped.to_string();
        }
    }

    for (key, value) in FOOD_NAME_MAPPINGS {
        if name.contains(key) {
            return (*value).to_string();
        }
    }

    let trimmed = name.trim().to_string();
    if trimmed.is_empty() {
        raw_name.to_string()
    } else {
        trimmed
    }
}

fn format_grams(amount_g: f64) -> (String, String) {
    if amount_g >= 1000.0 {
        let kg = amount_g / 1000.0;
        let mut text = format!("{kg:.1}");
        if text.ends_with(".0") {
            text.truncate(text.len() - 2);
        }
        (text, "kg".to_string())
    } else {
        (format!("{}", amount_g.round() as i64), "g".to_string())
    }
}

/// Convert a gram total into a practical display amount for the food.
/// Unknown foods stay in grams (or kilograms past 1000 g).
pub fn convert_to_display_unit(food_name: &str, amount_g: f64) -> (String, String) {
    let Some((_, grams_per_unit, unit)) = UNIT_MAPPINGS
        .iter()
        .find(|(name, _, _)| *name == food_name)
    else {
        return format_grams(amount_g);
    };

    if *unit == "g" || *unit == "ml" {
        return if amount_g >= 1000.0 {
            let (text, _) = format_grams(amount_g);
            let big = if *unit == "g" { "kg" } else { "L" };
            (text, big.to_string())
        } else {
            (format!("{}", amount_g.round() as i64), (*unit).to_string())
        };
    }

    let unit_count = amount_g / grams_per_unit;

    // Large items (whole cabbages and the like) display as fractions.
    if *grams_per_unit >= 500.0 {
        let display = if unit_count < 0.2 {
            return format_grams(amount_g);
        } else if unit_count < 0.4 {
            "1/4".to_string()
        } else if unit_count < 0.6 {
            "1/2".to_string()
        } else if unit_count < 0.9 {
            "3/4".to_string()
        } else if unit_count < 1.3 {
            "1".to_string()
        } else {
            format!("約{}", (unit_count * 2.0).round() / 2.0)
        };
        return (display, (*unit).to_string());
    }

    let display = if unit_count < 0.3 {
        return format_grams(amount_g);
    } else if unit_count < 0.7 {
        "1/2".to_string()
    } else if unit_count < 1.3 {
        "1".to_string()
    } else if unit_count < 1.7 {
        "1.5".to_string()
    } else if unit_count < 2.3 {
        "2".to_string()
    } else if unit_count < 2.7 {
        "2.5".to_string()
    } else if unit_count < 3.3 {
        "3".to_string()
    } else if unit_count < 4.0 {
        "3.5".to_string()
    } else if unit_count < 5.0 {
        "4".to_string()
    } else {
        format!("約{}", unit_count.round() as i64)
    };
    (display, (*unit).to_string())
}

/// Fold ingredient amounts across all cooking tasks into one list, keyed by
/// the normalized basic ingredient where available, else by normalized name.
pub fn generate_shopping_list(
    cooking_tasks: &[CookingTask],
    preferred_ingredient_ids: &HashSet<u32>,
) -> Vec<ShoppingItem> {
    struct Entry {
        name: String,
        amount: f64,
        ingredient_ids: HashSet<u32>,
    }

    let mut folded: BTreeMap<String, Entry> = BTreeMap::new();

    for task in cooking_tasks {
        for ing in &task.dish.ingredients {
            let (key, name) = match ing.ingredient_id {
                Some(id) => {
                    let name = ing
                        .name()
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("食品ID:{}", ing.food_id));
                    (format!("ing_{id}"), name)
                }
                None => {
                    let raw = ing
                        .food_name
                        .clone()
                        .unwrap_or_else(|| format!("食品ID:{}", ing.food_id));
                    let name = normalize_food_name(&raw);
                    (format!("name_{name}"), name)
                }
            };

            let entry = folded.entry(key).or_insert_with(|| Entry {
                name,
                amount: 0.0,
                ingredient_ids: HashSet::new(),
            });
            entry.amount += ing.amount * task.servings as f64;
            if let Some(id) = ing.ingredient_id {
                entry.ingredient_ids.insert(id);
            }
        }
    }

    let mut items: Vec<ShoppingItem> = folded
        .into_values()
        .map(|entry| {
            let (display_amount, unit) = convert_to_display_unit(&entry.name, entry.amount);
            let is_owned = !entry.ingredient_ids.is_disjoint(preferred_ingredient_ids);
            ShoppingItem {
                food_name: entry.name,
                total_amount: (entry.amount * 10.0).round() / 10.0,
                display_amount,
                unit,
                is_owned,
            }
        })
        .collect();
    items.sort_by(|a, b| a.food_name.cmp(&b.food_name));
    items
}
