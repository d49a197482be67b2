use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Dish category. Serialized with the Japanese labels the catalog data uses.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
)]
pub enum DishCategory {
    #[serde(rename = "主食")]
    #[strum(serialize = "主食")]
    Staple,
    #[serde(rename = "主菜")]
    #[strum(serialize = "主菜")]
    Main,
    /// Rice bowls, curry, ramen: one dish that fills both the staple and the
    /// main role. Counts toward the staple slot in meal templates.
    #[serde(rename = "主食・主菜")]
    #[strum(serialize = "主食・主菜")]
    StapleMain,
    #[serde(rename = "副菜")]
    #[strum(serialize = "副菜")]
    Side,
    #[serde(rename = "汁物")]
    #[strum(serialize = "汁物")]
    Soup,
    #[serde(rename = "デザート")]
    #[strum(serialize = "デザート")]
    Dessert,
}

impl DishCategory {
    /// The template slot this category counts toward. STAPLE_MAIN fills the
    /// staple slot; the staged scheduler then suppresses the main slot for
    /// that meal.
    pub fn counting_category(self) -> DishCategory {
        match self {
            DishCategory::StapleMain => DishCategory::Staple,
            other => other,
        }
    }

    /// Categories handled by the staged Phase-3 MIP rather than the
    /// rule-based scheduler.
    pub fn is_side_class(self) -> bool {
        matches!(
            self,
            DishCategory::Side | DishCategory::Soup | DishCategory::Dessert
        )
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealType {
    /// Share of the daily calorie target attributed to this meal, used by
    /// the per-day fallback planner.
    pub fn calorie_ratio(self) -> f64 {
        match self {
            MealType::Breakfast => 0.25,
            MealType::Lunch => 0.35,
            MealType::Dinner => 0.40,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Default)]
pub enum CookingMethod {
    #[serde(rename = "生")]
    #[strum(serialize = "生")]
    #[default]
    Raw,
    #[serde(rename = "茹でる")]
    #[strum(serialize = "茹でる")]
    Boil,
    #[serde(rename = "蒸す")]
    #[strum(serialize = "蒸す")]
    Steam,
    #[serde(rename = "焼く")]
    #[strum(serialize = "焼く")]
    Grill,
    #[serde(rename = "炒める")]
    #[strum(serialize = "炒める")]
    Fry,
    #[serde(rename = "揚げる")]
    #[strum(serialize = "揚げる")]
    DeepFry,
    #[serde(rename = "煮る")]
    #[strum(serialize = "煮る")]
    Simmer,
    #[serde(rename = "電子レンジ")]
    #[strum(serialize = "電子レンジ")]
    Microwave,
}

/// Seasoning lineage of a dish, used only by the staged scheduler to pair
/// mains with a compatible staple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Default)]
pub enum FlavorProfile {
    #[serde(rename = "和風")]
    #[strum(serialize = "和風")]
    #[default]
    Japanese,
    #[serde(rename = "洋風")]
    #[strum(serialize = "洋風")]
    Western,
    #[serde(rename = "中華")]
    #[strum(serialize = "中華")]
    Chinese,
}

/// The 28 labelled allergens: 8 with a mandatory declaration plus 20 with a
/// recommended one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter)]
pub enum Allergen {
    #[serde(rename = "卵")]
    Egg,
    #[serde(rename = "乳")]
    Milk,
    #[serde(rename = "小麦")]
    Wheat,
    #[serde(rename = "そば")]
    Buckwheat,
    #[serde(rename = "落花生")]
    Peanut,
    #[serde(rename = "えび")]
    Shrimp,
    #[serde(rename = "かに")]
    Crab,
    #[serde(rename = "くるみ")]
    Walnut,
    #[serde(rename = "アーモンド")]
    Almond,
    #[serde(rename = "あわび")]
    Abalone,
    #[serde(rename = "いか")]
    Squid,
    #[serde(rename = "いくら")]
    SalmonRoe,
    #[serde(rename = "オレンジ")]
    Orange,
    #[serde(rename = "牛肉")]
    Beef,
    #[serde(rename = "カシューナッツ")]
    Cashew,
    #[serde(rename = "キウイフルーツ")]
    Kiwi,
    #[serde(rename = "ごま")]
    Sesame,
    #[serde(rename = "さけ")]
    Salmon,
    #[serde(rename = "さば")]
    Mackerel,
    #[serde(rename = "大豆")]
    Soybean,
    #[serde(rename = "鶏肉")]
    Chicken,
    #[serde(rename = "豚肉")]
    Pork,
    #[serde(rename = "バナナ")]
    Banana,
    #[serde(rename = "もも")]
    Peach,
    #[serde(rename = "やまいも")]
    Yam,
    #[serde(rename = "りんご")]
    Apple,
    #[serde(rename = "ゼラチン")]
    Gelatin,
    #[serde(rename = "マカダミアナッツ")]
    Macadamia,
}

impl Allergen {
    pub fn label(self) -> &'static str {
        match self {
            Allergen::Egg => "卵",
            Allergen::Milk => "乳",
            Allergen::Wheat => "小麦",
            Allergen::Buckwheat => "そば",
            Allergen::Peanut => "落花生",
            Allergen::Shrimp => "えび",
            Allergen::Crab => "かに",
            Allergen::Walnut => "くるみ",
            Allergen::Almond => "アーモンド",
            Allergen::Abalone => "あわび",
            Allergen::Squid => "いか",
            Allergen::SalmonRoe => "いくら",
            Allergen::Orange => "オレンジ",
            Allergen::Beef => "牛肉",
            Allergen::Cashew => "カシューナッツ",
            Allergen::Kiwi => "キウイフルーツ",
            Allergen::Sesame => "ごま",
            Allergen::Salmon => "さけ",
            Allergen::Mackerel => "さば",
            Allergen::Soybean => "大豆",
            Allergen::Chicken => "鶏肉",
            Allergen::Pork => "豚肉",
            Allergen::Banana => "バナナ",
            Allergen::Peach => "もも",
            Allergen::Yam => "やまいも",
            Allergen::Apple => "りんご",
            Allergen::Gelatin => "ゼラチン",
            Allergen::Macadamia => "マカダミアナッツ",
        }
    }
}

/// How strongly the optimizer consolidates cooking into batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BatchCookingLevel {
    Small,
    #[default]
    Normal,
    Large,
}

impl BatchCookingLevel {
    /// Objective weight on the number of cooking events.
    pub fn cooking_weight(self) -> f64 {
        match self {
            BatchCookingLevel::Small => 0.01,
            BatchCookingLevel::Normal => 0.05,
            BatchCookingLevel::Large => 0.2,
        }
    }
}

/// Overall portion volume; scales the energy-bearing daily targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VolumeLevel {
    Small,
    #[default]
    Normal,
    Large,
}

impl VolumeLevel {
    pub fn target_multiplier(self) -> f64 {
        match self {
            VolumeLevel::Small => 0.8,
            VolumeLevel::Normal => 1.0,
            VolumeLevel::Large => 1.2,
        }
    }
}

/// How much repetition across the plan is acceptable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum VarietyLevel {
    /// Batch-cooking first: the same dish may repeat freely within its
    /// shelf-life window.
    Small,
    #[default]
    Normal,
    /// Every dish at most once in the plan.
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum HouseholdType {
    #[default]
    Single,
    Couple,
    Family,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SchedulingMode {
    #[default]
    Classic,
    Staged,
}
