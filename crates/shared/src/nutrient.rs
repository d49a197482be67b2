use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

use crate::types::VolumeLevel;

/// Fraction of a lower-bound target that counts as satisfied inside the
/// optimizer. Constraint minima are scaled by this so that 80% of the
/// recommended intake does not accrue a deficit penalty.
pub const SATURATION_THRESHOLD: f64 = 0.8;

/// Penalty applied to the "bad" direction of a deviation (undershooting a
/// lower-bound nutrient, overshooting sodium).
pub const UNDER_PENALTY: f64 = 10.0;

/// Penalty applied to the harmless direction of a deviation.
pub const OVER_PENALTY: f64 = 1.0;

/// Penalty applied when a nutrient with a tolerable upper limit exceeds it.
pub const UPPER_LIMIT_PENALTY: f64 = 20.0;

/// The 24 nutrients tracked per dish serving and per daily target.
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
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Nutrient {
    Calories,
    Protein,
    Fat,
    Carbohydrate,
    Fiber,
    Sodium,
    Potassium,
    Calcium,
    Magnesium,
    Iron,
    Zinc,
    VitaminA,
    VitaminD,
    VitaminE,
    VitaminK,
    VitaminB1,
    VitaminB2,
    VitaminB6,
    VitaminB12,
    Niacin,
    PantothenicAcid,
    Biotin,
    Folate,
    VitaminC,
}

/// How a nutrient participates in the optimization objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NutrientGroup {
    /// `x >= min` is the goal; undershoot is penalized heavily, overshoot
    /// lightly (or with [`UPPER_LIMIT_PENALTY`] past a tolerable upper limit).
    LowerBound,
    /// `x <= max` is the goal (sodium); overshoot is penalized heavily.
    UpperTarget,
    /// `min <= x <= max`; both sides penalized equally.
    Range,
}

impl Nutrient {
    pub const COUNT: usize = 24;

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// Optimization weight. Higher means deviations on this nutrient cost
    /// more relative to the others.
    pub fn weight(self) -> f64 {
        match self {
            Nutrient::Protein | Nutrient::VitaminD => 1.5,
            Nutrient::Iron | Nutrient::VitaminB12 => 1.3,
            Nutrient::Fiber
            | Nutrient::Calcium
            | Nutrient::VitaminB1
            | Nutrient::VitaminB2
            | Nutrient::Folate => 1.2,
            Nutrient::Sodium
            | Nutrient::VitaminE
            | Nutrient::VitaminK
            | Nutrient::PantothenicAcid
            | Nutrient::Biotin => 0.8,
            _ => 1.0,
        }
    }

    pub fn group(self) -> NutrientGroup {
        match self {
            Nutrient::Sodium => NutrientGroup::UpperTarget,
            Nutrient::Calories | Nutrient::Fat | Nutrient::Carbohydrate => NutrientGroup::Range,
            _ => NutrientGroup::LowerBound,
        }
    }

    /// Tolerable-upper-intake ratio over the recommended intake. Only the
    /// nutrients with a meaningful UL at dietary scale carry one.
    pub fn upper_limit_ratio(self) -> Option<f64> {
        match self {
            Nutrient::VitaminA => Some(3.5),
            Nutrient::VitaminD => Some(11.8),
            Nutrient::Iron => Some(4.4),
            Nutrient::Zinc => Some(4.0),
            Nutrient::Folate => Some(3.75),
            _ => None,
        }
    }

    /// Japanese display name used in warning messages and the CLI.
    pub fn display_name_ja(self) -> &'static str {
        match self {
            Nutrient::Calories => "カロリー",
            Nutrient::Protein => "たんぱく質",
            Nutrient::Fat => "脂質",
            Nutrient::Carbohydrate => "炭水化物",
            Nutrient::Fiber => "食物繊維",
            Nutrient::Sodium => "ナトリウム",
            Nutrient::Potassium => "カリウム",
            Nutrient::Calcium => "カルシウム",
            Nutrient::Magnesium => "マグネシウム",
            Nutrient::Iron => "鉄分",
            Nutrient::Zinc => "亜鉛",
            Nutrient::VitaminA => "ビタミンA",
            Nutrient::VitaminD => "ビタミンD",
            Nutrient::VitaminE => "ビタミンE",
            Nutrient::VitaminK => "ビタミンK",
            Nutrient::VitaminB1 => "ビタミンB1",
            Nutrient::VitaminB2 => "ビタミンB2",
            Nutrient::VitaminB6 => "ビタミンB6",
            Nutrient::VitaminB12 => "ビタミンB12",
            Nutrient::Niacin => "ナイアシン",
            Nutrient::PantothenicAcid => "パントテン酸",
            Nutrient::Biotin => "ビオチン",
            Nutrient::Folate => "葉酸",
            Nutrient::VitaminC => "ビタミンC",
        }
    }
}

/// A dense per-nutrient value vector. Serializes as a map keyed by the
/// snake_case nutrient names so catalog JSON stays readable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<Nutrient, f64>", into = "BTreeMap<Nutrient, f64>")]
pub struct NutrientVector {
    values: [f64; Nutrient::COUNT],
}

impl Default for NutrientVector {
    fn default() -> Self {
        NutrientVector {
            values: [0.0; Nutrient::COUNT],
        }
    }
}

impl NutrientVector {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn get(&self, nutrient: Nutrient) -> f64 {
        self.values[nutrient.index()]
    }

    pub fn set(&mut self, nutrient: Nutrient, value: f64) {
        self.values[nutrient.index()] = value;
    }

    pub fn add(&mut self, nutrient: Nutrient, delta: f64) {
        self.values[nutrient.index()] += delta;
    }

    /// `self += other * factor` across all nutrients.
    pub fn add_scaled(&mut self, other: &NutrientVector, factor: f64) {
        for i in 0..Nutrient::COUNT {
            self.values[i] += other.values[i] * factor;
        }
    }

    pub fn scaled(&self, factor: f64) -> NutrientVector {
        let mut out = self.clone();
        for v in &mut out.values {
            *v *= factor;
        }
        out
    }

    pub fn iter(&self) -> impl Iterator<Item = (Nutrient, f64)> + '_ {
        Nutrient::iter().map(|n| (n, self.get(n)))
    }

    pub fn has_negative(&self) -> bool {
        self.values.iter().any(|v| *v < 0.0)
    }
}

impl From<BTreeMap<Nutrient, f64>> for NutrientVector {
    fn from(map: BTreeMap<Nutrient, f64>) -> Self {
        let mut out = NutrientVector::zero();
        for (n, v) in map {
            out.set(n, v);
        }
        out
    }
}

impl From<NutrientVector> for BTreeMap<Nutrient, f64> {
    fn from(vec: NutrientVector) -> Self {
        vec.iter().filter(|(_, v)| *v != 0.0).collect()
    }
}

/// Daily per-person nutrient targets.
///
/// Defaults follow the Japanese dietary reference intakes (2020 edition),
/// averaged over adult men and women aged 18-64.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NutrientTarget {
    pub calories_min: f64,
    pub calories_max: f64,
    pub protein_min: f64,
    pub fat_min: f64,
    pub fat_max: f64,
    pub carbohydrate_min: f64,
    pub carbohydrate_max: f64,
    pub fiber_min: f64,
    /// mg, roughly 7.5 g of salt
    pub sodium_max: f64,
    pub potassium_min: f64,
    pub calcium_min: f64,
    pub magnesium_min: f64,
    pub iron_min: f64,
    pub zinc_min: f64,
    pub vitamin_a_min: f64,
    pub vitamin_d_min: f64,
    pub vitamin_e_min: f64,
    pub vitamin_k_min: f64,
    pub vitamin_b1_min: f64,
    pub vitamin_b2_min: f64,
    pub vitamin_b6_min: f64,
    pub vitamin_b12_min: f64,
    pub niacin_min: f64,
    pub pantothenic_acid_min: f64,
    pub biotin_min: f64,
    pub folate_min: f64,
    pub vitamin_c_min: f64,
}

impl Default for NutrientTarget {
    fn default() -> Self {
        NutrientTarget {
            calories_min: 1800.0,
            calories_max: 2200.0,
            protein_min: 58.0,
            fat_min: 50.0,
            fat_max: 80.0,
            carbohydrate_min: 250.0,
            carbohydrate_max: 350.0,
            fiber_min: 20.0,
            sodium_max: 2500.0,
            potassium_min: 2500.0,
            calcium_min: 700.0,
            magnesium_min: 320.0,
            iron_min: 9.0,
            zinc_min: 10.0,
            vitamin_a_min: 775.0,
            vitamin_d_min: 8.5,
            vitamin_e_min: 6.0,
            vitamin_k_min: 150.0,
            vitamin_b1_min: 1.2,
            vitamin_b2_min: 1.4,
            vitamin_b6_min: 1.3,
            vitamin_b12_min: 2.4,
            niacin_min: 13.5,
            pantothenic_acid_min: 5.5,
            biotin_min: 50.0,
            folate_min: 240.0,
            vitamin_c_min: 100.0,
        }
    }
}

impl NutrientTarget {
    /// Lower target, if the nutrient has one. Sodium does not.
    pub fn min_for(&self, nutrient: Nutrient) -> Option<f64> {
        match nutrient {
            Nutrient::Calories => Some(self.calories_min),
            Nutrient::Protein => Some(self.protein_min),
            Nutrient::Fat => Some(self.fat_min),
            Nutrient::Carbohydrate => Some(self.carbohydrate_min),
            Nutrient::Fiber => Some(self.fiber_min),
            Nutrient::Sodium => None,
            Nutrient::Potassium => Some(self.potassium_min),
            Nutrient::Calcium => Some(self.calcium_min),
            Nutrient::Magnesium => Some(self.magnesium_min),
            Nutrient::Iron => Some(self.iron_min),
            Nutrient::Zinc => Some(self.zinc_min),
            Nutrient::VitaminA => Some(self.vitamin_a_min),
            Nutrient::VitaminD => Some(self.vitamin_d_min),
            Nutrient::VitaminE => Some(self.vitamin_e_min),
            Nutrient::VitaminK => Some(self.vitamin_k_min),
            Nutrient::VitaminB1 => Some(self.vitamin_b1_min),
            Nutrient::VitaminB2 => Some(self.vitamin_b2_min),
            Nutrient::VitaminB6 => Some(self.vitamin_b6_min),
            Nutrient::VitaminB12 => Some(self.vitamin_b12_min),
            Nutrient::Niacin => Some(self.niacin_min),
            Nutrient::PantothenicAcid => Some(self.pantothenic_acid_min),
            Nutrient::Biotin => Some(self.biotin_min),
            Nutrient::Folate => Some(self.folate_min),
            Nutrient::VitaminC => Some(self.vitamin_c_min),
        }
    }

    /// Upper target, if the nutrient has one. Only the range group and
    /// sodium carry an explicit upper value.
    pub fn max_for(&self, nutrient: Nutrient) -> Option<f64> {
        match nutrient {
            Nutrient::Calories => Some(self.calories_max),
            Nutrient::Fat => Some(self.fat_max),
            Nutrient::Carbohydrate => Some(self.carbohydrate_max),
            Nutrient::Sodium => Some(self.sodium_max),
            _ => None,
        }
    }

    /// Value against which the achievement rate is computed: the lower
    /// target for most nutrients, the upper target for sodium.
    pub fn reference_for(&self, nutrient: Nutrient) -> f64 {
        match nutrient {
            Nutrient::Sodium => self.sodium_max,
            _ => self.min_for(nutrient).unwrap_or(0.0),
        }
    }

    /// Scale the energy-bearing targets by the volume level multiplier.
    /// Micronutrient targets are left unchanged.
    pub fn scaled_for_volume(&self, level: VolumeLevel) -> NutrientTarget {
        let mult = level.target_multiplier();
        if mult == 1.0 {
            return self.clone();
        }
        NutrientTarget {
            calories_min: self.calories_min * mult,
            calories_max: self.calories_max * mult,
            protein_min: self.protein_min * mult,
            fat_min: self.fat_min * mult,
            fat_max: self.fat_max * mult,
            carbohydrate_min: self.carbohydrate_min * mult,
            carbohydrate_max: self.carbohydrate_max * mult,
            fiber_min: self.fiber_min * mult,
            sodium_max: self.sodium_max * mult,
            ..self.clone()
        }
    }
}
