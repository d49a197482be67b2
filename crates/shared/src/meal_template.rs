use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::types::{DishCategory, MealType, VolumeLevel};

/// Allowed dish count for one category within one meal, inclusive on both
/// ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRange {
    pub min: u32,
    pub max: u32,
}

impl CategoryRange {
    pub const fn new(min: u32, max: u32) -> Self {
        CategoryRange { min, max }
    }
}

/// Named meal volume presets, each expanding to a category count table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealPreset {
    /// Staple only.
    Minimal,
    /// Staple + main.
    Light,
    /// Staple + main + side.
    Standard,
    /// Staple + main + side(s) + soup, optional dessert.
    Full,
    /// Ichiju-sansai: staple + main + 2-3 sides + soup.
    Japanese,
}

/// A map from dish category to its allowed count range, governing a single
/// meal on a single day. Categories absent from the map are unconstrained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MealTemplate(BTreeMap<DishCategory, CategoryRange>);

impl MealTemplate {
    pub fn new(ranges: impl IntoIterator<Item = (DishCategory, CategoryRange)>) -> Self {
        MealTemplate(ranges.into_iter().collect())
    }

    pub fn range_for(&self, category: DishCategory) -> Option<CategoryRange> {
        self.0.get(&category).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (DishCategory, CategoryRange)> + '_ {
        self.0.iter().map(|(c, r)| (*c, *r))
    }

    /// Default template for the given meal: a light breakfast, a standard
    /// lunch and a fuller dinner.
    pub fn default_for(meal: MealType) -> Self {
        match meal {
            MealType::Breakfast => MealTemplate::new([
                (DishCategory::Staple, CategoryRange::new(1, 1)),
                (DishCategory::Main, CategoryRange::new(0, 1)),
                (DishCategory::Side, CategoryRange::new(0, 1)),
                (DishCategory::Soup, CategoryRange::new(0, 0)),
                (DishCategory::Dessert, CategoryRange::new(0, 0)),
            ]),
            MealType::Lunch => MealTemplate::new([
                (DishCategory::Staple, CategoryRange::new(1, 1)),
                (DishCategory::Main, CategoryRange::new(1, 1)),
                (DishCategory::Side, CategoryRange::new(0, 1)),
                (DishCategory::Soup, CategoryRange::new(0, 1)),
                (DishCategory::Dessert, CategoryRange::new(0, 0)),
            ]),
            MealType::Dinner => MealTemplate::new([
                (DishCategory::Staple, CategoryRange::new(1, 1)),
                (DishCategory::Main, CategoryRange::new(1, 1)),
                (DishCategory::Side, CategoryRange::new(1, 2)),
                (DishCategory::Soup, CategoryRange::new(0, 1)),
                (DishCategory::Dessert, CategoryRange::new(0, 0)),
            ]),
        }
    }

    /// A category absent from a template is unconstrained, so the presets
    /// spell out an explicit `(0, 0)` for every category they forbid.
    pub fn from_preset(preset: MealPreset) -> Self {
        match preset {
            MealPreset::Minimal => MealTemplate::new([
                (DishCategory::Staple, CategoryRange::new(1, 1)),
                (DishCategory::Main, CategoryRange::new(0, 0)),
                (DishCategory::Side, CategoryRange::new(0, 0)),
                (DishCategory::Soup, CategoryRange::new(0, 0)),
                (DishCategory::Dessert, CategoryRange::new(0, 0)),
            ]),
            MealPreset::Light => MealTemplate::new([
                (DishCategory::Staple, CategoryRange::new(1, 1)),
                (DishCategory::Main, CategoryRange::new(1, 1)),
                (DishCategory::Side, CategoryRange::new(0, 0)),
                (DishCategory::Soup, CategoryRange::new(0, 0)),
                (DishCategory::Dessert, CategoryRange::new(0, 0)),
            ]),
            MealPreset::Standard => MealTemplate::new([
                (DishCategory::Staple, CategoryRange::new(1, 1)),
                (DishCategory::Main, CategoryRange::new(1, 1)),
                (DishCategory::Side, CategoryRange::new(1, 1)),
                (DishCategory::Soup, CategoryRange::new(0, 1)),
                (DishCategory::Dessert, CategoryRange::new(0, 0)),
            ]),
            MealPreset::Full => MealTemplate::new([
                (DishCategory::Staple, CategoryRange::new(1, 1)),
                (DishCategory::Main, CategoryRange::new(1, 1)),
                (DishCategory::Side, CategoryRange::new(1, 2)),
                (DishCategory::Soup, CategoryRange::new(1, 1)),
                (DishCategory::Dessert, CategoryRange::new(0, 1)),
            ]),
            MealPreset::Japanese => MealTemplate::new([
                (DishCategory::Staple, CategoryRange::new(1, 1)),
                (DishCategory::Main, CategoryRange::new(1, 1)),
                (DishCategory::Side, CategoryRange::new(2, 3)),
                (DishCategory::Soup, CategoryRange::new(1, 1)),
            ]),
        }
    }

    /// Legacy volume aliases kept for request compatibility.
    pub fn from_volume(volume: VolumeLevel) -> Self {
        match volume {
            VolumeLevel::Small => MealTemplate::from_preset(MealPreset::Light),
            VolumeLevel::Normal => MealTemplate::from_preset(MealPreset::Standard),
            VolumeLevel::Large => MealTemplate::from_preset(MealPreset::Full),
        }
    }
}

/// Per-meal settings: enabled flag plus the category template. A named
/// preset may be given instead of (or on top of) an explicit template; the
/// preset wins once the settings are resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealSetting {
    pub enabled: bool,
    #[serde(default)]
    pub preset: Option<MealPreset>,
    pub template: MealTemplate,
}

impl MealSetting {
    pub fn enabled_with(template: MealTemplate) -> Self {
        MealSetting {
            enabled: true,
            preset: None,
            template,
        }
    }

    pub fn from_preset(preset: MealPreset) -> Self {
        MealSetting {
            enabled: true,
            preset: Some(preset),
            template: MealTemplate::from_preset(preset),
        }
    }

    pub fn disabled() -> Self {
        MealSetting {
            enabled: false,
            preset: None,
            template: MealTemplate::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealSettings {
    pub breakfast: MealSetting,
    pub lunch: MealSetting,
    pub dinner: MealSetting,
}

impl Default for MealSettings {
    fn default() -> Self {
        MealSettings {
            breakfast: MealSetting::enabled_with(MealTemplate::default_for(MealType::Breakfast)),
            lunch: MealSetting::enabled_with(MealTemplate::default_for(MealType::Lunch)),
            dinner: MealSetting::enabled_with(MealTemplate::default_for(MealType::Dinner)),
        }
    }
}

impl MealSettings {
    pub fn get(&self, meal: MealType) -> &MealSetting {
        match meal {
            MealType::Breakfast => &self.breakfast,
            MealType::Lunch => &self.lunch,
            MealType::Dinner => &self.dinner,
        }
    }

    pub fn get_mut(&mut self, meal: MealType) -> &mut MealSetting {
        match meal {
            MealType::Breakfast => &mut self.breakfast,
            MealType::Lunch => &mut self.lunch,
            MealType::Dinner => &mut self.dinner,
        }
    }

    /// Enabled meals in day order.
    pub fn enabled_meals(&self) -> Vec<MealType> {
        [MealType::Breakfast, MealType::Lunch, MealType::Dinner]
            .into_iter()
            .filter(|m| self.get(*m).enabled)
            .collect()
    }

    /// Expand any named presets into their category tables, so downstream
    /// code can read `template` alone.
    pub fn resolved(&self) -> MealSettings {
        let resolve = |setting: &MealSetting| match setting.preset {
            Some(preset) => MealSetting {
                enabled: setting.enabled,
                preset: Some(preset),
                template: MealTemplate::from_preset(preset),
            },
            None => setting.clone(),
        };
        MealSettings {
            breakfast: resolve(&self.breakfast),
            lunch: resolve(&self.lunch),
            dinner: resolve(&self.dinner),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_templates_require_a_staple() {
        for meal in [MealType::Breakfast, MealType::Lunch, MealType::Dinner] {
            let range = MealTemplate::default_for(meal)
                .range_for(DishCategory::Staple)
                .unwrap();
            assert_eq!(range.min, 1);
            assert_eq!(range.max, 1);
        }
    }

    #[test]
    fn test_breakfast_main_is_optional() {
        let range = MealTemplate::default_for(MealType::Breakfast)
            .range_for(DishCategory::Main)
            .unwrap();
        assert_eq!(range.min, 0);
    }

    #[test]
    fn test_presets() {
        // Forbidden categories are pinned to (0, 0), not left open.
        let minimal = MealTemplate::from_preset(MealPreset::Minimal);
        assert_eq!(minimal.range_for(DishCategory::Staple).unwrap().min, 1);
        for category in [
            DishCategory::Main,
            DishCategory::Side,
            DishCategory::Soup,
            DishCategory::Dessert,
        ] {
            let range = minimal.range_for(category).unwrap();
            assert_eq!((range.min, range.max), (0, 0), "{category} must be pinned");
        }

        let light = MealTemplate::from_preset(MealPreset::Light);
        assert_eq!(light.range_for(DishCategory::Main).unwrap().max, 1);
        assert_eq!(light.range_for(DishCategory::Side).unwrap().max, 0);

        let standard = MealTemplate::from_preset(MealPreset::Standard);
        assert_eq!(standard.range_for(DishCategory::Dessert).unwrap().max, 0);

        let japanese = MealTemplate::from_preset(MealPreset::Japanese);
        let sides = japanese.range_for(DishCategory::Side).unwrap();
        assert_eq!((sides.min, sides.max), (2, 3));
        assert_eq!(japanese.range_for(DishCategory::Soup).unwrap().min, 1);

        let full = MealTemplate::from_volume(VolumeLevel::Large);
        assert_eq!(full.range_for(DishCategory::Soup).unwrap().min, 1);
    }

    #[test]
    fn test_enabled_meals_skips_disabled() {
        let mut settings = MealSettings::default();
        settings.breakfast = MealSetting::disabled();
        assert_eq!(
            settings.enabled_meals(),
            vec![MealType::Lunch, MealType::Dinner]
        );
    }

    #[test]
    fn test_resolved_expands_presets() {
        let mut settings = MealSettings::default();
        settings.breakfast.preset = Some(MealPreset::Minimal);

        let resolved = settings.resolved();
        let breakfast = &resolved.breakfast.template;
        assert_eq!(
            breakfast.range_for(DishCategory::Main).map(|r| (r.min, r.max)),
            Some((0, 0))
        );
        // Meals without a preset keep their explicit template.
        assert_eq!(resolved.lunch.template, settings.lunch.template);
    }

    #[test]
    fn test_setting_from_preset() {
        let setting = MealSetting::from_preset(MealPreset::Japanese);
        assert!(setting.enabled);
        assert_eq!(
            setting.template.range_for(DishCategory::Side).unwrap().min,
            2
        );
    }
}
