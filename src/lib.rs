//! kondate: nutrition-aware multi-day menu planning.
//!
//! The workspace splits into three crates re-exported here:
//! [`shared`] holds the nutrient model and closed enums, [`catalog`] the
//! dish entities and repository seam, and [`planner`] the optimizer itself
//! (full MIP, staged scheduler, fallbacks, shopping list).

pub use kondate_catalog as catalog;
pub use kondate_planner as planner;
pub use kondate_shared as shared;
