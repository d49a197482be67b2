use thiserror::Error;

use kondate_catalog::CatalogError;

/// Errors the planner surfaces to its caller. Solver failures never appear
/// here: they degrade to the fallback chain and ultimately to a `None` plan.
#[derive(Error, Debug)]
pub enum PlanningError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("dish catalog error: {0}")]
    Catalog(#[from] CatalogError),
}
