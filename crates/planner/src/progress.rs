use serde::{Deserialize, Serialize};

/// Phase boundaries reported to the optional progress callback. Hosts that
/// stream progress map these onto their own percentage scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizePhase {
    FilteringNutrients,
    FilteringDishes,
    BuildingModel,
    ApplyingConstraints,
    Solving,
    Finalizing,
}

/// Thin wrapper so call sites can report unconditionally.
#[derive(Clone, Copy)]
pub(crate) struct Progress<'a> {
    callback: Option<&'a dyn Fn(OptimizePhase)>,
}

impl<'a> Progress<'a> {
    pub(crate) fn new(callback: Option<&'a dyn Fn(OptimizePhase)>) -> Self {
        Progress { callback }
    }

    pub(crate) fn report(&self, phase: OptimizePhase) {
        if let Some(cb) = self.callback {
            cb(phase);
        }
    }
}
