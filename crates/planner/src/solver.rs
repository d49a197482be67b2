use std::time::{Duration, Instant};

use good_lp::{Constraint, Expression, ProblemVariables, ResolutionError, Solution, SolverModel};
use thiserror::Error;

/// Backend knobs. The bundled pure-Rust backend (microlp) exposes neither a
/// time limit nor a relative-gap stop, so both are best-effort: the adapter
/// records wall-clock time and warns when a solve overran the budget.
#[derive(Debug, Clone)]
pub struct SolverConfig {
    pub time_limit: Duration,
    pub gap_rel: Option<f64>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            time_limit: Duration::from_secs(30),
            gap_rel: Some(0.35),
        }
    }
}

#[derive(Error, Debug)]
pub enum SolverError {
    #[error("model is infeasible")]
    Infeasible,
    #[error("model is unbounded")]
    Unbounded,
    #[error("solver backend failure: {0}")]
    Backend(String),
}

/// Minimize `objective` subject to `constraints`. Panics never escape the
/// backend: every failure maps onto [`SolverError`] so the orchestrator can
/// fall through to the next strategy.
pub(crate) fn minimize(
    vars: ProblemVariables,
    objective: Expression,
    constraints: Vec<Constraint>,
    config: &SolverConfig,
) -> Result<impl Solution, SolverError> {
    let started = Instant::now();
    let mut model = vars.minimise(objective).using(good_lp::default_solver);
    for constraint in constraints {
        model.add_constraint(constraint);
    }

    let outcome = model.solve();
    let elapsed = started.elapsed();
    if elapsed > config.time_limit {
        tracing::warn!(
            elapsed_ms = elapsed.as_millis() as u64,
            limit_ms = config.time_limit.as_millis() as u64,
            "solve exceeded the configured time budget"
        );
    } else {
        tracing::debug!(elapsed_ms = elapsed.as_millis() as u64, "solve finished");
    }

    match outcome {
        Ok(solution) => Ok(solution),
        Err(ResolutionError::Infeasible) => Err(SolverError::Infeasible),
        Err(ResolutionError::Unbounded) => Err(SolverError::Unbounded),
        Err(other) => Err(SolverError::Backend(other.to_string())),
    }
}

/// Sum a collection of variables into an expression.
pub(crate) fn sum_vars(vars: impl IntoIterator<Item = good_lp::Variable>) -> Expression {
    vars.into_iter().map(Expression::from).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use good_lp::{constraint, variable, variables};

    #[test]
    fn test_minimize_simple_lp() {
        let mut vars = variables!();
        let x = vars.add(variable().min(0.0));
        let y = vars.add(variable().min(0.0));
        let objective: Expression = x + y;
        let constraints = vec![constraint!(x + y * 2.0 >= 4.0), constraint!(x >= 1.0)];
        let config = SolverConfig::default();
        let solution = minimize(vars, objective, constraints, &config).unwrap();
        assert!(solution.value(x) >= 1.0 - 1e-6);
        assert!(solution.value(x) + 2.0 * solution.value(y) >= 4.0 - 1e-6);
    }

    #[test]
    fn test_integer_variables() {
        let mut vars = variables!();
        let n = vars.add(variable().integer().min(0.0).max(10.0));
        let objective: Expression = Expression::from(n);
        let constraints = vec![constraint!(n >= 2.5)];
        let config = SolverConfig::default();
        let solution = minimize(vars, objective, constraints, &config).unwrap();
        let value = solution.value(n);
        assert!((value - 3.0).abs() < 1e-6, "expected 3, got {value}");
    }

    #[test]
    fn test_infeasible_maps_to_error() {
        let mut vars = variables!();
        let x = vars.add(variable().min(0.0).max(1.0));
        let objective: Expression = Expression::from(x);
        let constraints = vec![constraint!(x >= 2.0)];
        let config = SolverConfig::default();
        let result = minimize(vars, objective, constraints, &config);
        assert!(matches!(result, Err(SolverError::Infeasible)));
    }
}
