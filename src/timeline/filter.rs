//! Sub-category constraint filter

use crate::models::{Run, VariableConstraint};

/// True when the run selects the constrained value for every constraint.
/// A run that lacks a constrained variable does not satisfy it.
pub fn satisfies(run: &Run, constraints: &[VariableConstraint]) -> bool {
    constraints
        .iter()
        .all(|c| run.values.get(&c.variable_id) == Some(&c.value_id))
}

/// Runs satisfying every constraint, in their original order.
pub fn filter_runs<'a>(runs: &'a [Run], constraints: &[VariableConstraint]) -> Vec<&'a Run> {
    runs.iter().filter(|run| satisfies(run, constraints)).collect()
}
