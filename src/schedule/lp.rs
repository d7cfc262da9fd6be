use std::collections::HashMap;

use good_lp::{
    constraint, default_solver, variable, Expression, ProblemVariables, Solution, SolverModel,
    Variable,
};
use tracing::trace;

use super::assignment::{AssignmentBackend, AssignmentProblem, BackendError};

/// Integer program backend: one binary variable per candidacy, at most one
/// per band and per slot, maximising the assigned weight. Solved with the
/// pure-Rust microlp solver through `good_lp`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearProgram;

impl AssignmentBackend for LinearProgram {
    fn name(&self) -> &'static str {
        "linear_program"
    }

    fn solve(&self, problem: &AssignmentProblem) -> Result<Vec<usize>, BackendError> {
        if problem.edges.is_empty() {
            return Ok(Vec::new());
        }

        let mut vars = ProblemVariables::new();
        let x: Vec<Variable> = problem
            .edges
            .iter()
            .map(|_| vars.add(variable().binary()))
            .collect();

        let objective: Expression = problem
            .edges
            .iter()
            .zip(&x)
            .map(|(edge, var)| f64::from(edge.weight) * *var)
            .sum();

        let mut by_band: HashMap<usize, Vec<Variable>> = HashMap::new();
        let mut by_slot: HashMap<usize, Vec<Variable>> = HashMap::new();
        for (edge, var) in problem.edges.iter().zip(&x) {
            by_band.entry(edge.band).or_default().push(*var);
            by_slot.entry(edge.slot).or_default().push(*var);
        }

        let mut model = vars.maximise(objective).using(default_solver);
        let mut constraints = 0;
        for group in by_band.values().chain(by_slot.values()) {
            if group.len() < 2 {
                continue;
            }
            let assigned: Expression = group.iter().copied().sum();
            model.add_constraint(constraint!(assigned <= 1));
            constraints += 1;
        }
        trace!(
            variables = x.len(),
            constraints,
            "Solving assignment integer program"
        );

        let solution = model
            .solve()
            .map_err(|e| BackendError::Solver(e.to_string()))?;

        Ok(x.iter()
            .enumerate()
            .filter(|(_, var)| solution.value(**var) > 0.5)
            .map(|(e, _)| e)
            .collect())
    }
}
