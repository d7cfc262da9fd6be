use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use super::grid::{Candidacy, SlotGrid, SlotRef};
use super::hungarian::Hungarian;
use super::lp::LinearProgram;
use super::types::{Band, BandId};
use crate::error::ScheduleError;

/// A candidacy as an edge of the band/slot bipartite graph
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub band: usize,
    pub slot: usize,
    pub weight: u32,
}

/// The weighted bipartite graph extracted from a grid. A band listed more
/// than once on the same slot yields a single edge with its best weight.
#[derive(Debug, Clone)]
pub struct AssignmentProblem {
    pub bands: Vec<Arc<Band>>,
    pub slots: Vec<SlotRef>,
    pub edges: Vec<Edge>,
}

impl AssignmentProblem {
    pub fn from_grid(grid: &SlotGrid) -> Self {
        let slots = grid.slot_refs();
        let mut bands: Vec<Arc<Band>> = Vec::new();
        let mut band_index: HashMap<BandId, usize> = HashMap::new();
        let mut edges: Vec<Edge> = Vec::new();
        let mut edge_index: HashMap<(usize, usize), usize> = HashMap::new();

        for (s, at) in slots.iter().enumerate() {
            for c in &grid.slot(*at).candidacies {
                let band = *band_index.entry(c.band.id.clone()).or_insert_with(|| {
                    bands.push(Arc::clone(&c.band));
                    bands.len() - 1
                });
                match edge_index.get(&(band, s)) {
                    Some(&e) => edges[e].weight = edges[e].weight.max(c.weight),
                    None => {
                        edge_index.insert((band, s), edges.len());
                        edges.push(Edge {
                            band,
                            slot: s,
                            weight: c.weight,
                        });
                    }
                }
            }
        }

        AssignmentProblem {
            bands,
            slots,
            edges,
        }
    }

    /// Total weight of a matching given as edge indices.
    pub fn weight_of(&self, matching: &[usize]) -> u64 {
        matching
            .iter()
            .map(|&e| u64::from(self.edges[e].weight))
            .sum()
    }

    /// Checks that a matching uses known edges, and at most one edge per band
    /// and per slot.
    pub fn check(&self, matching: &[usize]) -> Result<(), BackendError> {
        let mut bands = HashSet::new();
        let mut slots = HashSet::new();
        for &e in matching {
            let edge = self.edges.get(e).ok_or_else(|| {
                BackendError::Infeasible(format!("unknown candidacy index {e}"))
            })?;
            if !bands.insert(edge.band) {
                return Err(BackendError::Infeasible(format!(
                    "band {} assigned twice",
                    self.bands[edge.band].id
                )));
            }
            if !slots.insert(edge.slot) {
                return Err(BackendError::Infeasible(format!(
                    "slot {:?} assigned twice",
                    self.slots[edge.slot]
                )));
            }
        }
        Ok(())
    }
}

/// Failure of a single backend
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    /// The underlying solver reported an error or no solution.
    #[error("solver failed: {0}")]
    Solver(String),

    /// The backend returned a matching that breaks a constraint.
    #[error("infeasible matching: {0}")]
    Infeasible(String),
}

/// An exact maximum-weight assignment algorithm. Returns the indices of the
/// chosen edges.
pub trait AssignmentBackend {
    fn name(&self) -> &'static str;

    fn solve(&self, problem: &AssignmentProblem) -> Result<Vec<usize>, BackendError>;
}

pub type DynBackend = Box<dyn AssignmentBackend + Send + Sync>;

/// Built-in backends, selectable by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Hungarian,
    LinearProgram,
}

impl BackendKind {
    pub fn backend(self) -> DynBackend {
        match self {
            BackendKind::Hungarian => Box::new(Hungarian),
            BackendKind::LinearProgram => Box::new(LinearProgram),
        }
    }
}

impl FromStr for BackendKind {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hungarian" => Ok(BackendKind::Hungarian),
            "lp" | "linear_program" | "ilp" => Ok(BackendKind::LinearProgram),
            other => Err(ScheduleError::Config(format!("unknown solver backend: {other}"))),
        }
    }
}

/// A backend that was tried and gave no usable answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendFailure {
    pub backend: &'static str,
    pub error: BackendError,
}

impl fmt::Display for BackendFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.backend, self.error)
    }
}

/// Output of the optimal assignment stage
#[derive(Debug, Clone)]
pub enum AssignmentResult {
    /// Every slot holds at most one candidacy, the winner at its weight.
    Solved {
        grid: SlotGrid,
        total_weight: u64,
        backend: &'static str,
    },
    /// No backend produced a feasible matching.
    Unavailable {
        reason: String,
        attempts: Vec<BackendFailure>,
    },
}

impl AssignmentResult {
    pub fn grid(&self) -> Option<&SlotGrid> {
        match self {
            AssignmentResult::Solved { grid, .. } => Some(grid),
            AssignmentResult::Unavailable { .. } => None,
        }
    }

    pub fn total_weight(&self) -> Option<u64> {
        match self {
            AssignmentResult::Solved { total_weight, .. } => Some(*total_weight),
            AssignmentResult::Unavailable { .. } => None,
        }
    }

    pub fn is_solved(&self) -> bool {
        matches!(self, AssignmentResult::Solved { .. })
    }
}

/// Exact assignment stage: tries each backend in order until one returns a
/// feasible matching.
pub struct Solver {
    backends: Vec<DynBackend>,
}

impl Default for Solver {
    fn default() -> Self {
        Solver::from_kinds(&[BackendKind::Hungarian, BackendKind::LinearProgram])
    }
}

impl Solver {
    pub fn with_backends(backends: Vec<DynBackend>) -> Self {
        Solver { backends }
    }

    pub fn from_kinds(kinds: &[BackendKind]) -> Self {
        Solver {
            backends: kinds.iter().map(|k| k.backend()).collect(),
        }
    }

    pub fn backend_names(&self) -> Vec<&'static str> {
        self.backends.iter().map(|b| b.name()).collect()
    }

    /// Solves the grid's candidacies as a maximum-weight assignment. The
    /// input grid is only read; the result carries its own snapshot.
    pub fn solve(&self, grid: &SlotGrid) -> AssignmentResult {
        let problem = AssignmentProblem::from_grid(grid);
        let mut attempts = Vec::new();

        for backend in &self.backends {
            match backend
                .solve(&problem)
                .and_then(|matching| build_assigned_grid(grid, &problem, matching))
            {
                Ok((assigned, total_weight)) => {
                    info!(
                        backend = backend.name(),
                        bands = problem.bands.len(),
                        candidacies = problem.edges.len(),
                        total_weight,
                        "Optimal assignment found"
                    );
                    return AssignmentResult::Solved {
                        grid: assigned,
                        total_weight,
                        backend: backend.name(),
                    };
                }
                Err(error) => {
                    warn!(backend = backend.name(), %error, "Assignment backend failed, trying next");
                    attempts.push(BackendFailure {
                        backend: backend.name(),
                        error,
                    });
                }
            }
        }

        let reason = if attempts.is_empty() {
            "no assignment backend configured".to_string()
        } else {
            format!(
                "all assignment backends failed: {}",
                attempts
                    .iter()
                    .map(|a| a.to_string())
                    .collect::<Vec<_>>()
                    .join("; ")
            )
        };
        warn!(%reason, "Optimal assignment unavailable");
        AssignmentResult::Unavailable { reason, attempts }
    }
}

/// Rewrites a snapshot of `grid` so each slot holds only its assigned band.
fn build_assigned_grid(
    grid: &SlotGrid,
    problem: &AssignmentProblem,
    matching: Vec<usize>,
) -> Result<(SlotGrid, u64), BackendError> {
    problem.check(&matching)?;

    let mut assigned = grid.snapshot();
    assigned.clear_candidacies();
    for &e in &matching {
        let edge = problem.edges[e];
        assigned
            .slot_mut(problem.slots[edge.slot])
            .candidacies
            .push(Candidacy {
                band: Arc::clone(&problem.bands[edge.band]),
                weight: edge.weight,
            });
    }
    assigned
        .validate_assignment()
        .map_err(|e| BackendError::Infeasible(e.to_string()))?;

    Ok((assigned, problem.weight_of(&matching)))
}

/// Runs the default backend chain on `grid`.
pub fn solve_optimal(grid: &SlotGrid) -> AssignmentResult {
    Solver::default().solve(grid)
}
