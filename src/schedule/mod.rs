pub mod types;
pub mod slot_utils;
pub mod grid;
pub mod projection;
pub mod reduction;
pub mod assignment;
pub mod hungarian;
pub mod lp;

pub use types::{Band, BandId, Preference, SlotChoice, MAX_PREFERENCES};
pub use slot_utils::{format_slot, parse_slot_token};
pub use grid::{Candidacy, Day, Slot, SlotGrid, SlotRef};
pub use projection::{project, ProjectionResult};
pub use reduction::{reduce, Reduction, UncontestedSlot};
pub use assignment::{
    solve_optimal, AssignmentBackend, AssignmentProblem, AssignmentResult, BackendError,
    BackendFailure, BackendKind, DynBackend, Solver,
};
