//! Festival band scheduler.
//!
//! Bands rank up to three `(day, slot)` preferences. The engine projects
//! those preferences onto a grid of festival slots, optionally prunes
//! dominated options, and solves the rest as a maximum-weight assignment so
//! every slot gets at most one band and every band at most one slot.

pub mod config;
pub mod display;
pub mod error;
pub mod parser;
pub mod schedule;

pub use error::{Result, ScheduleError};
