//! Error types for the band scheduler.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while loading input, building the grid or validating it.
///
/// Solver unavailability is not one of these: the assignment stage reports
/// it as `AssignmentResult::Unavailable`.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader or writer error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON config or output error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration value.
    #[error("config error: {0}")]
    Config(String),

    /// Two grid days share the same date.
    #[error("duplicate day in grid: {0}")]
    DuplicateDay(NaiveDate),

    /// A band supplied more ranked preferences than are weighted.
    #[error("band {band} has {count} preferences, at most {max} are allowed")]
    TooManyPreferences {
        band: String,
        count: usize,
        max: usize,
    },

    /// A preference rank is past the weighted ranks or not after the
    /// previous one.
    #[error("band {band} has a preference at rank {rank}, ranks must increase and stay below {max}")]
    PreferenceRank {
        band: String,
        rank: usize,
        max: usize,
    },

    /// A grid or assignment invariant does not hold.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
