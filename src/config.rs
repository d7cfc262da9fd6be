//! Scheduler configuration.
//!
//! The festival layout defaults to the 2025 summer festival and can be
//! replaced by a JSON file; paths, solver chain and logging come from the
//! environment.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};
use crate::schedule::{BackendKind, SlotGrid};

/// One festival day and its number of timed slots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayConfig {
    pub date: NaiveDate,
    pub slots: u8,
}

/// Static festival layout, loadable from JSON
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FestivalConfig {
    pub festival: String,
    pub venue: String,
    /// Year used for sheet dates written without one ("8月11日")
    pub year: i32,
    pub days: Vec<DayConfig>,
}

impl Default for FestivalConfig {
    fn default() -> Self {
        let day = |d, slots| DayConfig {
            date: NaiveDate::from_ymd_opt(2025, 8, d).expect("valid festival date"),
            slots,
        };
        FestivalConfig {
            festival: "笙伙2025SummerFest".to_string(),
            venue: "Modern Sky Lab Kunming".to_string(),
            year: 2025,
            days: vec![day(11, 7), day(12, 6), day(13, 6)],
        }
    }
}

impl FestivalConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: FestivalConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.days.is_empty() {
            return Err(ScheduleError::Config(
                "festival needs at least one day".to_string(),
            ));
        }
        self.grid().map(|_| ())
    }

    /// Builds the empty slot grid for this festival.
    pub fn grid(&self) -> Result<SlotGrid> {
        let layout: Vec<(NaiveDate, u8)> = self.days.iter().map(|d| (d.date, d.slots)).collect();
        SlotGrid::new(&layout)
    }
}

/// Full process configuration
#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub festival: FestivalConfig,

    /// Preference sheet (CSV).
    pub csv_path: PathBuf,

    /// Rendered schedule output.
    pub output_path: PathBuf,

    /// Optional JSON dump of the final grid.
    pub json_output_path: Option<PathBuf>,

    /// Assignment backends in the order they are tried.
    pub backends: Vec<BackendKind>,

    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines.
    pub log_json: bool,
}

impl SchedulerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let festival = match std::env::var("BAND_SCHEDULER_CONFIG") {
            Ok(path) => FestivalConfig::from_json_file(Path::new(&path))?,
            Err(_) => FestivalConfig::default(),
        };

        let csv_path = std::env::var("BAND_SCHEDULER_CSV")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("CollectedPrefs.csv"));

        let output_path = std::env::var("BAND_SCHEDULER_OUTPUT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("schedule.txt"));

        let json_output_path = std::env::var("BAND_SCHEDULER_JSON_OUTPUT")
            .ok()
            .map(PathBuf::from);

        let backends = match std::env::var("BAND_SCHEDULER_BACKENDS") {
            Ok(list) => parse_backends(&list)?,
            Err(_) => vec![BackendKind::Hungarian, BackendKind::LinearProgram],
        };

        let log_level =
            std::env::var("BAND_SCHEDULER_LOG").unwrap_or_else(|_| "info".to_string());

        let log_json = std::env::var("BAND_SCHEDULER_LOG_JSON")
            .map(|v| v == "1" || v.to_lowercase() == "true")
            .unwrap_or(false);

        Ok(Self {
            festival,
            csv_path,
            output_path,
            json_output_path,
            backends,
            log_level,
            log_json,
        })
    }
}

/// Parses a comma separated backend list such as `hungarian,lp`.
pub fn parse_backends(list: &str) -> Result<Vec<BackendKind>> {
    let backends = list
        .split(',')
        .filter(|s| !s.trim().is_empty())
        .map(str::parse)
        .collect::<Result<Vec<BackendKind>>>()?;
    if backends.is_empty() {
        return Err(ScheduleError::Config(
            "BAND_SCHEDULER_BACKENDS names no backend".to_string(),
        ));
    }
    Ok(backends)
}
