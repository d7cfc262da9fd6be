use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScheduleError};

/// Number of ranked preferences a band may submit. The first ranked
/// preference is weighted with this value, each following one with one less.
pub const MAX_PREFERENCES: usize = 3;

/// Stable identifier of a band (the GUID column of the preference sheet)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BandId(pub String);

impl BandId {
    pub fn new(id: impl Into<String>) -> Self {
        BandId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Which slot of a day a preference (or a grid slot) refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotChoice {
    /// A specific time slot, 0-based within its day
    Numbered(u8),
    /// No specific time: the day's flexible slot
    Flexible,
}

impl SlotChoice {
    pub fn is_flexible(&self) -> bool {
        matches!(self, SlotChoice::Flexible)
    }
}

/// A ranked slot preference with its derived weight
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preference {
    pub date: NaiveDate,
    pub slot: SlotChoice,
    pub weight: u32,
}

/// Weight of the preference at `rank` (0-based).
pub fn weight_for_rank(rank: usize) -> u32 {
    (MAX_PREFERENCES - rank) as u32
}

/// A band and its ranked preferences. Immutable once built; shared between
/// grid snapshots behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Band {
    pub name: String,
    pub id: BandId,
    preferences: Vec<Preference>,
}

impl Band {
    /// Builds a band from its picks in rank order; weights are derived from
    /// the rank.
    pub fn new(
        name: impl Into<String>,
        id: impl Into<String>,
        picks: Vec<(NaiveDate, SlotChoice)>,
    ) -> Result<Self> {
        let name = name.into();
        if picks.len() > MAX_PREFERENCES {
            return Err(ScheduleError::TooManyPreferences {
                band: name,
                count: picks.len(),
                max: MAX_PREFERENCES,
            });
        }
        let ranked = picks
            .into_iter()
            .enumerate()
            .map(|(rank, (date, slot))| (rank, date, slot))
            .collect();
        Band::from_ranked(name, id, ranked)
    }

    /// Builds a band from picks that keep their rank on the sheet, so a
    /// skipped first choice still leaves the second one at weight 2. Ranks
    /// must be strictly increasing and below `MAX_PREFERENCES`.
    pub fn from_ranked(
        name: impl Into<String>,
        id: impl Into<String>,
        picks: Vec<(usize, NaiveDate, SlotChoice)>,
    ) -> Result<Self> {
        let name = name.into();
        let mut previous: Option<usize> = None;
        let mut preferences = Vec::with_capacity(picks.len());
        for (rank, date, slot) in picks {
            if rank >= MAX_PREFERENCES || previous.is_some_and(|p| rank <= p) {
                return Err(ScheduleError::PreferenceRank {
                    band: name,
                    rank,
                    max: MAX_PREFERENCES,
                });
            }
            previous = Some(rank);
            preferences.push(Preference {
                date,
                slot,
                weight: weight_for_rank(rank),
            });
        }

        Ok(Band {
            name,
            id: BandId::new(id),
            preferences,
        })
    }

    pub fn preferences(&self) -> &[Preference] {
        &self.preferences
    }
}
