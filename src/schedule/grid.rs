use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Serialize, Serializer};

use super::types::{Band, BandId, SlotChoice};
use crate::error::{Result, ScheduleError};

/// A band's claim on a slot at the weight of the matching preference
#[derive(Debug, Clone)]
pub struct Candidacy {
    pub band: Arc<Band>,
    pub weight: u32,
}

impl Candidacy {
    pub fn band_id(&self) -> &BandId {
        &self.band.id
    }
}

impl Serialize for Candidacy {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("Candidacy", 3)?;
        s.serialize_field("band_id", &self.band.id)?;
        s.serialize_field("band_name", &self.band.name)?;
        s.serialize_field("weight", &self.weight)?;
        s.end()
    }
}

/// A single unit of stage capacity
#[derive(Debug, Clone, Serialize)]
pub struct Slot {
    pub choice: SlotChoice,
    pub candidacies: Vec<Candidacy>,
}

impl Slot {
    fn new(choice: SlotChoice) -> Self {
        Slot {
            choice,
            candidacies: Vec::new(),
        }
    }

    /// Stable sort by descending weight; ties keep insertion order.
    pub fn sort_candidacies(&mut self) {
        self.candidacies.sort_by(|a, b| b.weight.cmp(&a.weight));
    }

    /// The assigned band once the assignment stage has run.
    pub fn winner(&self) -> Option<&Candidacy> {
        self.candidacies.first()
    }
}

/// One festival day: numbered slots `0..n` followed by the flexible slot
#[derive(Debug, Clone, Serialize)]
pub struct Day {
    pub date: NaiveDate,
    pub slots: Vec<Slot>,
}

impl Day {
    pub fn new(date: NaiveDate, numbered_slots: u8) -> Self {
        let mut slots: Vec<Slot> = (0..numbered_slots)
            .map(|i| Slot::new(SlotChoice::Numbered(i)))
            .collect();
        slots.push(Slot::new(SlotChoice::Flexible));
        Day { date, slots }
    }

    pub fn numbered_count(&self) -> usize {
        self.slots.iter().filter(|s| !s.choice.is_flexible()).count()
    }

    /// Resolves a preference's slot against this day. Out-of-range numbered
    /// slots resolve to nothing.
    pub fn slot_mut(&mut self, choice: SlotChoice) -> Option<&mut Slot> {
        match choice {
            SlotChoice::Numbered(i) => self
                .slots
                .iter_mut()
                .find(|s| s.choice == SlotChoice::Numbered(i)),
            SlotChoice::Flexible => self.slots.iter_mut().find(|s| s.choice.is_flexible()),
        }
    }

    pub fn slot(&self, choice: SlotChoice) -> Option<&Slot> {
        self.slots.iter().find(|s| s.choice == choice)
    }
}

/// Position of a slot inside a grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SlotRef {
    pub day: usize,
    pub slot: usize,
}

/// The fixed day/slot topology with the candidacies attached to each slot
#[derive(Debug, Clone, Serialize)]
pub struct SlotGrid {
    days: Vec<Day>,
}

impl SlotGrid {
    /// Builds a grid from `(date, numbered slot count)` pairs in day order.
    pub fn new(layout: &[(NaiveDate, u8)]) -> Result<Self> {
        let mut seen = HashSet::new();
        for (date, _) in layout {
            if !seen.insert(*date) {
                return Err(ScheduleError::DuplicateDay(*date));
            }
        }

        Ok(SlotGrid {
            days: layout
                .iter()
                .map(|&(date, count)| Day::new(date, count))
                .collect(),
        })
    }

    pub fn days(&self) -> &[Day] {
        &self.days
    }

    pub fn day_mut(&mut self, date: NaiveDate) -> Option<&mut Day> {
        self.days.iter_mut().find(|d| d.date == date)
    }

    pub fn slot(&self, at: SlotRef) -> &Slot {
        &self.days[at.day].slots[at.slot]
    }

    pub fn slot_mut(&mut self, at: SlotRef) -> &mut Slot {
        &mut self.days[at.day].slots[at.slot]
    }

    /// Every slot position in day order, then slot order.
    pub fn slot_refs(&self) -> Vec<SlotRef> {
        self.days
            .iter()
            .enumerate()
            .flat_map(|(day, d)| (0..d.slots.len()).map(move |slot| SlotRef { day, slot }))
            .collect()
    }

    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.days.iter().flat_map(|d| d.slots.iter())
    }

    pub fn slots_mut(&mut self) -> impl Iterator<Item = &mut Slot> {
        self.days.iter_mut().flat_map(|d| d.slots.iter_mut())
    }

    pub fn clear_candidacies(&mut self) {
        for slot in self.slots_mut() {
            slot.candidacies.clear();
        }
    }

    pub fn sort_candidacies(&mut self) {
        for slot in self.slots_mut() {
            slot.sort_candidacies();
        }
    }

    pub fn candidacy_count(&self) -> usize {
        self.slots().map(|s| s.candidacies.len()).sum()
    }

    /// Independent copy of the grid and its candidacy lists. Bands are
    /// shared, only their `Arc` handles are cloned.
    pub fn snapshot(&self) -> SlotGrid {
        self.clone()
    }

    /// Sum of the weights of every candidacy left in the grid. After the
    /// assignment stage this is the satisfied preference weight.
    pub fn total_weight(&self) -> u64 {
        self.slots()
            .flat_map(|s| s.candidacies.iter())
            .map(|c| u64::from(c.weight))
            .sum()
    }

    /// Checks the topology and ordering invariants.
    pub fn validate(&self) -> Result<()> {
        let mut dates = HashSet::new();
        for day in &self.days {
            if !dates.insert(day.date) {
                return Err(ScheduleError::DuplicateDay(day.date));
            }

            let flexible = day.slots.iter().filter(|s| s.choice.is_flexible()).count();
            if flexible != 1 {
                return Err(ScheduleError::InvariantViolation(format!(
                    "day {} has {} flexible slots",
                    day.date, flexible
                )));
            }

            let numbered: Vec<u8> = day
                .slots
                .iter()
                .filter_map(|s| match s.choice {
                    SlotChoice::Numbered(i) => Some(i),
                    SlotChoice::Flexible => None,
                })
                .collect();
            if numbered.iter().enumerate().any(|(pos, &i)| usize::from(i) != pos) {
                return Err(ScheduleError::InvariantViolation(format!(
                    "day {} numbered slots are not contiguous from 0: {:?}",
                    day.date, numbered
                )));
            }

            for slot in &day.slots {
                if slot.candidacies.windows(2).any(|w| w[0].weight < w[1].weight) {
                    return Err(ScheduleError::InvariantViolation(format!(
                        "day {} slot {:?} candidacies are not sorted by weight",
                        day.date, slot.choice
                    )));
                }
            }
        }
        Ok(())
    }

    /// Checks that the grid holds a conflict-free assignment: at most one
    /// candidacy per slot and at most one slot per band.
    pub fn validate_assignment(&self) -> Result<()> {
        self.validate()?;
        let mut assigned: HashMap<&BandId, (NaiveDate, SlotChoice)> = HashMap::new();
        for day in &self.days {
            for slot in &day.slots {
                if slot.candidacies.len() > 1 {
                    return Err(ScheduleError::InvariantViolation(format!(
                        "day {} slot {:?} holds {} candidacies after assignment",
                        day.date,
                        slot.choice,
                        slot.candidacies.len()
                    )));
                }
                if let Some(c) = slot.candidacies.first() {
                    if let Some((d, s)) = assigned.insert(c.band_id(), (day.date, slot.choice)) {
                        return Err(ScheduleError::InvariantViolation(format!(
                            "band {} assigned to both {} {:?} and {} {:?}",
                            c.band_id(),
                            d,
                            s,
                            day.date,
                            slot.choice
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}
