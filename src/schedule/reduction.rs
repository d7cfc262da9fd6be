use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info};

use super::grid::{Slot, SlotGrid, SlotRef};
use super::types::{Band, BandId, SlotChoice};

/// Audit record for a slot whose top-weight band is unique
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UncontestedSlot {
    pub date: NaiveDate,
    pub slot: SlotChoice,
    pub band: BandId,
    pub band_name: String,
    pub weight: u32,
    /// Candidacies of the winner pruned from other slots
    pub removed: usize,
}

/// Output of the dominance reduction stage
#[derive(Debug, Clone)]
pub struct Reduction {
    pub grid: SlotGrid,
    /// One record per uncontested slot, in processing order
    pub audit: Vec<UncontestedSlot>,
    pub removed: usize,
    pub passes: usize,
}

/// Returns the slot's winner and its weight when exactly one band holds the
/// highest weight. A band listed more than once counts with its best weight.
pub fn uncontested_winner(slot: &Slot) -> Option<(Arc<Band>, u32)> {
    let mut best: HashMap<&BandId, (&Arc<Band>, u32)> = HashMap::new();
    for c in &slot.candidacies {
        let entry = best.entry(c.band_id()).or_insert((&c.band, c.weight));
        entry.1 = entry.1.max(c.weight);
    }

    let highest = best.values().map(|(_, w)| *w).max()?;
    let mut top = best.values().filter(|(_, w)| *w == highest);
    let (band, _) = top.next()?;
    if top.next().is_some() {
        return None;
    }
    Some((Arc::clone(*band), highest))
}

/// Removes the winner's candidacies below `highest` from every slot except
/// `at`. Slots the winner holds uncontested themselves are left alone.
fn prune_dominated(grid: &mut SlotGrid, at: SlotRef, winner: &BandId, highest: u32) -> usize {
    let mut removed = 0;
    for other in grid.slot_refs() {
        if other == at {
            continue;
        }
        let protected = uncontested_winner(grid.slot(other))
            .map(|(band, _)| band.id == *winner)
            .unwrap_or(false);
        if protected {
            continue;
        }

        let slot = grid.slot_mut(other);
        let before = slot.candidacies.len();
        slot.candidacies
            .retain(|c| !(c.band_id() == winner && c.weight < highest));
        removed += before - slot.candidacies.len();
    }
    removed
}

/// Prunes options dominated by uncontested slots.
///
/// Works on a snapshot of `input`. Passes over the grid repeat until one
/// removes nothing, so reducing the result again removes nothing. Nobody is
/// assigned here; the exact stage settles what is left.
pub fn reduce(input: &SlotGrid) -> Reduction {
    let mut grid = input.snapshot();
    let mut audit: Vec<UncontestedSlot> = Vec::new();
    let mut audit_index: HashMap<SlotRef, usize> = HashMap::new();
    let mut removed = 0;
    let mut passes = 0;

    loop {
        passes += 1;
        let mut pass_removed = 0;

        for at in grid.slot_refs() {
            let Some((winner, highest)) = uncontested_winner(grid.slot(at)) else {
                continue;
            };
            let count = prune_dominated(&mut grid, at, &winner.id, highest);
            pass_removed += count;

            match audit_index.get(&at) {
                Some(&i) => {
                    debug_assert_eq!(audit[i].band, winner.id);
                    audit[i].removed += count;
                }
                None => {
                    let date = grid.days()[at.day].date;
                    let slot = grid.slot(at).choice;
                    debug!(
                        date = %date,
                        slot = ?slot,
                        band = %winner.id,
                        weight = highest,
                        removed = count,
                        "Uncontested slot"
                    );
                    audit_index.insert(at, audit.len());
                    audit.push(UncontestedSlot {
                        date,
                        slot,
                        band: winner.id.clone(),
                        band_name: winner.name.clone(),
                        weight: highest,
                        removed: count,
                    });
                }
            }
        }

        grid.sort_candidacies();
        removed += pass_removed;
        if pass_removed == 0 {
            break;
        }
    }

    debug_assert!(grid.validate().is_ok());
    info!(
        uncontested = audit.len(),
        removed,
        passes,
        remaining = grid.candidacy_count(),
        "Dominance reduction finished"
    );

    Reduction {
        grid,
        audit,
        removed,
        passes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::projection::project;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, d).unwrap()
    }

    fn band(id: &str, picks: &[u8]) -> Arc<Band> {
        let picks = picks
            .iter()
            .map(|&i| (day(11), SlotChoice::Numbered(i)))
            .collect();
        Arc::new(Band::new(id, id, picks).unwrap())
    }

    fn ids(grid: &SlotGrid, slot: usize) -> Vec<(String, u32)> {
        grid.slot(SlotRef { day: 0, slot })
            .candidacies
            .iter()
            .map(|c| (c.band.id.to_string(), c.weight))
            .collect()
    }

    #[test]
    fn test_equal_weight_alternatives_survive() {
        // A: slot 0 (3); B: slot 0 (3), slot 1 (2)
        let mut grid = SlotGrid::new(&[(day(11), 2)]).unwrap();
        project(&mut grid, &[band("a", &[0]), band("b", &[0, 1])]);

        let reduction = reduce(&grid);
        assert_eq!(reduction.removed, 0);
        assert_eq!(reduction.audit.len(), 1);
        assert_eq!(reduction.audit[0].slot, SlotChoice::Numbered(1));
        assert_eq!(reduction.audit[0].band.as_str(), "b");
        assert_eq!(reduction.audit[0].weight, 2);
        assert_eq!(
            ids(&reduction.grid, 0),
            vec![("a".to_string(), 3), ("b".to_string(), 3)]
        );
    }

    #[test]
    fn test_lower_weight_options_of_winner_are_pruned() {
        // W wins slot 0 alone at 3; its rank-2 pick on the contested slot 1 goes
        let mut grid = SlotGrid::new(&[(day(11), 2)]).unwrap();
        project(&mut grid, &[band("w", &[0, 1]), band("v", &[1])]);
        assert_eq!(ids(&grid, 1), vec![("v".to_string(), 3), ("w".to_string(), 2)]);

        let reduction = reduce(&grid);
        assert_eq!(reduction.removed, 1);
        assert_eq!(ids(&reduction.grid, 1), vec![("v".to_string(), 3)]);
        let w = reduction.audit.iter().find(|a| a.band.as_str() == "w").unwrap();
        assert_eq!(w.removed, 1);
        // input untouched
        assert_eq!(grid.candidacy_count(), 3);
    }

    #[test]
    fn test_pruning_cascades_until_stable() {
        // slot 0: w(3) alone. slot 1: w(2), x(2) tied. x also on slot 2 at 1.
        // Pruning w from slot 1 leaves x uncontested there, which in turn
        // prunes x's weaker pick on slot 2.
        let mut grid = SlotGrid::new(&[(day(11), 3)]).unwrap();
        let w = band("w", &[0, 1]);
        let x = Arc::new(
            Band::new(
                "x",
                "x",
                vec![
                    (day(12), SlotChoice::Flexible),
                    (day(11), SlotChoice::Numbered(1)),
                    (day(11), SlotChoice::Numbered(2)),
                ],
            )
            .unwrap(),
        );
        let y = band("y", &[2]);
        project(&mut grid, &[w, x, y]);

        let reduction = reduce(&grid);
        assert_eq!(reduction.removed, 2);
        assert!(reduction.passes >= 2);
        assert_eq!(ids(&reduction.grid, 1), vec![("x".to_string(), 2)]);
        assert_eq!(ids(&reduction.grid, 2), vec![("y".to_string(), 3)]);

        let again = reduce(&reduction.grid);
        assert_eq!(again.removed, 0);
    }

    #[test]
    fn test_uncontested_slots_are_never_stolen() {
        // W is alone on slot 0 (3) and on slot 1 (2): both stay
        let mut grid = SlotGrid::new(&[(day(11), 2)]).unwrap();
        project(&mut grid, &[band("w", &[0, 1])]);

        let reduction = reduce(&grid);
        assert_eq!(reduction.removed, 0);
        assert_eq!(reduction.audit.len(), 2);
        assert_eq!(reduction.grid.candidacy_count(), 2);
    }

    #[test]
    fn test_no_uncontested_slots() {
        let mut grid = SlotGrid::new(&[(day(11), 1)]).unwrap();
        project(&mut grid, &[band("a", &[0]), band("b", &[0])]);

        let reduction = reduce(&grid);
        assert_eq!(reduction.removed, 0);
        assert!(reduction.audit.is_empty());
        assert_eq!(reduction.passes, 1);
    }

    #[test]
    fn test_duplicate_band_entries_use_best_weight() {
        let mut grid = SlotGrid::new(&[(day(11), 1)]).unwrap();
        project(&mut grid, &[band("a", &[0, 0]), band("b", &[0])]);
        // a appears twice (3 and 2), b once at 3: still contested
        assert!(uncontested_winner(grid.slot(SlotRef { day: 0, slot: 0 })).is_none());

        project(&mut grid, &[band("a", &[0, 0])]);
        let (winner, weight) = uncontested_winner(grid.slot(SlotRef { day: 0, slot: 0 })).unwrap();
        assert_eq!(winner.id.as_str(), "a");
        assert_eq!(weight, 3);
    }
}
