use std::sync::Arc;

use tracing::{debug, info};

use super::grid::{Candidacy, SlotGrid};
use super::types::Band;

/// Outcome of projecting band preferences onto a grid
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProjectionResult {
    /// Candidacies attached to a slot
    pub attached: usize,
    /// Preferences dropped because no grid day has their date
    pub unknown_day: usize,
    /// Preferences dropped because their numbered slot does not exist that day
    pub invalid_slot: usize,
}

/// Rebuilds every slot's candidacy list from the bands' preferences.
///
/// Existing candidacies are cleared first, so projecting the same bands
/// again yields the same grid. Preferences that do not resolve to a slot of
/// the grid are dropped without error.
pub fn project(grid: &mut SlotGrid, bands: &[Arc<Band>]) -> ProjectionResult {
    grid.clear_candidacies();
    let mut result = ProjectionResult::default();

    for band in bands {
        for pref in band.preferences() {
            let Some(day) = grid.day_mut(pref.date) else {
                debug!(band = %band.id, date = %pref.date, "preference date is not a festival day");
                result.unknown_day += 1;
                continue;
            };

            match day.slot_mut(pref.slot) {
                Some(slot) => {
                    slot.candidacies.push(Candidacy {
                        band: Arc::clone(band),
                        weight: pref.weight,
                    });
                    result.attached += 1;
                }
                None => {
                    debug!(band = %band.id, date = %pref.date, slot = ?pref.slot, "preference slot out of range");
                    result.invalid_slot += 1;
                }
            }
        }
    }

    grid.sort_candidacies();
    debug_assert!(grid.validate().is_ok());
    info!(
        bands = bands.len(),
        attached = result.attached,
        unknown_day = result.unknown_day,
        invalid_slot = result.invalid_slot,
        "Projected preferences onto grid"
    );
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::grid::SlotRef;
    use crate::schedule::slot_utils::parse_slot_token;
    use crate::schedule::types::SlotChoice;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 8, d).unwrap()
    }

    fn band(id: &str, picks: Vec<(NaiveDate, SlotChoice)>) -> Arc<Band> {
        Arc::new(Band::new(id, id, picks).unwrap())
    }

    fn names(grid: &SlotGrid, at: SlotRef) -> Vec<(String, u32)> {
        grid.slot(at)
            .candidacies
            .iter()
            .map(|c| (c.band.id.to_string(), c.weight))
            .collect()
    }

    #[test]
    fn test_projection_sorts_and_keeps_ties_in_order() {
        let mut grid = SlotGrid::new(&[(day(11), 2)]).unwrap();
        let bands = vec![
            band("a", vec![(day(11), SlotChoice::Numbered(0))]),
            band(
                "b",
                vec![(day(11), SlotChoice::Numbered(0)), (day(11), SlotChoice::Numbered(1))],
            ),
            band(
                "c",
                vec![(day(11), SlotChoice::Numbered(1)), (day(11), SlotChoice::Numbered(0))],
            ),
        ];

        let result = project(&mut grid, &bands);
        assert_eq!(result.attached, 5);
        assert_eq!(
            names(&grid, SlotRef { day: 0, slot: 0 }),
            vec![("a".to_string(), 3), ("b".to_string(), 3), ("c".to_string(), 2)]
        );
        assert_eq!(
            names(&grid, SlotRef { day: 0, slot: 1 }),
            vec![("c".to_string(), 3), ("b".to_string(), 2)]
        );
    }

    #[test]
    fn test_flexible_preference_goes_to_flexible_slot() {
        let mut grid = SlotGrid::new(&[(day(11), 3), (day(12), 3)]).unwrap();
        let bands = vec![band("c", vec![(day(12), SlotChoice::Flexible)])];

        project(&mut grid, &bands);
        assert_eq!(grid.candidacy_count(), 1);
        let flexible = grid.days()[1].slot(SlotChoice::Flexible).unwrap();
        assert_eq!(flexible.candidacies[0].band.id.as_str(), "c");
    }

    #[test]
    fn test_unknown_day_and_bad_slot_are_dropped() {
        let mut grid = SlotGrid::new(&[(day(11), 2)]).unwrap();
        let bands = vec![band(
            "d",
            vec![(day(20), SlotChoice::Numbered(0)), (day(11), SlotChoice::Numbered(9))],
        )];

        let result = project(&mut grid, &bands);
        assert_eq!(
            result,
            ProjectionResult {
                attached: 0,
                unknown_day: 1,
                invalid_slot: 1
            }
        );
        assert_eq!(grid.candidacy_count(), 0);
    }

    #[test]
    fn test_projection_is_idempotent() {
        let mut grid = SlotGrid::new(&[(day(11), 2)]).unwrap();
        let bands = vec![
            band("a", vec![(day(11), SlotChoice::Numbered(1))]),
            band("b", vec![(day(11), SlotChoice::Flexible)]),
        ];

        project(&mut grid, &bands);
        let first = grid.candidacy_count();
        project(&mut grid, &bands);
        assert_eq!(grid.candidacy_count(), first);
        assert!(grid.validate().is_ok());
    }

    #[test]
    fn test_oversized_slot_token_is_invalid_even_on_largest_day() {
        let mut grid = SlotGrid::new(&[(day(11), u8::MAX)]).unwrap();
        let bands = vec![band(
            "e",
            vec![(day(11), parse_slot_token("300th")), (day(11), parse_slot_token("255th"))],
        )];

        let result = project(&mut grid, &bands);
        assert_eq!(result.invalid_slot, 1);
        assert_eq!(result.attached, 1);
        assert_eq!(
            names(&grid, SlotRef { day: 0, slot: 254 }),
            vec![("e".to_string(), 2)]
        );
    }
}
