use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::schedule::{parse_slot_token, Band, SlotChoice, MAX_PREFERENCES};

/// Parses a sheet date. Accepts the month/day form used on the sheet
/// ("8月11日", year taken from `year`) and ISO dates ("2025-08-11").
pub fn parse_sheet_date(value: &str, year: i32) -> Option<NaiveDate> {
    let clean = value.trim();
    if clean.is_empty() {
        return None;
    }

    if let Some((month, rest)) = clean.split_once('月') {
        let day = rest.trim_end_matches('日');
        let month: u32 = month.trim().parse().ok()?;
        let day: u32 = day.trim().parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    NaiveDate::parse_from_str(clean, "%Y-%m-%d").ok()
}

/// Column positions of the sheet
struct Columns {
    name: usize,
    id: usize,
    first_preference: usize,
}

impl Columns {
    fn from_headers(headers: &StringRecord) -> Self {
        let name = headers
            .iter()
            .position(|h| h.to_lowercase().contains("name"))
            .unwrap_or(0);
        let id = headers
            .iter()
            .position(|h| {
                let h = h.to_lowercase();
                h.contains("guid") || h.trim() == "id"
            })
            .unwrap_or(1);
        let first_preference = headers
            .iter()
            .position(|h| h.to_lowercase().contains("pref"))
            .unwrap_or(2);
        Columns {
            name,
            id,
            first_preference,
        }
    }
}

/// Reads band preferences from a CSV sheet with a header row.
///
/// Columns: band name, id, then up to three `(date, slot)` pairs. Rows
/// without a name or id are skipped, as are preferences whose date cannot be
/// read or whose slot column is missing. A blank or unreadable slot means
/// "no specific slot". Weights follow the pair's column, not its position
/// among the kept pairs. A later row with an id already seen replaces the
/// earlier one.
pub fn parse_bands<R: Read>(input: R, year: i32) -> Result<Vec<Arc<Band>>> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(input);
    let columns = Columns::from_headers(reader.headers()?);

    let mut bands: Vec<Arc<Band>> = Vec::new();
    let mut by_id: HashMap<String, usize> = HashMap::new();

    for (row, result) in reader.records().enumerate() {
        let record = result?;
        let line = row + 2;

        let name = record.get(columns.name).unwrap_or("").trim();
        let id = record.get(columns.id).unwrap_or("").trim();
        if name.is_empty() || id.is_empty() {
            warn!(line, "Skipping row without band name or id");
            continue;
        }

        let mut picks: Vec<(usize, NaiveDate, SlotChoice)> = Vec::new();
        for rank in 0..MAX_PREFERENCES {
            let date_col = columns.first_preference + rank * 2;
            // a pair is only read when both of its columns are present
            let (Some(date_cell), Some(slot_cell)) =
                (record.get(date_col), record.get(date_col + 1))
            else {
                if record.get(date_col).is_some_and(|d| !d.trim().is_empty()) {
                    warn!(line, band = %id, rank = rank + 1, "Skipping preference without a slot column");
                }
                continue;
            };
            if date_cell.trim().is_empty() {
                continue;
            }
            match parse_sheet_date(date_cell, year) {
                Some(date) => picks.push((rank, date, parse_slot_token(slot_cell))),
                None => warn!(line, band = %id, date = date_cell, "Skipping unreadable preference date"),
            }
        }

        let band = Arc::new(Band::from_ranked(name, id, picks)?);
        debug!(line, band = %band.id, preferences = band.preferences().len(), "Parsed band");
        match by_id.get(id) {
            Some(&i) => {
                warn!(line, band = %id, "Duplicate band id, later row replaces earlier one");
                bands[i] = band;
            }
            None => {
                by_id.insert(id.to_string(), bands.len());
                bands.push(band);
            }
        }
    }

    info!(bands = bands.len(), "Loaded band preferences");
    Ok(bands)
}

/// Loads band preferences from a CSV file
pub fn load_bands<P: AsRef<Path>>(csv_path: P, year: i32) -> Result<Vec<Arc<Band>>> {
    let file = std::fs::File::open(csv_path)?;
    parse_bands(file, year)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    #[test]
    fn test_parse_sheet_date() {
        assert_eq!(parse_sheet_date("8月11日", 2025), Some(date(8, 11)));
        assert_eq!(parse_sheet_date(" 8月3 ", 2025), Some(date(8, 3)));
        assert_eq!(parse_sheet_date("2025-08-12", 1999), Some(date(8, 12)));
        assert_eq!(parse_sheet_date("13月1日", 2025), None);
        assert_eq!(parse_sheet_date("tomorrow", 2025), None);
        assert_eq!(parse_sheet_date("", 2025), None);
    }

    #[test]
    fn test_parse_bands() {
        let csv = "BandName,GUID,Pref1.date,Pref1.slot,Pref2.date,Pref2.slot,Pref3.date,Pref3.slot\n\
                   Echo Valley,g-1,8月11日,1st,8月12日,,8月13日,3rd\n\
                   \"Rust, Iron & Salt\",g-2,8月12日,2nd\n\
                   ,g-3,8月11日,1st\n\
                   Nowhere,g-4,someday,1st,8月13日,7th\n\
                   Late,g-5,,,8月12日,2nd\n";

        let bands = parse_bands(csv.as_bytes(), 2025).unwrap();
        assert_eq!(bands.len(), 4);

        let echo = &bands[0];
        assert_eq!(echo.name, "Echo Valley");
        let prefs: Vec<(NaiveDate, SlotChoice, u32)> = echo
            .preferences()
            .iter()
            .map(|p| (p.date, p.slot, p.weight))
            .collect();
        assert_eq!(
            prefs,
            vec![
                (date(8, 11), SlotChoice::Numbered(0), 3),
                (date(8, 12), SlotChoice::Flexible, 2),
                (date(8, 13), SlotChoice::Numbered(2), 1),
            ]
        );

        assert_eq!(bands[1].name, "Rust, Iron & Salt");
        assert_eq!(bands[1].preferences().len(), 1);

        // unreadable first date is dropped, the second keeps its weight
        let nowhere = &bands[2];
        assert_eq!(nowhere.preferences().len(), 1);
        assert_eq!(nowhere.preferences()[0].slot, SlotChoice::Numbered(6));
        assert_eq!(nowhere.preferences()[0].weight, 2);

        let late = &bands[3];
        assert_eq!(late.preferences().len(), 1);
        assert_eq!(late.preferences()[0].date, date(8, 12));
        assert_eq!(late.preferences()[0].weight, 2);
    }

    #[test]
    fn test_preference_without_slot_column_is_dropped() {
        let csv = "BandName,GUID,Pref1.date,Pref1.slot,Pref2.date,Pref2.slot\n\
                   Echo,g-1,8月11日,,8月12日\n\
                   Tail,g-2,8月13日\n";

        let bands = parse_bands(csv.as_bytes(), 2025).unwrap();
        let echo = &bands[0];
        assert_eq!(echo.preferences().len(), 1);
        assert_eq!(echo.preferences()[0].slot, SlotChoice::Flexible);
        assert_eq!(echo.preferences()[0].weight, 3);
        assert!(bands[1].preferences().is_empty());
    }

    #[test]
    fn test_resubmission_replaces_earlier_row() {
        let csv = "BandName,GUID,Pref1.date,Pref1.slot\n\
                   Echo,g-1,8月11日,1st\n\
                   Other,g-2,8月11日,2nd\n\
                   Echo,g-1,8月12日,\n";

        let bands = parse_bands(csv.as_bytes(), 2025).unwrap();
        assert_eq!(bands.len(), 2);
        assert_eq!(bands[0].id.as_str(), "g-1");
        assert_eq!(bands[0].preferences()[0].date, date(8, 12));
        assert_eq!(bands[0].preferences()[0].slot, SlotChoice::Flexible);
    }
}
