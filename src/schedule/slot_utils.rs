use super::types::SlotChoice;

/// Ordinal suffix for a 1-based position: 1st, 2nd, 3rd, 4th, 11th, 21st...
fn ordinal_suffix(n: u32) -> &'static str {
    match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    }
}

/// Slot index no day can have: a day holds at most `u8::MAX` numbered slots,
/// indexed `0..u8::MAX`. Projection drops preferences pointing here.
pub const OUT_OF_RANGE_SLOT: u8 = u8::MAX;

/// Converts a slot to its label as written on the preference sheet
/// ("1st", "2nd", ... or "flexible")
pub fn format_slot(choice: SlotChoice) -> String {
    match choice {
        SlotChoice::Numbered(i) => {
            let n = u32::from(i) + 1;
            format!("{}{}", n, ordinal_suffix(n))
        }
        SlotChoice::Flexible => "flexible".to_string(),
    }
}

/// Parses a slot token such as "1st", "2ND" or "3" into a 0-based slot.
/// Empty or unreadable tokens mean the band has no specific time preference.
/// Numbers past the last slot a day can hold map to `OUT_OF_RANGE_SLOT`.
pub fn parse_slot_token(token: &str) -> SlotChoice {
    let clean = token.trim().to_lowercase();
    let digits = clean
        .strip_suffix("st")
        .or_else(|| clean.strip_suffix("nd"))
        .or_else(|| clean.strip_suffix("rd"))
        .or_else(|| clean.strip_suffix("th"))
        .unwrap_or(&clean)
        .trim();

    match digits.parse::<i64>() {
        // 1-based on the sheet; "0" and below clamp to the first slot
        Ok(n) => {
            SlotChoice::Numbered(u8::try_from((n - 1).max(0)).unwrap_or(OUT_OF_RANGE_SLOT))
        }
        Err(_) => SlotChoice::Flexible,
    }
}
