use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;
use crate::schedule::{format_slot, Band, Reduction, SlotGrid};

/// Formats a band as "name (id)"
pub fn format_band(band: &Band) -> String {
    format!("{} ({})", band.name, band.id)
}

/// Writes every band with its ranked preferences
pub fn write_bands<W: Write>(out: &mut W, bands: &[Arc<Band>]) -> io::Result<()> {
    writeln!(out, "Bands in the scheduler ({}):", bands.len())?;
    for band in bands {
        writeln!(out, "  {}", format_band(band))?;
        for (rank, pref) in band.preferences().iter().enumerate() {
            writeln!(
                out,
                "    Pref{}: {} {} (weight {})",
                rank + 1,
                pref.date,
                format_slot(pref.slot),
                pref.weight
            )?;
        }
    }
    Ok(())
}

/// Writes the trail of slots settled by the dominance reduction
pub fn write_audit<W: Write>(out: &mut W, reduction: &Reduction) -> io::Result<()> {
    writeln!(
        out,
        "Dominance reduction: {} uncontested slots, {} candidacies removed, {} passes",
        reduction.audit.len(),
        reduction.removed,
        reduction.passes
    )?;
    for entry in &reduction.audit {
        writeln!(
            out,
            "  {} {:>8} -> {} ({}) weight {}, removed {}",
            entry.date,
            format_slot(entry.slot),
            entry.band_name,
            entry.band,
            entry.weight,
            entry.removed
        )?;
    }
    Ok(())
}

/// Writes a schedule: one line per slot with its band or [EMPTY]. Slots that
/// still hold several candidacies list them all with their weights.
pub fn write_schedule<W: Write>(out: &mut W, title: &str, grid: &SlotGrid) -> io::Result<()> {
    writeln!(out, "** {} **", title)?;
    for day in grid.days() {
        writeln!(out, "{}", day.date.format("%Y-%m-%d (%a)"))?;
        for slot in &day.slots {
            let label = format_slot(slot.choice);
            match slot.candidacies.as_slice() {
                [] => writeln!(out, "  {:>8} [EMPTY]", label)?,
                [only] => writeln!(
                    out,
                    "  {:>8} {} weight {}",
                    label,
                    format_band(&only.band),
                    only.weight
                )?,
                many => {
                    let listed: Vec<String> = many
                        .iter()
                        .map(|c| format!("{}:{}", c.band.name, c.weight))
                        .collect();
                    writeln!(out, "  {:>8} {}", label, listed.join(", "))?;
                }
            }
        }
    }
    Ok(())
}

pub fn print_bands(bands: &[Arc<Band>]) -> Result<()> {
    write_bands(&mut io::stdout().lock(), bands)?;
    Ok(())
}

pub fn print_audit(reduction: &Reduction) -> Result<()> {
    write_audit(&mut io::stdout().lock(), reduction)?;
    Ok(())
}

pub fn print_schedule(title: &str, grid: &SlotGrid) -> Result<()> {
    write_schedule(&mut io::stdout().lock(), title, grid)?;
    Ok(())
}

/// Writes the rendered schedule to a text file
pub fn write_schedule_to_file(title: &str, grid: &SlotGrid, path: &Path) -> Result<()> {
    let mut file = File::create(path)?;
    write_schedule(&mut file, title, grid)?;
    Ok(())
}

/// Writes the grid as JSON
pub fn write_schedule_json(grid: &SlotGrid, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, grid)?;
    Ok(())
}
