use std::fmt::Write as _;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::grid::{minutes_to_time_string, DayLayout, PlacedAppointment, SlotTier};

/// Formats a block as "Ada Lovelace (09:00-10:10, confirmed)"
pub fn format_block(block: &PlacedAppointment) -> String {
    format!(
        "{} ({}-{}, {})",
        block.patient_name,
        minutes_to_time_string(block.start_minutes),
        minutes_to_time_string(block.start_minutes.saturating_add(block.duration_minutes)),
        block.status.label()
    )
}

fn column_name(layout: &DayLayout, block: &PlacedAppointment) -> String {
    layout
        .columns
        .get(block.column)
        .map(|c| c.name.clone())
        .unwrap_or_else(|| format!("#{}", block.column))
}

/// Renders a day as text: one line per hour and half-hour gridline listing the blocks starting there
pub fn render_day(layout: &DayLayout) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "** {} view, {} **", layout.view_mode, layout.date.format("%A %Y-%m-%d"));
    let names: Vec<&str> = layout.columns.iter().map(|c| c.name.as_str()).collect();
    let _ = writeln!(out, "Columns: {}", names.join(" | "));

    let rows: Vec<_> = layout
        .slots
        .iter()
        .filter(|s| matches!(s.tier, SlotTier::Major | SlotTier::Medium))
        .collect();

    // A row owns the blocks starting before the next printed row; the last one closes at the grid's end
    let grid_end = layout.slots.last().map(|s| s.offset_minutes + 1).unwrap_or(0);
    let mut printed = 0;
    for (i, slot) in rows.iter().enumerate() {
        let row_end = rows.get(i + 1).map(|next| next.offset_minutes).unwrap_or(grid_end);
        let starting: Vec<&PlacedAppointment> = layout
            .blocks
            .iter()
            .filter(|b| b.start_minutes >= slot.offset_minutes && b.start_minutes < row_end)
            .collect();

        if starting.is_empty() {
            let _ = writeln!(out, "{:>8}", slot.label);
            continue;
        }
        for (i, block) in starting.iter().enumerate() {
            let label = if i == 0 { slot.label.as_str() } else { "" };
            let _ = writeln!(out, "{:>8}  [{}] {}", label, column_name(layout, block), format_block(block));
        }
        printed += starting.len();
    }

    if printed < layout.blocks.len() {
        let _ = writeln!(out, "\nOutside business hours:");
        let first = rows.first().map(|s| s.offset_minutes).unwrap_or(0);
        for block in layout.blocks.iter().filter(|b| b.start_minutes < first || b.start_minutes >= grid_end) {
            let _ = writeln!(out, "  [{}] {}", column_name(layout, block), format_block(block));
        }
    }

    if !layout.unassigned.is_empty() {
        let _ = writeln!(out, "\n⚠️  Unassigned appointments ({}):", layout.unassigned.len());
        for id in &layout.unassigned {
            let _ = writeln!(out, "  - appointment {}", id);
        }
    }

    out
}

/// Prints a day layout in a readable format
pub fn print_day(layout: &DayLayout) {
    println!("{}", render_day(layout));
    println!("Total appointments on the grid: {}", layout.blocks.len());
}

/// Writes a day layout to a file
pub fn write_day_to_file<P: AsRef<Path>>(layout: &DayLayout, filename: P) -> Result<()> {
    let mut file = File::create(filename)?;
    file.write_all(render_day(layout).as_bytes())?;
    Ok(())
}
