//! Plain-text rendering of the city table and JSON export

use crate::collector::CityTable;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Render the table as aligned columns, one row per city
#[must_use]
pub fn render_table(table: &CityTable) -> String {
    let mut out = format!(
        "{:>3}  {:<28} {:<7} {:>8} {:>9} {:>8} {:>8}  {}\n",
        "#", "cityName", "country", "randLat", "randLng", "km", "temp", "description"
    );

    if table.is_empty() {
        out.push_str("(no cities)\n");
        return out;
    }

    for (i, row) in table.rows().iter().enumerate() {
        let temp = row
            .temp
            .map_or_else(|| "-".to_string(), |t| format!("{t:.1}"));
        out.push_str(&format!(
            "{:>3}  {:<28} {:<7} {:>8.1} {:>9.1} {:>8.0} {:>8}  {}\n",
            i,
            row.city_name,
            row.country_code,
            row.rand_lat,
            row.rand_lng,
            row.distance_km,
            temp,
            row.description.as_deref().unwrap_or("-")
        ));
    }

    out
}

/// Write the table as pretty JSON
pub fn write_json(table: &CityTable, path: &Path) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create output file {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, table)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}
