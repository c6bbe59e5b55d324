//! CSV export of the publication log.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use super::PublicationRow;

/// Column header of the publication export.
const HEADER: &str = "step,unique_id,name,value,unit,device_class,state_class,attributes";

/// Exports publications to a CSV file at the given path.
///
/// Writes a header row followed by one row per publication, in the order
/// given. Produces deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(rows: &[PublicationRow], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(rows, buf)
}

/// Writes publications as CSV to any writer.
///
/// Missing values and units are written as empty cells; `attributes` holds
/// the attribute map as a JSON object.
///
/// # Errors
///
/// Returns an `io::Error` if writing or attribute encoding fails.
pub fn write_csv(rows: &[PublicationRow], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(','))?;

    for row in rows {
        let s = &row.state;
        let attributes = serde_json::to_string(&s.attributes).map_err(io::Error::other)?;
        wtr.write_record(&[
            row.step.to_string(),
            s.unique_id.clone(),
            s.name.clone(),
            s.value.map(|v| format!("{v:.3}")).unwrap_or_default(),
            s.unit.clone().unwrap_or_default(),
            s.device_class.to_string(),
            s.state_class.to_string(),
            attributes,
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
