//! CSV output for experiment rows.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use serde::Serialize;

use crate::error::DriverError;

/// Write `rows` with a header line to `out`, or to stdout when `out` is `None`.
///
/// Undefined metrics become empty fields.
pub fn write_csv<T: Serialize>(rows: &[T], out: Option<&Path>) -> Result<(), DriverError> {
    let sink: Box<dyn Write> = match out {
        Some(path) => Box::new(File::create(path)?),
        None => Box::new(io::stdout().lock()),
    };
    write_rows(rows, sink)
}

fn write_rows<T: Serialize, W: Write>(rows: &[T], sink: W) -> Result<(), DriverError> {
    let mut writer = csv::Writer::from_writer(sink);
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}
