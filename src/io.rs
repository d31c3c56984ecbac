//! CSV adapter: raw tables in, flat output tables out.

use std::io::{Read, Write};
use std::path::Path;

use crate::dataset::{Cell, Dataset};
use crate::error::Result;

/// Read a comma-separated table with a header row. Every field is kept as
/// raw text; typing happens in the normalizer.
pub fn read_csv<R: Read>(reader: R) -> Result<Dataset> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(reader);
    let headers: Vec<String> = rdr.headers()?.iter().map(String::from).collect();
    let mut ds = Dataset::new(headers);
    for record in rdr.records() {
        let record = record?;
        ds.push_row(record.iter().map(Cell::text).collect())?;
    }
    tracing::debug!(rows = ds.len(), columns = ds.columns().len(), "read csv");
    Ok(ds)
}

pub fn read_csv_path(path: &Path) -> Result<Dataset> {
    let file = std::fs::File::open(path)?;
    read_csv(file)
}

/// Write the table with a header row. Nulls are empty fields.
pub fn write_csv<W: Write>(ds: &Dataset, writer: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(ds.columns())?;
    for row in ds.rows() {
        wtr.write_record(row.iter().map(Cell::render))?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_csv_path(ds: &Dataset, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_csv(ds, file)
}
