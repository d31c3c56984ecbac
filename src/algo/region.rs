use crate::dataset::{Cell, Dataset};
use crate::error::Result;

/// Region code from a slash-delimited location such as
/// `"São Paulo/SP/São Paulo"`: the second segment, trimmed and uppercased.
/// Fewer than two segments yields `None`.
pub fn derive_region(location: Option<&str>) -> Option<String> {
    let location = location?;
    let mut segments = location.split('/');
    segments.next()?;
    segments.next().map(|s| s.trim().to_uppercase())
}

/// Write a region column derived from `source` for every row.
pub fn add_regions(mut ds: Dataset, source: &str, target: &str) -> Result<Dataset> {
    let col = ds.require_column(source)?;
    let regions: Vec<Cell> = (0..ds.len())
        .map(|row| derive_region(ds.text(row, col)).into())
        .collect();
    let found = regions.iter().filter(|c| !c.is_null()).count();
    ds.set_column(target, regions)?;
    tracing::debug!(rows = ds.len(), with_region = found, "derived regions");
    Ok(ds)
}
