use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;
use unicode_normalization::UnicodeNormalization;

use crate::config::ColumnNames;
use crate::dataset::{Cell, Dataset};
use crate::error::{Result, SurveyError};

/// Tokens typed into the survey in place of a missing value.
const NULL_TOKENS: [&str; 4] = ["nan", "null", "-", ""];

fn identifier_junk() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9_]").expect("static pattern"))
}

/// Normalize a column header into an ASCII identifier:
/// - Trim and lowercase
/// - Spaces become underscores
/// - NFKD decomposition, non-ASCII dropped (accents vanish, base letters stay)
/// - Anything outside `[a-zA-Z0-9_]` removed
///
/// Idempotent: `clean_header(clean_header(h)) == clean_header(h)`.
pub fn clean_header(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase().replace(' ', "_");
    let ascii: String = lowered.nfkd().filter(char::is_ascii).collect();
    identifier_junk()
        .replace_all(&ascii, "")
        .to_ascii_lowercase()
}

/// Trim and lowercase a free-text value; sentinel tokens become `None`.
pub fn clean_text(raw: &str) -> Option<String> {
    let cleaned = raw.trim().to_lowercase();
    if is_null_token(&cleaned) {
        None
    } else {
        Some(cleaned)
    }
}

/// True for the literal tokens that stand for "no value".
pub fn is_null_token(value: &str) -> bool {
    NULL_TOKENS.contains(&value)
}

/// Parse a finite number. Words that `f64::from_str` accepts ("nan", "inf")
/// are rejected.
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Turn a raw table into the canonical dataset.
///
/// Columns whose every present value parses as a number become numeric;
/// every other column is free text, trimmed and lowercased, with sentinel
/// tokens turned into nulls. The call-duration column, when present, is
/// coerced to a float with nulls filled by `0.0`.
pub fn normalize(raw: Dataset, columns: &ColumnNames) -> Result<Dataset> {
    let mut ds = raw;

    let headers: Vec<String> = ds.columns().iter().map(|h| clean_header(h)).collect();
    let mut seen = HashSet::new();
    for h in &headers {
        if !seen.insert(h.as_str()) {
            return Err(SurveyError::DuplicateColumn(h.clone()));
        }
    }
    *ds.columns_mut() = headers;

    for col in 0..ds.columns().len() {
        let numeric = column_is_numeric(&ds, col);
        for row in ds.rows_mut().iter_mut() {
            row[col] = normalize_cell(&row[col], numeric);
        }
    }

    if let Some(col) = ds.column_index(&columns.call_duration) {
        coerce_duration(&mut ds, col)?;
    } else {
        tracing::debug!(column = %columns.call_duration, "no call-duration column to coerce");
    }

    tracing::debug!(rows = ds.len(), columns = ds.columns().len(), "normalized dataset");
    Ok(ds)
}

fn column_is_numeric(ds: &Dataset, col: usize) -> bool {
    ds.column(col).all(|cell| match cell {
        Cell::Null | Cell::Number(_) => true,
        Cell::Text(s) => clean_text(s).is_none() || parse_number(s).is_some(),
    })
}

fn normalize_cell(cell: &Cell, numeric: bool) -> Cell {
    match (cell, numeric) {
        (Cell::Null, _) => Cell::Null,
        (Cell::Number(n), true) => Cell::Number(*n),
        (Cell::Number(n), false) => Cell::Text(n.to_string()),
        (Cell::Text(s), true) => parse_number(s).map(Cell::Number).unwrap_or(Cell::Null),
        (Cell::Text(s), false) => clean_text(s).into(),
    }
}

fn coerce_duration(ds: &mut Dataset, col: usize) -> Result<()> {
    let name = ds.columns()[col].clone();
    for (i, row) in ds.rows_mut().iter_mut().enumerate() {
        let value = match &row[col] {
            Cell::Null => 0.0,
            Cell::Number(n) => *n,
            Cell::Text(s) => parse_number(s).ok_or_else(|| SurveyError::Numeric {
                column: name.clone(),
                row: i,
                value: s.clone(),
            })?,
        };
        row[col] = Cell::Number(value);
    }
    Ok(())
}
