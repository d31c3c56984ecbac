use nu_plugin::EvaluatedCall;
use nu_protocol::{LabeledError, ListStream, PipelineData, Record, Signals, Span, Value};
use std::path::PathBuf;

use crate::config::{self, SurveyConfig};
use crate::dataset::{Cell, Dataset};
use crate::error::SurveyError;

/// Collect a table (list of records) into a [`Dataset`].
///
/// Columns are the union of record keys in first-appearance order; a record
/// lacking a column gets null there. Non-record items become a single
/// `value` column.
pub fn table_to_dataset(rows: &[Value], span: Span) -> Result<Dataset, LabeledError> {
    let mut columns: Vec<String> = Vec::new();
    for row in rows {
        match row {
            Value::Record { val, .. } => {
                for (name, _) in val.iter() {
                    if !columns.iter().any(|c| c == name) {
                        columns.push(name.clone());
                    }
                }
            }
            _ => {
                if !columns.iter().any(|c| c == "value") {
                    columns.push("value".into());
                }
            }
        }
    }

    let mut ds = Dataset::new(columns);
    for row in rows {
        let cells = ds
            .columns()
            .iter()
            .map(|name| match row {
                Value::Record { val, .. } => val.get(name).map(cell_from_value).unwrap_or(Cell::Null),
                other if name == "value" => cell_from_value(other),
                _ => Cell::Null,
            })
            .collect();
        ds.push_row(cells).map_err(|e| to_labeled(e, span))?;
    }
    Ok(ds)
}

pub fn cell_from_value(v: &Value) -> Cell {
    match v {
        Value::Nothing { .. } => Cell::Null,
        Value::String { val, .. } => Cell::Text(val.clone()),
        Value::Int { val, .. } => Cell::Number(*val as f64),
        Value::Float { val, .. } => Cell::Number(*val),
        other => other.coerce_string().map(Cell::Text).unwrap_or(Cell::Null),
    }
}

/// Integral numbers become `int` unless `float` is set for the column.
pub fn value_from_cell(cell: &Cell, float: bool, span: Span) -> Value {
    match cell {
        Cell::Null => Value::nothing(span),
        Cell::Number(n) if !float && n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 => {
            Value::int(*n as i64, span)
        }
        Cell::Number(n) => Value::float(*n, span),
        Cell::Text(s) => Value::string(s, span),
    }
}

/// Render a dataset back into a table stream. The call-duration column
/// stays `float` even when its values are whole.
pub fn dataset_to_pipeline(ds: &Dataset, config: &SurveyConfig, span: Span) -> PipelineData {
    let float_cols: Vec<bool> = ds
        .columns()
        .iter()
        .map(|c| *c == config.columns.call_duration)
        .collect();
    let rows: Vec<Value> = ds
        .rows()
        .iter()
        .map(|row| {
            let mut record = Record::new();
            for ((name, cell), &float) in ds.columns().iter().zip(row).zip(&float_cols) {
                record.push(name.clone(), value_from_cell(cell, float, span));
            }
            Value::record(record, span)
        })
        .collect();
    ListStream::new(rows.into_iter(), span, Signals::empty()).into()
}

/// Configuration from the `--config` flag, or the default resolution order.
pub fn survey_config(call: &EvaluatedCall) -> Result<SurveyConfig, LabeledError> {
    let path: Option<String> = call.get_flag("config")?;
    config::resolve_config(path.map(PathBuf::from).as_deref())
        .map_err(|e| to_labeled(e, call.head))
}

pub fn to_labeled(e: SurveyError, span: Span) -> LabeledError {
    LabeledError::new(e.to_string()).with_label("survey pipeline failed here", span)
}

/// Collect the input stream into rows.
pub fn collect_rows(input: PipelineData) -> Vec<Value> {
    match input {
        PipelineData::Value(Value::List { vals, .. }, _) => vals,
        PipelineData::Value(Value::Nothing { .. }, _) => vec![],
        other => other.into_iter().collect(),
    }
}
