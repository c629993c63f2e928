// CSV input for the CLI and for callers holding text data

use crate::data::{parse_datetime, Column, ColumnData, Dataset};
use crate::error::{PlotError, Result};
use std::io::{self, Read};

/// Read a CSV document (with header row) into a Dataset.
///
/// Column dtypes are decided once per column from its cells: integer, then
/// float, then boolean, then datetime, falling back to string. Empty cells
/// are missing values and do not take part in the decision.
pub fn read_csv<R: Read>(reader: R) -> Result<Dataset> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() {
        return Err(PlotError::Dataset("CSV has no header row".into()));
    }

    let mut cells: Vec<Vec<Option<String>>> = vec![Vec::new(); headers.len()];
    for record in rdr.records() {
        let record = record?;
        for (col, cell) in cells.iter_mut().enumerate() {
            let value = record.get(col).filter(|s| !s.is_empty()).map(str::to_string);
            cell.push(value);
        }
    }

    if cells[0].is_empty() {
        return Err(PlotError::Dataset(
            "CSV must contain at least one data row".into(),
        ));
    }

    let columns = headers
        .into_iter()
        .zip(cells)
        .map(|(name, raw)| infer_column(name, raw))
        .collect();

    Dataset::new(columns)
}

/// Read CSV data from stdin
pub fn read_csv_from_stdin() -> Result<Dataset> {
    let stdin = io::stdin();
    read_csv(stdin.lock())
}

fn infer_column(name: String, raw: Vec<Option<String>>) -> Column {
    let present = || raw.iter().flatten();

    if present().all(|s| s.parse::<i64>().is_ok()) {
        let values = raw.iter().map(|s| s.as_deref().and_then(|s| s.parse().ok())).collect();
        return Column::new(name, ColumnData::Int(values));
    }
    if present().all(|s| s.parse::<f64>().is_ok()) {
        let values = raw.iter().map(|s| s.as_deref().and_then(|s| s.parse().ok())).collect();
        return Column::new(name, ColumnData::Float(values));
    }
    if present().all(|s| parse_bool(s).is_some()) {
        let values = raw.iter().map(|s| s.as_deref().and_then(parse_bool)).collect();
        return Column::new(name, ColumnData::Bool(values));
    }
    if present().all(|s| parse_datetime(s).is_some()) {
        let values = raw.iter().map(|s| s.as_deref().and_then(parse_datetime)).collect();
        return Column::new(name, ColumnData::DateTime(values));
    }
    Column::new(name, ColumnData::Str(raw))
}

fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "true" | "True" | "TRUE" => Some(true),
        "false" | "False" | "FALSE" => Some(false),
        _ => None,
    }
}
