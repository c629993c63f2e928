use crate::error::{PlotError, Result};
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;

/// Formats accepted when reading datetime cells from text
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Declared storage type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DType {
    Int,
    Float,
    Bool,
    Str,
    Category,
    DateTime,
}

impl DType {
    pub fn is_numeric(&self) -> bool {
        matches!(self, DType::Int | DType::Float)
    }

    pub fn name(&self) -> &'static str {
        match self {
            DType::Int => "int64",
            DType::Float => "float64",
            DType::Bool => "bool",
            DType::Str => "string",
            DType::Category => "category",
            DType::DateTime => "datetime64",
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Column storage. Missing values are `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Int(Vec<Option<i64>>),
    Float(Vec<Option<f64>>),
    Bool(Vec<Option<bool>>),
    Str(Vec<Option<String>>),
    Category(Vec<Option<String>>),
    DateTime(Vec<Option<NaiveDateTime>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Int(v) => v.len(),
            ColumnData::Float(v) => v.len(),
            ColumnData::Bool(v) => v.len(),
            ColumnData::Str(v) | ColumnData::Category(v) => v.len(),
            ColumnData::DateTime(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dtype(&self) -> DType {
        match self {
            ColumnData::Int(_) => DType::Int,
            ColumnData::Float(_) => DType::Float,
            ColumnData::Bool(_) => DType::Bool,
            ColumnData::Str(_) => DType::Str,
            ColumnData::Category(_) => DType::Category,
            ColumnData::DateTime(_) => DType::DateTime,
        }
    }
}

/// A named, typed column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }

    pub fn int(name: impl Into<String>, values: impl IntoIterator<Item = i64>) -> Self {
        Self::new(name, ColumnData::Int(values.into_iter().map(Some).collect()))
    }

    pub fn float(name: impl Into<String>, values: impl IntoIterator<Item = f64>) -> Self {
        Self::new(name, ColumnData::Float(values.into_iter().map(Some).collect()))
    }

    pub fn boolean(name: impl Into<String>, values: impl IntoIterator<Item = bool>) -> Self {
        Self::new(name, ColumnData::Bool(values.into_iter().map(Some).collect()))
    }

    pub fn string<S: Into<String>>(name: impl Into<String>, values: impl IntoIterator<Item = S>) -> Self {
        Self::new(
            name,
            ColumnData::Str(values.into_iter().map(|s| Some(s.into())).collect()),
        )
    }

    pub fn category<S: Into<String>>(name: impl Into<String>, values: impl IntoIterator<Item = S>) -> Self {
        Self::new(
            name,
            ColumnData::Category(values.into_iter().map(|s| Some(s.into())).collect()),
        )
    }

    pub fn datetime(name: impl Into<String>, values: impl IntoIterator<Item = NaiveDateTime>) -> Self {
        Self::new(
            name,
            ColumnData::DateTime(values.into_iter().map(Some).collect()),
        )
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn dtype(&self) -> DType {
        self.data.dtype()
    }

    pub fn is_numeric(&self) -> bool {
        self.dtype().is_numeric()
    }

    /// Numeric view of row `i`; `None` for missing or non-finite values and
    /// for non-numeric columns
    pub fn f64_at(&self, i: usize) -> Option<f64> {
        match &self.data {
            ColumnData::Int(v) => v.get(i).copied().flatten().map(|x| x as f64),
            ColumnData::Float(v) => v.get(i).copied().flatten().filter(|x| x.is_finite()),
            _ => None,
        }
    }

    /// Non-missing numeric values, in row order
    pub fn valid_f64(&self) -> Vec<f64> {
        (0..self.len()).filter_map(|i| self.f64_at(i)).collect()
    }

    /// JSON representation of row `i`, as it appears in the data payload
    pub fn json_at(&self, i: usize) -> Value {
        match &self.data {
            ColumnData::Int(v) => v.get(i).copied().flatten().map(Value::from).unwrap_or(Value::Null),
            ColumnData::Float(v) => v
                .get(i)
                .copied()
                .flatten()
                .and_then(|x| serde_json::Number::from_f64(x).map(Value::Number))
                .unwrap_or(Value::Null),
            ColumnData::Bool(v) => v.get(i).copied().flatten().map(Value::Bool).unwrap_or(Value::Null),
            ColumnData::Str(v) | ColumnData::Category(v) => v
                .get(i)
                .cloned()
                .flatten()
                .map(Value::String)
                .unwrap_or(Value::Null),
            ColumnData::DateTime(v) => v
                .get(i)
                .copied()
                .flatten()
                .map(|d| Value::String(format_datetime(&d)))
                .unwrap_or(Value::Null),
        }
    }

    /// Grouping key of row `i` (used for categorical axes)
    pub fn key_at(&self, i: usize) -> Option<String> {
        match self.json_at(i) {
            Value::Null => None,
            Value::String(s) => Some(s),
            other => Some(other.to_string()),
        }
    }
}

/// Kind of object a dataset stands for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Frame,
    Series,
}

/// Column-oriented table with a row index
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    index: Column,
    columns: Vec<Column>,
    shape: Shape,
}

impl Dataset {
    /// Build a frame with a default range index
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let nrows = columns.first().map(|c| c.len()).unwrap_or(0);
        let mut seen = HashSet::new();
        for col in &columns {
            if col.len() != nrows {
                return Err(PlotError::Dataset(format!(
                    "column '{}' has {} rows, expected {}",
                    col.name,
                    col.len(),
                    nrows
                )));
            }
            if !seen.insert(col.name.as_str()) {
                return Err(PlotError::Dataset(format!("duplicate column name '{}'", col.name)));
            }
        }

        let index_name = if seen.contains("index") { "level_0" } else { "index" };
        let index = Column::int(index_name, 0..nrows as i64);

        Ok(Self {
            index,
            columns,
            shape: Shape::Frame,
        })
    }

    /// Build a series dataset from a single column
    pub fn from_series(column: Column) -> Self {
        let nrows = column.len();
        let index_name = if column.name == "index" { "level_0" } else { "index" };
        Self {
            index: Column::int(index_name, 0..nrows as i64),
            columns: vec![column],
            shape: Shape::Series,
        }
    }

    /// Promote an existing column to be the index
    pub fn set_index(mut self, name: &str) -> Result<Self> {
        let pos = self
            .columns
            .iter()
            .position(|c| c.name == name)
            .ok_or_else(|| PlotError::column_not_found("index", name))?;
        self.index = self.columns.remove(pos);
        Ok(self)
    }

    /// View a single column as a series sharing this dataset's index
    pub fn series(&self, name: &str) -> Result<Dataset> {
        let column = self
            .column(name)
            .cloned()
            .ok_or_else(|| PlotError::column_not_found("series", name))?;
        Ok(Dataset {
            index: self.index.clone(),
            ..Dataset::from_series(column)
        })
    }

    pub fn index(&self) -> &Column {
        &self.index
    }

    pub fn index_name(&self) -> &str {
        &self.index.name
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Look up a column or the index by name
    pub fn field(&self, name: &str) -> Option<&Column> {
        self.column(name)
            .or_else(|| (self.index.name == name).then_some(&self.index))
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn numeric_columns(&self) -> Vec<&Column> {
        self.columns.iter().filter(|c| c.is_numeric()).collect()
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn is_series(&self) -> bool {
        self.shape == Shape::Series
    }

    /// Rows as JSON objects, the index first when requested
    pub fn to_records(&self, include_index: bool) -> Vec<Map<String, Value>> {
        (0..self.len())
            .map(|i| {
                let mut row = Map::new();
                if include_index {
                    row.insert(self.index.name.clone(), self.index.json_at(i));
                }
                for col in &self.columns {
                    row.insert(col.name.clone(), col.json_at(i));
                }
                row
            })
            .collect()
    }

    /// Create a Dataset from a JSON array of objects
    pub fn from_json(value: &Value) -> Result<Self> {
        let array = value
            .as_array()
            .ok_or_else(|| PlotError::Dataset("input data must be a JSON array of objects".into()))?;

        if array.is_empty() {
            return Err(PlotError::Dataset("input data array is empty".into()));
        }

        // Headers come from the first object
        let first_obj = array[0]
            .as_object()
            .ok_or_else(|| PlotError::Dataset("items in array must be objects".into()))?;
        let headers: Vec<String> = first_obj.keys().cloned().collect();

        let null = Value::Null;
        let mut cells: Vec<Vec<&Value>> = vec![Vec::with_capacity(array.len()); headers.len()];
        for item in array {
            let obj = item
                .as_object()
                .ok_or_else(|| PlotError::Dataset("items in array must be objects".into()))?;
            for (col, header) in headers.iter().enumerate() {
                cells[col].push(obj.get(header).unwrap_or(&null));
            }
        }

        let columns = headers
            .into_iter()
            .zip(cells)
            .map(|(name, values)| json_column(name, &values))
            .collect::<Result<Vec<_>>>()?;

        Dataset::new(columns)
    }
}

fn json_column(name: String, values: &[&Value]) -> Result<Column> {
    let present: Vec<&Value> = values.iter().copied().filter(|v| !v.is_null()).collect();

    if present.iter().all(|v| v.as_i64().is_some()) {
        return Ok(Column::new(name, ColumnData::Int(values.iter().map(|v| v.as_i64()).collect())));
    }
    if present.iter().all(|v| v.is_number()) {
        return Ok(Column::new(name, ColumnData::Float(values.iter().map(|v| v.as_f64()).collect())));
    }
    if present.iter().all(|v| v.is_boolean()) {
        return Ok(Column::new(name, ColumnData::Bool(values.iter().map(|v| v.as_bool()).collect())));
    }
    if present.iter().all(|v| v.is_string()) {
        let strings: Vec<Option<String>> = values.iter().map(|v| v.as_str().map(str::to_string)).collect();
        if !present.is_empty()
            && strings.iter().flatten().all(|s| parse_datetime(s).is_some())
        {
            let dates = strings.iter().map(|s| s.as_deref().and_then(parse_datetime)).collect();
            return Ok(Column::new(name, ColumnData::DateTime(dates)));
        }
        return Ok(Column::new(name, ColumnData::Str(strings)));
    }

    Err(PlotError::Dataset(format!("unsupported value type for field '{}'", name)))
}

/// Parse an ISO-like date or datetime
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

pub fn format_datetime(dt: &NaiveDateTime) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_index() {
        let ds = Dataset::new(vec![Column::int("a", [1, 2, 3])]).unwrap();
        assert_eq!(ds.index_name(), "index");
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.index().json_at(2), json!(2));
    }

    #[test]
    fn test_index_name_avoids_collision() {
        let ds = Dataset::new(vec![Column::int("index", [1, 2])]).unwrap();
        assert_eq!(ds.index_name(), "level_0");
    }

    #[test]
    fn test_ragged_columns_rejected() {
        let res = Dataset::new(vec![Column::int("a", [1, 2]), Column::int("b", [1])]);
        assert!(matches!(res, Err(PlotError::Dataset(_))));
    }

    #[test]
    fn test_duplicate_columns_rejected() {
        let res = Dataset::new(vec![Column::int("a", [1]), Column::int("a", [2])]);
        assert!(res.is_err());
    }

    #[test]
    fn test_set_index() {
        let ds = Dataset::new(vec![
            Column::string("day", ["mon", "tue"]),
            Column::float("temp", [20.5, 21.0]),
        ])
        .unwrap()
        .set_index("day")
        .unwrap();
        assert_eq!(ds.index_name(), "day");
        assert_eq!(ds.column_names(), vec!["temp"]);
    }

    #[test]
    fn test_series_view() {
        let ds = Dataset::new(vec![Column::int("a", [1, 2]), Column::int("b", [3, 4])]).unwrap();
        let s = ds.series("b").unwrap();
        assert!(s.is_series());
        assert_eq!(s.column_names(), vec!["b"]);
        assert!(ds.series("zzz").is_err());
    }

    #[test]
    fn test_from_series() {
        let s = Dataset::from_series(Column::float("index", [1.0, 2.0]));
        assert!(s.is_series());
        assert_eq!(s.index_name(), "level_0");
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn test_non_finite_values_are_missing() {
        let col = Column::new(
            "v",
            ColumnData::Float(vec![Some(1.0), Some(f64::INFINITY), None, Some(f64::NAN), Some(f64::NEG_INFINITY)]),
        );
        assert_eq!(col.f64_at(0), Some(1.0));
        assert_eq!(col.f64_at(1), None);
        assert_eq!(col.f64_at(4), None);
        assert_eq!(col.valid_f64(), vec![1.0]);
        assert_eq!(col.json_at(1), Value::Null);
    }

    #[test]
    fn test_from_json_infers_types() {
        let value = json!([
            {"n": 1, "f": 1.5, "s": "a", "d": "2020-01-01", "b": true},
            {"n": 2, "f": null, "s": "b", "d": "2020-01-02", "b": false}
        ]);
        let ds = Dataset::from_json(&value).unwrap();
        assert_eq!(ds.column("n").unwrap().dtype(), DType::Int);
        assert_eq!(ds.column("f").unwrap().dtype(), DType::Float);
        assert_eq!(ds.column("s").unwrap().dtype(), DType::Str);
        assert_eq!(ds.column("d").unwrap().dtype(), DType::DateTime);
        assert_eq!(ds.column("b").unwrap().dtype(), DType::Bool);
        assert_eq!(ds.column("f").unwrap().f64_at(1), None);
    }

    #[test]
    fn test_from_json_not_array() {
        assert!(Dataset::from_json(&json!({"a": 1})).is_err());
        assert!(Dataset::from_json(&json!([])).is_err());
    }

    #[test]
    fn test_to_records() {
        let ds = Dataset::new(vec![Column::string("s", ["x", "y"])]).unwrap();
        let records = ds.to_records(true);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1]["index"], json!(1));
        assert_eq!(records[1]["s"], json!("y"));
    }

    #[test]
    fn test_parse_datetime() {
        assert!(parse_datetime("2021-03-04").is_some());
        assert!(parse_datetime("2021-03-04 10:11:12").is_some());
        assert!(parse_datetime("2021-03-04T10:11").is_some());
        assert!(parse_datetime("yesterday").is_none());
    }
}
