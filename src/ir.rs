use crate::data::{Column, DType};
use crate::infer::{vegalite_type, VegaType};
use crate::request::{PlotKind, StyleOptions};
use serde_json::{Map, Value};

// =============================================================================
// Phase 1: Resolution
// =============================================================================

/// A dataset column (or the index) bound to a channel, with its types
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedField {
    pub name: String,
    pub dtype: DType,
    pub vtype: VegaType,
    pub is_index: bool,
}

impl ResolvedField {
    pub fn from_column(column: &Column, is_index: bool) -> Self {
        Self {
            name: column.name.clone(),
            dtype: column.dtype(),
            vtype: vegalite_type(column.dtype()),
            is_index,
        }
    }
}

/// A channel bound either to a field or to a constant
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedChannel {
    Field(ResolvedField),
    Value(Value),
}

impl ResolvedChannel {
    pub fn field_name(&self) -> Option<&str> {
        match self {
            ResolvedChannel::Field(f) => Some(&f.name),
            ResolvedChannel::Value(_) => None,
        }
    }
}

/// Result of resolving a request against the dataset columns (not values)
#[derive(Debug, Clone)]
pub struct ResolvedRequest {
    pub kind: PlotKind,
    /// Row index of the dataset
    pub index: ResolvedField,
    /// Position along x; the index when the caller gave none
    pub x: Option<ResolvedField>,
    /// Whether `x` was given explicitly
    pub x_explicit: bool,
    /// Single y column (scatter, hexbin, heatmap)
    pub y: Option<ResolvedField>,
    /// Columns plotted as separate series (or panels)
    pub series: Vec<ResolvedField>,
    pub color: Option<ResolvedChannel>,
    pub size: Option<ResolvedChannel>,
    /// Column aggregated per cell (hexbin/heatmap `C`)
    pub value_column: Option<ResolvedField>,
    pub class_column: Option<ResolvedField>,
    /// Input was a series rather than a frame
    pub is_series: bool,
    pub options: StyleOptions,
}

impl ResolvedRequest {
    pub fn series_names(&self) -> Vec<String> {
        self.series.iter().map(|f| f.name.clone()).collect()
    }
}

// =============================================================================
// Phase 2: Transformation
// =============================================================================

/// One row of the data payload
pub type Record = Map<String, Value>;

/// Data payload produced for a plot, plus the fields the builder derived
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    pub records: Vec<Record>,
    /// Number of series the payload holds (drives default opacity)
    pub n_series: usize,
}

impl Payload {
    pub fn new(records: Vec<Record>, n_series: usize) -> Self {
        Self { records, n_series }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Build a record from `(field, value)` pairs
pub fn record<I, K>(fields: I) -> Record
where
    I: IntoIterator<Item = (K, Value)>,
    K: Into<String>,
{
    fields.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

/// JSON number for a float, `null` when not finite
pub fn number(x: f64) -> Value {
    serde_json::Number::from_f64(x)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
