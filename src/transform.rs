//! Data payload construction: reshaping (melt) and the statistics the
//! builder computes itself (histograms, 2-D binning, KDE, lag pairs,
//! Andrews curves).

use crate::data::{Column, Dataset};
use crate::error::{PlotError, Result};
use crate::ir::{number, record, Payload, Record, ResolvedField};
use crate::request::Bandwidth;
use crate::vegalite::Aggregate;
use log::{debug, warn};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::f64::consts::PI;

pub const DEFAULT_BINS: usize = 10;
pub const DEFAULT_GRIDSIZE: usize = 100;
pub const DEFAULT_SAMPLES: usize = 200;

pub const VAR_NAME: &str = "variable";
pub const VALUE_NAME: &str = "value";
pub const BIN_START: &str = "bin_start";
pub const BIN_END: &str = "bin_end";
pub const COUNT: &str = "count";
pub const DENSITY: &str = "density";
pub const ANDREWS_T: &str = "t";
pub const ANDREWS_SAMPLE: &str = "sample";

fn column<'a>(data: &'a Dataset, field: &ResolvedField) -> Result<&'a Column> {
    data.field(&field.name)
        .ok_or_else(|| PlotError::column_not_found("field", &field.name))
}

/// Finite non-null values of a numeric field, warning about any that were dropped
fn valid_values(data: &Dataset, field: &ResolvedField, kind: &str) -> Result<Vec<f64>> {
    let col = column(data, field)?;
    let values = col.valid_f64();
    let dropped = col.len() - values.len();
    if dropped > 0 {
        warn!("{}(): dropped {} missing or non-finite values from '{}'", kind, dropped, field.name);
    }
    Ok(values)
}

// =============================================================================
// Reshaping
// =============================================================================

/// Keep only the named fields of every row
pub fn project(data: &Dataset, fields: &[&ResolvedField]) -> Result<Vec<Record>> {
    let columns = fields
        .iter()
        .map(|f| column(data, f))
        .collect::<Result<Vec<_>>>()?;

    Ok((0..data.len())
        .map(|i| {
            columns
                .iter()
                .map(|c| (c.name.clone(), c.json_at(i)))
                .collect()
        })
        .collect())
}

/// Fail when a copied column shares its name with a field the builder derives
fn check_collision(param: &str, column: &str, derived: &[&str]) -> Result<()> {
    match derived.iter().find(|name| **name == column) {
        Some(name) => Err(PlotError::invalid(
            param,
            format!("column '{}' clashes with the derived '{}' field", column, name),
        )),
        None => Ok(()),
    }
}

/// Wide to long: one record per (value column, row), value columns outermost.
///
/// `ids` are copied onto every record; the column name goes to `var_name`
/// and the cell to `value_name`. An id named like either output field is an
/// error rather than being overwritten.
pub fn melt(
    data: &Dataset,
    ids: &[&ResolvedField],
    values: &[ResolvedField],
    var_name: &str,
    value_name: &str,
) -> Result<Vec<Record>> {
    if var_name == value_name {
        return Err(PlotError::invalid("value_name", format!("'{}' is also the var_name", value_name)));
    }
    for id in ids {
        check_collision("var_name", &id.name, &[var_name])?;
        check_collision("value_name", &id.name, &[value_name])?;
    }
    let id_columns = ids
        .iter()
        .map(|f| column(data, f))
        .collect::<Result<Vec<_>>>()?;

    let mut records = Vec::with_capacity(values.len() * data.len());
    for field in values {
        let col = column(data, field)?;
        for i in 0..data.len() {
            let mut row: Record = id_columns
                .iter()
                .map(|c| (c.name.clone(), c.json_at(i)))
                .collect();
            row.insert(var_name.to_string(), Value::String(col.name.clone()));
            row.insert(value_name.to_string(), col.json_at(i));
            records.push(row);
        }
    }
    Ok(records)
}

// =============================================================================
// Binning
// =============================================================================

/// `count` uniform-width bins over `[lo, hi]`.
///
/// Bins are `(e_i, e_i+1]` except the first, which is closed `[lo, e_1]`,
/// so a value on an interior edge falls in the lower-indexed bin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinEdges {
    pub lo: f64,
    pub hi: f64,
    pub count: usize,
}

impl BinEdges {
    /// Edges spanning the observed range of `values`; `None` when there are
    /// no finite values or `count` is zero.
    /// A single distinct value `v` is widened to `[v - 0.5, v + 0.5]`.
    pub fn spanning(values: impl IntoIterator<Item = f64>, count: usize) -> Option<Self> {
        if count == 0 {
            return None;
        }
        let (lo, hi) = values
            .into_iter()
            .filter(|v| v.is_finite())
            .fold(None, |acc: Option<(f64, f64)>, v| match acc {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })?;

        let (lo, hi) = if lo == hi { (lo - 0.5, hi + 0.5) } else { (lo, hi) };
        Some(Self { lo, hi, count })
    }

    pub fn width(&self) -> f64 {
        (self.hi - self.lo) / self.count as f64
    }

    /// Left edge of bin `i` (`edge(count)` is `hi`)
    pub fn edge(&self, i: usize) -> f64 {
        if i >= self.count {
            self.hi
        } else {
            self.lo + i as f64 * self.width()
        }
    }

    /// Bin holding `v`, or `None` when outside the range
    pub fn locate(&self, v: f64) -> Option<usize> {
        if !v.is_finite() || v < self.lo || v > self.hi {
            return None;
        }
        let last = self.count - 1;
        let pos = ((v - self.lo) / self.width()).ceil() as usize;
        let mut idx = pos.saturating_sub(1).min(last);

        // Rounding in the division can land one bin off near an edge
        if idx > 0 && v <= self.edge(idx) {
            idx -= 1;
        } else if idx < last && v > self.edge(idx + 1) {
            idx += 1;
        }
        Some(idx)
    }

    /// Count of values per bin; out-of-range values are dropped
    pub fn histogram(&self, values: &[f64]) -> Vec<usize> {
        let mut counts = vec![0; self.count];
        for &v in values {
            if let Some(i) = self.locate(v) {
                counts[i] += 1;
            }
        }
        counts
    }
}

/// Histogram of each series over one shared set of edges.
///
/// Emits exactly `bins` records per series, `{variable, bin_start, bin_end, count}`.
pub fn histogram_records(data: &Dataset, series: &[ResolvedField], bins: usize) -> Result<Payload> {
    let mut values = Vec::with_capacity(series.len());
    for field in series {
        values.push((field.name.clone(), valid_values(data, field, "hist")?));
    }

    let edges = BinEdges::spanning(values.iter().flat_map(|(_, v)| v.iter().copied()), bins)
        .ok_or_else(|| PlotError::InsufficientData {
            kind: "hist".into(),
            reason: "no non-null values to bin".into(),
        })?;
    debug!("histogram edges: [{}, {}] in {} bins", edges.lo, edges.hi, edges.count);

    let mut records = Vec::with_capacity(series.len() * edges.count);
    for (name, vals) in &values {
        let counts = edges.histogram(vals);
        for (i, count) in counts.into_iter().enumerate() {
            records.push(record([
                (VAR_NAME, Value::String(name.clone())),
                (BIN_START, number(edges.edge(i))),
                (BIN_END, number(edges.edge(i + 1))),
                (COUNT, Value::from(count)),
            ]));
        }
    }
    Ok(Payload::new(records, series.len()))
}

/// Apply an aggregate to a group of values; `None` for an empty group
pub fn reduce(values: &[f64], aggregate: Aggregate) -> Option<f64> {
    if aggregate == Aggregate::Count {
        return Some(values.len() as f64);
    }
    if values.is_empty() {
        return None;
    }
    let n = values.len() as f64;
    let result = match aggregate {
        Aggregate::Count => n,
        Aggregate::Sum => values.iter().sum(),
        Aggregate::Mean => values.iter().sum::<f64>() / n,
        Aggregate::Median => {
            let mut sorted = values.to_vec();
            sorted.sort_by(|a, b| a.total_cmp(b));
            percentile(&sorted, 0.5)
        }
        Aggregate::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
        Aggregate::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    };
    Some(result)
}

fn percentile(sorted_data: &[f64], p: f64) -> f64 {
    let n = sorted_data.len();
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return sorted_data[0];
    }

    let rank = p * (n - 1) as f64;
    let lower_idx = rank.floor() as usize;
    let upper_idx = rank.ceil() as usize;

    if lower_idx == upper_idx {
        sorted_data[lower_idx]
    } else {
        let weight = rank - lower_idx as f64;
        sorted_data[lower_idx] * (1.0 - weight) + sorted_data[upper_idx] * weight
    }
}

/// One axis of a 2-D grid: uniform bins over a numeric column, or the
/// distinct values of any other column.
#[derive(Debug, Clone)]
pub enum GridAxis {
    Binned(BinEdges),
    Grouped(Vec<String>),
}

impl GridAxis {
    pub fn for_column(col: &Column, gridsize: usize) -> Option<Self> {
        if col.is_numeric() {
            return BinEdges::spanning(col.valid_f64(), gridsize).map(GridAxis::Binned);
        }
        let keys = distinct_keys(col);
        (!keys.is_empty()).then_some(GridAxis::Grouped(keys))
    }

    fn cell(&self, col: &Column, row: usize) -> Option<usize> {
        match self {
            GridAxis::Binned(edges) => col.f64_at(row).and_then(|v| edges.locate(v)),
            GridAxis::Grouped(keys) => {
                let key = col.key_at(row)?;
                keys.iter().position(|k| *k == key)
            }
        }
    }

    /// Fields describing cell `i` along this axis
    fn fields(&self, axis: &str, column: &str, i: usize) -> Vec<(String, Value)> {
        match self {
            GridAxis::Binned(edges) => vec![
                (format!("{}_start", axis), number(edges.edge(i))),
                (format!("{}_end", axis), number(edges.edge(i + 1))),
            ],
            GridAxis::Grouped(keys) => vec![(column.to_string(), Value::String(keys[i].clone()))],
        }
    }
}

/// Output of 2-D binning
#[derive(Debug, Clone)]
pub struct Grid {
    pub x: GridAxis,
    pub y: GridAxis,
    /// Name of the per-cell value field
    pub value_field: String,
    pub payload: Payload,
}

/// Bin rows on a `gridsize × gridsize` grid and emit one record per
/// non-empty cell: the row count, or `reduce` over column `c`.
pub fn grid_records(
    kind: &str,
    data: &Dataset,
    x: &ResolvedField,
    y: &ResolvedField,
    c: Option<&ResolvedField>,
    reduce_fn: Aggregate,
    gridsize: usize,
) -> Result<Grid> {
    let xcol = column(data, x)?;
    let ycol = column(data, y)?;
    let ccol = c.map(|f| column(data, f)).transpose()?;

    let no_data = || PlotError::InsufficientData {
        kind: kind.to_string(),
        reason: "no rows with both x and y present".into(),
    };
    let xaxis = GridAxis::for_column(xcol, gridsize).ok_or_else(no_data)?;
    let yaxis = GridAxis::for_column(ycol, gridsize).ok_or_else(no_data)?;
    let value_field = c.map(|f| f.name.clone()).unwrap_or_else(|| COUNT.to_string());

    // Grouped axes copy the column name into each record
    let mut derived = vec![value_field.clone()];
    for (axis, prefix) in [(&xaxis, "x"), (&yaxis, "y")] {
        if let GridAxis::Binned(_) = axis {
            derived.push(format!("{}_start", prefix));
            derived.push(format!("{}_end", prefix));
        }
    }
    let derived: Vec<&str> = derived.iter().map(String::as_str).collect();
    for (axis, field, param) in [(&xaxis, x, "x"), (&yaxis, y, "y")] {
        if let GridAxis::Grouped(_) = axis {
            check_collision(param, &field.name, &derived)?;
        }
    }

    let mut cells: BTreeMap<(usize, usize), Vec<f64>> = BTreeMap::new();
    let mut skipped = 0;
    for row in 0..data.len() {
        let (Some(xi), Some(yi)) = (xaxis.cell(xcol, row), yaxis.cell(ycol, row)) else {
            skipped += 1;
            continue;
        };
        let entry = cells.entry((xi, yi)).or_default();
        match ccol {
            Some(col) => {
                if let Some(v) = col.f64_at(row) {
                    entry.push(v);
                }
            }
            None => entry.push(1.0),
        }
    }
    if skipped > 0 {
        debug!("2-D binning skipped {} rows with missing x or y", skipped);
    }

    let records = cells
        .into_iter()
        .filter_map(|((xi, yi), values)| {
            let value = match ccol {
                Some(_) if values.is_empty() => return None,
                Some(_) => reduce(&values, reduce_fn)?,
                None => values.len() as f64,
            };
            let mut fields = xaxis.fields("x", &x.name, xi);
            fields.extend(yaxis.fields("y", &y.name, yi));
            let value = if ccol.is_none() || reduce_fn == Aggregate::Count {
                Value::from(value as u64)
            } else {
                number(value)
            };
            fields.push((value_field.clone(), value));
            Some(record(fields))
        })
        .collect();

    Ok(Grid {
        x: xaxis,
        y: yaxis,
        value_field,
        payload: Payload::new(records, 1),
    })
}

// =============================================================================
// Kernel density estimation
// =============================================================================

/// Bandwidth factor applied to the sample standard deviation
pub fn bandwidth_factor(method: Bandwidth, n: usize) -> f64 {
    let n = n as f64;
    match method {
        Bandwidth::Scott => n.powf(-0.2),
        Bandwidth::Silverman => (n * 3.0 / 4.0).powf(-0.2),
        Bandwidth::Factor(f) => f,
    }
}

/// Gaussian kernel function
fn gaussian_kernel(u: f64) -> f64 {
    const SQRT_2PI: f64 = 2.5066282746310002;
    (-0.5 * u * u).exp() / SQRT_2PI
}

fn std_dev(data: &[f64]) -> f64 {
    let n = data.len() as f64;
    let mean = data.iter().sum::<f64>() / n;
    let variance = data.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

/// Evenly spaced points from `start` to `end` inclusive
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + i as f64 * step).collect()
        }
    }
}

/// Gaussian KDE of `data` evaluated at `grid`
pub fn gaussian_kde(data: &[f64], bandwidth: f64, grid: &[f64]) -> Vec<f64> {
    let n = data.len() as f64;
    grid.iter()
        .map(|&y| {
            let d: f64 = data.iter().map(|&xi| gaussian_kernel((y - xi) / bandwidth)).sum();
            d / (n * bandwidth)
        })
        .collect()
}

/// Density curve of each series, `{variable, value, density}` per grid point.
///
/// The grid spans the series range extended by half the range on both sides.
pub fn kde_records(
    data: &Dataset,
    series: &[ResolvedField],
    method: Bandwidth,
    points: usize,
) -> Result<Payload> {
    let mut records = Vec::with_capacity(series.len() * points);
    for field in series {
        let values = valid_values(data, field, "kde")?;
        if values.len() < 2 {
            return Err(PlotError::InsufficientData {
                kind: "kde".into(),
                reason: format!("column '{}' needs at least 2 non-null values", field.name),
            });
        }
        let sd = std_dev(&values);
        if sd == 0.0 || !sd.is_finite() {
            return Err(PlotError::InsufficientData {
                kind: "kde".into(),
                reason: format!("column '{}' has zero variance", field.name),
            });
        }
        let bandwidth = sd * bandwidth_factor(method, values.len());

        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let range = max - min;
        let grid = linspace(min - 0.5 * range, max + 0.5 * range, points);
        let density = gaussian_kde(&values, bandwidth, &grid);

        for (x, d) in grid.into_iter().zip(density) {
            records.push(record([
                (VAR_NAME, Value::String(field.name.clone())),
                (VALUE_NAME, number(x)),
                (DENSITY, number(d)),
            ]));
        }
    }
    Ok(Payload::new(records, series.len()))
}

// =============================================================================
// Lag plots and Andrews curves
// =============================================================================

/// Field names of the two lag plot axes
pub fn lag_fields(lag: usize) -> (String, String) {
    ("y(t)".to_string(), format!("y(t + {})", lag))
}

/// `(v[i], v[i + lag])` pairs of each series, `N - lag` per series.
/// With `tag_series` each record also names its series under `variable`.
pub fn lag_records(
    data: &Dataset,
    series: &[ResolvedField],
    lag: usize,
    tag_series: bool,
) -> Result<Payload> {
    let n = data.len();
    if lag == 0 || lag >= n {
        return Err(PlotError::InvalidLag { lag, len: n });
    }
    let (y1, y2) = lag_fields(lag);

    let mut records = Vec::with_capacity(series.len() * (n - lag));
    for field in series {
        let col = column(data, field)?;
        for i in 0..n - lag {
            let mut row = record([(y1.as_str(), col.json_at(i)), (y2.as_str(), col.json_at(i + lag))]);
            if tag_series {
                row.insert(VAR_NAME.to_string(), Value::String(col.name.clone()));
            }
            records.push(row);
        }
    }
    Ok(Payload::new(records, series.len()))
}

/// Andrews curve of one observation at `t`:
/// `v0 + v1 sin(t) + v2 cos(t) + v3 sin(2t) + v4 cos(2t) + ...`
pub fn andrews_curve(values: &[f64], t: f64) -> f64 {
    let Some((&first, rest)) = values.split_first() else {
        return 0.0;
    };
    rest.iter().enumerate().fold(first, |acc, (j, &v)| {
        let i = j + 1;
        let ft = ((i + 1) / 2) as f64 * t;
        if i % 2 == 1 {
            acc + v * ft.sin()
        } else {
            acc + v * ft.cos()
        }
    })
}

/// Sample every row's Andrews curve at `samples` points over `[-π, π]`.
///
/// Records are `{t, sample, value, <class>}`; rows with a missing value
/// are skipped.
pub fn andrews_records(
    data: &Dataset,
    series: &[ResolvedField],
    class: &ResolvedField,
    samples: usize,
) -> Result<Payload> {
    let columns = series
        .iter()
        .map(|f| column(data, f))
        .collect::<Result<Vec<_>>>()?;
    check_collision("class_column", &class.name, &[ANDREWS_T, ANDREWS_SAMPLE, VALUE_NAME])?;
    let class_col = column(data, class)?;
    let ts = linspace(-PI, PI, samples);

    let mut records = Vec::with_capacity(data.len() * samples);
    let mut skipped = 0;
    for row in 0..data.len() {
        let values: Option<Vec<f64>> = columns.iter().map(|c| c.f64_at(row)).collect();
        let Some(values) = values else {
            skipped += 1;
            continue;
        };
        let class_value = class_col.json_at(row);
        for &t in &ts {
            records.push(record([
                (ANDREWS_T, number(t)),
                (ANDREWS_SAMPLE, Value::from(row)),
                (VALUE_NAME, number(andrews_curve(&values, t))),
                (class.name.as_str(), class_value.clone()),
            ]));
        }
    }
    if skipped > 0 {
        warn!("andrews_curves(): skipped {} rows with missing values", skipped);
    }
    Ok(Payload::new(records, data.len() - skipped))
}

/// Distinct values of a column in order of first appearance
pub fn distinct_keys(col: &Column) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut keys = Vec::new();
    for i in 0..col.len() {
        if let Some(k) = col.key_at(i) {
            if seen.insert(k.clone()) {
                keys.push(k);
            }
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;
    use serde_json::json;

    fn field(data: &Dataset, name: &str) -> ResolvedField {
        ResolvedField::from_column(data.field(name).unwrap(), name == data.index_name())
    }

    fn make_data() -> Dataset {
        Dataset::new(vec![
            Column::float("a", [1.0, 2.0, 3.0, 4.0]),
            Column::float("b", [2.0, 2.0, 8.0, 10.0]),
            Column::string("kind", ["x", "y", "x", "y"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_melt_column_major() {
        let data = make_data();
        let idx = field(&data, "index");
        let records = melt(&data, &[&idx], &[field(&data, "a"), field(&data, "b")], VAR_NAME, VALUE_NAME).unwrap();
        assert_eq!(records.len(), 8);
        assert_eq!(records[0], record([("index", json!(0)), (VAR_NAME, json!("a")), (VALUE_NAME, json!(1.0))]));
        assert_eq!(records[4][VAR_NAME], json!("b"));
        assert_eq!(records[7][VALUE_NAME], json!(10.0));
    }

    #[test]
    fn test_melt_rejects_clashing_names() {
        let data = Dataset::new(vec![Column::float("value", [10.0, 20.0]), Column::float("b", [1.0, 2.0])]).unwrap();
        let x = field(&data, "value");
        let err = melt(&data, &[&x], &[field(&data, "b")], VAR_NAME, VALUE_NAME).unwrap_err();
        match err {
            PlotError::InvalidParameter { param, reason } => {
                assert_eq!(param, "value_name");
                assert!(reason.contains("'value'"), "{}", reason);
            }
            other => panic!("unexpected error {:?}", other),
        }

        let idx = field(&data, "index");
        assert!(melt(&data, &[&idx], &[field(&data, "b")], "same", "same").is_err());
    }

    #[test]
    fn test_bin_edges_rule() {
        let edges = BinEdges::spanning([0.0, 10.0], 5).unwrap();
        assert_eq!(edges.width(), 2.0);
        assert_eq!(edges.locate(0.0), Some(0));
        assert_eq!(edges.locate(2.0), Some(0));
        assert_eq!(edges.locate(1.999), Some(0));
        assert_eq!(edges.locate(2.001), Some(1));
        assert_eq!(edges.locate(8.0), Some(3));
        assert_eq!(edges.locate(10.0), Some(4));
        assert_eq!(edges.locate(-0.1), None);
        assert_eq!(edges.locate(10.5), None);
        assert_eq!(edges.locate(f64::NAN), None);
    }

    #[test]
    fn test_bin_edges_float_edge() {
        let edges = BinEdges::spanning([0.0, 1.0], 10).unwrap();
        assert_eq!(edges.locate(edges.edge(3)), Some(2));
        assert_eq!(edges.locate(edges.edge(0)), Some(0));
    }

    #[test]
    fn test_bin_edges_degenerate() {
        let edges = BinEdges::spanning([3.0, 3.0], 4).unwrap();
        assert_eq!(edges.lo, 2.5);
        assert_eq!(edges.hi, 3.5);
        assert_eq!(edges.locate(3.0), Some(1));
        assert!(BinEdges::spanning(Vec::<f64>::new(), 4).is_none());
        assert!(BinEdges::spanning([1.0, 2.0], 0).is_none());
    }

    #[test]
    fn test_histogram_counts() {
        let data = Dataset::new(vec![Column::new(
            "v",
            crate::data::ColumnData::Float(vec![Some(0.0), Some(1.0), None, Some(2.0), Some(2.0), Some(5.0)]),
        )])
        .unwrap();
        let payload = histogram_records(&data, &[field(&data, "v")], 5).unwrap();
        assert_eq!(payload.len(), 5);
        let counts: Vec<u64> = payload.records.iter().map(|r| r[COUNT].as_u64().unwrap()).collect();
        assert_eq!(counts, vec![2, 2, 0, 0, 1]);
        assert_eq!(counts.iter().sum::<u64>(), 5);

        let widths: Vec<f64> = payload
            .records
            .iter()
            .map(|r| r[BIN_END].as_f64().unwrap() - r[BIN_START].as_f64().unwrap())
            .collect();
        assert!(widths.iter().all(|w| (w - 1.0).abs() < 1e-12));
    }

    #[test]
    fn test_histogram_skips_non_finite() {
        let data = Dataset::new(vec![Column::float("v", [1.0, 2.0, f64::INFINITY, 3.0])]).unwrap();
        let payload = histogram_records(&data, &[field(&data, "v")], 2).unwrap();
        let counts: Vec<u64> = payload.records.iter().map(|r| r[COUNT].as_u64().unwrap()).collect();
        assert_eq!(counts, vec![2, 1]);
        assert_eq!(payload.records[1][BIN_END], json!(3.0));
    }

    #[test]
    fn test_histogram_shared_edges() {
        let data = make_data();
        let payload = histogram_records(&data, &[field(&data, "a"), field(&data, "b")], 3).unwrap();
        assert_eq!(payload.len(), 6);
        assert_eq!(payload.n_series, 2);
        assert_eq!(payload.records[0][BIN_START], payload.records[3][BIN_START]);
        assert_eq!(payload.records[0][BIN_START], json!(1.0));
        assert_eq!(payload.records[5][BIN_END], json!(10.0));
    }

    #[test]
    fn test_reduce() {
        let v = [4.0, 1.0, 3.0, 2.0];
        assert_eq!(reduce(&v, Aggregate::Mean), Some(2.5));
        assert_eq!(reduce(&v, Aggregate::Median), Some(2.5));
        assert_eq!(reduce(&v, Aggregate::Sum), Some(10.0));
        assert_eq!(reduce(&v, Aggregate::Min), Some(1.0));
        assert_eq!(reduce(&v, Aggregate::Max), Some(4.0));
        assert_eq!(reduce(&v, Aggregate::Count), Some(4.0));
        assert_eq!(reduce(&[], Aggregate::Mean), None);
    }

    #[test]
    fn test_grid_counts() {
        let data = make_data();
        let grid = grid_records("hexbin", &data, &field(&data, "a"), &field(&data, "b"), None, Aggregate::Mean, 2).unwrap();
        assert_eq!(grid.value_field, COUNT);
        let total: u64 = grid.payload.records.iter().map(|r| r[COUNT].as_u64().unwrap()).sum();
        assert_eq!(total, 4);
        assert!(grid.payload.records.iter().all(|r| r.contains_key("x_start") && r.contains_key("y_end")));
    }

    #[test]
    fn test_grid_no_data_names_kind() {
        let data = Dataset::new(vec![
            Column::new("x", crate::data::ColumnData::Float(vec![None, None])),
            Column::float("y", [1.0, 2.0]),
        ])
        .unwrap();
        let err = grid_records("heatmap", &data, &field(&data, "x"), &field(&data, "y"), None, Aggregate::Mean, 3)
            .unwrap_err();
        assert!(matches!(err, PlotError::InsufficientData { ref kind, .. } if kind == "heatmap"));
        assert!(err.to_string().starts_with("heatmap()"));
    }

    #[test]
    fn test_grid_grouped_axis_clash() {
        let data = Dataset::new(vec![
            Column::string("count", ["a", "b"]),
            Column::float("y", [1.0, 2.0]),
        ])
        .unwrap();
        let err = grid_records("heatmap", &data, &field(&data, "count"), &field(&data, "y"), None, Aggregate::Mean, 3)
            .unwrap_err();
        assert!(matches!(err, PlotError::InvalidParameter { ref param, .. } if param == "x"));
    }

    #[test]
    fn test_grid_reduce_c() {
        let data = make_data();
        let grid = grid_records(
            "heatmap",
            &data,
            &field(&data, "kind"),
            &field(&data, "kind"),
            Some(&field(&data, "a")),
            Aggregate::Sum,
            10,
        )
        .unwrap();
        assert_eq!(grid.payload.len(), 2);
        let first = &grid.payload.records[0];
        assert_eq!(first["kind"], json!("x"));
        assert_eq!(first["a"], json!(4.0));
    }

    #[test]
    fn test_kde_integrates_to_one() {
        let data = make_data();
        let payload = kde_records(&data, &[field(&data, "a")], Bandwidth::Scott, 1000).unwrap();
        assert_eq!(payload.len(), 1000);
        let xs: Vec<f64> = payload.records.iter().map(|r| r[VALUE_NAME].as_f64().unwrap()).collect();
        let ds: Vec<f64> = payload.records.iter().map(|r| r[DENSITY].as_f64().unwrap()).collect();
        assert_eq!(xs[0], -0.5);
        assert!((xs[999] - 5.5).abs() < 1e-9);
        let step = xs[1] - xs[0];
        let area: f64 = ds.iter().sum::<f64>() * step;
        assert!(area > 0.9 && area < 1.01, "area {}", area);
    }

    #[test]
    fn test_kde_degenerate() {
        let data = Dataset::new(vec![Column::float("c", [1.0, 1.0, 1.0])]).unwrap();
        assert!(matches!(
            kde_records(&data, &[field(&data, "c")], Bandwidth::Scott, 10),
            Err(PlotError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_bandwidth_factors() {
        assert!((bandwidth_factor(Bandwidth::Scott, 32) - 0.5).abs() < 1e-12);
        assert!((bandwidth_factor(Bandwidth::Silverman, 4) - 3f64.powf(-0.2)).abs() < 1e-12);
        assert_eq!(bandwidth_factor(Bandwidth::Factor(0.3), 100), 0.3);
    }

    #[test]
    fn test_lag_pairs() {
        let data = make_data();
        let payload = lag_records(&data, &[field(&data, "a")], 1, false).unwrap();
        assert_eq!(payload.len(), 3);
        assert_eq!(payload.records[0]["y(t)"], json!(1.0));
        assert_eq!(payload.records[0]["y(t + 1)"], json!(2.0));
        assert!(!payload.records[0].contains_key(VAR_NAME));

        let tagged = lag_records(&data, &[field(&data, "a"), field(&data, "b")], 2, true).unwrap();
        assert_eq!(tagged.len(), 4);
        assert_eq!(tagged.records[3][VAR_NAME], json!("b"));

        assert!(matches!(
            lag_records(&data, &[field(&data, "a")], 4, false),
            Err(PlotError::InvalidLag { lag: 4, len: 4 })
        ));
    }

    #[test]
    fn test_andrews_curve_terms() {
        let t: f64 = 0.7;
        let expected = 1.0 + 2.0 * t.sin() + 3.0 * t.cos() + 4.0 * (2.0 * t).sin();
        assert!((andrews_curve(&[1.0, 2.0, 3.0, 4.0], t) - expected).abs() < 1e-12);
    }

    #[test]
    fn test_andrews_records() {
        let data = make_data();
        let payload = andrews_records(&data, &[field(&data, "a"), field(&data, "b")], &field(&data, "kind"), 5).unwrap();
        assert_eq!(payload.len(), 20);
        assert_eq!(payload.records[0]["t"].as_f64().unwrap(), -PI);
        assert_eq!(payload.records[4]["t"].as_f64().unwrap(), PI);
        assert_eq!(payload.records[5]["sample"], json!(1));
        assert_eq!(payload.records[5]["kind"], json!("y"));
    }

    #[test]
    fn test_andrews_class_clash() {
        let data = Dataset::new(vec![
            Column::float("a", [1.0, 2.0]),
            Column::float("b", [3.0, 4.0]),
            Column::string("sample", ["x", "y"]),
        ])
        .unwrap();
        let res = andrews_records(&data, &[field(&data, "a"), field(&data, "b")], &field(&data, "sample"), 4);
        assert!(matches!(res, Err(PlotError::InvalidParameter { ref param, .. }) if param == "class_column"));
    }

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(0.0, 1.0, 3), vec![0.0, 0.5, 1.0]);
        assert_eq!(linspace(2.0, 5.0, 1), vec![2.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_distinct_keys() {
        let col = Column::string("s", ["b", "a", "b"]);
        assert_eq!(distinct_keys(&col), vec!["b", "a"]);
    }
}
