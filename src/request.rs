use crate::error::{PlotError, Result};
use crate::parser::ast::{ArgValue, PlotCall};
use crate::vegalite::{Aggregate, Channel};
use log::warn;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Plot kinds understood by the builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlotKind {
    Line,
    Scatter,
    Area,
    Bar,
    Barh,
    Hist,
    Kde,
    Hexbin,
    Heatmap,
    ScatterMatrix,
    ParallelCoordinates,
    AndrewsCurves,
    LagPlot,
}

const COMMON_ARGS: &[&str] = &["alpha", "width", "height", "interactive"];

impl PlotKind {
    pub fn name(&self) -> &'static str {
        match self {
            PlotKind::Line => "line",
            PlotKind::Scatter => "scatter",
            PlotKind::Area => "area",
            PlotKind::Bar => "bar",
            PlotKind::Barh => "barh",
            PlotKind::Hist => "hist",
            PlotKind::Kde => "kde",
            PlotKind::Hexbin => "hexbin",
            PlotKind::Heatmap => "heatmap",
            PlotKind::ScatterMatrix => "scatter_matrix",
            PlotKind::ParallelCoordinates => "parallel_coordinates",
            PlotKind::AndrewsCurves => "andrews_curves",
            PlotKind::LagPlot => "lag_plot",
        }
    }

    /// Kinds whose series can be stacked on a shared baseline
    pub fn is_stackable(&self) -> bool {
        matches!(self, PlotKind::Bar | PlotKind::Barh | PlotKind::Area | PlotKind::Hist)
    }

    /// Stacking used when the caller does not say
    pub fn stacked_by_default(&self) -> bool {
        matches!(self, PlotKind::Area)
    }

    /// Keyword arguments this kind understands (besides the common ones)
    fn specific_args(&self) -> &'static [&'static str] {
        match self {
            PlotKind::Line => &["x", "y"],
            PlotKind::Area | PlotKind::Bar | PlotKind::Barh => &["x", "y", "stacked"],
            PlotKind::Scatter => &["x", "y", "c", "color", "s", "size"],
            PlotKind::Hist => &["y", "bins", "stacked", "histtype"],
            PlotKind::Kde => &["y", "bw_method", "ind"],
            PlotKind::Hexbin | PlotKind::Heatmap => {
                &["x", "y", "C", "reduce_C_function", "reduce", "gridsize"]
            }
            PlotKind::ScatterMatrix => &["c", "s", "figsize", "dpi"],
            PlotKind::ParallelCoordinates => &["class_column", "cols", "var_name", "value_name"],
            PlotKind::AndrewsCurves => &["class_column", "samples"],
            PlotKind::LagPlot => &["y", "lag", "c", "color", "s", "size"],
        }
    }

    pub fn accepts(&self, arg: &str) -> bool {
        let common = !matches!(self, PlotKind::ScatterMatrix) && COMMON_ARGS.contains(&arg);
        common || self.specific_args().contains(&arg)
    }
}

impl fmt::Display for PlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PlotKind {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self> {
        let kind = match s {
            "line" => PlotKind::Line,
            "scatter" => PlotKind::Scatter,
            "area" => PlotKind::Area,
            "bar" => PlotKind::Bar,
            "barh" => PlotKind::Barh,
            "hist" | "histogram" => PlotKind::Hist,
            "kde" | "density" => PlotKind::Kde,
            "hexbin" => PlotKind::Hexbin,
            "heatmap" => PlotKind::Heatmap,
            "scatter_matrix" => PlotKind::ScatterMatrix,
            "parallel_coordinates" => PlotKind::ParallelCoordinates,
            "andrews_curves" => PlotKind::AndrewsCurves,
            "lag_plot" | "lag" => PlotKind::LagPlot,
            other => return Err(PlotError::UnsupportedKind(other.to_string())),
        };
        Ok(kind)
    }
}

/// What a channel is bound to
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelValue {
    /// One column
    Field(String),
    /// Several columns, one series each (y only)
    Fields(Vec<String>),
    /// A constant visual value
    Value(Value),
}

/// Drawing style of a histogram
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistType {
    #[default]
    Bar,
    Step,
    StepFilled,
}

impl FromStr for HistType {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bar" => Ok(HistType::Bar),
            "step" => Ok(HistType::Step),
            "stepfilled" => Ok(HistType::StepFilled),
            other => Err(PlotError::invalid(
                "histtype",
                format!("expected 'bar', 'step' or 'stepfilled', got '{}'", other),
            )),
        }
    }
}

/// KDE bandwidth selection
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Bandwidth {
    #[default]
    Scott,
    Silverman,
    /// Explicit factor applied to the sample standard deviation
    Factor(f64),
}

/// Style and statistic options of a request. `None` means "use the default".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleOptions {
    pub stacked: Option<bool>,
    pub alpha: Option<f64>,
    pub bins: Option<usize>,
    pub histtype: HistType,
    pub gridsize: Option<usize>,
    /// Column aggregated per cell by hexbin/heatmap (pandas `C`)
    pub value_column: Option<String>,
    pub reduce: Option<Aggregate>,
    pub bandwidth: Bandwidth,
    /// Number of KDE evaluation points
    pub ind: Option<usize>,
    pub samples: Option<usize>,
    pub lag: Option<i64>,
    pub class_column: Option<String>,
    pub cols: Option<Vec<String>>,
    pub var_name: Option<String>,
    pub value_name: Option<String>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub interactive: Option<bool>,
    /// Figure size in inches (scatter matrix)
    pub figsize: Option<(f64, f64)>,
    pub dpi: Option<f64>,
}

/// A plot kind, its channel bindings and its options
#[derive(Debug, Clone, PartialEq)]
pub struct PlotRequest {
    pub kind: PlotKind,
    pub channels: BTreeMap<Channel, ChannelValue>,
    pub options: StyleOptions,
}

impl PlotRequest {
    pub fn new(kind: PlotKind) -> Self {
        Self {
            kind,
            channels: BTreeMap::new(),
            options: StyleOptions::default(),
        }
    }

    pub fn channel(mut self, channel: Channel, value: ChannelValue) -> Self {
        self.channels.insert(channel, value);
        self
    }

    pub fn x(self, column: impl Into<String>) -> Self {
        self.channel(Channel::X, ChannelValue::Field(column.into()))
    }

    pub fn y(self, column: impl Into<String>) -> Self {
        self.channel(Channel::Y, ChannelValue::Field(column.into()))
    }

    pub fn ys<S: Into<String>>(self, columns: impl IntoIterator<Item = S>) -> Self {
        let cols = columns.into_iter().map(Into::into).collect();
        self.channel(Channel::Y, ChannelValue::Fields(cols))
    }

    pub fn color(self, column: impl Into<String>) -> Self {
        self.channel(Channel::Color, ChannelValue::Field(column.into()))
    }

    pub fn size(self, column: impl Into<String>) -> Self {
        self.channel(Channel::Size, ChannelValue::Field(column.into()))
    }

    pub fn stacked(mut self, stacked: bool) -> Self {
        self.options.stacked = Some(stacked);
        self
    }

    pub fn alpha(mut self, alpha: f64) -> Self {
        self.options.alpha = Some(alpha);
        self
    }

    pub fn bins(mut self, bins: usize) -> Self {
        self.options.bins = Some(bins);
        self
    }

    pub fn histtype(mut self, histtype: HistType) -> Self {
        self.options.histtype = histtype;
        self
    }

    pub fn gridsize(mut self, gridsize: usize) -> Self {
        self.options.gridsize = Some(gridsize);
        self
    }

    pub fn value_column(mut self, column: impl Into<String>) -> Self {
        self.options.value_column = Some(column.into());
        self
    }

    pub fn reduce(mut self, aggregate: Aggregate) -> Self {
        self.options.reduce = Some(aggregate);
        self
    }

    pub fn bandwidth(mut self, bandwidth: Bandwidth) -> Self {
        self.options.bandwidth = bandwidth;
        self
    }

    pub fn samples(mut self, samples: usize) -> Self {
        self.options.samples = Some(samples);
        self
    }

    pub fn lag(mut self, lag: i64) -> Self {
        self.options.lag = Some(lag);
        self
    }

    pub fn class_column(mut self, column: impl Into<String>) -> Self {
        self.options.class_column = Some(column.into());
        self
    }

    pub fn cols<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.options.cols = Some(columns.into_iter().map(Into::into).collect());
        self
    }

    pub fn size_px(mut self, width: f64, height: f64) -> Self {
        self.options.width = Some(width);
        self.options.height = Some(height);
        self
    }

    pub fn interactive(mut self, interactive: bool) -> Self {
        self.options.interactive = Some(interactive);
        self
    }

    pub fn figsize(mut self, width_in: f64, height_in: f64) -> Self {
        self.options.figsize = Some((width_in, height_in));
        self
    }

    /// Build a request from a parsed call.
    ///
    /// Keywords the kind does not understand are reported with a warning
    /// and otherwise ignored.
    pub fn from_call(call: &PlotCall) -> Result<Self> {
        let kind: PlotKind = call.kind.parse()?;
        let mut request = PlotRequest::new(kind);
        let mut unrecognized = Vec::new();

        for arg in &call.args {
            let name = arg.name.as_str();
            if !kind.accepts(name) {
                unrecognized.push(format!("'{}'", name));
                continue;
            }
            if arg.value == ArgValue::Null {
                continue;
            }
            let value = &arg.value;
            let opts = &mut request.options;

            match name {
                "x" => {
                    let col = expect_str(name, value)?;
                    request.channels.insert(Channel::X, ChannelValue::Field(col));
                }
                "y" => {
                    let binding = match value {
                        ArgValue::List(_) => ChannelValue::Fields(expect_names(name, value)?),
                        _ => ChannelValue::Field(expect_str(name, value)?),
                    };
                    request.channels.insert(Channel::Y, binding);
                }
                "c" | "color" => {
                    request.channels.insert(Channel::Color, visual_binding(name, value)?);
                }
                "s" | "size" => {
                    request.channels.insert(Channel::Size, visual_binding(name, value)?);
                }
                "C" => opts.value_column = Some(expect_str(name, value)?),
                "stacked" => opts.stacked = Some(expect_bool(name, value)?),
                "interactive" => opts.interactive = Some(expect_bool(name, value)?),
                "alpha" => opts.alpha = Some(expect_f64(name, value)?),
                "width" => opts.width = Some(expect_f64(name, value)?),
                "height" => opts.height = Some(expect_f64(name, value)?),
                "dpi" => opts.dpi = Some(expect_f64(name, value)?),
                "bins" => opts.bins = Some(expect_count(name, value)?),
                "gridsize" => opts.gridsize = Some(expect_count(name, value)?),
                "ind" => opts.ind = Some(expect_count(name, value)?),
                "samples" => opts.samples = Some(expect_count(name, value)?),
                "lag" => opts.lag = Some(expect_int(name, value)?),
                "histtype" => opts.histtype = expect_str(name, value)?.parse()?,
                "reduce" | "reduce_C_function" => {
                    let agg = expect_str(name, value)?;
                    opts.reduce = Some(agg.parse::<Aggregate>().map_err(|e| PlotError::invalid(name, e))?);
                }
                "bw_method" => {
                    opts.bandwidth = match value {
                        ArgValue::Number(f) if *f > 0.0 => Bandwidth::Factor(*f),
                        ArgValue::Number(_) => {
                            return Err(PlotError::invalid(name, "bandwidth factor must be positive"))
                        }
                        _ => match expect_str(name, value)?.as_str() {
                            "scott" => Bandwidth::Scott,
                            "silverman" => Bandwidth::Silverman,
                            other => {
                                return Err(PlotError::invalid(
                                    name,
                                    format!("expected 'scott', 'silverman' or a number, got '{}'", other),
                                ))
                            }
                        },
                    }
                }
                "class_column" => opts.class_column = Some(expect_str(name, value)?),
                "cols" => opts.cols = Some(expect_names(name, value)?),
                "var_name" => opts.var_name = Some(expect_str(name, value)?),
                "value_name" => opts.value_name = Some(expect_str(name, value)?),
                "figsize" => {
                    let pair = match value {
                        ArgValue::List(items) if items.len() == 2 => {
                            items[0].as_f64().zip(items[1].as_f64())
                        }
                        _ => None,
                    };
                    opts.figsize = Some(pair.ok_or_else(|| {
                        PlotError::invalid(name, "expected [width, height] in inches")
                    })?);
                }
                _ => unrecognized.push(format!("'{}'", name)),
            }
        }

        if !unrecognized.is_empty() {
            warn!(
                "Unrecognized keywords in vgplot.{}(): {}",
                kind,
                unrecognized.join(", ")
            );
        }

        Ok(request)
    }
}

fn expect_str(name: &str, value: &ArgValue) -> Result<String> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| PlotError::invalid(name, format!("expected a name, got {}", value.describe())))
}

fn expect_names(name: &str, value: &ArgValue) -> Result<Vec<String>> {
    value
        .as_names()
        .ok_or_else(|| PlotError::invalid(name, format!("expected a list of names, got {}", value.describe())))
}

fn expect_bool(name: &str, value: &ArgValue) -> Result<bool> {
    value
        .as_bool()
        .ok_or_else(|| PlotError::invalid(name, format!("expected true or false, got {}", value.describe())))
}

fn expect_f64(name: &str, value: &ArgValue) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| PlotError::invalid(name, format!("expected a number, got {}", value.describe())))
}

fn expect_int(name: &str, value: &ArgValue) -> Result<i64> {
    let n = expect_f64(name, value)?;
    if n.fract() != 0.0 {
        return Err(PlotError::invalid(name, format!("expected an integer, got {}", n)));
    }
    Ok(n as i64)
}

fn expect_count(name: &str, value: &ArgValue) -> Result<usize> {
    let n = expect_int(name, value)?;
    if n < 1 {
        return Err(PlotError::invalid(name, format!("must be a positive integer, got {}", n)));
    }
    Ok(n as usize)
}

/// Bare names bind a column; quoted strings and numbers are literal values
fn visual_binding(name: &str, value: &ArgValue) -> Result<ChannelValue> {
    match value {
        ArgValue::Ident(col) => Ok(ChannelValue::Field(col.clone())),
        ArgValue::Str(s) => Ok(ChannelValue::Value(Value::String(s.clone()))),
        ArgValue::Number(n) => Ok(ChannelValue::Value(Value::from(*n))),
        other => Err(PlotError::invalid(
            name,
            format!("expected a column name or a literal, got {}", other.describe()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::call::parse_call;

    fn request(text: &str) -> Result<PlotRequest> {
        let (_, call) = parse_call(text).unwrap();
        PlotRequest::from_call(&call)
    }

    #[test]
    fn test_kind_names() {
        assert_eq!("density".parse::<PlotKind>().unwrap(), PlotKind::Kde);
        assert_eq!("histogram".parse::<PlotKind>().unwrap(), PlotKind::Hist);
        let err = "pie".parse::<PlotKind>().unwrap_err();
        assert!(err.to_string().contains("pie"));
    }

    #[test]
    fn test_from_call_channels() {
        let req = request(r#"scatter(x: a, y: b, c: "red", s: size_col)"#).unwrap();
        assert_eq!(req.kind, PlotKind::Scatter);
        assert_eq!(req.channels[&Channel::X], ChannelValue::Field("a".into()));
        assert_eq!(req.channels[&Channel::Color], ChannelValue::Value(Value::from("red")));
        assert_eq!(req.channels[&Channel::Size], ChannelValue::Field("size_col".into()));
    }

    #[test]
    fn test_from_call_y_list() {
        let req = request("line(y: [a, b])").unwrap();
        assert_eq!(
            req.channels[&Channel::Y],
            ChannelValue::Fields(vec!["a".into(), "b".into()])
        );
    }

    #[test]
    fn test_from_call_options() {
        let req = request(r#"hist(bins: 5, stacked: true, histtype: "stepfilled", alpha: 0.5)"#).unwrap();
        assert_eq!(req.options.bins, Some(5));
        assert_eq!(req.options.stacked, Some(true));
        assert_eq!(req.options.histtype, HistType::StepFilled);
        assert_eq!(req.options.alpha, Some(0.5));
    }

    #[test]
    fn test_from_call_hexbin() {
        let req = request(r#"hexbin(x: a, y: b, C: c, reduce_C_function: "sum", gridsize: 10)"#).unwrap();
        assert_eq!(req.options.value_column.as_deref(), Some("c"));
        assert_eq!(req.options.reduce, Some(Aggregate::Sum));
        assert_eq!(req.options.gridsize, Some(10));
    }

    #[test]
    fn test_from_call_bad_values() {
        assert!(request("hist(bins: 0)").is_err());
        assert!(request("hist(bins: 2.5)").is_err());
        assert!(request(r#"hist(histtype: "zigzag")"#).is_err());
        assert!(request("kde(bw_method: -1)").is_err());
        assert!(request("scatter_matrix(figsize: [1])").is_err());
    }

    #[test]
    fn test_unrecognized_keywords_ignored() {
        let req = request("line(bins: 5, unrecognized_arg: 1)").unwrap();
        assert_eq!(req.options.bins, None);
    }

    #[test]
    fn test_unsupported_kind() {
        assert!(matches!(request("pie()"), Err(PlotError::UnsupportedKind(_))));
    }

    #[test]
    fn test_stackable() {
        assert!(PlotKind::Hist.is_stackable());
        assert!(!PlotKind::Line.is_stackable());
        assert!(PlotKind::Area.stacked_by_default());
        assert!(!PlotKind::Bar.stacked_by_default());
    }
}
