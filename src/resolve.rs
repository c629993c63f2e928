use crate::data::Dataset;
use crate::error::{PlotError, Result};
use crate::infer::VegaType;
use crate::ir::{ResolvedChannel, ResolvedField, ResolvedRequest};
use crate::request::{ChannelValue, PlotKind, PlotRequest, StyleOptions};
use crate::vegalite::Channel;
use log::{debug, warn};

/// Resolve all channel bindings of a request against the dataset columns.
///
/// Fills in pandas-style defaults (index on x, numeric columns as series)
/// and checks that every referenced column exists with a usable dtype.
pub fn resolve_request(request: &PlotRequest, data: &Dataset) -> Result<ResolvedRequest> {
    let kind = request.kind;
    check_counts(&request.options)?;
    let index = ResolvedField::from_column(data.index(), true);

    let mut resolved = ResolvedRequest {
        kind,
        index: index.clone(),
        x: None,
        x_explicit: false,
        y: None,
        series: Vec::new(),
        color: None,
        size: None,
        value_column: None,
        class_column: None,
        is_series: data.is_series(),
        options: request.options.clone(),
    };

    let x_name = single_name(request, Channel::X)?;
    let y_names = y_names(request)?;

    match kind {
        PlotKind::Line | PlotKind::Area | PlotKind::Bar | PlotKind::Barh => {
            let (x, explicit) = match &x_name {
                Some(name) => (lookup(data, "x", name)?, true),
                None => (index, false),
            };
            resolved.series = resolve_series(kind, data, y_names, Some(&x.name))?;
            resolved.x = Some(x);
            resolved.x_explicit = explicit;
        }
        PlotKind::Scatter => {
            let x = required(kind, "x", x_name)?;
            let y = required(kind, "y", single(kind, "y", y_names)?)?;
            resolved.x = Some(lookup(data, "x", &x)?);
            resolved.y = Some(lookup(data, "y", &y)?);
            resolved.x_explicit = true;
            resolved.color = resolve_visual(request, data, Channel::Color)?;
            resolved.size = resolve_visual(request, data, Channel::Size)?;
        }
        PlotKind::Hist | PlotKind::Kde => {
            resolved.series = resolve_series(kind, data, y_names, None)?;
        }
        PlotKind::Hexbin | PlotKind::Heatmap => {
            let x = lookup(data, "x", &required(kind, "x", x_name)?)?;
            let y = lookup(data, "y", &required(kind, "y", single(kind, "y", y_names)?)?)?;
            if kind == PlotKind::Hexbin {
                require_numeric(&x)?;
                require_numeric(&y)?;
            }
            resolved.x = Some(x);
            resolved.y = Some(y);
            resolved.x_explicit = true;

            if let Some(name) = &request.options.value_column {
                let c = lookup(data, "C", name)?;
                require_numeric(&c)?;
                resolved.value_column = Some(c);
            } else if request.options.reduce.is_some() {
                warn!("{}(): reduce_C_function has no effect without C", kind);
            }
        }
        PlotKind::ScatterMatrix => {
            resolved.color = resolve_visual(request, data, Channel::Color)?;
            resolved.size = resolve_visual(request, data, Channel::Size)?;
            let excluded: Vec<&str> = [&resolved.color, &resolved.size]
                .into_iter()
                .flatten()
                .filter_map(ResolvedChannel::field_name)
                .collect();

            resolved.series = data
                .columns()
                .iter()
                .filter(|c| !excluded.contains(&c.name.as_str()))
                .map(|c| ResolvedField::from_column(c, false))
                .filter(|f| f.vtype == VegaType::Quantitative)
                .collect();

            if resolved.series.len() < 2 {
                return Err(PlotError::InsufficientColumns {
                    kind: kind.to_string(),
                    what: "quantitative columns".into(),
                    required: 2,
                    found: resolved.series.len(),
                });
            }
        }
        PlotKind::ParallelCoordinates | PlotKind::AndrewsCurves => {
            let class_name = request
                .options
                .class_column
                .as_deref()
                .ok_or_else(|| PlotError::missing(kind.name(), "class_column"))?;
            let class = lookup(data, "class_column", class_name)?;

            let series = match &request.options.cols {
                Some(cols) => {
                    let mut fields = Vec::with_capacity(cols.len());
                    for name in cols.iter().filter(|c| *c != class_name) {
                        let field = lookup(data, "cols", name)?;
                        require_numeric(&field)?;
                        fields.push(field);
                    }
                    fields
                }
                None => data
                    .numeric_columns()
                    .into_iter()
                    .filter(|c| c.name != class_name)
                    .map(|c| ResolvedField::from_column(c, false))
                    .collect(),
            };

            if series.len() < 2 {
                return Err(PlotError::InsufficientColumns {
                    kind: kind.to_string(),
                    what: "numeric columns besides the class column".into(),
                    required: 2,
                    found: series.len(),
                });
            }
            resolved.series = series;
            resolved.class_column = Some(class);
        }
        PlotKind::LagPlot => {
            resolved.series = resolve_series(kind, data, y_names, None)?;

            let lag = request.options.lag.unwrap_or(1);
            if lag < 1 {
                return Err(PlotError::invalid("lag", format!("must be a positive integer, got {}", lag)));
            }
            let lag = lag as usize;
            if lag >= data.len() {
                return Err(PlotError::InvalidLag { lag, len: data.len() });
            }

            resolved.color = match request.channels.get(&Channel::Color) {
                Some(ChannelValue::Value(v)) => Some(ResolvedChannel::Value(v.clone())),
                Some(_) => {
                    return Err(PlotError::invalid(
                        "c",
                        "lag plots color by series; only a literal color is accepted",
                    ))
                }
                None => None,
            };
            resolved.size = match request.channels.get(&Channel::Size) {
                Some(ChannelValue::Value(v)) => Some(ResolvedChannel::Value(v.clone())),
                Some(_) => return Err(PlotError::invalid("s", "only a literal size is accepted")),
                None => None,
            };
        }
    }

    debug!(
        "resolved {}(): x={:?} series={:?}",
        kind,
        resolved.x.as_ref().map(|f| f.name.as_str()),
        resolved.series_names()
    );
    Ok(resolved)
}

/// Bin counts, grid sizes and sample counts must be positive
fn check_counts(options: &StyleOptions) -> Result<()> {
    let counts = [
        ("bins", options.bins),
        ("gridsize", options.gridsize),
        ("samples", options.samples),
        ("ind", options.ind),
    ];
    match counts.into_iter().find(|(_, n)| *n == Some(0)) {
        Some((param, _)) => Err(PlotError::invalid(param, "must be a positive integer, got 0")),
        None => Ok(()),
    }
}

/// Look up a column or the index by name
fn lookup(data: &Dataset, channel: &str, name: &str) -> Result<ResolvedField> {
    if let Some(col) = data.column(name) {
        return Ok(ResolvedField::from_column(col, false));
    }
    data.field(name)
        .map(|col| ResolvedField::from_column(col, true))
        .ok_or_else(|| PlotError::column_not_found(channel, name))
}

fn require_numeric(field: &ResolvedField) -> Result<()> {
    if field.dtype.is_numeric() {
        Ok(())
    } else {
        Err(PlotError::TypeMismatch {
            column: field.name.clone(),
            expected: "numeric".into(),
            found: field.dtype.to_string(),
        })
    }
}

fn required(kind: PlotKind, param: &str, name: Option<String>) -> Result<String> {
    name.ok_or_else(|| PlotError::missing(kind.name(), param))
}

/// Name bound to a single-column channel
fn single_name(request: &PlotRequest, channel: Channel) -> Result<Option<String>> {
    match request.channels.get(&channel) {
        None => Ok(None),
        Some(ChannelValue::Field(name)) => Ok(Some(name.clone())),
        Some(ChannelValue::Fields(names)) if names.len() == 1 => Ok(Some(names[0].clone())),
        Some(ChannelValue::Fields(_)) => Err(PlotError::invalid(channel.name(), "expected a single column")),
        Some(ChannelValue::Value(_)) => Err(PlotError::invalid(channel.name(), "expected a column name")),
    }
}

fn y_names(request: &PlotRequest) -> Result<Option<Vec<String>>> {
    match request.channels.get(&Channel::Y) {
        None => Ok(None),
        Some(ChannelValue::Field(name)) => Ok(Some(vec![name.clone()])),
        Some(ChannelValue::Fields(names)) => Ok(Some(names.clone())),
        Some(ChannelValue::Value(_)) => Err(PlotError::invalid("y", "expected a column name")),
    }
}

fn single(kind: PlotKind, param: &str, names: Option<Vec<String>>) -> Result<Option<String>> {
    match names {
        None => Ok(None),
        Some(mut names) if names.len() == 1 => Ok(names.pop()),
        Some(_) => Err(PlotError::invalid(param, format!("{}() takes a single column", kind))),
    }
}

/// Columns plotted as separate series: the explicit `y` subset, or every
/// numeric column other than `exclude`.
fn resolve_series(
    kind: PlotKind,
    data: &Dataset,
    names: Option<Vec<String>>,
    exclude: Option<&str>,
) -> Result<Vec<ResolvedField>> {
    let series = match names {
        Some(names) => {
            let mut fields = Vec::with_capacity(names.len());
            for name in &names {
                let field = lookup(data, "y", name)?;
                require_numeric(&field)?;
                fields.push(field);
            }
            fields
        }
        None => data
            .numeric_columns()
            .into_iter()
            .filter(|c| Some(c.name.as_str()) != exclude)
            .map(|c| ResolvedField::from_column(c, false))
            .collect(),
    };

    if series.is_empty() {
        return Err(PlotError::InsufficientColumns {
            kind: kind.to_string(),
            what: "numeric column".into(),
            required: 1,
            found: 0,
        });
    }
    Ok(series)
}

/// Resolve a color/size binding: a column reference or a literal
fn resolve_visual(
    request: &PlotRequest,
    data: &Dataset,
    channel: Channel,
) -> Result<Option<ResolvedChannel>> {
    match request.channels.get(&channel) {
        None => Ok(None),
        Some(ChannelValue::Field(name)) => Ok(Some(ResolvedChannel::Field(lookup(
            data,
            channel.name(),
            name,
        )?))),
        Some(ChannelValue::Value(v)) => Ok(Some(ResolvedChannel::Value(v.clone()))),
        Some(ChannelValue::Fields(_)) => {
            Err(PlotError::invalid(channel.name(), "expected a single column or a literal"))
        }
    }
}
