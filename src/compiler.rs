use crate::data::Dataset;
use crate::error::{PlotError, Result};
use crate::infer::VegaType;
use crate::ir::{Payload, ResolvedChannel, ResolvedField, ResolvedRequest};
use crate::request::{HistType, PlotKind};
use crate::transform::{
    self, GridAxis, ANDREWS_SAMPLE, ANDREWS_T, BIN_END, BIN_START, COUNT, DEFAULT_BINS,
    DEFAULT_GRIDSIZE, DEFAULT_SAMPLES, DENSITY, VALUE_NAME, VAR_NAME,
};
use crate::vegalite::{
    Aggregate, Channel, ChannelDef, Data, Mark, MarkType, Repeat, RepeatRef, Selection,
    StackOffset, VegaLite,
};
use crate::PlotConfig;
use log::debug;
use std::collections::BTreeMap;

/// Opacity given to overlapping (unstacked) series
const OVERLAP_OPACITY: f64 = 0.7;
const DEFAULT_DPI: f64 = 72.0;

const BRUSH_EVENTS: &str = "[mousedown[event.shiftKey], window:mouseup] > window:mousemove!";
const PAN_EVENTS: &str = "[mousedown[!event.shiftKey], window:mouseup] > window:mousemove!";

/// Compile a resolved request into a complete Vega-Lite document with its
/// data payload inlined.
pub fn compile_spec(
    resolved: &ResolvedRequest,
    data: &Dataset,
    config: &PlotConfig,
) -> Result<VegaLite> {
    let mut spec = VegaLite::new();
    spec.schema = Some(config.schema.clone());

    let payload = match resolved.kind {
        PlotKind::Line | PlotKind::Area | PlotKind::Bar | PlotKind::Barh => {
            compile_series(&mut spec, resolved, data)?
        }
        PlotKind::Scatter => compile_scatter(&mut spec, resolved, data)?,
        PlotKind::Hist => compile_hist(&mut spec, resolved, data)?,
        PlotKind::Kde => compile_kde(&mut spec, resolved, data, config)?,
        PlotKind::Hexbin | PlotKind::Heatmap => compile_grid(&mut spec, resolved, data)?,
        PlotKind::ScatterMatrix => {
            // Panel sizes live on the inner spec; no top-level finishing
            let payload = compile_scatter_matrix(&mut spec, resolved, data)?;
            spec.data = Some(Data::inline(payload.records));
            return Ok(spec);
        }
        PlotKind::ParallelCoordinates => compile_parallel(&mut spec, resolved, data)?,
        PlotKind::AndrewsCurves => compile_andrews(&mut spec, resolved, data)?,
        PlotKind::LagPlot => compile_lag(&mut spec, resolved, data)?,
    };

    finalize(&mut spec, resolved, config, payload.n_series)?;
    debug!("compiled {}() with {} data rows", resolved.kind, payload.len());
    spec.data = Some(Data::inline(payload.records));
    Ok(spec)
}

fn is_stacked(resolved: &ResolvedRequest) -> bool {
    resolved
        .options
        .stacked
        .unwrap_or_else(|| resolved.kind.stacked_by_default())
}

fn stack_offset(resolved: &ResolvedRequest) -> StackOffset {
    if is_stacked(resolved) {
        StackOffset::Zero
    } else {
        StackOffset::Disabled
    }
}

fn field_def(field: &ResolvedField) -> ChannelDef {
    ChannelDef::field(&field.name, field.vtype)
}

fn visual_def(channel: &ResolvedChannel) -> ChannelDef {
    match channel {
        ResolvedChannel::Field(f) => field_def(f),
        ResolvedChannel::Value(v) => ChannelDef::value(v.clone()),
    }
}

fn x_field(resolved: &ResolvedRequest) -> Result<&ResolvedField> {
    resolved
        .x
        .as_ref()
        .ok_or_else(|| PlotError::missing(resolved.kind.name(), "x"))
}

fn y_field(resolved: &ResolvedRequest) -> Result<&ResolvedField> {
    resolved
        .y
        .as_ref()
        .ok_or_else(|| PlotError::missing(resolved.kind.name(), "y"))
}

fn class_field(resolved: &ResolvedRequest) -> Result<&ResolvedField> {
    resolved
        .class_column
        .as_ref()
        .ok_or_else(|| PlotError::missing(resolved.kind.name(), "class_column"))
}

/// Line, area, bar and barh: one series per column, long form for frames
fn compile_series(spec: &mut VegaLite, resolved: &ResolvedRequest, data: &Dataset) -> Result<Payload> {
    let kind = resolved.kind;
    let x = x_field(resolved)?;

    spec.mark = Some(
        match kind {
            PlotKind::Line => MarkType::Line,
            PlotKind::Area => MarkType::Area,
            _ => MarkType::Bar,
        }
        .into(),
    );

    let (records, value_field) = if resolved.is_series {
        let series = &resolved.series[0];
        (transform::project(data, &[x, series])?, series.name.clone())
    } else {
        let mut ids = vec![x];
        let with_order = kind == PlotKind::Line && resolved.x_explicit && x.name != resolved.index.name;
        if with_order {
            ids.push(&resolved.index);
        }
        let records = transform::melt(data, &ids, &resolved.series, VAR_NAME, VALUE_NAME)?;
        spec.encode(Channel::Color, ChannelDef::field(VAR_NAME, VegaType::Nominal));
        if with_order {
            spec.encode(Channel::Order, field_def(&resolved.index));
        }
        (records, VALUE_NAME.to_string())
    };

    let mut category = field_def(x);
    if matches!(kind, PlotKind::Bar | PlotKind::Barh) {
        category.vtype = Some(VegaType::Ordinal);
    }
    let mut value = ChannelDef::field(value_field, VegaType::Quantitative);
    if kind.is_stackable() {
        value = value.with_stack(stack_offset(resolved));
    }

    if kind == PlotKind::Barh {
        spec.encode(Channel::X, value);
        spec.encode(Channel::Y, category);
    } else {
        spec.encode(Channel::X, category);
        spec.encode(Channel::Y, value);
    }

    Ok(Payload::new(records, resolved.series.len()))
}

fn compile_scatter(spec: &mut VegaLite, resolved: &ResolvedRequest, data: &Dataset) -> Result<Payload> {
    let x = x_field(resolved)?;
    let y = y_field(resolved)?;
    spec.mark = Some(MarkType::Circle.into());
    spec.encode(Channel::X, field_def(x));
    spec.encode(Channel::Y, field_def(y));

    let mut fields: Vec<&ResolvedField> = vec![x];
    let visuals = [(Channel::Color, &resolved.color), (Channel::Size, &resolved.size)];
    let extra = visuals.iter().filter_map(|(_, c)| match c {
        Some(ResolvedChannel::Field(f)) => Some(f),
        _ => None,
    });
    for f in std::iter::once(y).chain(extra) {
        if !fields.iter().any(|have| have.name == f.name) {
            fields.push(f);
        }
    }
    for (channel, binding) in visuals {
        if let Some(binding) = binding {
            spec.encode(channel, visual_def(binding));
        }
    }

    Ok(Payload::new(transform::project(data, &fields)?, 1))
}

fn compile_hist(spec: &mut VegaLite, resolved: &ResolvedRequest, data: &Dataset) -> Result<Payload> {
    let opts = &resolved.options;
    let payload = transform::histogram_records(data, &resolved.series, opts.bins.unwrap_or(DEFAULT_BINS))?;

    spec.mark = Some(match opts.histtype {
        HistType::Bar => MarkType::Bar.into(),
        HistType::Step => Mark::step(MarkType::Line),
        HistType::StepFilled => Mark::step(MarkType::Area),
    });

    let mut x = ChannelDef::field(BIN_START, VegaType::Quantitative);
    if let [only] = resolved.series.as_slice() {
        x = x.with_title(&only.name);
    }
    spec.encode(Channel::X, x);
    if opts.histtype == HistType::Bar {
        spec.encode(Channel::X2, ChannelDef::field(BIN_END, VegaType::Quantitative));
    }
    spec.encode(
        Channel::Y,
        ChannelDef::field(COUNT, VegaType::Quantitative).with_stack(stack_offset(resolved)),
    );
    if !resolved.is_series {
        spec.encode(Channel::Color, ChannelDef::field(VAR_NAME, VegaType::Nominal));
    }
    Ok(payload)
}

fn compile_kde(
    spec: &mut VegaLite,
    resolved: &ResolvedRequest,
    data: &Dataset,
    config: &PlotConfig,
) -> Result<Payload> {
    let opts = &resolved.options;
    let points = opts.ind.unwrap_or(config.kde_points);
    let payload = transform::kde_records(data, &resolved.series, opts.bandwidth, points)?;

    spec.mark = Some(MarkType::Line.into());
    let mut x = ChannelDef::field(VALUE_NAME, VegaType::Quantitative);
    if let [only] = resolved.series.as_slice() {
        x = x.with_title(&only.name);
    }
    spec.encode(Channel::X, x);
    spec.encode(Channel::Y, ChannelDef::field(DENSITY, VegaType::Quantitative));
    if !resolved.is_series {
        spec.encode(Channel::Color, ChannelDef::field(VAR_NAME, VegaType::Nominal));
    }
    Ok(payload)
}

/// Hexbin and heatmap: one rect per non-empty grid cell
fn compile_grid(spec: &mut VegaLite, resolved: &ResolvedRequest, data: &Dataset) -> Result<Payload> {
    let opts = &resolved.options;
    let x = x_field(resolved)?;
    let y = y_field(resolved)?;
    let reduce = opts.reduce.unwrap_or(Aggregate::Mean);
    let grid = transform::grid_records(
        resolved.kind.name(),
        data,
        x,
        y,
        resolved.value_column.as_ref(),
        reduce,
        opts.gridsize.unwrap_or(DEFAULT_GRIDSIZE),
    )?;

    spec.mark = Some(MarkType::Rect.into());
    encode_grid_axis(spec, &grid.x, x, "x", Channel::X, Channel::X2);
    encode_grid_axis(spec, &grid.y, y, "y", Channel::Y, Channel::Y2);

    let mut color = ChannelDef::field(&grid.value_field, VegaType::Quantitative);
    if let Some(c) = &resolved.value_column {
        color = color.with_title(format!("{}({})", reduce.name(), c.name));
    }
    spec.encode(Channel::Color, color);
    Ok(grid.payload)
}

fn encode_grid_axis(
    spec: &mut VegaLite,
    axis: &GridAxis,
    field: &ResolvedField,
    prefix: &str,
    start: Channel,
    end: Channel,
) {
    match axis {
        GridAxis::Binned(_) => {
            spec.encode(
                start,
                ChannelDef::field(format!("{}_start", prefix), VegaType::Quantitative).with_title(&field.name),
            );
            spec.encode(end, ChannelDef::field(format!("{}_end", prefix), VegaType::Quantitative));
        }
        GridAxis::Grouped(_) => {
            spec.encode(start, ChannelDef::field(&field.name, VegaType::Ordinal));
        }
    }
}

fn compile_scatter_matrix(
    spec: &mut VegaLite,
    resolved: &ResolvedRequest,
    data: &Dataset,
) -> Result<Payload> {
    let cols = resolved.series_names();
    let mut reversed = cols.clone();
    reversed.reverse();
    spec.repeat = Some(Repeat {
        row: cols.clone(),
        column: reversed,
    });

    let mut inner = VegaLite {
        mark: Some(MarkType::Point.into()),
        ..Default::default()
    };

    let brush = Selection {
        resolve: Some("union".into()),
        on: Some(BRUSH_EVENTS.into()),
        translate: Some(BRUSH_EVENTS.into()),
        zoom: Some("wheel![event.shiftKey]".into()),
        ..Selection::interval()
    };
    let grid = Selection {
        resolve: Some("global".into()),
        translate: Some(PAN_EVENTS.into()),
        zoom: Some("wheel![!event.shiftKey]".into()),
        ..Selection::grid()
    };
    inner.selection = Some(BTreeMap::from([("brush".to_string(), brush), ("grid".to_string(), grid)]));

    inner.encode(Channel::X, ChannelDef::repeat(RepeatRef::Column, VegaType::Quantitative));
    inner.encode(Channel::Y, ChannelDef::repeat(RepeatRef::Row, VegaType::Quantitative));

    let mut condition = match &resolved.color {
        Some(c) => visual_def(c),
        None => ChannelDef::value("steelblue"),
    };
    condition.selection = Some("brush".into());
    inner.encode(
        Channel::Color,
        ChannelDef {
            condition: Some(Box::new(condition)),
            ..ChannelDef::value("grey")
        },
    );
    if let Some(size) = &resolved.size {
        inner.encode(Channel::Size, visual_def(size));
    }

    if let Some((width_in, height_in)) = resolved.options.figsize {
        let dpi = resolved.options.dpi.unwrap_or(DEFAULT_DPI);
        let n = cols.len() as f64;
        inner.width = Some(0.8 * dpi * width_in / n);
        inner.height = Some(0.8 * dpi * height_in / n);
    }

    spec.spec = Some(Box::new(inner));
    Ok(Payload::new(data.to_records(false), cols.len()))
}

fn compile_parallel(spec: &mut VegaLite, resolved: &ResolvedRequest, data: &Dataset) -> Result<Payload> {
    let opts = &resolved.options;
    let class = class_field(resolved)?;
    let var_name = opts.var_name.as_deref().unwrap_or(VAR_NAME);
    let value_name = opts.value_name.as_deref().unwrap_or(VALUE_NAME);

    let records = transform::melt(data, &[&resolved.index, class], &resolved.series, var_name, value_name)?;

    spec.mark = Some(MarkType::Line.into());
    spec.encode(Channel::Color, field_def(class));
    spec.encode(Channel::Detail, field_def(&resolved.index));
    spec.encode(Channel::X, ChannelDef::field(var_name, VegaType::Nominal));
    spec.encode(Channel::Y, ChannelDef::field(value_name, VegaType::Quantitative));
    Ok(Payload::new(records, 1))
}

fn compile_andrews(spec: &mut VegaLite, resolved: &ResolvedRequest, data: &Dataset) -> Result<Payload> {
    let class = class_field(resolved)?;
    let samples = resolved.options.samples.unwrap_or(DEFAULT_SAMPLES);
    let payload = transform::andrews_records(data, &resolved.series, class, samples)?;

    spec.mark = Some(MarkType::Line.into());
    // t is the angle itself, not the sample position
    spec.encode(
        Channel::X,
        ChannelDef::field(ANDREWS_T, VegaType::Quantitative).with_title("t (radians, -pi to pi)"),
    );
    spec.encode(Channel::Y, ChannelDef::field(VALUE_NAME, VegaType::Quantitative));
    spec.encode(Channel::Color, field_def(class));
    spec.encode(Channel::Detail, ChannelDef::field(ANDREWS_SAMPLE, VegaType::Quantitative));
    Ok(payload)
}

fn compile_lag(spec: &mut VegaLite, resolved: &ResolvedRequest, data: &Dataset) -> Result<Payload> {
    let lag = resolved.options.lag.unwrap_or(1).max(0) as usize;
    let tag_series = !resolved.is_series;
    let payload = transform::lag_records(data, &resolved.series, lag, tag_series)?;
    let (y1, y2) = transform::lag_fields(lag);

    spec.mark = Some(MarkType::Circle.into());
    spec.encode(Channel::X, ChannelDef::field(y1, VegaType::Quantitative));
    spec.encode(Channel::Y, ChannelDef::field(y2, VegaType::Quantitative));
    if tag_series {
        spec.encode(Channel::Color, ChannelDef::field(VAR_NAME, VegaType::Nominal));
    } else if let Some(color) = &resolved.color {
        spec.encode(Channel::Color, visual_def(color));
    }
    if let Some(size) = &resolved.size {
        spec.encode(Channel::Size, visual_def(size));
    }
    Ok(payload)
}

/// Dimensions, opacity and the pan/zoom selection shared by unit plots
fn finalize(
    spec: &mut VegaLite,
    resolved: &ResolvedRequest,
    config: &PlotConfig,
    n_series: usize,
) -> Result<()> {
    let opts = &resolved.options;
    spec.width = Some(opts.width.unwrap_or(config.width));
    spec.height = Some(opts.height.unwrap_or(config.height));

    if let Some(alpha) = opts.alpha {
        if !(0.0..=1.0).contains(&alpha) {
            return Err(PlotError::invalid("alpha", format!("must be within [0, 1], got {}", alpha)));
        }
        spec.encode(Channel::Opacity, ChannelDef::value(alpha));
    } else if resolved.kind.is_stackable() && !is_stacked(resolved) && n_series > 1 {
        spec.encode(Channel::Opacity, ChannelDef::value(OVERLAP_OPACITY));
    }

    if opts.interactive.unwrap_or(config.interactive) {
        spec.selection = Some(BTreeMap::from([("grid".to_string(), Selection::grid())]));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;
    use crate::request::PlotRequest;
    use crate::resolve::resolve_request;
    use serde_json::json;

    fn make_data() -> Dataset {
        Dataset::new(vec![
            Column::float("a", [1.0, 2.0, 3.0, 4.0]),
            Column::int("b", [4, 3, 2, 1]),
            Column::string("label", ["p", "q", "p", "q"]),
        ])
        .unwrap()
    }

    fn build(request: PlotRequest, data: &Dataset) -> Result<VegaLite> {
        let resolved = resolve_request(&request, data)?;
        compile_spec(&resolved, data, &PlotConfig::default())
    }

    #[test]
    fn test_compile_default_line() {
        let data = make_data();
        let spec = build(PlotRequest::new(PlotKind::Line), &data).unwrap();
        assert_eq!(spec.mark, Some(MarkType::Line.into()));
        assert_eq!(spec.encoding[&Channel::X].field_name(), Some("index"));
        assert_eq!(spec.encoding[&Channel::Y].field_name(), Some("value"));
        assert_eq!(spec.encoding[&Channel::Color].field_name(), Some("variable"));
        assert!(!spec.encoding.contains_key(&Channel::Order));
        assert_eq!(spec.width, Some(450.0));
        assert_eq!(spec.height, Some(300.0));
        assert!(spec.selection.as_ref().unwrap().contains_key("grid"));
        // two numeric columns, four rows each
        assert_eq!(spec.data.as_ref().unwrap().num_rows(), 8);
    }

    #[test]
    fn test_compile_line_explicit_x_adds_order() {
        let data = make_data();
        let spec = build(PlotRequest::new(PlotKind::Line).x("a"), &data).unwrap();
        assert_eq!(spec.encoding[&Channel::Order].field_name(), Some("index"));
        let rows = spec.data.unwrap().values.unwrap();
        assert!(rows[0].contains_key("index"));
        assert!(rows[0].contains_key("a"));
    }

    #[test]
    fn test_compile_line_x_named_like_melted_field() {
        let data = Dataset::new(vec![
            Column::float("value", [10.0, 20.0, 30.0]),
            Column::float("b", [1.0, 2.0, 3.0]),
        ])
        .unwrap();
        let err = build(PlotRequest::new(PlotKind::Line).x("value"), &data).unwrap_err();
        assert!(matches!(err, PlotError::InvalidParameter { .. }), "{:?}", err);
        assert!(err.to_string().contains("'value'"));

        let classed = Dataset::new(vec![
            Column::float("a", [1.0, 2.0]),
            Column::float("b", [3.0, 4.0]),
            Column::string("variable", ["p", "q"]),
        ])
        .unwrap();
        let req = PlotRequest::new(PlotKind::ParallelCoordinates).class_column("variable");
        assert!(build(req, &classed).is_err());
    }

    #[test]
    fn test_compile_bar_is_ordinal_and_unstacked() {
        let data = make_data();
        let spec = build(PlotRequest::new(PlotKind::Bar), &data).unwrap();
        assert_eq!(spec.encoding[&Channel::X].vtype, Some(VegaType::Ordinal));
        assert_eq!(spec.encoding[&Channel::Y].stack, Some(StackOffset::Disabled));
        assert_eq!(spec.encoding[&Channel::Opacity].value, Some(json!(0.7)));
    }

    #[test]
    fn test_compile_area_stacks_by_default() {
        let data = make_data();
        let spec = build(PlotRequest::new(PlotKind::Area), &data).unwrap();
        assert_eq!(spec.encoding[&Channel::Y].stack, Some(StackOffset::Zero));
        assert!(!spec.encoding.contains_key(&Channel::Opacity));
    }

    #[test]
    fn test_compile_barh_swaps_axes() {
        let data = make_data();
        let spec = build(PlotRequest::new(PlotKind::Barh).stacked(true), &data).unwrap();
        assert_eq!(spec.encoding[&Channel::Y].field_name(), Some("index"));
        assert_eq!(spec.encoding[&Channel::X].stack, Some(StackOffset::Zero));
    }

    #[test]
    fn test_compile_series_line() {
        let data = make_data().series("a").unwrap();
        let spec = build(PlotRequest::new(PlotKind::Line), &data).unwrap();
        assert_eq!(spec.encoding[&Channel::Y].field_name(), Some("a"));
        assert!(!spec.encoding.contains_key(&Channel::Color));
        assert_eq!(spec.data.unwrap().num_rows(), 4);
    }

    #[test]
    fn test_compile_alpha() {
        let data = make_data();
        let spec = build(PlotRequest::new(PlotKind::Line).alpha(0.3), &data).unwrap();
        assert_eq!(spec.encoding[&Channel::Opacity].value, Some(json!(0.3)));
        assert!(build(PlotRequest::new(PlotKind::Line).alpha(1.5), &data).is_err());
    }

    #[test]
    fn test_compile_not_interactive() {
        let data = make_data();
        let spec = build(PlotRequest::new(PlotKind::Line).interactive(false), &data).unwrap();
        assert!(spec.selection.is_none());
    }

    #[test]
    fn test_compile_scatter_literals() {
        let data = make_data();
        let req = PlotRequest::new(PlotKind::Scatter)
            .x("a")
            .y("b")
            .channel(Channel::Color, crate::request::ChannelValue::Value(json!("red")))
            .size("a");
        let spec = build(req, &data).unwrap();
        assert_eq!(spec.mark, Some(MarkType::Circle.into()));
        assert_eq!(spec.encoding[&Channel::Color].value, Some(json!("red")));
        assert_eq!(spec.encoding[&Channel::Size].field_name(), Some("a"));
        let rows = spec.data.unwrap().values.unwrap();
        assert_eq!(rows[0].len(), 2);
    }

    #[test]
    fn test_compile_hist() {
        let data = make_data();
        let spec = build(PlotRequest::new(PlotKind::Hist).bins(4), &data).unwrap();
        assert_eq!(spec.data.as_ref().unwrap().num_rows(), 8);
        assert_eq!(spec.encoding[&Channel::X].field_name(), Some(BIN_START));
        assert_eq!(spec.encoding[&Channel::X2].field_name(), Some(BIN_END));
        assert_eq!(spec.encoding[&Channel::Y].stack, Some(StackOffset::Disabled));
    }

    #[test]
    fn test_compile_hist_step() {
        let data = make_data();
        let spec = build(PlotRequest::new(PlotKind::Hist).histtype(HistType::Step), &data).unwrap();
        assert_eq!(spec.mark, Some(Mark::step(MarkType::Line)));
        assert!(!spec.encoding.contains_key(&Channel::X2));
    }

    #[test]
    fn test_compile_hexbin_with_c() {
        let data = make_data();
        let req = PlotRequest::new(PlotKind::Hexbin).x("a").y("b").value_column("a").gridsize(2);
        let spec = build(req, &data).unwrap();
        assert_eq!(spec.mark, Some(MarkType::Rect.into()));
        assert_eq!(spec.encoding[&Channel::Color].field_name(), Some("a"));
        assert_eq!(spec.encoding[&Channel::Color].title.as_deref(), Some("mean(a)"));
        assert_eq!(spec.encoding[&Channel::X2].field_name(), Some("x_end"));
    }

    #[test]
    fn test_compile_heatmap_categorical() {
        let data = make_data();
        let req = PlotRequest::new(PlotKind::Heatmap).x("label").y("b");
        let spec = build(req, &data).unwrap();
        assert_eq!(spec.encoding[&Channel::X].field_name(), Some("label"));
        assert_eq!(spec.encoding[&Channel::X].vtype, Some(VegaType::Ordinal));
        assert!(!spec.encoding.contains_key(&Channel::X2));
        assert_eq!(spec.encoding[&Channel::Color].field_name(), Some(COUNT));
    }

    #[test]
    fn test_compile_scatter_matrix() {
        let data = make_data();
        let spec = build(PlotRequest::new(PlotKind::ScatterMatrix).figsize(4.0, 4.0), &data).unwrap();
        let repeat = spec.repeat.as_ref().unwrap();
        assert_eq!(repeat.row, vec!["a", "b"]);
        assert_eq!(repeat.column, vec!["b", "a"]);
        let inner = spec.spec.as_ref().unwrap();
        assert_eq!(inner.width, Some(0.8 * 72.0 * 4.0 / 2.0));
        let color = &inner.encoding[&Channel::Color];
        assert_eq!(color.value, Some(json!("grey")));
        let cond = color.condition.as_ref().unwrap();
        assert_eq!(cond.selection.as_deref(), Some("brush"));
        assert_eq!(cond.value, Some(json!("steelblue")));
        assert!(spec.selection.is_none());
        assert!(spec.width.is_none());
    }

    #[test]
    fn test_compile_parallel_coordinates() {
        let data = make_data();
        let req = PlotRequest::new(PlotKind::ParallelCoordinates).class_column("label");
        let spec = build(req, &data).unwrap();
        assert_eq!(spec.encoding[&Channel::Detail].field_name(), Some("index"));
        assert_eq!(spec.encoding[&Channel::Color].vtype, Some(VegaType::Nominal));
        assert_eq!(spec.data.unwrap().num_rows(), 8);
    }

    #[test]
    fn test_compile_andrews() {
        let data = make_data();
        let req = PlotRequest::new(PlotKind::AndrewsCurves).class_column("label").samples(10);
        let spec = build(req, &data).unwrap();
        assert_eq!(spec.data.unwrap().num_rows(), 40);
        assert_eq!(spec.encoding[&Channel::Detail].field_name(), Some("sample"));
        assert_eq!(spec.encoding[&Channel::X].title.as_deref(), Some("t (radians, -pi to pi)"));
    }

    #[test]
    fn test_compile_lag_frame() {
        let data = make_data();
        let spec = build(PlotRequest::new(PlotKind::LagPlot).lag(2), &data).unwrap();
        assert_eq!(spec.encoding[&Channel::Y].field_name(), Some("y(t + 2)"));
        assert_eq!(spec.encoding[&Channel::Color].field_name(), Some("variable"));
        assert_eq!(spec.data.unwrap().num_rows(), 4);
    }
}
