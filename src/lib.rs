// Library exports for vgplot

pub mod csv_reader;
pub mod data;
pub mod error;
pub mod infer;
pub mod parser;
pub mod request;
pub mod vegalite;

// Builder pipeline
pub mod ir;
pub mod resolve;
pub mod transform;
pub mod compiler;
pub mod axes;
pub mod render;

pub use axes::Axes;
pub use data::{Column, ColumnData, DType, Dataset};
pub use error::{PlotError, Result};
pub use request::{ChannelValue, PlotKind, PlotRequest};
pub use vegalite::VegaLite;

use log::debug;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
pub enum OutputFormat {
    #[serde(rename = "json")]
    #[default]
    Json,
    #[serde(rename = "html")]
    Html,
}

/// Defaults applied to every plot
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlotConfig {
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
    #[serde(default = "default_interactive")]
    pub interactive: bool,
    #[serde(default = "default_schema")]
    pub schema: String,
    /// Largest payload `Axes::display` will hand to a surface
    #[serde(default = "default_max_rows")]
    pub max_rows: usize,
    #[serde(default = "default_kde_points")]
    pub kde_points: usize,
    #[serde(default, rename = "type")]
    pub format: OutputFormat,
}

fn default_width() -> f64 { 450.0 }
fn default_height() -> f64 { 300.0 }
fn default_interactive() -> bool { true }
fn default_schema() -> String { vegalite::SCHEMA_URL.to_string() }
fn default_max_rows() -> usize { 5000 }
fn default_kde_points() -> usize { 1000 }

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            interactive: default_interactive(),
            schema: default_schema(),
            max_rows: default_max_rows(),
            kde_points: default_kde_points(),
            format: OutputFormat::Json,
        }
    }
}

impl PlotConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Build the plot described by `request` over `data`
pub fn plot(data: &Dataset, request: &PlotRequest, config: &PlotConfig) -> Result<Axes> {
    let resolved = resolve::resolve_request(request, data)?;
    let spec = compiler::compile_spec(&resolved, data, config)?;
    Ok(Axes::new(spec))
}

/// Parse call text (`kind(arg: value, ...)`, optionally `|`-chained) and
/// build it; each additional call becomes a layer.
pub fn plot_text(data: &Dataset, text: &str, config: &PlotConfig) -> Result<Axes> {
    let pipeline = parser::parse_plot(text)?;
    debug!("parsed {} plot call(s)", pipeline.calls.len());

    let mut axes = Axes::empty();
    for call in &pipeline.calls {
        let request = PlotRequest::from_call(call)?;
        let layer = plot(data, &request, config)?;
        axes.add_layer(layer.into_spec());
    }
    Ok(axes)
}
