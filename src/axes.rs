use crate::error::{PlotError, Result};
use crate::ir::Record;
use crate::render::RenderSurface;
use crate::vegalite::{Data, VegaLite};
use log::debug;

/// Placeholder data source set on layered documents whose layers carry
/// their own data
pub const NO_TOPLEVEL_DATA: &str = "no-toplevel-data";

/// A plot: a Vega-Lite document with its data payload
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Axes {
    spec: VegaLite,
}

impl Axes {
    pub fn new(spec: VegaLite) -> Self {
        Self { spec }
    }

    /// Axes with no plot yet; the first added layer becomes the whole spec
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn spec(&self) -> &VegaLite {
        &self.spec
    }

    pub fn spec_mut(&mut self) -> &mut VegaLite {
        &mut self.spec
    }

    pub fn into_spec(self) -> VegaLite {
        self.spec
    }

    /// Top-level data rows
    pub fn data(&self) -> Option<&[Record]> {
        self.spec.data.as_ref()?.values.as_deref()
    }

    /// The document without its top-level data payload
    pub fn spec_no_data(&self) -> VegaLite {
        self.spec.without_data()
    }

    /// Rows across the top-level payload and every layer
    pub fn num_rows(&self) -> usize {
        let top = self.spec.data.as_ref().map(Data::num_rows).unwrap_or(0);
        let layers: usize = self
            .spec
            .layer
            .iter()
            .flatten()
            .filter_map(|l| l.data.as_ref())
            .map(Data::num_rows)
            .sum();
        top + layers
    }

    fn is_blank(&self) -> bool {
        let s = &self.spec;
        s.mark.is_none() && s.layer.is_none() && s.repeat.is_none() && s.encoding.is_empty()
    }

    /// Add `spec` as a layer.
    ///
    /// On blank axes the spec is taken whole. Otherwise the current unit spec
    /// moves into the first layer (keeping its selection) and only the mark,
    /// encoding, data, transform and description of `spec` are added; other
    /// layers never carry selections.
    pub fn add_layer(&mut self, spec: VegaLite) -> &mut Self {
        if self.is_blank() {
            self.spec = spec;
            return self;
        }

        let layers = self.spec.layer.get_or_insert_with(Vec::new);
        if layers.is_empty() {
            let s = &mut self.spec;
            let first = VegaLite {
                mark: s.mark.take(),
                encoding: std::mem::take(&mut s.encoding),
                data: s.data.take(),
                transform: s.transform.take(),
                description: s.description.take(),
                selection: s.selection.take(),
                ..Default::default()
            };
            s.layer = Some(vec![first]);
        }

        let layer = VegaLite {
            mark: spec.mark,
            encoding: spec.encoding,
            data: spec.data,
            transform: spec.transform,
            description: spec.description,
            ..Default::default()
        };
        if let Some(layers) = self.spec.layer.as_mut() {
            layers.push(layer);
            debug!("axes now has {} layers", layers.len());
        }

        if self.spec.data.is_none() {
            self.spec.data = Some(Data::named(NO_TOPLEVEL_DATA));
        }
        self
    }

    /// Send the plot to a surface, refusing payloads above `max_rows`
    pub fn display<S: RenderSurface + ?Sized>(&self, surface: &mut S, max_rows: usize) -> Result<()> {
        let rows = self.num_rows();
        if rows > max_rows {
            return Err(PlotError::MaxRowsExceeded { rows, max_rows });
        }
        surface.display(&self.spec_no_data(), self.spec.data.as_ref())
    }
}

impl From<VegaLite> for Axes {
    fn from(spec: VegaLite) -> Self {
        Self::new(spec)
    }
}
