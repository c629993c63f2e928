// Plot call parser: `kind(name: value, ...) | kind(...)`

pub mod ast;
pub mod call;
pub mod lexer;
pub mod pipeline;

// Public API re-exports
pub use ast::{ArgValue, Argument, PlotCall, PlotPipeline};
pub use pipeline::{parse_pipeline, parse_plot};
