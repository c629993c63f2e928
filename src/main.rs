use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::fs::{self, File};
use std::io::{self, BufReader};
use vgplot::csv_reader;
use vgplot::render::{HtmlSurface, JsonSurface, RenderSurface};
use vgplot::{OutputFormat, PlotConfig};

#[derive(Parser, Debug)]
#[command(name = "vgplot")]
#[command(about = "Generate Vega-Lite specifications from CSV data using pandas-style plot calls", long_about = None)]
struct Args {
    /// Plot call (e.g., 'hist(bins: 20, stacked: true)' or 'line(y: a) | scatter(x: a, y: b)')
    call: String,

    /// CSV file to read instead of stdin
    #[arg(short, long)]
    input: Option<String>,

    /// Column to use as the row index
    #[arg(long)]
    index_col: Option<String>,

    /// Plot a single column as a series
    #[arg(long)]
    series: Option<String>,

    /// Output format (defaults to the config's, else json)
    #[arg(short, long, value_enum)]
    format: Option<Format>,

    /// Leave the data payload out of the JSON document
    #[arg(long)]
    no_data: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// JSON file with plot defaults (width, height, interactive, max_rows, ...)
    #[arg(short, long)]
    config: Option<String>,

    #[arg(long, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Format {
    Json,
    Html,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_default_env()
        .filter_level(args.log_level.to_level_filter())
        .format_module_path(false)
        .init();

    let config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file '{}'", path))?;
            PlotConfig::from_json(&text).with_context(|| format!("Invalid config file '{}'", path))?
        }
        None => PlotConfig::default(),
    };

    // Read CSV from the input file or stdin
    let mut data = match &args.input {
        Some(path) => {
            let file = File::open(path).with_context(|| format!("Failed to open '{}'", path))?;
            csv_reader::read_csv(BufReader::new(file))
                .with_context(|| format!("Failed to read CSV from '{}'", path))?
        }
        None => csv_reader::read_csv_from_stdin().context("Failed to read CSV from stdin")?,
    };
    log::info!("read {} rows x {} columns", data.len(), data.ncols());

    if let Some(index) = &args.index_col {
        data = data.set_index(index).context("Failed to set index column")?;
    }
    if let Some(name) = &args.series {
        data = data.series(name).context("Failed to select series")?;
    }

    let axes = vgplot::plot_text(&data, &args.call, &config).context("Failed to build plot")?;

    let format = match args.format {
        Some(Format::Json) => OutputFormat::Json,
        Some(Format::Html) => OutputFormat::Html,
        None => config.format,
    };

    // Write the document to stdout
    let stdout = io::stdout();
    let handle = stdout.lock();
    let mut surface: Box<dyn RenderSurface> = match format {
        OutputFormat::Json => Box::new(
            JsonSurface::new(handle)
                .pretty(args.pretty)
                .include_data(!args.no_data),
        ),
        OutputFormat::Html => Box::new(HtmlSurface::new(handle)),
    };
    axes.display(surface.as_mut(), config.max_rows)
        .context("Failed to write plot to stdout")?;

    Ok(())
}
