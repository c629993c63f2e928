use thiserror::Error;

/// Errors raised while turning a dataset and a plot request into a Vega-Lite spec
#[derive(Debug, Error)]
pub enum PlotError {
    /// Plot kind name that has no handler
    #[error("unsupported plot kind: '{0}'")]
    UnsupportedKind(String),

    /// A channel refers to a column the dataset does not have
    #[error("column '{column}' for channel '{channel}' not found in dataset")]
    ColumnNotFound { channel: String, column: String },

    /// A required parameter was not supplied
    #[error("{kind}() requires parameter '{param}'")]
    MissingParameter { kind: String, param: String },

    /// Too few eligible columns for a multi-series or multi-panel kind
    #[error("{kind}() requires at least {required} {what}, found {found}")]
    InsufficientColumns {
        kind: String,
        what: String,
        required: usize,
        found: usize,
    },

    /// Not enough rows to compute a statistic
    #[error("{kind}(): {reason}")]
    InsufficientData { kind: String, reason: String },

    /// Lag is zero or does not fit inside the series
    #[error("lag must satisfy 1 <= lag < {len}, got {lag}")]
    InvalidLag { lag: usize, len: usize },

    /// Column dtype is incompatible with the requested use
    #[error("column '{column}' must be {expected}, found {found}")]
    TypeMismatch {
        column: String,
        expected: String,
        found: String,
    },

    /// Parameter value out of range or of the wrong shape
    #[error("invalid value for parameter '{param}': {reason}")]
    InvalidParameter { param: String, reason: String },

    /// Data payload is larger than the display limit
    #[error("dataset has {rows} rows, which exceeds the maximum of {max_rows}")]
    MaxRowsExceeded { rows: usize, max_rows: usize },

    /// Dataset construction problem (ragged columns, duplicate names, ...)
    #[error("invalid dataset: {0}")]
    Dataset(String),

    /// Plot call text could not be parsed
    #[error("parse error: {0}")]
    Parse(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PlotError {
    pub(crate) fn column_not_found(channel: &str, column: &str) -> Self {
        PlotError::ColumnNotFound {
            channel: channel.to_string(),
            column: column.to_string(),
        }
    }

    pub(crate) fn missing(kind: &str, param: &str) -> Self {
        PlotError::MissingParameter {
            kind: kind.to_string(),
            param: param.to_string(),
        }
    }

    pub(crate) fn invalid(param: &str, reason: impl Into<String>) -> Self {
        PlotError::InvalidParameter {
            param: param.to_string(),
            reason: reason.into(),
        }
    }
}

/// Type alias for Results using PlotError
pub type Result<T> = std::result::Result<T, PlotError>;
