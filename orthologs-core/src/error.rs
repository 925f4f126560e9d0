use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures that abort a whole run.
///
/// Problems with individual ortholog rows are not errors; they are
/// counted as a [`SkipReason`](crate::SkipReason) instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("annotation file is missing required column {0:?}")]
    MissingColumn(String),

    #[error("malformed annotation row at line {line}: {reason}")]
    MalformedAnnotation { line: u64, reason: String },

    #[error("malformed gene map row at line {line}: {reason}")]
    MalformedMap { line: u64, reason: String },
}

impl Error {
    /// Line number a csv error points at, if it has one.
    pub(crate) fn csv_line(err: &csv::Error) -> u64 {
        err.position().map(|pos| pos.line()).unwrap_or(0)
    }
}
