use thiserror::Error;

/// Everything that can stop a pipeline run. Per-row problems never end up
/// here: they degrade to defaults inside the normalizer.
#[derive(Debug, Error)]
pub enum StatsError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("cannot read workbook {path}: {source}")]
    Workbook {
        path: String,
        #[source]
        source: calamine::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unsupported file type for {0} (expected csv, xlsx, xlsm, xls or ods)")]
    UnsupportedFormat(String),

    #[error("worksheet {0:?} not found or empty")]
    MissingSheet(String),

    #[error("missing expected column {0:?}")]
    MissingColumn(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl StatsError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        StatsError::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, StatsError>;
