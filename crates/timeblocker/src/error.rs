use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, TimeblockError>;

#[derive(Debug, Error)]
pub enum TimeblockError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error("Missing column '{column}' in input (available: {})", .available.join(", "))]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },

    #[error("Invalid FSDB header: {0}")]
    FsdbHeader(String),

    #[error("Row {row} has {got} fields, column '{column}' is missing")]
    ShortRow {
        row: usize,
        got: usize,
        column: String,
    },

    #[error("Invalid number at row {row}, column '{column}': {value}")]
    ValueParse {
        row: usize,
        column: String,
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },

    #[error("Value out of range at row {row}, column '{column}': {value}")]
    ValueRange {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Failed to read config file {path}")]
    ReadConfig {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create file {path}")]
    CreateFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Render error: {0}")]
    Render(String),
}

impl From<toml::de::Error> for TimeblockError {
    fn from(err: toml::de::Error) -> Self {
        TimeblockError::Config(format!("TOML parse error: {}", err))
    }
}
