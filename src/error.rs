// src/error.rs
use std::path::PathBuf;

/// Errors surfaced by the library. Binaries wrap these in `anyhow`.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("spreadsheet not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("unsupported spreadsheet format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("sheet `{name}` not found (available: {available:?})")]
    SheetNotFound { name: String, available: Vec<String> },

    #[error("workbook error: {0}")]
    Workbook(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("missing required columns: {missing:?} (available columns: {found:?})")]
    MissingColumns {
        missing: Vec<String>,
        found: Vec<String>,
    },

    #[error("please select at least one tool")]
    NoToolsSelected,

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("mail client error: {0}")]
    MailClient(String),

    #[error("config error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_columns_message_lists_found_columns() {
        let err = Error::MissingColumns {
            missing: vec!["tools".into()],
            found: vec!["User".into(), "userEmail".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("tools"));
        assert!(msg.contains("userEmail"));
    }
}
