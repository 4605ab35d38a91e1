use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure to load one of the startup inputs. Any of these aborts the run
/// before a single URL is fetched.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read keyword file {path:?}: {source}")]
    Lexicon { path: PathBuf, source: io::Error },

    #[error("cannot read stopword file {path:?}: {source}")]
    Stopwords { path: PathBuf, source: io::Error },

    #[error("cannot read url sheet {path:?}: {reason}")]
    Sheet { path: PathBuf, reason: String },

    #[error("url sheet {path:?} has no {column:?} column")]
    MissingColumn { path: PathBuf, column: &'static str },

    #[error("unsupported url sheet format: {path:?} (expected .xlsx, .xls, .ods or .csv)")]
    UnsupportedFormat { path: PathBuf },
}

/// Per-URL failure. The driver logs it and skips the row.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("empty body")]
    EmptyBody,

    #[error("cannot read {path:?}: {source}")]
    File { path: PathBuf, source: io::Error },
}

impl FetchError {
    /// Short label used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "transport",
            FetchError::Status(_) => "status",
            FetchError::EmptyBody => "empty",
            FetchError::File { .. } => "file",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_kinds() {
        assert_eq!(FetchError::Status(404).kind(), "status");
        assert_eq!(FetchError::EmptyBody.kind(), "empty");
        assert_eq!(FetchError::Status(503).to_string(), "HTTP status 503");
    }

    #[test]
    fn missing_column_message_names_column() {
        let err = LoadError::MissingColumn {
            path: PathBuf::from("urls.csv"),
            column: "URL_ID",
        };
        assert!(err.to_string().contains("\"URL_ID\""));
    }
}
