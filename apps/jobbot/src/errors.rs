use std::path::{Path, PathBuf};

use thiserror::Error;

/// Binary-level errors: reading inputs and persisting results.
/// Generation failures have their own taxonomy in `llm_client::GenerationError`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing input file: {}", .0.display())]
    MissingInput(PathBuf),
}

impl AppError {
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Io { .. } => "IO_ERROR",
            AppError::Json { .. } => "JSON_ERROR",
            AppError::MissingInput(_) => "MISSING_INPUT",
        }
    }

    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        AppError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn json(path: &Path, source: serde_json::Error) -> Self {
        AppError::Json {
            path: path.to_path_buf(),
            source,
        }
    }
}
