use std::path::PathBuf;

use crate::layout::LayoutParseError;

/// Errors raised while loading static device and BIOS data.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse {name}: {source}")]
    Json {
        name: String,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Layout(#[from] LayoutParseError),
}

impl CoreError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn json(name: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Json {
            name: name.into(),
            source,
        }
    }
}
