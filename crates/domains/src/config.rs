//! Loading rule-table parameters from JSON or TOML.
//!
//! Only numeric parameters and codes are configurable; the rules and their
//! order are fixed by each engine. Missing keys fall back to defaults.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;

/// Errors loading a policy document.
#[derive(Debug, thiserror::Error)]
pub enum PolicyError {
    #[error("invalid JSON policy: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid TOML policy: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to read policy file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Policy files must end in `.json` or `.toml`.
    #[error("unsupported policy file: {}", .path.display())]
    UnsupportedFormat { path: PathBuf },
}

/// A deserializable set of rule-table parameters.
pub trait Policy: DeserializeOwned {
    fn from_json_str(s: &str) -> Result<Self, PolicyError> {
        Ok(serde_json::from_str(s)?)
    }

    fn from_toml_str(s: &str) -> Result<Self, PolicyError> {
        Ok(toml::from_str(s)?)
    }

    /// Load from a file, choosing the format by extension.
    fn from_path(path: &Path) -> Result<Self, PolicyError> {
        let content = std::fs::read_to_string(path).map_err(|source| PolicyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            Some("toml") => Self::from_toml_str(&content),
            _ => Err(PolicyError::UnsupportedFormat {
                path: path.to_path_buf(),
            }),
        }
    }
}
