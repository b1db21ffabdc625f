//! Failure type shared by every filesystem capability.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Errors surfaced by the filesystem capabilities.
#[derive(Debug, Error)]
pub enum FsError {
    /// The file does not exist.
    #[error("file not found: {}", path.display())]
    NotFound {
        /// The missing path.
        path: PathBuf,
    },

    /// Any other I/O failure, with the path it concerned.
    #[error("I/O error for '{}': {source}", path.display())]
    Io {
        /// The path involved in the operation.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl FsError {
    /// Wrap an I/O error, mapping `NotFound` to the dedicated variant.
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            Self::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            Self::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    /// Whether this error reports a missing file.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
