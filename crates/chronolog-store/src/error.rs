//! Failures raised by the transaction engine itself.
//!
//! User transformation errors and lower-layer errors (`FsError`, `VcsError`,
//! stream and codec failures) pass through the engine unchanged; only the
//! conditions the engine detects on its own live here.

use std::path::PathBuf;

use thiserror::Error;

use chronolog_fs::FsError;

/// Errors originating in the transaction engine.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A [`crate::TransactionHandle`] was used after its transaction ended.
    #[error("transaction storage used outside an active transaction")]
    TransactionClosed,

    /// Copying an asset into the working copy failed.
    #[error(
        "failed to copy asset '{}' to '{}': {source}",
        source_path.display(),
        target.display()
    )]
    AssetCopyFailed {
        /// The queued source file.
        source_path: PathBuf,
        /// The computed target path.
        target: PathBuf,
        /// Underlying filesystem failure.
        #[source]
        source: FsError,
    },
}
