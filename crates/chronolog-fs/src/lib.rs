#![forbid(unsafe_code)]
#![deny(missing_docs)]

//! **chronolog-fs** – Filesystem capabilities for chronolog.
//!
//! This crate defines the narrow set of asynchronous filesystem interfaces the
//! rest of the stack is allowed to touch: a reader, writer, appender, creator,
//! checker, copier, and deleter. Code above this layer never handles raw paths
//! beyond computing them; every byte that moves does so through one of these
//! capabilities, which is what keeps the transaction engine testable.
//!
//! The checker hands out [`ExistingFile`] proofs. The type has no public
//! constructor, so holding one means the path was observed to exist - an
//! arbitrary string can never be passed where a checked file is required.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;

mod error;
mod local;

pub use error::FsError;
pub use local::LocalFs;

//─────────────────────────────
//  Existence proofs
//─────────────────────────────

/// Proof that a path referred to an existing regular file when checked.
///
/// Only the checker and creator capabilities mint these; everything else can
/// merely carry them around. The proof is a snapshot - the file can of course
/// disappear afterwards, which surfaces as an [`FsError`] from whichever
/// operation trips over it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExistingFile {
    path: PathBuf,
}

impl ExistingFile {
    pub(crate) fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// The checked path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Final path component.
    pub fn file_name(&self) -> &OsStr {
        // A path whose metadata reported a regular file always ends in a
        // normal component; the fallback is unreachable in practice.
        self.path.file_name().unwrap_or_else(|| self.path.as_os_str())
    }
}

//─────────────────────────────
//  Capability traits
//─────────────────────────────

/// Read a checked file to a string.
#[async_trait]
pub trait FileReader: Send + Sync {
    /// Read the entire file as UTF-8 text.
    async fn read_to_string(&self, file: &ExistingFile) -> Result<String, FsError>;
}

/// Replace a file's contents, creating it if absent.
#[async_trait]
pub trait FileWriter: Send + Sync {
    /// Write `contents`, truncating any previous data.
    async fn write(&self, path: &Path, contents: &str) -> Result<(), FsError>;
}

/// Append to a checked file.
#[async_trait]
pub trait FileAppender: Send + Sync {
    /// Append `contents` at the end of the file.
    async fn append(&self, file: &ExistingFile, contents: &str) -> Result<(), FsError>;
}

/// Create files and directories.
#[async_trait]
pub trait FileCreator: Send + Sync {
    /// Create an empty file, returning its existence proof.
    async fn create_file(&self, path: &Path) -> Result<ExistingFile, FsError>;

    /// Create a directory and all missing parents.
    async fn create_dir_all(&self, path: &Path) -> Result<(), FsError>;

    /// Create a fresh temporary directory and return its path.
    async fn create_temp_dir(&self) -> Result<PathBuf, FsError>;
}

/// Check whether a path is an existing regular file.
#[async_trait]
pub trait PathChecker: Send + Sync {
    /// `Some` proof if `path` is a regular file, `None` if it is absent or
    /// not a file.
    async fn check_file(&self, path: &Path) -> Result<Option<ExistingFile>, FsError>;
}

/// Copy a checked file's bytes to a new location.
#[async_trait]
pub trait FileCopier: Send + Sync {
    /// Copy `source` to `target`, replacing any existing file there.
    async fn copy(&self, source: &ExistingFile, target: &Path) -> Result<(), FsError>;
}

/// Delete a file.
#[async_trait]
pub trait FileDeleter: Send + Sync {
    /// Remove the file at `path`; a missing file is reported as
    /// [`FsError::NotFound`].
    async fn delete(&self, path: &Path) -> Result<(), FsError>;
}

//─────────────────────────────
//  Capability bundle
//─────────────────────────────

/// The full set of filesystem capabilities handed to the engine.
///
/// Each slot is an independent trait object so tests can substitute a single
/// capability while leaving the rest real. [`Capabilities::local`] wires every
/// slot to one shared [`LocalFs`].
#[derive(Clone)]
pub struct Capabilities {
    /// File reading.
    pub reader: Arc<dyn FileReader>,
    /// Replace-on-write file writing.
    pub writer: Arc<dyn FileWriter>,
    /// File appending.
    pub appender: Arc<dyn FileAppender>,
    /// File and directory creation.
    pub creator: Arc<dyn FileCreator>,
    /// Existence checking.
    pub checker: Arc<dyn PathChecker>,
    /// Byte-level file copying.
    pub copier: Arc<dyn FileCopier>,
    /// File deletion.
    pub deleter: Arc<dyn FileDeleter>,
}

impl Capabilities {
    /// Bundle backed entirely by the local filesystem.
    pub fn local() -> Self {
        let fs = Arc::new(LocalFs::new());
        Self {
            reader: fs.clone(),
            writer: fs.clone(),
            appender: fs.clone(),
            creator: fs.clone(),
            checker: fs.clone(),
            copier: fs.clone(),
            deleter: fs,
        }
    }
}
