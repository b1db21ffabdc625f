//! Local filesystem implementation of the capability traits.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::{
    ExistingFile, FileAppender, FileCopier, FileCreator, FileDeleter, FileReader, FileWriter,
    FsError, PathChecker,
};

/// Capability implementation backed by `tokio::fs`.
///
/// One instance implements every capability trait; [`crate::Capabilities::local`]
/// shares a single instance across all slots.
#[derive(Debug, Default, Clone)]
pub struct LocalFs;

impl LocalFs {
    /// Create a new local filesystem handle.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileReader for LocalFs {
    async fn read_to_string(&self, file: &ExistingFile) -> Result<String, FsError> {
        fs::read_to_string(file.path())
            .await
            .map_err(|e| FsError::io(file.path(), e))
    }
}

#[async_trait]
impl FileWriter for LocalFs {
    async fn write(&self, path: &Path, contents: &str) -> Result<(), FsError> {
        fs::write(path, contents)
            .await
            .map_err(|e| FsError::io(path, e))
    }
}

#[async_trait]
impl FileAppender for LocalFs {
    async fn append(&self, file: &ExistingFile, contents: &str) -> Result<(), FsError> {
        let mut handle = fs::OpenOptions::new()
            .append(true)
            .open(file.path())
            .await
            .map_err(|e| FsError::io(file.path(), e))?;
        handle
            .write_all(contents.as_bytes())
            .await
            .map_err(|e| FsError::io(file.path(), e))?;
        handle.flush().await.map_err(|e| FsError::io(file.path(), e))
    }
}

#[async_trait]
impl FileCreator for LocalFs {
    async fn create_file(&self, path: &Path) -> Result<ExistingFile, FsError> {
        fs::File::create(path)
            .await
            .map_err(|e| FsError::io(path, e))?;
        Ok(ExistingFile::new(path.to_path_buf()))
    }

    async fn create_dir_all(&self, path: &Path) -> Result<(), FsError> {
        fs::create_dir_all(path)
            .await
            .map_err(|e| FsError::io(path, e))
    }

    async fn create_temp_dir(&self) -> Result<PathBuf, FsError> {
        let dir = tempfile::tempdir()
            .map_err(|e| FsError::io(Path::new("<temp>"), e))?;
        Ok(dir.into_path())
    }
}

#[async_trait]
impl PathChecker for LocalFs {
    async fn check_file(&self, path: &Path) -> Result<Option<ExistingFile>, FsError> {
        match fs::metadata(path).await {
            Ok(meta) if meta.is_file() => Ok(Some(ExistingFile::new(path.to_path_buf()))),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(FsError::io(path, e)),
        }
    }
}

#[async_trait]
impl FileCopier for LocalFs {
    async fn copy(&self, source: &ExistingFile, target: &Path) -> Result<(), FsError> {
        fs::copy(source.path(), target)
            .await
            .map(|_| ())
            .map_err(|e| FsError::io(target, e))
    }
}

#[async_trait]
impl FileDeleter for LocalFs {
    async fn delete(&self, path: &Path) -> Result<(), FsError> {
        fs::remove_file(path)
            .await
            .map_err(|e| FsError::io(path, e))
    }
}
