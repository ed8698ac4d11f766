//! Per-job workspace lifecycle
//!
//! Each job gets its own directory under the configured base directory,
//! named after a random UUID so concurrent jobs never share one.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

/// Errors that occur while preparing a job directory
#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("failed to create job directory {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid path: {0}")]
    InvalidPath(String),
}

/// A job directory that is removed when dropped
///
/// Removal is recursive and best effort: failures are logged and never
/// surface to the caller, so cleanup cannot mask the job's own result.
///
/// Inside async code prefer [`remove`](Self::remove), which does the
/// recursive delete on the blocking pool. `Drop` deletes synchronously on
/// the current thread and only covers early returns and cancelled futures.
#[derive(Debug)]
pub struct JobWorkspace {
    /// Job ID
    id: Uuid,

    /// Absolute path to the job directory
    path: PathBuf,

    /// Set once the directory has been handed to [`remove`](Self::remove)
    removed: bool,
}

impl JobWorkspace {
    /// Create a fresh, empty job directory under `base_dir`
    #[instrument]
    pub async fn create(base_dir: &Path) -> Result<Self, WorkspaceError> {
        let id = Uuid::new_v4();
        let path = base_dir.join(id.to_string());

        tokio::fs::create_dir_all(&path)
            .await
            .map_err(|source| WorkspaceError::Create {
                path: path.clone(),
                source,
            })?;

        // From here on the guard owns the directory, so an early return
        // below still removes it.
        let mut workspace = Self {
            id,
            path,
            removed: false,
        };

        // Children run with the job directory as their working directory,
        // so every path handed to them must be absolute.
        workspace.path = tokio::fs::canonicalize(&workspace.path)
            .await
            .map_err(|source| WorkspaceError::Create {
                path: workspace.path.clone(),
                source,
            })?;

        debug!(path = %workspace.path.display(), "created job directory");
        Ok(workspace)
    }

    /// Get the job ID
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Get the path to the job directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the path to a file inside the job directory
    ///
    /// Returns an error if the name would escape the directory.
    pub fn file_path(&self, name: &str) -> Result<PathBuf, WorkspaceError> {
        if name.is_empty() || name.contains("..") || Path::new(name).is_absolute() {
            return Err(WorkspaceError::InvalidPath(format!(
                "path traversal not allowed: {name}"
            )));
        }
        Ok(self.path.join(name))
    }

    /// Write a file into the job directory
    #[instrument(skip(self, content))]
    pub async fn write_file(&self, name: &str, content: &[u8]) -> Result<PathBuf, WorkspaceError> {
        let path = self.file_path(name)?;
        tokio::fs::write(&path, content)
            .await
            .map_err(|source| WorkspaceError::Write {
                path: path.clone(),
                source,
            })?;
        debug!(?path, len = content.len(), "wrote file to job directory");
        Ok(path)
    }

    /// Remove the job directory without blocking the async worker
    ///
    /// The directory is gone when this returns. If the future is dropped
    /// early the removal still finishes in the background.
    pub async fn remove(mut self) {
        self.removed = true;
        let result = tokio::fs::remove_dir_all(&self.path).await;
        self.log_removal(result);
    }

    fn log_removal(&self, result: io::Result<()>) {
        match result {
            Ok(()) => debug!(job_id = %self.id, "removed job directory"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                job_id = %self.id,
                path = %self.path.display(),
                error = %e,
                "failed to remove job directory"
            ),
        }
    }
}

impl Drop for JobWorkspace {
    fn drop(&mut self) {
        if self.removed {
            return;
        }
        let result = std::fs::remove_dir_all(&self.path);
        self.log_removal(result);
    }
}
