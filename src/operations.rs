//! Destructive operations on scan results.
//!
//! Every path must have been surfaced as a match by the current scan session
//! before it can be deleted, trashed or moved. Each path in a batch is
//! handled independently: a failure is recorded in that path's outcome and
//! the rest of the batch carries on.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::errors::{AppError, DenyReason};
use crate::model::OpOutcome;
use crate::platform::{self, Filesystem, StdFilesystem, is_cross_device, is_filesystem_root};
use crate::scanner::{ScanEngine, ScanSession};

#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Authorization {
    pub path: PathBuf,
    pub denied: Option<DenyReason>,
}

impl Authorization {
    pub fn ok(&self) -> bool {
        self.denied.is_none()
    }
}

pub struct OperationGate {
    session: Option<Arc<ScanSession>>,
    fs: Arc<dyn Filesystem>,
}

impl OperationGate {
    pub fn new(session: Option<Arc<ScanSession>>) -> Self {
        Self {
            session,
            fs: Arc::new(StdFilesystem),
        }
    }

    /// Gate backed by the engine's current session.
    pub fn for_engine(engine: &ScanEngine) -> Self {
        Self::new(engine.session())
    }

    pub fn with_filesystem(mut self, fs: Arc<dyn Filesystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn authorize(&self, paths: &[PathBuf]) -> Vec<Authorization> {
        paths
            .iter()
            .map(|path| Authorization {
                path: path.clone(),
                denied: (!self.is_allowed(path)).then_some(DenyReason::NotAllowed),
            })
            .collect()
    }

    pub fn delete(&self, paths: &[PathBuf]) -> Result<Vec<OpOutcome>, AppError> {
        require_paths(paths)?;
        Ok(paths
            .iter()
            .map(|path| {
                if let Err(reason) = self.check(path, true) {
                    return OpOutcome::failure(path.clone(), reason.to_string());
                }
                match self.fs.remove_file(path) {
                    Ok(()) => {
                        self.revoke(path);
                        info!("deleted {}", path.display());
                        OpOutcome::success(path.clone())
                    }
                    Err(error) => io_failure("delete", path, &error),
                }
            })
            .collect())
    }

    pub fn trash(&self, paths: &[PathBuf]) -> Result<Vec<OpOutcome>, AppError> {
        require_paths(paths)?;
        Ok(paths
            .iter()
            .map(|path| {
                if let Err(reason) = self.check(path, false) {
                    return OpOutcome::failure(path.clone(), reason.to_string());
                }
                match self.fs.trash(path) {
                    Ok(()) => {
                        self.revoke(path);
                        info!("trashed {}", path.display());
                        OpOutcome::success(path.clone())
                    }
                    Err(error) => io_failure("trash", path, &error),
                }
            })
            .collect())
    }

    pub fn move_to(
        &self,
        paths: &[PathBuf],
        destination: &Path,
    ) -> Result<Vec<OpOutcome>, AppError> {
        require_paths(paths)?;
        let metadata = self
            .fs
            .metadata(destination)
            .map_err(|_| AppError::InvalidInput("Destination not found".to_string()))?;
        if !metadata.is_dir() {
            return Err(AppError::InvalidInput(
                "Destination not directory".to_string(),
            ));
        }

        Ok(paths
            .iter()
            .map(|path| {
                if let Err(reason) = self.check(path, false) {
                    return OpOutcome::failure(path.clone(), reason.to_string());
                }
                let Some(name) = path.file_name() else {
                    return OpOutcome::failure(path.clone(), DenyReason::NotAFile.to_string());
                };
                let target = destination.join(name);
                if target == *path {
                    return OpOutcome::failure(path.clone(), "Already in destination".to_string());
                }
                match move_file(self.fs.as_ref(), path, &target) {
                    Ok(()) => {
                        self.revoke(path);
                        info!("moved {} -> {}", path.display(), target.display());
                        OpOutcome::moved(path.clone(), target)
                    }
                    Err(error) => io_failure("move", path, &error),
                }
            })
            .collect())
    }

    /// Not gated: revealing a path never changes the filesystem.
    pub fn reveal(&self, path: &Path) -> Result<(), AppError> {
        platform::reveal_in_file_manager(path).map_err(|error| AppError::Operation {
            path: path.to_path_buf(),
            reason: format!("reveal failed: {error}"),
        })
    }

    pub fn open(&self, path: &Path) -> Result<(), AppError> {
        platform::open_with_default_app(path).map_err(|error| AppError::Operation {
            path: path.to_path_buf(),
            reason: format!("open failed: {error}"),
        })
    }

    fn is_allowed(&self, path: &Path) -> bool {
        self.session
            .as_ref()
            .is_some_and(|session| session.is_allowed(path))
    }

    fn revoke(&self, path: &Path) {
        if let Some(session) = &self.session {
            session.revoke(path);
        }
    }

    fn check(&self, path: &Path, reject_root: bool) -> Result<(), DenyReason> {
        if !self.is_allowed(path) {
            return Err(DenyReason::NotAllowed);
        }
        if reject_root && is_filesystem_root(path) {
            return Err(DenyReason::ForbiddenPath);
        }
        // The tree may have changed since the scan saw this path.
        let is_file = self
            .fs
            .symlink_metadata(path)
            .map(|metadata| metadata.is_file())
            .unwrap_or(false);
        if !is_file {
            return Err(DenyReason::NotAFile);
        }
        Ok(())
    }
}

fn require_paths(paths: &[PathBuf]) -> Result<(), AppError> {
    if paths.is_empty() {
        return Err(AppError::InvalidInput("No paths".to_string()));
    }
    Ok(())
}

fn io_failure(action: &str, path: &Path, error: &io::Error) -> OpOutcome {
    warn!("{action} failed for {}: {error}", path.display());
    OpOutcome::failure(path.to_path_buf(), error.to_string())
}

/// Renames `from` to `to`, falling back to copy-then-remove across devices.
///
/// The source is removed only after the copy has fully completed.
pub fn move_file(fs: &dyn Filesystem, from: &Path, to: &Path) -> io::Result<()> {
    match fs.rename(from, to) {
        Ok(()) => Ok(()),
        Err(error) if is_cross_device(&error) => {
            debug!(
                "{} and {} are on different devices, copying",
                from.display(),
                to.display()
            );
            if let Some(parent) = to.parent() {
                fs.create_dir_all(parent)?;
            }
            if let Err(error) = fs.copy(from, to) {
                let _ = fs.remove_file(to);
                return Err(error);
            }
            fs.remove_file(from)
        }
        Err(error) => Err(error),
    }
}
