use std::io;
use std::path::Path;

use crate::errors::BenchError;
use crate::types::CleanupPolicy;

/// Outcome of a best-effort directory removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed,
    Absent,
}

/// Recursively remove `path`. A missing directory is reported as
/// [`Removal::Absent`], not as an error.
pub fn remove_output_dir(path: &Path) -> io::Result<Removal> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(Removal::Removed),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Removal::Absent),
        Err(e) => Err(e),
    }
}

/// Remove `path`, routing real failures through `policy`.
pub fn clear_output_dir(path: &Path, policy: CleanupPolicy) -> Result<(), BenchError> {
    match remove_output_dir(path) {
        Ok(Removal::Removed) => {
            tracing::trace!("removed {}", path.display());
            Ok(())
        }
        Ok(Removal::Absent) => Ok(()),
        Err(source) => match policy {
            CleanupPolicy::Warn => {
                tracing::warn!("failed to remove {}: {}", path.display(), source);
                Ok(())
            }
            CleanupPolicy::Abort => Err(BenchError::Cleanup {
                path: path.to_path_buf(),
                source,
            }),
        },
    }
}
