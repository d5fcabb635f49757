use std::path::PathBuf;
use thiserror::Error;

/// Precondition faults of folder synchronization, outside the documented
/// input domain of `synchronize_folder`. Expected negative outcomes
/// (unrecognized filenames, missing passports, failed renames) are plain
/// values, not errors.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("folder does not exist: {0}")]
    MissingSource(PathBuf),
    #[error("folder has no parent directory: {0}")]
    MissingParent(PathBuf),
}
