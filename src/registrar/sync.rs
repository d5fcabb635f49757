use crate::error::SyncError;
use crate::registrar::warn::{self, WarnEvent};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

/// Characters the archive filesystem rejects in folder names.
const INVALID_NAME_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Terminal states of one synchronization attempt. The folder's contents
/// are never touched; the worst case parks the whole folder under the
/// temp name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Folder already carries the digest name.
    NoActionNeeded,
    /// Folder now lives under the digest name; only after this may the
    /// owning record's path be rewritten.
    Renamed { new_path: PathBuf },
    /// A move failed but the folder is intact at its original path.
    RevertedFailure { old_path: PathBuf },
    /// The second hop and the revert both failed; the folder physically
    /// exists at the temp path and needs operator attention.
    Unrecoverable { temp_path: PathBuf },
}

/// Strips characters the filesystem would reject from a digest so it can
/// serve as a folder name.
pub fn sanitize_folder_name(digest: &str) -> String {
    digest
        .chars()
        .filter(|ch| !INVALID_NAME_CHARS.contains(ch) && !ch.is_control())
        .collect()
}

fn random_sibling_name(prefix: &str) -> String {
    let stamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!(
        "{prefix}-{:x}{:x}-{:x}",
        stamp.as_secs(),
        stamp.subsec_nanos(),
        process::id()
    )
}

/// Renames the folder at `old_path` to the sanitized digest name via a
/// random sibling temp hop.
///
/// Renames against the archive share are not atomic as a pair, so the hop
/// bounds the damage: a failed first move leaves the folder where it was,
/// a failed second move is reverted, and only when the revert also fails
/// does the folder stay parked at the temp path, reported as
/// `Unrecoverable` rather than silently.
pub fn synchronize_folder(
    old_path: &Path,
    new_digest: &str,
    temp_prefix: &str,
) -> Result<SyncOutcome, SyncError> {
    if !old_path.is_dir() {
        return Err(SyncError::MissingSource(old_path.to_path_buf()));
    }
    let parent = old_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| SyncError::MissingParent(old_path.to_path_buf()))?;

    let new_name = sanitize_folder_name(new_digest);
    let current_name = old_path.file_name().and_then(|s| s.to_str()).unwrap_or("");
    if new_name == current_name {
        return Ok(SyncOutcome::NoActionNeeded);
    }

    let temp_path = parent.join(random_sibling_name(temp_prefix));
    let new_path = parent.join(&new_name);

    if let Err(err) = fs::rename(old_path, &temp_path) {
        warn::emit(WarnEvent {
            code: "MOVE_TO_TEMP_FAILED",
            stage: "sync",
            action: "move-old-to-temp",
            record: "",
            path: &old_path.display().to_string(),
            reason: "rename-failed",
            err: &err.to_string(),
        });
        return Ok(SyncOutcome::RevertedFailure {
            old_path: old_path.to_path_buf(),
        });
    }

    if let Err(err) = fs::rename(&temp_path, &new_path) {
        warn::emit(WarnEvent {
            code: "MOVE_TO_TARGET_FAILED",
            stage: "sync",
            action: "move-temp-to-target",
            record: "",
            path: &new_path.display().to_string(),
            reason: "rename-failed",
            err: &err.to_string(),
        });

        if let Err(revert_err) = fs::rename(&temp_path, old_path) {
            warn::emit(WarnEvent {
                code: "REVERT_FAILED",
                stage: "sync",
                action: "move-temp-to-old",
                record: "",
                path: &temp_path.display().to_string(),
                reason: "folder-parked-at-temp-path",
                err: &revert_err.to_string(),
            });
            return Ok(SyncOutcome::Unrecoverable { temp_path });
        }

        return Ok(SyncOutcome::RevertedFailure {
            old_path: old_path.to_path_buf(),
        });
    }

    Ok(SyncOutcome::Renamed { new_path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::tempdir;

    fn folder_with_files(root: &Path, name: &str, files: &[&str]) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(&dir).expect("mkdir");
        for file in files {
            fs::write(dir.join(file), b"data").expect("write");
        }
        dir
    }

    fn file_set(dir: &Path) -> BTreeSet<String> {
        fs::read_dir(dir)
            .expect("read_dir")
            .map(|entry| entry.expect("entry").file_name().to_string_lossy().to_string())
            .collect()
    }

    #[test]
    fn sanitize_strips_filesystem_invalid_characters() {
        assert_eq!(sanitize_folder_name("ПКВ/М7 № 18/2011"), "ПКВМ7 № 182011");
        assert_eq!(sanitize_folder_name("a:b*c?d\"e<f>g|h\\i"), "abcdefghi");
        assert_eq!(sanitize_folder_name("чистое имя"), "чистое имя");
    }

    #[test]
    fn rename_moves_folder_and_keeps_contents() {
        let tmp = tempdir().expect("tempdir");
        let old = folder_with_files(tmp.path(), "МИКО-7 № 12013", &["a.pdf", "b.pdf"]);

        let outcome = synchronize_folder(&old, "МИКО-7 № 1/2013 (списан)", ".sync").expect("sync");
        let SyncOutcome::Renamed { new_path } = outcome else {
            panic!("expected rename, got {outcome:?}");
        };
        assert_eq!(new_path, tmp.path().join("МИКО-7 № 12013 (списан)"));
        assert!(!old.exists());
        assert_eq!(file_set(&new_path).len(), 2);
    }

    #[test]
    fn matching_name_is_a_no_op_twice() {
        let tmp = tempdir().expect("tempdir");
        let digest = "МИКО-7 № 1/2013";
        let dir = folder_with_files(tmp.path(), &sanitize_folder_name(digest), &["a.pdf"]);

        for _ in 0..2 {
            let outcome = synchronize_folder(&dir, digest, ".sync").expect("sync");
            assert_eq!(outcome, SyncOutcome::NoActionNeeded);
            assert!(dir.exists());
        }
    }

    #[test]
    fn failed_second_hop_reverts_with_contents_unchanged() {
        let tmp = tempdir().expect("tempdir");
        let old = folder_with_files(tmp.path(), "старое имя", &["a.pdf", "b.pdf"]);
        let before = file_set(&old);

        // A non-empty folder already at the target name makes the second
        // rename fail, which must trigger the revert.
        folder_with_files(tmp.path(), "новое имя", &["occupied.pdf"]);

        let outcome = synchronize_folder(&old, "новое имя", ".sync").expect("sync");
        assert_eq!(
            outcome,
            SyncOutcome::RevertedFailure {
                old_path: old.clone()
            }
        );
        assert!(old.is_dir());
        assert_eq!(file_set(&old), before);
    }

    #[test]
    fn missing_source_is_a_precondition_error() {
        let tmp = tempdir().expect("tempdir");
        let missing = tmp.path().join("нет такой папки");
        let err = synchronize_folder(&missing, "что-нибудь", ".sync").expect_err("error");
        assert!(matches!(err, SyncError::MissingSource(_)));
    }
}
