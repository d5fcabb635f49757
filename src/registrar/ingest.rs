use crate::registrar::party::{self, PartyCandidate};
use crate::registrar::passport;
use crate::registrar::protocol::Protocol;
use crate::registrar::registry::{AttachedDocument, RegistryStore};
use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// How one parsed protocol file fared against the registry.
#[derive(Debug, Clone)]
pub enum RegisterOutcome {
    /// A passport digest matched; the file is attached and archived.
    Attached { passport_id: String, deduped: bool },
    /// No passport, but the party index knows the unit and year.
    PartyOnly { party: PartyCandidate },
    /// Neither a passport nor a party candidate exists.
    Unmatched,
}

/// Aggregate of one `load` run, reported to the operator as a batch.
#[derive(Debug, Clone, Default)]
pub struct LoadOutcome {
    pub scanned: usize,
    pub attached: usize,
    pub unrecognized: usize,
    pub party_only: usize,
    pub unmatched: usize,
    pub failed: usize,
    pub lines: Vec<String>,
}

fn epoch_now() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock is before UNIX_EPOCH")?
        .as_secs())
}

fn file_hash(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}

fn move_file(from: &Path, to: &Path) -> Result<()> {
    if from == to {
        return Ok(());
    }
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    match fs::rename(from, to) {
        Ok(_) => Ok(()),
        Err(rename_err) => {
            if matches!(
                rename_err.kind(),
                ErrorKind::CrossesDevices | ErrorKind::PermissionDenied
            ) {
                fs::copy(from, to).with_context(|| {
                    format!("failed to copy {} to {}", from.display(), to.display())
                })?;
                fs::remove_file(from)
                    .with_context(|| format!("failed to remove {}", from.display()))?;
                Ok(())
            } else {
                Err(rename_err).with_context(|| {
                    format!("failed to move {} to {}", from.display(), to.display())
                })
            }
        }
    }
}

fn collect_files(root: &Path, recursive: bool, out: &mut Vec<PathBuf>) -> Result<()> {
    let entries =
        fs::read_dir(root).with_context(|| format!("failed to read {}", root.display()))?;
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.is_file() {
            out.push(path);
            continue;
        }
        if recursive && path.is_dir() {
            collect_files(&path, recursive, out)?;
        }
    }
    Ok(())
}

/// Scans the inbox and builds one `Protocol` per file; malformed names
/// come back with `is_valid == false` rather than being dropped.
pub fn scan_protocols(inbox_dir: &Path, recursive: bool) -> Result<Vec<Protocol>> {
    let mut files = Vec::new();
    collect_files(inbox_dir, recursive, &mut files)?;
    files.sort();
    Ok(files.iter().map(|path| Protocol::from_path(path)).collect())
}

/// Resolves one valid protocol against the registry. On a passport hit the
/// file is attached (unless an attachment with the same name or content
/// already exists) and moved out of the inbox.
pub fn register_protocol(
    store: &mut RegistryStore,
    protocol: &Protocol,
    inbox_dir: &Path,
    processed_dir: &Path,
) -> Result<RegisterOutcome> {
    let passport_id = passport::find_passport(&store.passports, protocol)?
        .map(|record| record.id.clone());

    let Some(passport_id) = passport_id else {
        return Ok(match party::select_party(&store.parties, protocol)? {
            Some(party) => RegisterOutcome::PartyOnly { party },
            None => RegisterOutcome::Unmatched,
        });
    };

    let content_hash = file_hash(&protocol.source_path)?;
    let record = store
        .passport_mut(&passport_id)
        .context("matched passport disappeared from the store")?;

    let deduped = record.has_attachment(protocol.file_name(), &content_hash);
    if !deduped {
        record.attachments.push(AttachedDocument {
            file_name: protocol.file_name().to_string(),
            category_id: protocol
                .kind()
                .map(|kind| kind.category_id().to_string())
                .unwrap_or_default(),
            test_date: protocol.date_token.clone(),
            content_hash,
            attached_at_epoch_secs: epoch_now()?,
        });
    }

    let relative = protocol
        .source_path
        .strip_prefix(inbox_dir)
        .unwrap_or(Path::new(protocol.file_name()));
    move_file(&protocol.source_path, &processed_dir.join(relative))?;

    Ok(RegisterOutcome::Attached {
        passport_id,
        deduped,
    })
}

/// Runs the whole batch, accumulating a human-readable report; per-file
/// registry or filesystem errors are recorded and do not abort the rest
/// of the batch. Unrecognized files stay in the inbox.
pub fn register_batch(
    store: &mut RegistryStore,
    protocols: &[Protocol],
    inbox_dir: &Path,
    processed_dir: &Path,
) -> Result<LoadOutcome> {
    let mut out = LoadOutcome::default();

    for protocol in protocols {
        out.scanned += 1;

        if !protocol.is_valid {
            out.unrecognized += 1;
            out.lines.push(format!(
                "unrecognized file: {}",
                protocol.source_path.display()
            ));
            continue;
        }

        match register_protocol(store, protocol, inbox_dir, processed_dir) {
            Ok(RegisterOutcome::Attached {
                passport_id,
                deduped,
            }) => {
                out.attached += 1;
                if deduped {
                    out.lines.push(format!(
                        "already attached to passport {passport_id}: {}",
                        protocol.file_name()
                    ));
                } else {
                    out.lines.push(format!(
                        "attached to passport {passport_id}: {}",
                        protocol.file_name()
                    ));
                }
            }
            Ok(RegisterOutcome::PartyOnly { party }) => {
                out.party_only += 1;
                out.lines.push(format!(
                    "no passport for {}; latest party: {}",
                    protocol.file_name(),
                    party.display_name
                ));
            }
            Ok(RegisterOutcome::Unmatched) => {
                out.unmatched += 1;
                out.lines.push(format!(
                    "no passport and no party for {}",
                    protocol.file_name()
                ));
            }
            Err(err) => {
                out.failed += 1;
                out.lines.push(format!(
                    "register failed for {}: {err:#}",
                    protocol.file_name()
                ));
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registrar::registry::{PartyRecord, PassportRecord};
    use tempfile::tempdir;

    fn store_with_passport() -> RegistryStore {
        let mut store = RegistryStore::default();
        store.passports.push(PassportRecord {
            id: "p-1".to_string(),
            digest: "ПКВ/М7 № 18/2011".to_string(),
            path: None,
            attachments: Vec::new(),
        });
        store.parties.push(PartyRecord {
            id: "b-1".to_string(),
            name: "МИКО-7 - 50 - 2/2013".to_string(),
        });
        store
    }

    #[test]
    fn scan_walks_subfolders_and_flags_malformed_names() {
        let tmp = tempdir().expect("tempdir");
        let inbox = tmp.path().join("inbox");
        fs::create_dir_all(inbox.join("глубже")).expect("mkdir");
        fs::write(inbox.join("ПК-01.05.11-18-11-ПКВМ7.pdf"), b"x").expect("write");
        fs::write(inbox.join("глубже/мусор.txt"), b"x").expect("write");

        let protocols = scan_protocols(&inbox, true).expect("scan");
        assert_eq!(protocols.len(), 2);
        assert_eq!(protocols.iter().filter(|p| p.is_valid).count(), 1);

        let flat = scan_protocols(&inbox, false).expect("scan");
        assert_eq!(flat.len(), 1);
    }

    #[test]
    fn matched_file_is_attached_and_moved() {
        let tmp = tempdir().expect("tempdir");
        let inbox = tmp.path().join("inbox");
        let processed = tmp.path().join("processed");
        fs::create_dir_all(&inbox).expect("mkdir");
        let file = inbox.join("ПК-01.05.11-18-11-ПКВМ7.pdf");
        fs::write(&file, b"protocol body").expect("write");

        let mut store = store_with_passport();
        let protocol = Protocol::from_path(&file);
        let outcome =
            register_protocol(&mut store, &protocol, &inbox, &processed).expect("register");

        assert!(matches!(
            outcome,
            RegisterOutcome::Attached { deduped: false, .. }
        ));
        assert!(!file.exists());
        assert!(processed.join("ПК-01.05.11-18-11-ПКВМ7.pdf").exists());

        let record = &store.passports[0];
        assert_eq!(record.attachments.len(), 1);
        let doc = &record.attachments[0];
        assert_eq!(doc.file_name, "ПК-01.05.11-18-11-ПКВМ7.pdf");
        assert_eq!(doc.test_date, "01.05.11");
        assert_eq!(doc.category_id, "{937151F3-A501-4DE0-991E-59594D73CBE2}");
    }

    #[test]
    fn reattaching_the_same_file_is_deduplicated() {
        let tmp = tempdir().expect("tempdir");
        let inbox = tmp.path().join("inbox");
        let processed = tmp.path().join("processed");
        fs::create_dir_all(&inbox).expect("mkdir");

        let mut store = store_with_passport();
        for _ in 0..2 {
            let file = inbox.join("ПК-01.05.11-18-11-ПКВМ7.pdf");
            fs::write(&file, b"protocol body").expect("write");
            let protocol = Protocol::from_path(&file);
            register_protocol(&mut store, &protocol, &inbox, &processed).expect("register");
        }

        assert_eq!(store.passports[0].attachments.len(), 1);
    }

    #[test]
    fn batch_report_covers_every_outcome() {
        let tmp = tempdir().expect("tempdir");
        let inbox = tmp.path().join("inbox");
        let processed = tmp.path().join("processed");
        fs::create_dir_all(&inbox).expect("mkdir");
        for name in [
            "ПК-01.05.11-18-11-ПКВМ7.pdf", // passport match
            "ПР-02.04.13-7-13-МИКО7.pdf",  // party only
            "ПР-02.04.19-9-19-МИКО9.pdf",  // unmatched
            "не протокол.pdf",             // unrecognized
        ] {
            fs::write(inbox.join(name), name.as_bytes()).expect("write");
        }

        let mut store = store_with_passport();
        let protocols = scan_protocols(&inbox, false).expect("scan");
        let out = register_batch(&mut store, &protocols, &inbox, &processed).expect("batch");

        assert_eq!(out.scanned, 4);
        assert_eq!(out.attached, 1);
        assert_eq!(out.party_only, 1);
        assert_eq!(out.unmatched, 1);
        assert_eq!(out.unrecognized, 1);
        assert_eq!(out.failed, 0);
        assert!(inbox.join("не протокол.pdf").exists());
        assert!(inbox.join("ПР-02.04.13-7-13-МИКО7.pdf").exists());
    }
}
