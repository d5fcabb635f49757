use anyhow::{Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// One file attached to a passport record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachedDocument {
    pub file_name: String,
    pub category_id: String,
    pub test_date: String,
    pub content_hash: String,
    pub attached_at_epoch_secs: u64,
}

/// Registry entry for one physical instrument instance. The digest is the
/// display string other tooling searches; `path` points at the archive
/// folder and is only rewritten after a confirmed rename.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PassportRecord {
    pub id: String,
    pub digest: String,
    pub path: Option<String>,
    #[serde(default)]
    pub attachments: Vec<AttachedDocument>,
}

impl PassportRecord {
    /// A protocol file counts as already attached when the record holds a
    /// file whose stored name occurs inside the incoming name, or whose
    /// content hash matches.
    pub fn has_attachment(&self, file_name: &str, content_hash: &str) -> bool {
        self.attachments
            .iter()
            .any(|doc| file_name.contains(&doc.file_name) || doc.content_hash == content_hash)
    }
}

/// Row of the manufacturing-party index. The composite display name
/// (`ПКВ/М7 - 50 - 2/2011`) is the only searchable surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartyRecord {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryStore {
    pub schema_version: u32,
    pub passports: Vec<PassportRecord>,
    pub parties: Vec<PartyRecord>,
}

impl Default for RegistryStore {
    fn default() -> Self {
        Self {
            schema_version: 1,
            passports: Vec::new(),
            parties: Vec::new(),
        }
    }
}

impl RegistryStore {
    pub fn passport_mut(&mut self, id: &str) -> Option<&mut PassportRecord> {
        self.passports.iter_mut().find(|record| record.id == id)
    }
}

pub fn load(file: &Path) -> Result<RegistryStore> {
    if !file.exists() {
        return Ok(RegistryStore::default());
    }

    let raw =
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;
    let parsed = serde_json::from_str(&raw)
        .with_context(|| format!("failed to parse {}", file.display()))?;
    Ok(parsed)
}

pub fn save(file: &Path, store: &RegistryStore) -> Result<()> {
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let data = serde_json::to_string_pretty(store)?;
    fs::write(file, format!("{data}\n"))
        .with_context(|| format!("failed to write {}", file.display()))?;
    Ok(())
}

/// Advisory lock serializing store mutations between concurrent
/// invocations. It deliberately does not extend to archive folder renames;
/// racing renames surface as move failures instead.
#[derive(Debug)]
pub struct StoreLock {
    file: fs::File,
}

pub fn lock_store(store_file: &Path) -> Result<StoreLock> {
    let lock_path: PathBuf = store_file.with_extension("lock");
    if let Some(parent) = lock_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .open(&lock_path)
        .with_context(|| format!("failed to open {}", lock_path.display()))?;
    file.lock_exclusive()
        .with_context(|| format!("failed to lock {}", lock_path.display()))?;
    Ok(StoreLock { file })
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}
