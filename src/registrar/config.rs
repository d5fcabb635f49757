use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestSettings {
    /// Walk the inbox recursively.
    pub recursive: bool,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self { recursive: true }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncSettings {
    /// Name prefix for the transient sibling folder used during renames.
    pub temp_prefix: String,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            temp_prefix: ".sync".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RegistrarConfig {
    pub ingest: IngestSettings,
    pub sync: SyncSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PartialRegistrarConfig {
    ingest: Option<IngestSettings>,
    sync: Option<SyncSettings>,
}

fn env_or_bool(var: &str, fallback: bool) -> bool {
    match env::var(var) {
        Ok(v) => {
            let trimmed = v.trim();
            match trimmed {
                "1" | "true" | "TRUE" | "yes" | "on" => true,
                "0" | "false" | "FALSE" | "no" | "off" => false,
                _ => fallback,
            }
        }
        Err(_) => fallback,
    }
}

fn env_or_string(var: &str, fallback: &str) -> String {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
        _ => fallback.to_string(),
    }
}

fn validate(cfg: &RegistrarConfig) -> Result<()> {
    let prefix = cfg.sync.temp_prefix.trim();
    if prefix.is_empty() {
        return Err(anyhow!("invalid sync temp prefix: cannot be empty"));
    }
    if prefix.contains('/') || prefix.contains('\\') {
        return Err(anyhow!(
            "invalid sync temp prefix: must not contain path separators"
        ));
    }
    Ok(())
}

fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(custom) = env::var("REGISTRAR_CONFIG_PATH") {
        let trimmed = custom.trim();
        if !trimmed.is_empty() {
            return Some(PathBuf::from(trimmed));
        }
    }

    let home = dirs::home_dir()?;
    Some(home.join(".passport-registrar").join("registrar.toml"))
}

fn merge_file_config(base: &mut RegistrarConfig) -> Result<()> {
    let Some(path) = resolve_config_path() else {
        return Ok(());
    };
    if !path.exists() {
        return Ok(());
    }

    let raw = fs::read_to_string(&path)?;
    let parsed: PartialRegistrarConfig = toml::from_str(&raw)
        .map_err(|err| anyhow!("failed to parse registrar config {}: {err}", path.display()))?;
    if let Some(ingest) = parsed.ingest {
        base.ingest = ingest;
    }
    if let Some(sync) = parsed.sync {
        base.sync = sync;
    }
    Ok(())
}

pub fn load_config() -> Result<RegistrarConfig> {
    let mut cfg = RegistrarConfig::default();
    merge_file_config(&mut cfg)?;

    cfg.ingest.recursive = env_or_bool("REGISTRAR_INGEST_RECURSIVE", cfg.ingest.recursive);
    cfg.sync.temp_prefix = env_or_string("REGISTRAR_SYNC_TEMP_PREFIX", &cfg.sync.temp_prefix);

    validate(&cfg)?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass_validation() {
        let cfg = RegistrarConfig::default();
        assert!(validate(&cfg).is_ok());
        assert!(cfg.ingest.recursive);
        assert_eq!(cfg.sync.temp_prefix, ".sync");
    }

    #[test]
    fn temp_prefix_with_separator_is_rejected() {
        let mut cfg = RegistrarConfig::default();
        cfg.sync.temp_prefix = "a/b".to_string();
        assert!(validate(&cfg).is_err());

        cfg.sync.temp_prefix = "  ".to_string();
        assert!(validate(&cfg).is_err());
    }

    #[test]
    fn partial_file_sections_override_defaults() {
        let parsed: PartialRegistrarConfig =
            toml::from_str("[ingest]\nrecursive = false\n").expect("parse");
        let mut cfg = RegistrarConfig::default();
        if let Some(ingest) = parsed.ingest {
            cfg.ingest = ingest;
        }
        assert!(!cfg.ingest.recursive);
        assert_eq!(cfg.sync.temp_prefix, ".sync");
    }
}
