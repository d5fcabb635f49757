use anyhow::Result;
use std::env;
use std::path::PathBuf;

/// Every location the registrar touches, resolved once per invocation and
/// passed down by reference; nothing here is process-global.
#[derive(Debug, Clone)]
pub struct RegistrarPaths {
    pub registrar_home: PathBuf,
    pub archive_dir: PathBuf,
    pub inbox_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub registry_file: PathBuf,
    pub logs_dir: PathBuf,
}

fn required_home_dir() -> Result<PathBuf> {
    if let Some(home) = dirs::home_dir() {
        return Ok(home);
    }
    Err(anyhow::anyhow!("HOME directory could not be resolved"))
}

fn env_or_default_path(var: &str, fallback: PathBuf) -> PathBuf {
    match env::var(var) {
        Ok(v) if !v.trim().is_empty() => PathBuf::from(v.trim()),
        _ => fallback,
    }
}

pub fn resolve_paths() -> Result<RegistrarPaths> {
    let home = required_home_dir()?;
    let registrar_home = env_or_default_path("REGISTRAR_HOME", home.join("passport-registrar"));

    let archive_dir = env_or_default_path("REGISTRAR_ARCHIVE_DIR", registrar_home.join("archive"));
    let inbox_dir = env_or_default_path("REGISTRAR_INBOX_DIR", registrar_home.join("inbox"));
    let processed_dir =
        env_or_default_path("REGISTRAR_PROCESSED_DIR", registrar_home.join("processed"));
    let registry_file =
        env_or_default_path("REGISTRAR_REGISTRY_FILE", registrar_home.join("registry.json"));
    let logs_dir = env_or_default_path("REGISTRAR_LOGS_DIR", registrar_home.join("logs"));

    Ok(RegistrarPaths {
        registrar_home,
        archive_dir,
        inbox_dir,
        processed_dir,
        registry_file,
        logs_dir,
    })
}
