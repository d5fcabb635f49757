use anyhow::Result;
use std::path::Path;

use crate::commands::CommandReport;
use crate::registrar::paths::resolve_paths;
use crate::registrar::registry;
use crate::registrar::sync::sanitize_folder_name;

#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    pub strict: bool,
}

/// Read-only drift check: every passport folder must exist and carry the
/// sanitized digest as its name. Nothing is renamed here; drift is what
/// `sync` exists to repair.
pub fn run(opts: &VerifyOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let mut report = CommandReport::new("verify");

    let store = registry::load(&paths.registry_file)?;
    report.detail(format!("registry_file={}", paths.registry_file.display()));
    report.detail(format!("passports={}", store.passports.len()));
    report.detail(format!("parties={}", store.parties.len()));

    let mut pathless = 0usize;
    for record in &store.passports {
        let Some(path) = &record.path else {
            pathless += 1;
            continue;
        };

        let folder = Path::new(path);
        if !folder.is_dir() {
            report.issue(format!("record {}: folder missing: {path}", record.id));
            continue;
        }

        let want = sanitize_folder_name(&record.digest);
        let have = folder.file_name().and_then(|s| s.to_str()).unwrap_or("");
        if have != want {
            report.issue(format!(
                "record {}: folder name drifts from digest (have `{have}`, want `{want}`)",
                record.id
            ));
        }
    }
    report.detail(format!("records_without_path={pathless}"));

    if opts.strict && !report.ok {
        report.issue("strict verify failed");
    }

    Ok(report)
}
