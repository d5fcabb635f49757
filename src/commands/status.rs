use anyhow::Result;

use crate::commands::CommandReport;
use crate::registrar::config::load_config;
use crate::registrar::paths::resolve_paths;
use crate::registrar::registry;

pub fn run() -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let cfg = load_config()?;
    let mut report = CommandReport::new("status");

    report.detail(format!("registrar_home={}", paths.registrar_home.display()));
    report.detail(format!("archive_dir={}", paths.archive_dir.display()));
    report.detail(format!("inbox_dir={}", paths.inbox_dir.display()));
    report.detail(format!("processed_dir={}", paths.processed_dir.display()));
    report.detail(format!("registry_file={}", paths.registry_file.display()));
    report.detail(format!("logs_dir={}", paths.logs_dir.display()));
    report.detail(format!("ingest.recursive={}", cfg.ingest.recursive));
    report.detail(format!("sync.temp_prefix={}", cfg.sync.temp_prefix));

    if !paths.archive_dir.exists() {
        report.issue("missing archive dir (REGISTRAR_ARCHIVE_DIR)");
    }
    if !paths.inbox_dir.exists() {
        report.issue("missing inbox dir (REGISTRAR_INBOX_DIR)");
    }

    if paths.registry_file.exists() {
        let store = registry::load(&paths.registry_file)?;
        report.detail(format!("passports={}", store.passports.len()));
        report.detail(format!("parties={}", store.parties.len()));
        let attached: usize = store
            .passports
            .iter()
            .map(|record| record.attachments.len())
            .sum();
        report.detail(format!("attachments={attached}"));
    } else {
        report.detail("registry_file=absent (empty store)".to_string());
    }

    Ok(report)
}
