use anyhow::Result;

use crate::commands::CommandReport;
use crate::registrar::audit;
use crate::registrar::config::load_config;
use crate::registrar::ingest;
use crate::registrar::paths::resolve_paths;
use crate::registrar::registry;

#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    pub dry_run: bool,
}

pub fn run(opts: &LoadOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let cfg = load_config()?;
    let mut report = CommandReport::new("load");

    report.detail(format!("inbox_dir={}", paths.inbox_dir.display()));
    report.detail(format!("processed_dir={}", paths.processed_dir.display()));
    report.detail(format!("registry_file={}", paths.registry_file.display()));

    if !paths.inbox_dir.exists() {
        report.issue("inbox dir does not exist");
        return Ok(report);
    }

    let protocols = ingest::scan_protocols(&paths.inbox_dir, cfg.ingest.recursive)?;
    report.detail(format!("files_found={}", protocols.len()));

    if opts.dry_run {
        let recognized = protocols.iter().filter(|p| p.is_valid).count();
        report.detail(format!(
            "dry-run: {recognized} recognized protocol(s) would be registered"
        ));
        return Ok(report);
    }

    let _lock = registry::lock_store(&paths.registry_file)?;
    let mut store = registry::load(&paths.registry_file)?;
    let outcome =
        ingest::register_batch(&mut store, &protocols, &paths.inbox_dir, &paths.processed_dir)?;
    registry::save(&paths.registry_file, &store)?;

    for line in &outcome.lines {
        report.detail(line.clone());
    }
    let summary = format!(
        "scanned={} attached={} party_only={} unmatched={} unrecognized={} failed={}",
        outcome.scanned,
        outcome.attached,
        outcome.party_only,
        outcome.unmatched,
        outcome.unrecognized,
        outcome.failed
    );
    report.detail(summary.clone());
    if outcome.failed > 0 {
        report.issue(format!("{} file(s) failed to register", outcome.failed));
    }

    audit::append_event(
        &paths,
        "load",
        if report.ok { "ok" } else { "failed" },
        &summary,
    )?;

    Ok(report)
}
