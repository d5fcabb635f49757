use anyhow::Result;
use std::path::Path;

use crate::commands::CommandReport;
use crate::registrar::audit;
use crate::registrar::config::load_config;
use crate::registrar::paths::resolve_paths;
use crate::registrar::registry;
use crate::registrar::sync::{SyncOutcome, synchronize_folder};

#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    pub record_id: Option<String>,
    pub all: bool,
}

pub fn run(opts: &SyncOptions) -> Result<CommandReport> {
    let paths = resolve_paths()?;
    let cfg = load_config()?;
    let mut report = CommandReport::new("sync");

    let _lock = registry::lock_store(&paths.registry_file)?;
    let mut store = registry::load(&paths.registry_file)?;

    let ids: Vec<String> = if opts.all {
        store.passports.iter().map(|r| r.id.clone()).collect()
    } else if let Some(id) = &opts.record_id {
        if store.passports.iter().any(|r| r.id == *id) {
            vec![id.clone()]
        } else {
            report.issue(format!("unknown passport record: {id}"));
            return Ok(report);
        }
    } else {
        report.issue("pass a record id or --all");
        return Ok(report);
    };

    let mut changed = false;
    for id in &ids {
        let Some(record) = store.passports.iter().find(|r| r.id == *id) else {
            continue;
        };
        let digest = record.digest.clone();
        let Some(old_path) = record.path.clone() else {
            report.detail(format!("record {id}: no archive path"));
            continue;
        };

        match synchronize_folder(Path::new(&old_path), &digest, &cfg.sync.temp_prefix) {
            Ok(SyncOutcome::NoActionNeeded) => {
                report.detail(format!("record {id}: no synchronization needed"));
            }
            Ok(SyncOutcome::Renamed { new_path }) => {
                if let Some(record) = store.passport_mut(id) {
                    record.path = Some(new_path.display().to_string());
                }
                changed = true;
                report.detail(format!(
                    "record {id}: folder renamed to {}",
                    new_path.display()
                ));
                audit::append_event(
                    &paths,
                    "sync",
                    "ok",
                    &format!("record {id} renamed to {}", new_path.display()),
                )?;
            }
            Ok(SyncOutcome::RevertedFailure { old_path }) => {
                report.issue(format!(
                    "record {id}: rename failed, folder kept at {}",
                    old_path.display()
                ));
                audit::append_event(
                    &paths,
                    "sync",
                    "reverted",
                    &format!("record {id} kept at {}", old_path.display()),
                )?;
            }
            Ok(SyncOutcome::Unrecoverable { temp_path }) => {
                report.issue(format!(
                    "record {id}: folder parked at temp path {}; operator attention required",
                    temp_path.display()
                ));
                audit::append_event(
                    &paths,
                    "sync",
                    "unrecoverable",
                    &format!("record {id} parked at {}", temp_path.display()),
                )?;
            }
            Err(err) => {
                report.issue(format!("record {id}: {err}"));
            }
        }
    }

    if changed {
        registry::save(&paths.registry_file, &store)?;
    }

    Ok(report)
}
