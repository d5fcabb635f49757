use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn seed_registry(file: &Path, passports: &str, parties: &str) {
    if let Some(parent) = file.parent() {
        fs::create_dir_all(parent).expect("mkdir registry parent");
    }
    let body = format!(
        "{{\n  \"schema_version\": 1,\n  \"passports\": [{passports}],\n  \"parties\": [{parties}]\n}}\n"
    );
    fs::write(file, body).expect("write registry");
}

#[test]
fn load_attaches_matching_protocol_and_moves_the_file() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("registrar");
    let inbox = home.join("inbox");
    fs::create_dir_all(&inbox).expect("mkdir inbox");
    fs::write(
        inbox.join("ПК-01.05.11-18-11-ПКВМ7.pdf"),
        b"protocol body",
    )
    .expect("write protocol");

    let registry = home.join("registry.json");
    seed_registry(
        &registry,
        r#"{"id": "p-1", "digest": "ПКВ/М7 № 18/2011", "path": null, "attachments": []}"#,
        "",
    );

    assert_cmd::cargo::cargo_bin_cmd!("passport-registrar")
        .current_dir(tmp.path())
        .env("REGISTRAR_HOME", &home)
        .env("REGISTRAR_CONFIG_PATH", tmp.path().join("no-config.toml"))
        .arg("load")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "attached to passport p-1: ПК-01.05.11-18-11-ПКВМ7.pdf",
        ));

    assert!(!inbox.join("ПК-01.05.11-18-11-ПКВМ7.pdf").exists());
    assert!(
        home.join("processed/ПК-01.05.11-18-11-ПКВМ7.pdf").exists(),
        "ingested file should be parked under processed/"
    );

    let saved = fs::read_to_string(&registry).expect("read registry");
    assert!(saved.contains("ПК-01.05.11-18-11-ПКВМ7.pdf"));
    assert!(saved.contains("{937151F3-A501-4DE0-991E-59594D73CBE2}"));
}

#[test]
fn load_reports_party_fallback_and_unrecognized_files() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("registrar");
    let inbox = home.join("inbox");
    fs::create_dir_all(&inbox).expect("mkdir inbox");
    fs::write(inbox.join("ПР-02.04.13-7-13-МИКО7.pdf"), b"x").expect("write protocol");
    fs::write(inbox.join("мусор.txt"), b"x").expect("write junk");

    seed_registry(
        &home.join("registry.json"),
        "",
        r#"{"id": "b-1", "name": "МИКО-7 - 50 - 2/2013"}, {"id": "b-2", "name": "МИКО-7 - 30 - 5/2013"}"#,
    );

    assert_cmd::cargo::cargo_bin_cmd!("passport-registrar")
        .current_dir(tmp.path())
        .env("REGISTRAR_HOME", &home)
        .env("REGISTRAR_CONFIG_PATH", tmp.path().join("no-config.toml"))
        .arg("load")
        .assert()
        .success()
        .stdout(predicate::str::contains("latest party: МИКО-7 - 30 - 5/2013"))
        .stdout(predicate::str::contains("unrecognized file"));

    // Nothing matched a passport, so both files stay in the inbox.
    assert!(inbox.join("ПР-02.04.13-7-13-МИКО7.pdf").exists());
    assert!(inbox.join("мусор.txt").exists());
}

#[test]
fn load_dry_run_leaves_inbox_and_registry_untouched() {
    let tmp = tempdir().expect("tempdir");
    let home = tmp.path().join("registrar");
    let inbox = home.join("inbox");
    fs::create_dir_all(&inbox).expect("mkdir inbox");
    fs::write(inbox.join("ПК-01.05.11-18-11-ПКВМ7.pdf"), b"x").expect("write protocol");

    let registry = home.join("registry.json");
    seed_registry(
        &registry,
        r#"{"id": "p-1", "digest": "ПКВ/М7 № 18/2011", "path": null, "attachments": []}"#,
        "",
    );
    let before = fs::read_to_string(&registry).expect("read registry");

    assert_cmd::cargo::cargo_bin_cmd!("passport-registrar")
        .current_dir(tmp.path())
        .env("REGISTRAR_HOME", &home)
        .env("REGISTRAR_CONFIG_PATH", tmp.path().join("no-config.toml"))
        .arg("load")
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "1 recognized protocol(s) would be registered",
        ));

    assert!(inbox.join("ПК-01.05.11-18-11-ПКВМ7.pdf").exists());
    assert_eq!(
        fs::read_to_string(&registry).expect("read registry"),
        before
    );
}
