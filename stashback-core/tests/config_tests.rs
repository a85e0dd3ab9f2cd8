//! Config file loading and layering integration tests.

use std::path::PathBuf;
use std::time::Duration;

use assert_fs::prelude::*;
use predicates::prelude::predicate;
use stashback_core::{
    config::{self, Config, ConfigFile, Overrides, ReportFormat},
    ConfigError,
};

// ---------------------------------------------------------------------------
// 1. Load errors
// ---------------------------------------------------------------------------

#[test]
fn load_missing_explicit_file_returns_io_error_with_path() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let path = dir.path().join("nope.yaml");
    let err = config::load_file_at(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Io { .. }), "got: {err}");
    assert!(err.to_string().contains("nope.yaml"));
}

#[test]
fn load_corrupt_yaml_returns_parse_error() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("config.yaml");
    file.write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("write");

    let err = config::load_file_at(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
}

#[test]
fn load_wrong_type_returns_parse_error() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let file = dir.child("config.yaml");
    file.write_str("workers: many\n").expect("write");

    let err = config::load_file_at(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
}

// ---------------------------------------------------------------------------
// 2. Full layering from disk
// ---------------------------------------------------------------------------

#[test]
fn file_on_disk_resolves_with_cli_overrides() {
    let home = assert_fs::TempDir::new().expect("tempdir");
    let file = home.child(".stashback/config.yaml");
    file.write_str(
        "roots:\n  - /srv/docs\nbucket: /srv/bucket\nqueue_capacity: 64\ncall_timeout_secs: 30\n",
    )
    .expect("write");
    file.assert(predicate::path::is_file());

    let layer = config::load_default_at(home.path()).expect("load");
    let overrides = Overrides {
        workers: Some(12),
        report_format: Some(ReportFormat::Json),
        ..Overrides::default()
    };
    let resolved = Config::resolve(layer, overrides).expect("resolve");

    assert_eq!(resolved.roots, vec![PathBuf::from("/srv/docs")]);
    assert_eq!(resolved.bucket, PathBuf::from("/srv/bucket"));
    assert_eq!(resolved.workers, 12);
    assert_eq!(resolved.queue_capacity, 64);
    assert_eq!(resolved.call_timeout, Duration::from_secs(30));
    assert_eq!(resolved.report_format, ReportFormat::Json);
}

#[test]
fn serialized_layer_reloads_identically() {
    let dir = assert_fs::TempDir::new().expect("tempdir");
    let layer = ConfigFile {
        roots: vec![PathBuf::from("/a"), PathBuf::from("/b")],
        bucket: Some(PathBuf::from("/bucket")),
        dry_run: Some(true),
        ..ConfigFile::default()
    };
    let file = dir.child("config.yaml");
    file.write_str(&serde_yaml::to_string(&layer).expect("serialize"))
        .expect("write");
    file.assert(predicate::str::contains("dry_run: true"));

    let loaded = config::load_file_at(file.path()).expect("load");
    assert_eq!(loaded, layer);
}
