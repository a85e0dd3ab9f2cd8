//! Run configuration.
//!
//! # Layering
//!
//! ```text
//! command-line flag  >  STASHBACK_* environment variable  >  config.yaml  >  default
//! ```
//!
//! Flags and environment variables are both resolved by the binary (clap reads
//! the `env` fallback) and arrive here as a single [`Overrides`] value. The
//! YAML layer lives at `<home>/.stashback/config.yaml` unless a path is given.
//!
//! The resolved [`Config`] is built once at startup and passed down by value;
//! nothing below the binary reads the environment.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};

pub const DEFAULT_WORKERS: usize = 5;
pub const DEFAULT_QUEUE_CAPACITY: usize = 20;
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(300);

/// Output shape for the end-of-run report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

// ---------------------------------------------------------------------------
// Layers
// ---------------------------------------------------------------------------

/// On-disk YAML layer. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roots: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bucket: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workers: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub queue_capacity: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub call_timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_format: Option<ReportFormat>,
}

/// Flag / environment layer, already merged by the binary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub roots: Vec<PathBuf>,
    pub bucket: Option<PathBuf>,
    pub workers: Option<usize>,
    pub queue_capacity: Option<usize>,
    pub call_timeout_secs: Option<u64>,
    pub dry_run: Option<bool>,
    pub report_path: Option<PathBuf>,
    pub report_format: Option<ReportFormat>,
}

// ---------------------------------------------------------------------------
// Resolved config
// ---------------------------------------------------------------------------

/// Fully resolved, validated configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub roots: Vec<PathBuf>,
    pub bucket: PathBuf,
    pub workers: usize,
    pub queue_capacity: usize,
    pub call_timeout: Duration,
    pub dry_run: bool,
    pub report_path: Option<PathBuf>,
    pub report_format: ReportFormat,
}

impl Config {
    /// Merge `overrides` over `file` over defaults, then validate.
    pub fn resolve(file: ConfigFile, overrides: Overrides) -> Result<Self, ConfigError> {
        let roots = if overrides.roots.is_empty() {
            file.roots
        } else {
            overrides.roots
        };
        let bucket = overrides
            .bucket
            .or(file.bucket)
            .ok_or(ConfigError::Missing("bucket"))?;

        let config = Config {
            roots,
            bucket,
            workers: overrides.workers.or(file.workers).unwrap_or(DEFAULT_WORKERS),
            queue_capacity: overrides
                .queue_capacity
                .or(file.queue_capacity)
                .unwrap_or(DEFAULT_QUEUE_CAPACITY),
            call_timeout: overrides
                .call_timeout_secs
                .or(file.call_timeout_secs)
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_CALL_TIMEOUT),
            dry_run: overrides.dry_run.or(file.dry_run).unwrap_or(false),
            report_path: overrides.report_path.or(file.report_path),
            report_format: overrides
                .report_format
                .or(file.report_format)
                .unwrap_or_default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.roots.is_empty() {
            return Err(ConfigError::Missing("at least one root"));
        }
        if let Some(empty) = self.roots.iter().find(|r| r.as_os_str().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "root path cannot be blank: {empty:?}"
            )));
        }
        if self.bucket.as_os_str().is_empty() {
            return Err(ConfigError::Missing("bucket"));
        }
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".into()));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Invalid(
                "queue capacity must be at least 1".into(),
            ));
        }
        if self.call_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "call timeout must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// `<home>/.stashback/config.yaml`. Pure, no I/O.
pub fn default_path_at(home: &Path) -> PathBuf {
    home.join(".stashback").join("config.yaml")
}

/// Load a YAML config layer from `path`.
pub fn load_file_at(path: &Path) -> Result<ConfigFile, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the default layer under `home`, or an empty layer if it does not exist.
pub fn load_default_at(home: &Path) -> Result<ConfigFile, ConfigError> {
    let path = default_path_at(home);
    if !path.exists() {
        return Ok(ConfigFile::default());
    }
    load_file_at(&path)
}

/// `load_default_at` convenience wrapper; an undeterminable home yields an empty layer.
pub fn load_default() -> Result<ConfigFile, ConfigError> {
    match dirs::home_dir() {
        Some(home) => load_default_at(&home),
        None => Ok(ConfigFile::default()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    fn minimal_overrides() -> Overrides {
        Overrides {
            roots: vec![PathBuf::from("/data/photos")],
            bucket: Some(PathBuf::from("/mnt/bucket")),
            ..Overrides::default()
        }
    }

    #[test]
    fn defaults_apply_when_no_layer_sets_a_value() {
        let config = Config::resolve(ConfigFile::default(), minimal_overrides()).unwrap();
        assert_eq!(config.workers, DEFAULT_WORKERS);
        assert_eq!(config.queue_capacity, DEFAULT_QUEUE_CAPACITY);
        assert_eq!(config.call_timeout, DEFAULT_CALL_TIMEOUT);
        assert!(!config.dry_run);
        assert_eq!(config.report_format, ReportFormat::Text);
        assert!(config.report_path.is_none());
    }

    #[test]
    fn overrides_win_over_file() {
        let file = ConfigFile {
            roots: vec![PathBuf::from("/from/file")],
            bucket: Some(PathBuf::from("/file/bucket")),
            workers: Some(2),
            dry_run: Some(true),
            ..ConfigFile::default()
        };
        let overrides = Overrides {
            workers: Some(8),
            dry_run: Some(false),
            ..minimal_overrides()
        };
        let config = Config::resolve(file, overrides).unwrap();
        assert_eq!(config.roots, vec![PathBuf::from("/data/photos")]);
        assert_eq!(config.bucket, PathBuf::from("/mnt/bucket"));
        assert_eq!(config.workers, 8);
        assert!(!config.dry_run);
    }

    #[test]
    fn file_fills_gaps_left_by_overrides() {
        let file = ConfigFile {
            roots: vec![PathBuf::from("/from/file")],
            bucket: Some(PathBuf::from("/file/bucket")),
            call_timeout_secs: Some(12),
            report_format: Some(ReportFormat::Json),
            ..ConfigFile::default()
        };
        let config = Config::resolve(file, Overrides::default()).unwrap();
        assert_eq!(config.roots, vec![PathBuf::from("/from/file")]);
        assert_eq!(config.call_timeout, Duration::from_secs(12));
        assert_eq!(config.report_format, ReportFormat::Json);
    }

    #[test]
    fn missing_bucket_is_reported() {
        let overrides = Overrides {
            bucket: None,
            ..minimal_overrides()
        };
        let err = Config::resolve(ConfigFile::default(), overrides).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("bucket")), "got: {err}");
    }

    #[test]
    fn missing_roots_is_reported() {
        let overrides = Overrides {
            roots: vec![],
            ..minimal_overrides()
        };
        let err = Config::resolve(ConfigFile::default(), overrides).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(_)), "got: {err}");
    }

    #[rstest]
    #[case(Some(0), None, None)]
    #[case(None, Some(0), None)]
    #[case(None, None, Some(0))]
    fn zero_values_are_invalid(
        #[case] workers: Option<usize>,
        #[case] queue_capacity: Option<usize>,
        #[case] call_timeout_secs: Option<u64>,
    ) {
        let overrides = Overrides {
            workers,
            queue_capacity,
            call_timeout_secs,
            ..minimal_overrides()
        };
        let err = Config::resolve(ConfigFile::default(), overrides).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "got: {err}");
    }

    #[test]
    fn load_default_returns_empty_layer_when_absent() {
        let home = TempDir::new().unwrap();
        let layer = load_default_at(home.path()).unwrap();
        assert_eq!(layer, ConfigFile::default());
    }

    #[test]
    fn load_default_reads_yaml() {
        let home = TempDir::new().unwrap();
        let path = default_path_at(home.path());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(
            &path,
            "roots:\n  - /a\n  - /b\nbucket: /bucket\nworkers: 3\nreport_format: json\n",
        )
        .unwrap();

        let layer = load_default_at(home.path()).unwrap();
        assert_eq!(layer.roots, vec![PathBuf::from("/a"), PathBuf::from("/b")]);
        assert_eq!(layer.bucket, Some(PathBuf::from("/bucket")));
        assert_eq!(layer.workers, Some(3));
        assert_eq!(layer.report_format, Some(ReportFormat::Json));
    }

    #[test]
    fn unknown_key_is_a_parse_error_with_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "bucket: /b\nworker_count: 4\n").unwrap();

        let err = load_file_at(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }), "got: {err}");
        assert!(err.to_string().contains("config.yaml"));
    }
}
