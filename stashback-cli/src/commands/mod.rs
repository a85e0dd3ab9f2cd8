pub mod plan;
pub mod run;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use stashback_core::{config, Config, ConfigFile, Overrides};
use stashback_sync::{local_gatherers, DirStore, Gatherer, RemoteStore};

/// Where to read from and write to. Shared by every subcommand.
#[derive(Args, Debug, Default)]
pub struct SourceArgs {
    /// YAML config file (default: ~/.stashback/config.yaml when present).
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Local directory to back up. Repeat for several roots.
    #[arg(
        long = "root",
        value_name = "DIR",
        env = "STASHBACK_ROOTS",
        value_delimiter = ','
    )]
    pub roots: Vec<PathBuf>,

    /// Directory acting as the remote bucket.
    #[arg(long, value_name = "DIR", env = "STASHBACK_BUCKET")]
    pub bucket: Option<PathBuf>,
}

impl SourceArgs {
    /// The YAML layer: `--config` if given, else the default file if it exists.
    pub fn config_file(&self) -> Result<ConfigFile> {
        match &self.config {
            Some(path) => config::load_file_at(path)
                .with_context(|| format!("failed to load config '{}'", path.display())),
            None => config::load_default().context("failed to load default config"),
        }
    }

    pub fn overrides(&self) -> Overrides {
        Overrides {
            roots: self.roots.clone(),
            bucket: self.bucket.clone(),
            ..Overrides::default()
        }
    }
}

pub fn resolve(file: ConfigFile, overrides: Overrides) -> Result<Config> {
    Config::resolve(file, overrides).context("invalid configuration")
}

/// Gatherers for every configured root plus the bucket store.
pub fn wire(config: &Config) -> (Vec<Arc<dyn Gatherer>>, Arc<dyn RemoteStore>) {
    let locals = local_gatherers(&config.roots);
    let remote: Arc<dyn RemoteStore> = Arc::new(DirStore::new(&config.bucket));
    (locals, remote)
}
