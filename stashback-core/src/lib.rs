//! stashback core library: domain types, run configuration, errors.
//!
//! - [`types`]: file records, inventories, actions, log entries
//! - [`config`]: layered [`Config`] resolution
//! - [`error`]: [`ConfigError`]

pub mod config;
pub mod error;
pub mod types;

pub use config::{Config, ConfigFile, Overrides, ReportFormat};
pub use error::ConfigError;
pub use types::{Action, ActionType, FileRecord, Inventory, Level, LogEntry};
