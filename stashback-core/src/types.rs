//! Domain types shared by the reconciliation engine and its collaborators.
//!
//! File identity is the object name alone; equality is `(name, size)`.
//! Contents are never hashed, so a same-size edit is invisible to a run.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// FileRecord
// ---------------------------------------------------------------------------

/// A single file as seen by one side of a reconciliation pass.
///
/// `source` is the on-disk location of a locally gathered file. It travels
/// with the record so a push can read the content, but it takes no part in
/// identity or equality. Remote records never carry one.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub name: String,
    pub size: i64,
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

impl FileRecord {
    /// A record without a local source (remote listings, tests).
    pub fn new(name: impl Into<String>, size: i64) -> Self {
        Self {
            name: name.into(),
            size,
            source: None,
        }
    }

    /// A record gathered from the local filesystem.
    pub fn local(name: impl Into<String>, size: i64, source: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            size,
            source: Some(source.into()),
        }
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

impl PartialEq for FileRecord {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.size == other.size
    }
}

impl fmt::Display for FileRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "name: '{}' - size: '{}'", self.name, self.size)
    }
}

// ---------------------------------------------------------------------------
// Inventory
// ---------------------------------------------------------------------------

/// Name → record mapping for one side of a pass.
///
/// Built by exactly one gather call and never mutated after it is handed to
/// the reconciler.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    files: HashMap<String, FileRecord>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record keyed by its name, replacing any previous entry.
    pub fn insert(&mut self, record: FileRecord) -> Option<FileRecord> {
        self.files.insert(record.name.clone(), record)
    }

    /// Map-union: entries of `other` overwrite same-named entries in `self`.
    pub fn merge(&mut self, other: Inventory) {
        self.files.extend(other.files);
    }

    pub fn get(&self, name: &str) -> Option<&FileRecord> {
        self.files.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.files.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileRecord)> {
        self.files.iter().map(|(name, record)| (name.as_str(), record))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }
}

impl FromIterator<FileRecord> for Inventory {
    fn from_iter<I: IntoIterator<Item = FileRecord>>(iter: I) -> Self {
        let mut inventory = Inventory::new();
        for record in iter {
            inventory.insert(record);
        }
        inventory
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// What a worker should do to the remote for one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Push,
    Remove,
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionType::Push => write!(f, "push"),
            ActionType::Remove => write!(f, "remove"),
        }
    }
}

/// One unit of work produced by the reconciler and consumed by one worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Action {
    pub action_type: ActionType,
    pub file: FileRecord,
}

impl Action {
    pub fn push(file: FileRecord) -> Self {
        Self {
            action_type: ActionType::Push,
            file,
        }
    }

    pub fn remove(file: FileRecord) -> Self {
        Self {
            action_type: ActionType::Remove,
            file,
        }
    }
}

// ---------------------------------------------------------------------------
// Log entries
// ---------------------------------------------------------------------------

/// Severity of a [`LogEntry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Info,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Info => write!(f, "INFO"),
            Level::Error => write!(f, "ERROR"),
        }
    }
}

/// Record of one completed action, or of a fatal gather failure.
///
/// Gather failures are not tied to an action, so `action_type` is `None`
/// for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub message: String,
    pub file: String,
    pub level: Level,
    pub action_type: Option<ActionType>,
}

impl LogEntry {
    pub fn info(action_type: ActionType, file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            file: file.into(),
            level: Level::Info,
            action_type: Some(action_type),
        }
    }

    pub fn error(action_type: ActionType, file: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            file: file.into(),
            level: Level::Error,
            action_type: Some(action_type),
        }
    }

    /// An error entry that belongs to no action (gather failures).
    pub fn fatal(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            file: String::new(),
            level: Level::Error,
            action_type: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == Level::Error
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let action = self.action_type.map(|a| a.to_string()).unwrap_or_default();
        write!(
            f,
            "file: '{}' - action: '{}' - message: '{}'",
            self.file, action, self.message
        )
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_ignores_source() {
        let a = FileRecord::local("docs/a.txt", 100, "/home/me/docs/a.txt");
        let b = FileRecord::new("docs/a.txt", 100);
        assert_eq!(a, b);
        assert_ne!(a, FileRecord::new("docs/a.txt", 101));
    }

    #[test]
    fn file_record_display() {
        let f = FileRecord::new("a", 100);
        assert_eq!(f.to_string(), "name: 'a' - size: '100'");
    }

    #[test]
    fn merge_is_last_writer_wins() {
        let mut first: Inventory = [FileRecord::new("shared", 1), FileRecord::new("x", 2)]
            .into_iter()
            .collect();
        let second: Inventory = [FileRecord::new("shared", 9)].into_iter().collect();
        first.merge(second);
        assert_eq!(first.len(), 2);
        assert_eq!(first.get("shared").map(|f| f.size), Some(9));
    }

    #[test]
    fn log_entry_display_matches_report_format() {
        let entry = LogEntry::info(ActionType::Push, "file1", "test1");
        assert_eq!(
            entry.to_string(),
            "file: 'file1' - action: 'push' - message: 'test1'"
        );
    }

    #[test]
    fn fatal_entry_has_no_action() {
        let entry = LogEntry::fatal("boom");
        assert!(entry.is_error());
        assert_eq!(entry.to_string(), "file: '' - action: '' - message: 'boom'");
    }

    #[test]
    fn action_type_display() {
        assert_eq!(ActionType::Push.to_string(), "push");
        assert_eq!(ActionType::Remove.to_string(), "remove");
    }
}
