//! Inventory diffing.
//!
//! Two independent passes over the inventories:
//!
//! - **push**: every local name that is missing remotely or differs in size.
//! - **remove**: every remote name with no local counterpart.
//!
//! A name lands in at most one pass. Equal `(name, size)` pairs produce nothing.

use stashback_core::{Action, Inventory};

/// Local files that must be uploaded.
pub fn push_actions<'a>(
    local: &'a Inventory,
    remote: &'a Inventory,
) -> impl Iterator<Item = Action> + 'a {
    local
        .iter()
        .filter(move |(name, file)| remote.get(name) != Some(*file))
        .map(|(_, file)| Action::push(file.clone()))
}

/// Remote objects with no local counterpart.
pub fn remove_actions<'a>(
    local: &'a Inventory,
    remote: &'a Inventory,
) -> impl Iterator<Item = Action> + 'a {
    remote
        .iter()
        .filter(move |(name, _)| !local.contains(name))
        .map(|(_, file)| Action::remove(file.clone()))
}

/// Both passes collected, sorted by (type, name) for stable display.
pub fn reconcile(local: &Inventory, remote: &Inventory) -> Vec<Action> {
    let mut actions: Vec<Action> = push_actions(local, remote)
        .chain(remove_actions(local, remote))
        .collect();
    actions.sort_by(|a, b| {
        (a.action_type, &a.file.name).cmp(&(b.action_type, &b.file.name))
    });
    actions
}
