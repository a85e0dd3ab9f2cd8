//! `stashback plan`: list the actions a run would take.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

use stashback_core::ActionType;
use stashback_sync::pipeline;

use super::{resolve, wire, SourceArgs};

/// Arguments for `stashback plan`.
#[derive(Args, Debug)]
pub struct PlanArgs {
    #[command(flatten)]
    pub source: SourceArgs,
}

impl PlanArgs {
    pub async fn run(self) -> Result<()> {
        let file = self.source.config_file()?;
        let config = resolve(file, self.source.overrides())?;
        let (locals, remote) = wire(&config);

        let actions = pipeline::plan(locals, remote)
            .await
            .context("failed to compute plan")?;

        if actions.is_empty() {
            println!("{} bucket is up to date", "✓".green().bold());
            return Ok(());
        }

        for action in &actions {
            let verb = match action.action_type {
                ActionType::Push => "push".green(),
                ActionType::Remove => "remove".red(),
            };
            println!("{verb:<6} {} ({} bytes)", action.file.name, action.file.size);
        }
        let pushes = actions
            .iter()
            .filter(|a| a.action_type == ActionType::Push)
            .count();
        println!(
            "{} actions: {} push, {} remove",
            actions.len(),
            pushes,
            actions.len() - pushes
        );
        Ok(())
    }
}
