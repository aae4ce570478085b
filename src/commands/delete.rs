use crate::{
    api::Environment,
    client::{PagesClient, Pacing, per_page},
    config::Settings,
    utils,
};
use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io::IsTerminal;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone)]
pub struct DeleteOptions {
    pub env: Option<Environment>,
    pub dry_run: bool,
    pub force: bool,
    pub limit: u32,
    /// Skip the confirmation prompt.
    pub yes: bool,
    /// Whether a prompt can be answered; never prompt without a terminal.
    pub interactive: bool,
    pub pacing: Pacing,
}

impl Default for DeleteOptions {
    fn default() -> Self {
        Self {
            env: None,
            dry_run: false,
            force: false,
            limit: 25,
            yes: false,
            interactive: std::io::stdin().is_terminal(),
            pacing: Pacing::default(),
        }
    }
}

impl DeleteOptions {
    pub fn needs_confirmation(&self) -> bool {
        !self.dry_run && !self.yes && self.interactive
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeletionSummary {
    pub total: usize,
    pub deleted: usize,
    pub failed: usize,
}

pub(crate) fn fetch_spinner() -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb.set_message("Fetching page 1...");
    Ok(pb)
}

pub async fn delete(settings: &Settings, options: &DeleteOptions) -> Result<DeletionSummary> {
    let client = PagesClient::new(settings)?.with_pacing(options.pacing);

    println!(
        "Getting deployments for project: {}",
        settings.project_name.bright_cyan()
    );

    let pb = fetch_spinner()?;
    let listed = client
        .list_deployments(per_page(options.limit), options.env, &pb)
        .await;
    pb.finish_and_clear();
    let deployments = listed.context("Error getting deployments")?;

    println!("Found {} deployments", deployments.len());

    if deployments.is_empty() {
        println!("{}", "No deployments to delete".yellow());
        return Ok(DeletionSummary::default());
    }

    if options.dry_run {
        println!(
            "{}",
            "DRY RUN mode enabled - no actual deletions will occur".yellow()
        );
    }

    if options.force {
        println!(
            "{}",
            "FORCE mode enabled - will attempt to delete aliased deployments".yellow()
        );
    }

    if options.needs_confirmation() {
        let message = format!(
            "Delete {} deployments from project '{}'?",
            deployments.len(),
            settings.project_name
        );
        if !utils::confirm(&message)? {
            println!("{}", "Deletion cancelled".yellow());
            return Ok(DeletionSummary::default());
        }
    }

    let total = deployments.len();
    let mut summary = DeletionSummary {
        total,
        ..Default::default()
    };

    println!("\nStarting deletion of {} deployments...", total);

    for (idx, deployment) in deployments.iter().enumerate() {
        let idx = idx + 1;
        let id = deployment.id.as_str();

        println!(
            "[{}/{}] ({:.1}%) Deleting deployment: {}",
            idx,
            total,
            utils::progress_percent(idx, total),
            id.bright_cyan()
        );

        if options.dry_run {
            println!(
                "[DRY RUN] Would delete deployment: {}{}",
                id,
                if options.force { " (forced)" } else { "" }
            );
            summary.deleted += 1;
        } else {
            match client.delete_deployment(id, options.force).await {
                Ok(()) => {
                    println!(
                        "{} Successfully deleted deployment: {}",
                        "✓".green().bold(),
                        id
                    );
                    summary.deleted += 1;
                }
                Err(e) => {
                    println!("Error deleting deployment {}: {}", id, e);
                    if let Some(hint) = e.hint() {
                        println!("\n{}\n", hint.yellow());
                    }
                    println!("{} Failed to delete deployment: {}", "✗".red().bold(), id);
                    tracing::warn!(deployment = id, error = %e, "delete failed");
                    summary.failed += 1;
                }
            }
        }

        sleep(options.pacing.after_delete(summary.failed)).await;
    }

    println!(
        "Completed deletion: {} deleted, {} failed",
        summary.deleted, summary.failed
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(dry_run: bool, yes: bool, interactive: bool) -> DeleteOptions {
        DeleteOptions {
            dry_run,
            yes,
            interactive,
            ..Default::default()
        }
    }

    #[test]
    fn test_confirmation_only_on_interactive_real_runs() {
        assert!(options(false, false, true).needs_confirmation());
        assert!(!options(false, true, true).needs_confirmation());
        assert!(!options(true, false, true).needs_confirmation());
        assert!(!options(false, false, false).needs_confirmation());
    }
}
