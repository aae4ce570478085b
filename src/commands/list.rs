use crate::{
    OutputFormat,
    api::{Deployment, Environment},
    client::{PagesClient, Pacing, per_page},
    commands::delete::fetch_spinner,
    config::Settings,
    utils,
};
use anyhow::{Context, Result};
use colored::Colorize;
use comfy_table::{Cell, Color, Table, presets::UTF8_FULL};

fn status_cell(status: &str) -> Cell {
    match status {
        "success" | "active" => Cell::new(status).fg(Color::Green),
        "failure" | "failed" | "canceled" => Cell::new(status).fg(Color::Red),
        "idle" | "queued" => Cell::new(status).fg(Color::Yellow),
        _ => Cell::new(status),
    }
}

fn environment_cell(environment: &str) -> Cell {
    match environment {
        "production" => Cell::new(environment).fg(Color::Green),
        "preview" => Cell::new(environment).fg(Color::Blue),
        _ => Cell::new(environment),
    }
}

pub fn render_table(deployments: &[Deployment]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec![
        "ID",
        "Environment",
        "Branch",
        "Status",
        "Created",
        "URL",
        "Aliased",
    ]);

    for deployment in deployments {
        let environment = deployment.environment.as_deref().unwrap_or("-");
        let branch = deployment.branch().unwrap_or("-");
        let status = deployment.status().unwrap_or("-");
        let created = deployment
            .created_on
            .as_deref()
            .map(utils::format_timestamp)
            .unwrap_or("-".to_string());
        let url = deployment.url.as_deref().unwrap_or("-");

        let aliased_cell = if deployment.is_aliased() {
            Cell::new("yes").fg(Color::Yellow)
        } else {
            Cell::new("")
        };

        table.add_row(vec![
            Cell::new(&deployment.id),
            environment_cell(environment),
            Cell::new(utils::truncate_string(branch, 30)),
            status_cell(status),
            Cell::new(created),
            Cell::new(url),
            aliased_cell,
        ]);
    }

    table
}

/// Print every deployment a delete run would target.
pub async fn list(
    settings: &Settings,
    env: Option<Environment>,
    limit: u32,
    pacing: Pacing,
    format: OutputFormat,
) -> Result<Vec<Deployment>> {
    let client = PagesClient::new(settings)?.with_pacing(pacing);

    let pb = fetch_spinner()?;
    let listed = client.list_deployments(per_page(limit), env, &pb).await;
    pb.finish_and_clear();
    let deployments = listed.context("Error getting deployments")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&deployments)?);
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(&deployments)?);
        }
        OutputFormat::Table => {
            if deployments.is_empty() {
                println!("{}", "No deployments found".yellow());
                return Ok(deployments);
            }

            println!("{}", render_table(&deployments));

            let aliased = deployments.iter().filter(|d| d.is_aliased()).count();
            println!(
                "\n{} deployments in {}{}",
                deployments.len(),
                settings.project_name.bright_cyan(),
                env.map(|e| format!(" ({})", e)).unwrap_or_default()
            );
            if aliased > 0 {
                println!(
                    "{}",
                    format!(
                        "{} aliased deployment(s) can only be deleted with --force",
                        aliased
                    )
                    .dimmed()
                );
            }
        }
    }

    Ok(deployments)
}
