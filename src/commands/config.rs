use crate::config::{Config, Resolution, Sourced};
use crate::utils;
use anyhow::Result;
use colored::Colorize;
use std::path::Path;

fn print_value(label: &str, value: Option<&Sourced>, secret: bool, show_all: bool) {
    match value {
        Some(sourced) => {
            let shown = if secret && !show_all {
                utils::mask_secret(&sourced.value)
            } else {
                sourced.value.clone()
            };
            println!(
                "  {}: {} {}",
                label,
                shown.bright_cyan(),
                format!("({})", sourced.source).dimmed()
            );
        }
        None => println!("  {}: {}", label, "Not set".yellow()),
    }
}

pub fn show(resolution: &Resolution, env_file: &Path, show_all: bool) -> Result<()> {
    println!("⚙️  {}\n", "cf-pages-deleter Configuration".bold());

    match Config::config_path() {
        Ok(path) => println!("Config file: {}", path.display()),
        Err(_) => println!("Config file: {}", "unavailable".yellow()),
    }
    let env_file_state = if env_file.exists() {
        "found".green()
    } else {
        "not found".dimmed()
    };
    println!("Env file: {} {}", env_file.display(), env_file_state);

    println!("\n{}", "Project:".bold());
    print_value("Account ID", resolution.account_id.as_ref(), false, show_all);
    print_value("Project Name", resolution.project_name.as_ref(), false, show_all);
    print_value("API URL", Some(&resolution.api_url), false, show_all);

    println!("\n{}", "Authentication:".bold());
    print_value("API Token", resolution.api_token.as_ref(), true, show_all);
    print_value("Email", resolution.email.as_ref(), false, show_all);
    print_value("API Key", resolution.api_key.as_ref(), true, show_all);

    match resolution.auth() {
        Some(auth) => println!("\nUsing {} authentication", auth.scheme().green()),
        None => println!(
            "\n{}",
            "No usable credentials: provide an API token or Email+API key".yellow()
        ),
    }

    Ok(())
}
