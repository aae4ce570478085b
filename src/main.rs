use cf_pages_deleter::{
    OutputFormat,
    api::Environment,
    client::Pacing,
    commands,
    config::{self, Config, ConfigError, Overrides, Resolution},
    error::ApiError,
    utils,
};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "cf-pages-deleter", version)]
#[command(about = "Delete deployments from a Cloudflare Pages project", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Cloudflare account ID
    #[arg(global = true, long, help_heading = "Project")]
    account_id: Option<String>,

    /// Pages project name
    #[arg(global = true, long, help_heading = "Project")]
    project_name: Option<String>,

    /// Cloudflare API token
    #[arg(global = true, long, help_heading = "Authentication (use either token or email+key)")]
    api_token: Option<String>,

    /// Cloudflare account email
    #[arg(global = true, long, help_heading = "Authentication (use either token or email+key)")]
    email: Option<String>,

    /// Cloudflare global API key
    #[arg(global = true, long, help_heading = "Authentication (use either token or email+key)")]
    api_key: Option<String>,

    /// API base URL
    #[arg(global = true, long, hide = true)]
    api_url: Option<String>,

    /// Path to environment file
    #[arg(global = true, long, default_value = config::DEFAULT_ENV_FILE)]
    env_file: PathBuf,

    /// Path to config file (defaults to the user config directory)
    #[arg(global = true, long)]
    config: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(global = true, short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Delete all deployments of the project
    Delete {
        /// Filter deployments by environment
        #[arg(long, value_enum)]
        env: Option<Environment>,
        /// Show what would be deleted without actually deleting
        #[arg(long)]
        dry_run: bool,
        /// Force deletion of aliased deployments (production)
        #[arg(short, long)]
        force: bool,
        /// Deployments to fetch per page (max: 25)
        #[arg(long, default_value_t = 25)]
        limit: u32,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// List the deployments of the project
    List {
        /// Filter deployments by environment
        #[arg(long, value_enum)]
        env: Option<Environment>,
        /// Deployments to fetch per page (max: 25)
        #[arg(long, default_value_t = 25)]
        limit: u32,
        /// Output format
        #[arg(long, default_value = "table", value_enum)]
        format: OutputFormat,
    },
    /// Show resolved configuration
    Config {
        /// Show secrets in full
        #[arg(long)]
        show_all: bool,
    },
    /// Generate markdown documentation (hidden command)
    #[command(hide = true)]
    GenerateDocs,
}

enum CliError {
    Validation(String),
    Failure(anyhow::Error),
}

type CliResult<T> = Result<T, CliError>;

impl CliError {
    const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::Failure(_) => 1,
        }
    }

    fn display_message(&self) -> String {
        match self {
            Self::Validation(message) => message.clone(),
            Self::Failure(error) => format!("{error:#}"),
        }
    }

    fn hint(&self) -> Option<String> {
        match self {
            Self::Validation(_) => None,
            Self::Failure(error) => error.downcast_ref::<ApiError>().and_then(ApiError::hint),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(error: ConfigError) -> Self {
        Self::Validation(error.to_string())
    }
}

impl From<anyhow::Error> for CliError {
    fn from(error: anyhow::Error) -> Self {
        Self::Failure(error)
    }
}

fn init_tracing(verbose: bool) {
    let default_directive = if verbose {
        "cf_pages_deleter=debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let exit_code = match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {}", "error:".red().bold(), err.display_message());
            if let Some(hint) = err.hint() {
                eprintln!("\n{}\n", hint.yellow());
            }
            err.exit_code()
        }
    };

    std::process::exit(exit_code);
}

async fn run(cli: Cli) -> CliResult<i32> {
    let Cli {
        command,
        account_id,
        project_name,
        api_token,
        email,
        api_key,
        api_url,
        env_file,
        config: config_path,
        verbose: _,
    } = cli;

    if let Commands::GenerateDocs = command {
        let markdown = clap_markdown::help_markdown::<Cli>();
        println!("{}", markdown);
        return Ok(0);
    }

    let env_vars = if env_file.exists() {
        println!("Loading configuration from {}", env_file.display());
        let vars = config::load_env_file(&env_file)?;
        let masked: Vec<String> = vars
            .iter()
            .map(|(key, value)| {
                if utils::is_secret_key(key) {
                    format!("{}={}", key, utils::mask_secret(value))
                } else {
                    format!("{}={}", key, value)
                }
            })
            .collect();
        tracing::debug!(vars = ?masked, "loaded environment file");
        vars
    } else {
        Default::default()
    };

    let file_config = match &config_path {
        Some(path) => Config::load_from(path)?,
        None => Config::load_or_default(),
    };

    let overrides = Overrides {
        account_id,
        project_name,
        api_token,
        email,
        api_key,
        api_url,
    };
    let resolution = Resolution::from_process_env(&overrides, &env_vars, &file_config);

    match command {
        Commands::Delete {
            env,
            dry_run,
            force,
            limit,
            yes,
        } => {
            let settings = resolution.settings()?;
            tracing::debug!(
                account_id = %settings.account_id,
                project_name = %settings.project_name,
                environment = env.map(|e| e.as_str()).unwrap_or("all"),
                dry_run,
                force,
                limit,
                "configuration"
            );

            let options = commands::delete::DeleteOptions {
                env,
                dry_run,
                force,
                limit,
                yes,
                interactive: std::io::stdin().is_terminal(),
                pacing: Pacing::default(),
            };
            let summary = commands::delete::delete(&settings, &options).await?;
            Ok(if summary.failed > 0 { 1 } else { 0 })
        }
        Commands::List { env, limit, format } => {
            let settings = resolution.settings()?;
            commands::list::list(&settings, env, limit, Pacing::default(), format).await?;
            Ok(0)
        }
        Commands::Config { show_all } => {
            commands::config::show(&resolution, &env_file, show_all)?;
            Ok(0)
        }
        Commands::GenerateDocs => Ok(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_is_a_list_option() {
        let cli = Cli::try_parse_from(["cf-pages-deleter", "list", "--format", "json"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::List {
                format: OutputFormat::Json,
                ..
            }
        ));

        assert!(Cli::try_parse_from(["cf-pages-deleter", "delete", "--format", "json"]).is_err());
        assert!(Cli::try_parse_from(["cf-pages-deleter", "config", "--format", "json"]).is_err());
    }
}
