use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

pub const DEFAULT_API_URL: &str = "https://api.cloudflare.com/client/v4";
pub const DEFAULT_ENV_FILE: &str = "../envfile";

pub const ACCOUNT_ID_KEYS: &[&str] = &["CF_ACCOUNT_ID", "CLOUDFLARE_ACCOUNT_ID"];
pub const PROJECT_NAME_KEYS: &[&str] = &["CF_PAGES_PROJECT_NAME"];
pub const API_TOKEN_KEYS: &[&str] = &["CF_API_TOKEN", "CLOUDFLARE_API_TOKEN"];
pub const EMAIL_KEYS: &[&str] = &["CF_EMAIL", "CLOUDFLARE_EMAIL"];
pub const API_KEY_KEYS: &[&str] = &["CF_API_KEY", "CLOUDFLARE_API_KEY"];
pub const API_URL_KEYS: &[&str] = &["CF_API_URL"];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "Account ID is required. Provide it via --account-id or CF_ACCOUNT_ID in env file/variables"
    )]
    MissingAccountId,
    #[error(
        "Project name is required. Provide it via --project-name or CF_PAGES_PROJECT_NAME in env file/variables"
    )]
    MissingProjectName,
    #[error(
        "Authentication required. Provide API token or Email+API key via arguments or environment variables"
    )]
    MissingAuth,
    #[error("API URL must include the scheme prefix (http:// or https://). Got: '{0}'")]
    InvalidApiUrl(String),
}

/// Parse an API base URL, requiring an explicit http:// or https:// scheme
pub fn parse_api_url(url_str: &str) -> Result<Url, ConfigError> {
    if !url_str.starts_with("http://") && !url_str.starts_with("https://") {
        return Err(ConfigError::InvalidApiUrl(url_str.to_string()));
    }
    Url::parse(url_str).map_err(|_| ConfigError::InvalidApiUrl(url_str.to_string()))
}

/// Persistent defaults read from `<config_dir>/cf-pages-deleter/config.toml`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Config {
    pub account_id: Option<String>,
    pub project_name: Option<String>,
    pub api_token: Option<String>,
    pub email: Option<String>,
    pub api_key: Option<String>,
    pub api_url: Option<String>,
}

impl Config {
    /// Load the user config file. It is only the last fallback, so a missing
    /// config directory or an unparsable file warns and yields the defaults.
    pub fn load_or_default() -> Self {
        match Self::config_path() {
            Ok(config_path) => Self::load_from_or_default(&config_path),
            Err(e) => {
                tracing::warn!(error = %e, "no config directory, ignoring config file");
                Self::default()
            }
        }
    }

    pub fn load_from_or_default(config_path: &Path) -> Self {
        Self::load_from(config_path).unwrap_or_else(|e| {
            tracing::warn!("ignoring config file {}: {:#}", config_path.display(), e);
            Self::default()
        })
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content =
                std::fs::read_to_string(config_path).context("Failed to read config file")?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            Ok(Self::default())
        }
    }

    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to get config directory")?;
        Ok(config_dir.join("cf-pages-deleter").join("config.toml"))
    }
}

/// Load `KEY=value` pairs from an env file. A missing file yields no values.
///
/// Blank lines, `#` comments and lines without `=` are skipped. Each line is
/// split on its first `=` and the value is trimmed; nothing is expanded or
/// unquoted.
pub fn load_env_file(path: &Path) -> Result<HashMap<String, String>> {
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read env file {}", path.display()))?;
    Ok(parse_env_file(&content))
}

pub fn parse_env_file(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// Values given on the command line; they win over every other source.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub account_id: Option<String>,
    pub project_name: Option<String>,
    pub api_token: Option<String>,
    pub email: Option<String>,
    pub api_key: Option<String>,
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    Flag,
    EnvFile(&'static str),
    Environment(&'static str),
    ConfigFile,
    Default,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag => f.write_str("command line"),
            Self::EnvFile(key) => write!(f, "env file ({key})"),
            Self::Environment(key) => write!(f, "environment ({key})"),
            Self::ConfigFile => f.write_str("config file"),
            Self::Default => f.write_str("default"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sourced {
    pub value: String,
    pub source: Source,
}

/// Credentials sent with every request.
#[derive(Clone, PartialEq, Eq)]
pub enum Auth {
    Token(String),
    Key { email: String, key: String },
}

impl Auth {
    pub fn scheme(&self) -> &'static str {
        match self {
            Self::Token(_) => "API token",
            Self::Key { .. } => "Email+API key",
        }
    }

    /// Header names and values with secrets masked, for logging.
    pub fn masked_headers(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::Token(_) => vec![("Authorization", "***".to_string())],
            Self::Key { email, .. } => vec![
                ("X-Auth-Email", email.clone()),
                ("X-Auth-Key", "***".to_string()),
            ],
        }
    }
}

// Never print secrets through Debug.
impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Token(token) => f
                .debug_tuple("Token")
                .field(&crate::utils::mask_secret(token))
                .finish(),
            Self::Key { email, key } => f
                .debug_struct("Key")
                .field("email", email)
                .field("key", &crate::utils::mask_secret(key))
                .finish(),
        }
    }
}

/// Fully validated settings needed to talk to the API.
#[derive(Debug, Clone)]
pub struct Settings {
    pub account_id: String,
    pub project_name: String,
    pub auth: Auth,
    pub api_url: Url,
}

/// Every setting looked up across all sources, before validation.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub account_id: Option<Sourced>,
    pub project_name: Option<Sourced>,
    pub api_token: Option<Sourced>,
    pub email: Option<Sourced>,
    pub api_key: Option<Sourced>,
    pub api_url: Sourced,
}

struct Lookup<'a, F> {
    env_file: &'a HashMap<String, String>,
    env: F,
}

impl<F: Fn(&str) -> Option<String>> Lookup<'_, F> {
    fn find(
        &self,
        flag: Option<&String>,
        keys: &[&'static str],
        config: Option<&String>,
    ) -> Option<Sourced> {
        fn present(v: &str) -> bool {
            !v.trim().is_empty()
        }

        if let Some(value) = flag.filter(|v| present(v)) {
            return Some(Sourced {
                value: value.clone(),
                source: Source::Flag,
            });
        }

        for &key in keys {
            if let Some(value) = self.env_file.get(key).filter(|v| present(v)) {
                return Some(Sourced {
                    value: value.clone(),
                    source: Source::EnvFile(key),
                });
            }
        }

        for &key in keys {
            if let Some(value) = (self.env)(key).filter(|v| present(v)) {
                return Some(Sourced {
                    value,
                    source: Source::Environment(key),
                });
            }
        }

        config.filter(|v| present(v)).map(|value| Sourced {
            value: value.clone(),
            source: Source::ConfigFile,
        })
    }
}

impl Resolution {
    /// Resolve every setting in precedence order: flag, env file, process
    /// environment, config file.
    pub fn resolve<F>(
        overrides: &Overrides,
        env_file: &HashMap<String, String>,
        config: &Config,
        env: F,
    ) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = Lookup { env_file, env };

        Self {
            account_id: lookup.find(
                overrides.account_id.as_ref(),
                ACCOUNT_ID_KEYS,
                config.account_id.as_ref(),
            ),
            project_name: lookup.find(
                overrides.project_name.as_ref(),
                PROJECT_NAME_KEYS,
                config.project_name.as_ref(),
            ),
            api_token: lookup.find(
                overrides.api_token.as_ref(),
                API_TOKEN_KEYS,
                config.api_token.as_ref(),
            ),
            email: lookup.find(overrides.email.as_ref(), EMAIL_KEYS, config.email.as_ref()),
            api_key: lookup.find(
                overrides.api_key.as_ref(),
                API_KEY_KEYS,
                config.api_key.as_ref(),
            ),
            api_url: lookup
                .find(
                    overrides.api_url.as_ref(),
                    API_URL_KEYS,
                    config.api_url.as_ref(),
                )
                .unwrap_or_else(|| Sourced {
                    value: DEFAULT_API_URL.to_string(),
                    source: Source::Default,
                }),
        }
    }

    pub fn from_process_env(
        overrides: &Overrides,
        env_file: &HashMap<String, String>,
        config: &Config,
    ) -> Self {
        Self::resolve(overrides, env_file, config, |key| std::env::var(key).ok())
    }

    /// Token authentication wins when both schemes are available.
    pub fn auth(&self) -> Option<Auth> {
        if let Some(token) = &self.api_token {
            return Some(Auth::Token(token.value.trim().to_string()));
        }
        match (&self.email, &self.api_key) {
            (Some(email), Some(key)) => Some(Auth::Key {
                email: email.value.trim().to_string(),
                key: key.value.trim().to_string(),
            }),
            _ => None,
        }
    }

    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let account_id = self
            .account_id
            .as_ref()
            .ok_or(ConfigError::MissingAccountId)?;
        let project_name = self
            .project_name
            .as_ref()
            .ok_or(ConfigError::MissingProjectName)?;
        let auth = self.auth().ok_or(ConfigError::MissingAuth)?;
        let api_url = parse_api_url(&self.api_url.value)?;

        Ok(Settings {
            account_id: account_id.value.trim().to_string(),
            project_name: project_name.value.trim().to_string(),
            auth,
            api_url,
        })
    }
}
