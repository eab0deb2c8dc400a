use std::env;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const DEFAULT_TRACKER_BASE_URL: &str = "https://oversee.atlassian.net";
pub const DEFAULT_WEBHOOK_CHANNEL: &str = "dev";
const DEFAULT_FROM_BRANCH: &str = "staging";
const DEFAULT_INTO_BRANCH: &str = "master";
const CONFIG_FILE_NAME: &str = "config.json";

/// Options persisted by `autopr config init`.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct StoredConfig {
    pub tracker_base_url: Option<String>,
    pub webhook_url: Option<String>,
    pub webhook_channel: Option<String>,
    pub github_token: Option<String>,
}

impl StoredConfig {
    pub fn load() -> AppResult<Self> {
        let path = config_file_path()?;
        match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents)
                .map_err(|err| AppError::Configuration(format!("invalid config file: {err}"))),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(AppError::Io(err)),
        }
    }

    pub fn save(&self) -> AppResult<()> {
        let path = config_file_path()?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(self)
            .map_err(|err| AppError::Configuration(format!("failed to encode config: {err}")))?;
        fs::write(&path, data)?;
        Ok(())
    }
}

pub fn config_directory() -> AppResult<PathBuf> {
    if let Some(dir) = env::var_os("XDG_CONFIG_HOME").filter(|value| !value.is_empty()) {
        return Ok(PathBuf::from(dir).join("autopr"));
    }
    let home = env::var_os("HOME").filter(|value| !value.is_empty()).ok_or_else(|| {
        AppError::Configuration("cannot locate a home directory for the config file".to_string())
    })?;
    Ok(PathBuf::from(home).join(".config").join("autopr"))
}

pub fn config_file_path() -> AppResult<PathBuf> {
    Ok(config_directory()?.join(CONFIG_FILE_NAME))
}

/// Positional arguments and flags from the `create` command. Explicit
/// arguments win over environment variables, which win over the stored file.
#[derive(Debug, Default, Clone)]
pub struct CliOverrides {
    pub repository: Option<String>,
    pub from_branch: Option<String>,
    pub into_branch: Option<String>,
    pub hotfix: bool,
    pub deploy_sequence: bool,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub repository: String,
    pub from_branch: String,
    pub into_branch: String,
    pub hotfix: bool,
    pub deploy_sequence: bool,
    pub github_token: Option<String>,
    pub tracker_base_url: String,
    pub webhook_url: Option<String>,
    pub webhook_channel: String,
    pub deploy_execution_url: Option<String>,
    pub deploy_results_path: Option<String>,
}

impl AppConfig {
    pub fn resolve(cli: CliOverrides) -> AppResult<Self> {
        let stored = StoredConfig::load()?;

        let repository = cli
            .repository
            .or_else(|| env_string("AUTOPR_REPOSITORY"))
            .ok_or_else(|| {
                AppError::Configuration(
                    "repository name not set (pass it as the first argument or AUTOPR_REPOSITORY)"
                        .to_string(),
                )
            })?;
        let from_branch = cli
            .from_branch
            .or_else(|| env_string("AUTOPR_FROM_BRANCH"))
            .unwrap_or_else(|| DEFAULT_FROM_BRANCH.to_string());
        let into_branch = cli
            .into_branch
            .or_else(|| env_string("AUTOPR_INTO_BRANCH"))
            .unwrap_or_else(|| DEFAULT_INTO_BRANCH.to_string());

        Ok(Self {
            repository,
            from_branch,
            into_branch,
            hotfix: cli.hotfix || env_flag("AUTOPR_HOTFIX"),
            deploy_sequence: cli.deploy_sequence || env_flag("AUTOPR_DEPLOY_SEQUENCE"),
            github_token: env_string("GITHUB_ACCESS_TOKEN").or(stored.github_token),
            tracker_base_url: env_string("AUTOPR_TRACKER_BASE_URL")
                .or(stored.tracker_base_url)
                .unwrap_or_else(|| DEFAULT_TRACKER_BASE_URL.to_string()),
            webhook_url: env_string("AUTOPR_WEBHOOK_URL").or(stored.webhook_url),
            webhook_channel: env_string("AUTOPR_WEBHOOK_CHANNEL")
                .or(stored.webhook_channel)
                .unwrap_or_else(|| DEFAULT_WEBHOOK_CHANNEL.to_string()),
            deploy_execution_url: env_string("DEPLOY_EXECUTION_URL"),
            deploy_results_path: env_string("DEPLOY_RESULTS_PATH"),
        })
    }
}

fn env_string(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

// Flag variables are true when set non-empty, whatever the value.
fn env_flag(name: &str) -> bool {
    env_string(name).is_some()
}
