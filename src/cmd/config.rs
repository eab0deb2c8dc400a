use std::io::{self, Write};

use clap::{Args, Subcommand};

use crate::config::{StoredConfig, config_file_path};
use crate::error::AppResult;

#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Run the interactive configuration wizard.
    Init,
    /// Show the stored configuration (secrets masked).
    Show,
}

pub fn run(command: ConfigCommand) -> AppResult<()> {
    match command {
        ConfigCommand::Init => run_init(),
        ConfigCommand::Show => run_show(),
    }
}

fn run_init() -> AppResult<()> {
    let mut cfg = StoredConfig::load()?;

    println!("Configuring autopr.");
    println!("Press Enter to keep the current value, '-' to clear it.");
    println!();

    prompt_field(
        "Tracker base URL (e.g., https://company.atlassian.net)",
        &mut cfg.tracker_base_url,
        false,
    )?;
    prompt_field("Webhook URL", &mut cfg.webhook_url, true)?;
    prompt_field("Webhook channel", &mut cfg.webhook_channel, false)?;
    prompt_field("GitHub access token", &mut cfg.github_token, true)?;

    cfg.save()?;

    let path = config_file_path()?;
    println!("\nConfiguration saved to {}", path.display());
    Ok(())
}

fn run_show() -> AppResult<()> {
    let cfg = StoredConfig::load()?;
    let path = config_file_path()?;

    println!("Configuration file: {}", path.display());
    println!(
        "Tracker base URL: {}",
        display_value(cfg.tracker_base_url.as_deref())
    );
    println!("Webhook URL: {}", mask_secret(cfg.webhook_url.as_deref()));
    println!(
        "Webhook channel: {}",
        display_value(cfg.webhook_channel.as_deref())
    );
    println!(
        "GitHub access token: {}",
        mask_secret(cfg.github_token.as_deref())
    );

    Ok(())
}

fn prompt_field(label: &str, target: &mut Option<String>, secret: bool) -> AppResult<()> {
    let mut stdout = io::stdout();
    match (target.as_deref(), secret) {
        (Some(_), true) => write!(stdout, "{label} [****] (Enter to keep, '-' to clear): ")?,
        (Some(value), false) => {
            write!(stdout, "{label} [{value}] (Enter to keep, '-' to clear): ")?
        }
        (None, _) => write!(stdout, "{label} (Enter to skip): ")?,
    }
    stdout.flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let trimmed = input.trim();

    if trimmed == "-" {
        *target = None;
    } else if !trimmed.is_empty() {
        *target = Some(trimmed.to_string());
    }
    Ok(())
}

fn display_value(value: Option<&str>) -> &str {
    match value {
        Some(value) if !value.is_empty() => value,
        _ => "<not set>",
    }
}

fn mask_secret(value: Option<&str>) -> String {
    match value {
        Some(secret) if secret.len() > 6 => {
            format!("{}***{}", &secret[..3], &secret[secret.len() - 3..])
        }
        Some(secret) if !secret.is_empty() => "***".to_string(),
        _ => "<not set>".to_string(),
    }
}
