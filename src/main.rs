mod cmd;
mod config;
mod context;
mod domain;
mod error;
mod infra;
mod services;
mod workflow;

use std::sync::Arc;

use clap::{Args, Parser, Subcommand};

use crate::cmd::config::{self as config_cmd, ConfigArgs};
use crate::cmd::pull_request;
use crate::config::{AppConfig, CliOverrides};
use crate::context::AppContext;
use crate::error::AppResult;
use crate::infra::browser;
use crate::infra::github::GithubClient;
use crate::infra::slack::SlackWebhook;
use crate::services::Notification;

#[derive(Parser)]
#[command(
    name = "autopr",
    author,
    version,
    about = "Automated pull-request creation and notification"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create (or reuse) a pull request and rewrite it from its commits.
    Create(CreateArgs),
    /// Manage CLI configuration.
    Config(ConfigArgs),
}

#[derive(Args)]
struct CreateArgs {
    /// Repository name (falls back to AUTOPR_REPOSITORY).
    repository: Option<String>,
    /// Source branch (falls back to AUTOPR_FROM_BRANCH, then "staging").
    from_branch: Option<String>,
    /// Target branch (falls back to AUTOPR_INTO_BRANCH, then "master").
    into_branch: Option<String>,
    /// Mark the run as a hotfix deploy.
    #[arg(long)]
    hotfix: bool,
    /// Mark the run as an automated deploy sequence.
    #[arg(long)]
    deploy_sequence: bool,
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> AppResult<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Config(args) => {
            config_cmd::run(args.command)?;
            Ok(())
        }
        Commands::Create(args) => run_create(args).await,
    }
}

async fn run_create(args: CreateArgs) -> AppResult<()> {
    let config = AppConfig::resolve(CliOverrides {
        repository: args.repository,
        from_branch: args.from_branch,
        into_branch: args.into_branch,
        hotfix: args.hotfix,
        deploy_sequence: args.deploy_sequence,
    })?;

    if config.github_token.is_none() {
        eprintln!("Warning: GitHub access token not configured; hosting API calls will fail.");
    }
    if config.webhook_url.is_none() {
        eprintln!("Warning: webhook URL not configured; the chat notification will be skipped.");
    }

    let hosting = Arc::new(GithubClient::new(config.github_token.clone()));
    let notifier = Arc::new(SlackWebhook::new(config.webhook_url.clone()));
    let context = AppContext::new(config, hosting, notifier);

    let outcome = pull_request::run(&context).await?;

    let config = &context.config;
    if config.webhook_url.is_some() {
        let username = if config.deploy_execution_url.is_some() {
            "Acceptance Checker"
        } else {
            "autopr"
        };
        context
            .notifier
            .send(&Notification {
                text: format!(
                    "[{}] Pull request from {} created\n{}",
                    outcome.repository.name,
                    outcome.pull_request.head,
                    outcome.pull_request.html_url
                ),
                username: username.to_string(),
                channel: Some(config.webhook_channel.clone()),
                attachments: None,
                icon_emoji: Some(":rocket:".to_string()),
            })
            .await?;
    }

    browser::open_in_browser(&outcome.pull_request.html_url);

    println!(
        "Initiated [{}] PR: {} <- {}",
        outcome.repository.name, outcome.pull_request.base, outcome.pull_request.head
    );

    Ok(())
}
