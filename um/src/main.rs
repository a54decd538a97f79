//! um - rate-limited user management client
//!
//! CLI entry point: initializes one session from config and environment,
//! runs a single operation and prints the result as JSON.

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use eyre::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use usermanager::cli::{Cli, Command};
use usermanager::config::Config;
use usermanager::{UserCreationParams, UserManager, UserUpdateParams};

/// Append-only log file under the platform data directory
fn log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("usermanager")
        .join("logs")
        .join("um.log")
}

/// Install the file subscriber; `RUST_LOG` directives refine the base level
fn setup_logging(verbose: bool) -> Result<PathBuf> {
    let path = log_path();
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).context("Failed to create log directory")?;
    }

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let log_file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!(?level, pid = std::process::id(), "um started");
    Ok(path)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("Failed to serialize result")?;
    println!("{}", json);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_file = setup_logging(cli.verbose).context("Failed to setup logging")?;
    debug!(log_file = %log_file.display(), "main: logging ready");

    let (config, source) = Config::load_with_source(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(?source, "main: configuration resolved");
    let credentials = config.credentials().context("Failed to resolve credentials")?;

    let manager = UserManager::from_config(&config).context("Failed to create user manager")?;
    manager.init_application(&credentials.application_id, &credentials.api_token);

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Command::Create {
            user_id,
            nickname,
            profile_url,
        } => {
            debug!("main: matched Create command");
            let mut params = UserCreationParams::new(user_id, nickname);
            if let Some(url) = profile_url {
                params = params.with_profile_url(url);
            }
            let user = manager.create_user(params).await.context("Failed to create user")?;
            print_json(&user)
        }
        Command::Update {
            user_id,
            nickname,
            profile_url,
        } => {
            debug!("main: matched Update command");
            let mut params = UserUpdateParams::new(user_id);
            if let Some(nickname) = nickname {
                params = params.with_nickname(nickname);
            }
            if let Some(url) = profile_url {
                params = params.with_profile_url(url);
            }
            let user = manager.update_user(params).await.context("Failed to update user")?;
            print_json(&user)
        }
        Command::Get { user_id } => {
            debug!("main: matched Get command");
            let user = manager.get_user(&user_id).await.context("Failed to get user")?;
            print_json(&user)
        }
        Command::List { nickname, token } => {
            debug!("main: matched List command");
            let page = manager
                .get_users_page(&nickname, token.as_deref())
                .await
                .context("Failed to list users")?;
            print_json(&page)
        }
    }
}
