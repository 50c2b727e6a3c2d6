use std::path::PathBuf;

use authsession::{ApiError, AuthOutcome, ConfigError, Navigator, Route, SessionConfig};
use clap::{Parser, Subcommand};
use serde_json::Value;


#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("client setup failed: {0}")]
    Api(#[from] ApiError),
    #[error("{0}")]
    AuthFailed(String),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "authsession-cli", about = "Sign in, inspect, and sign out of an auth backend")]
struct Cli {
    #[arg(long, env = "API_URL")]
    api_url: Option<String>,

    #[arg(long, env = "SESSION_TOKEN_PATH")]
    token_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Restore the persisted session and print the current user.
    Whoami,
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "AUTHSESSION_PASSWORD")]
        password: String,
    },
    Register {
        #[arg(long)]
        email: String,
        #[arg(long, env = "AUTHSESSION_PASSWORD")]
        password: String,
        #[arg(long)]
        name: String,
        #[arg(long, help = "Requested role; defaults to `user` when omitted")]
        role: Option<String>,
    },
    Logout,
}

/// Reports route changes on stderr so stdout stays machine-readable.
struct StderrNavigator;

impl Navigator for StderrNavigator {
    fn navigate(&self, route: Route) {
        eprintln!("-> {route}");
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = resolve_config(cli.api_url.as_deref(), cli.token_path, |key| std::env::var(key).ok())?;
    tracing::debug!(api_url = %config.api_url, token_path = %config.token_path.display(), "configured");
    let session = authsession::connect(config, StderrNavigator)?;

    match cli.command {
        Command::Whoami => {
            session.initialize().await;
            match session.snapshot().user {
                Some(user) => print_json(&serde_json::to_value(user)?),
                None => {
                    println!("anonymous");
                    Ok(())
                }
            }
        }
        Command::Login { email, password } => report(session.login(&email, &password).await),
        Command::Register { email, password, name, role } => {
            report(session.register(&email, &password, &name, role.as_deref()).await)
        }
        Command::Logout => {
            session.logout().await;
            println!("signed out");
            Ok(())
        }
    }
}

/// Build the session config, letting command-line flags win over `env`.
fn resolve_config<F>(api_url: Option<&str>, token_path: Option<PathBuf>, env: F) -> Result<SessionConfig, CliError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = SessionConfig::from_lookup(|key| match (key, api_url) {
        ("API_URL", Some(url)) => Some(url.to_owned()),
        _ => env(key),
    })?;
    if let Some(path) = token_path {
        config.token_path = path;
    }
    Ok(config)
}

fn report(outcome: AuthOutcome) -> Result<(), CliError> {
    match outcome {
        AuthOutcome::Success { .. } => print_json(&serde_json::to_value(&outcome)?),
        AuthOutcome::Failure { error } => Err(CliError::AuthFailed(error)),
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
