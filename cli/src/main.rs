use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use console_client::cache::QueryKey;
use console_client::error::{ApiError, AuthError, ConfigError};
use console_client::guard::GuardDecision;
use console_client::{Console, ConsoleConfig, LoginRequest, Resource};
use serde_json::Value;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("{0}")]
    Auth(#[from] AuthError),
    #[error("not signed in; run `console login` first")]
    NotSignedIn,
    #[error("{0}")]
    Denied(&'static str),
    #[error("invalid parameter `{0}`; expected key=value")]
    InvalidParam(String),
    #[error("--data must be a JSON object")]
    NotAnObject,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "console", about = "Admin console client")]
struct Cli {
    #[arg(long, env = "CONSOLE_API_URL")]
    api_url: Option<String>,

    #[arg(long, env = "CONSOLE_STORAGE_PATH")]
    storage_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in with an admin account.
    Login {
        #[arg(long, env = "CONSOLE_EMAIL")]
        email: String,
        #[arg(long, env = "CONSOLE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Sign out and wipe stored credentials.
    Logout,
    /// Print the current session.
    Whoami,
    /// Show the route guard decision for a view path.
    Guard { path: String },
    /// GET an arbitrary endpoint.
    Get {
        endpoint: String,
        #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
        params: Vec<String>,
    },
    /// CRUD on a backend collection.
    Resource(ResourceCommand),
}

#[derive(Args, Debug)]
struct ResourceCommand {
    resource: Resource,
    #[command(subcommand)]
    command: ResourceSubcommand,
}

#[derive(Subcommand, Debug)]
enum ResourceSubcommand {
    List,
    Show {
        id: String,
    },
    Create {
        #[arg(long)]
        data: String,
    },
    Update {
        id: String,
        #[arg(long)]
        data: String,
    },
    Delete {
        id: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    if let Err(e) = dotenvy::dotenv()
        && !e.not_found()
    {
        eprintln!("ignoring .env: {e}");
    }
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut config = ConsoleConfig::from_env()?;
    if let Some(api_url) = cli.api_url {
        config.api_url = api_url.trim_end_matches('/').to_owned();
    }
    if let Some(path) = cli.storage_path {
        config.storage_path = path;
    }
    debug!(api_url = %config.api_url, storage = %config.storage_path.display(), "console config");

    let console = Console::from_config(&config)?;
    console.init();

    match cli.command {
        Command::Login { email, password } => run_login(&console, email, password).await,
        Command::Logout => {
            console.logout().await;
            println!("signed out");
            Ok(())
        }
        Command::Whoami => print_json(&serde_json::to_value(console.session().session())?),
        Command::Guard { path } => {
            println!("{}", describe(&console.guard(&path)));
            Ok(())
        }
        Command::Get { endpoint, params } => run_get(&console, &endpoint, &params).await,
        Command::Resource(command) => run_resource(&console, command).await,
    }
}

async fn run_login(console: &Console, email: String, password: String) -> Result<(), CliError> {
    let user = console.login(&LoginRequest::new(email, password)).await.into_result()?;
    println!("signed in as {} ({})", user.email.as_deref().unwrap_or(&user.id), user.role);
    Ok(())
}

async fn run_get(console: &Console, endpoint: &str, params: &[String]) -> Result<(), CliError> {
    require_admin(console, endpoint)?;
    let mut key = QueryKey::new(endpoint);
    for param in params {
        let (name, value) = param.split_once('=').ok_or_else(|| CliError::InvalidParam(param.clone()))?;
        key = key.with_param(name, value);
    }
    print_json(&console.query(&key).await?)
}

async fn run_resource(console: &Console, command: ResourceCommand) -> Result<(), CliError> {
    let resource = command.resource;
    require_admin(console, &format!("/{resource}"))?;
    let json = match command.command {
        ResourceSubcommand::List => console.list(resource).await?,
        ResourceSubcommand::Show { id } => console.show(resource, &id).await?,
        ResourceSubcommand::Create { data } => console.create(resource, parse_object(&data)?).await?,
        ResourceSubcommand::Update { id, data } => console.update(resource, &id, parse_object(&data)?).await?,
        ResourceSubcommand::Delete { id } => console.delete(resource, &id).await?,
    };
    print_json(&json)
}

fn require_admin(console: &Console, path: &str) -> Result<(), CliError> {
    match console.guard(path) {
        GuardDecision::Render { .. } => Ok(()),
        GuardDecision::Redirect { notice: Some(notice), .. } => Err(CliError::Denied(notice.message())),
        GuardDecision::Redirect { .. } | GuardDecision::Placeholder => Err(CliError::NotSignedIn),
    }
}

fn describe(decision: &GuardDecision) -> String {
    match decision {
        GuardDecision::Placeholder => "loading".to_owned(),
        GuardDecision::Render { path } => format!("render {path}"),
        GuardDecision::Redirect { to, from, notice } => {
            let from = from.as_deref().map(|from| format!(" (from {from})")).unwrap_or_default();
            let notice = notice.map(|notice| format!(": {}", notice.message())).unwrap_or_default();
            format!("redirect {to}{from}{notice}")
        }
    }
}

fn parse_object(data: &str) -> Result<Value, CliError> {
    match serde_json::from_str::<Value>(data)? {
        value @ Value::Object(_) => Ok(value),
        _ => Err(CliError::NotAnObject),
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
