//! IIS Agent CLI

use clap::{Parser, Subcommand};
use iis_agent::config::DEFAULT_EXECUTABLE;
use iis_agent::{
    ApplicationPool, Client, ConnectionConfig, EntityKind, Repository, WebApplication,
    WebApplicationId, WebSite,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::borrow::Borrow;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "iis-agent")]
#[command(about = "Reconcile IIS application pools, sites and applications", long_about = None)]
struct Cli {
    /// Remote host reached through WinRM; omit to run locally
    #[arg(long, env = "IIS_HOSTNAME", global = true)]
    hostname: Option<String>,
    #[arg(long, env = "IIS_USERNAME", global = true)]
    username: Option<String>,
    #[arg(long, env = "IIS_PASSWORD", hide_env_values = true, global = true)]
    password: Option<String>,
    /// PowerShell executable
    #[arg(long, default_value = DEFAULT_EXECUTABLE, global = true)]
    executable: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage application pools
    AppPool {
        #[command(subcommand)]
        action: Action,
    },
    /// Manage web sites
    WebSite {
        #[command(subcommand)]
        action: Action,
    },
    /// Manage web applications (identified as `site/name`)
    WebApplication {
        #[command(subcommand)]
        action: Action,
    },
}

#[derive(Subcommand)]
enum Action {
    /// Print the current state as JSON
    Get { id: String },
    /// Create from a JSON desired-state file
    Create { file: PathBuf },
    /// Apply a JSON desired-state file to an existing entity
    Update { file: PathBuf },
    Delete { id: String },
}

/// What the CLI needs to know about each entity kind
trait Resource: Serialize + DeserializeOwned {
    const KIND: EntityKind;
    type Id: ?Sized;
    type Key: Borrow<Self::Id> + std::fmt::Display;

    fn parse_key(raw: &str) -> iis_agent::Result<Self::Key>;
    fn key(&self) -> Self::Key;
    fn check(&self) -> iis_agent::Result<()>;
}

impl Resource for ApplicationPool {
    const KIND: EntityKind = EntityKind::ApplicationPool;
    type Id = str;
    type Key = String;

    fn parse_key(raw: &str) -> iis_agent::Result<String> {
        Ok(raw.to_string())
    }

    fn key(&self) -> String {
        self.name.clone()
    }

    fn check(&self) -> iis_agent::Result<()> {
        self.validate()
    }
}

impl Resource for WebSite {
    const KIND: EntityKind = EntityKind::WebSite;
    type Id = str;
    type Key = String;

    fn parse_key(raw: &str) -> iis_agent::Result<String> {
        Ok(raw.to_string())
    }

    fn key(&self) -> String {
        self.name.clone()
    }

    fn check(&self) -> iis_agent::Result<()> {
        self.validate()
    }
}

impl Resource for WebApplication {
    const KIND: EntityKind = EntityKind::WebApplication;
    type Id = WebApplicationId;
    type Key = WebApplicationId;

    fn parse_key(raw: &str) -> iis_agent::Result<WebApplicationId> {
        raw.parse()
    }

    fn key(&self) -> WebApplicationId {
        self.id()
    }

    fn check(&self) -> iis_agent::Result<()> {
        self.validate()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let client = Client::new(connection(&cli))?;

    match cli.command {
        Commands::AppPool { action } => run(&client.app_pools(), action)?,
        Commands::WebSite { action } => run(&client.web_sites(), action)?,
        Commands::WebApplication { action } => run(&client.web_applications(), action)?,
    }

    Ok(())
}

fn connection(cli: &Cli) -> ConnectionConfig {
    let mut builder = ConnectionConfig::builder().executable(cli.executable.as_str());
    if let Some(hostname) = &cli.hostname {
        builder = builder.hostname(hostname.as_str());
    }
    if let Some(username) = &cli.username {
        builder = builder.username(username.as_str());
    }
    if let Some(password) = &cli.password {
        builder = builder.password(password.as_str());
    }
    builder.build()
}

fn run<R>(repo: &R, action: Action) -> iis_agent::Result<()>
where
    R: Repository,
    R::Entity: Resource<Id = R::Id>,
{
    match action {
        Action::Get { id } => {
            let key = <R::Entity as Resource>::parse_key(&id)?;
            print(&repo.get(<_ as Borrow<R::Id>>::borrow(&key))?)
        }
        Action::Create { file } => {
            let desired: R::Entity = load(&file)?;
            print(&repo.create(&desired)?)
        }
        Action::Update { file } => {
            let desired: R::Entity = load(&file)?;
            repo.update(&desired)?;
            let key = desired.key();
            print(&repo.get(<_ as Borrow<R::Id>>::borrow(&key))?)
        }
        Action::Delete { id } => {
            let key = <R::Entity as Resource>::parse_key(&id)?;
            repo.delete(<_ as Borrow<R::Id>>::borrow(&key))?;
            println!("Deleted {} '{}'", <R::Entity as Resource>::KIND, key);
            Ok(())
        }
    }
}

/// Read and validate a desired-state file. Omitted fields take IIS defaults.
fn load<E: Resource>(path: &Path) -> iis_agent::Result<E> {
    let text = std::fs::read_to_string(path)?;
    let entity: E = serde_json::from_str(&text)?;
    entity.check()?;
    Ok(entity)
}

fn print<E: Serialize>(entity: &E) -> iis_agent::Result<()> {
    println!("{}", serde_json::to_string_pretty(entity)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use iis_agent::Error;
    use std::io::Write;

    fn desired_file(json: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_load_fills_defaults() {
        let file = desired_file(r#"{"name":"shop","queue_length":5000}"#);
        let pool: ApplicationPool = load(file.path()).unwrap();
        assert_eq!(pool.name, "shop");
        assert_eq!(pool.queue_length, 5000);
        assert_eq!(pool.runtime_version, "v4.0");
        assert_eq!(pool.process_model.idle_timeout, 20);
    }

    #[test]
    fn test_load_rejects_invalid_state() {
        let file = desired_file(r#"{"name":"shop","queue_length":5}"#);
        let err = load::<ApplicationPool>(file.path()).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let file = desired_file("{not json");
        assert!(matches!(load::<WebSite>(file.path()), Err(Error::Json(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load::<WebSite>(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_web_application_key() {
        let key = WebApplication::parse_key("shop/api").unwrap();
        assert_eq!(key, WebApplicationId::new("shop", "api"));
        assert!(matches!(WebApplication::parse_key("shop"), Err(Error::Config(_))));
    }

    #[test]
    fn test_cli_parses_nested_commands() {
        let cli = Cli::try_parse_from([
            "iis-agent",
            "web-application",
            "get",
            "shop/api",
            "--hostname",
            "web01",
        ])
        .unwrap();
        assert_eq!(cli.hostname.as_deref(), Some("web01"));
        assert_eq!(cli.executable, DEFAULT_EXECUTABLE);
        assert!(matches!(
            cli.command,
            Commands::WebApplication { action: Action::Get { ref id } } if id == "shop/api"
        ));

        let config = connection(&cli);
        assert_eq!(config.host(), Some("web01"));
    }
}
