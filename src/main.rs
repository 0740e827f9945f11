use anyhow::{Context, Result};
use clap::Parser;
use reqwest::Method;
use session_http::config::{ClientConfig, DEFAULT_API_ENDPOINT, default_storage_dir};
use session_http::notify::TerminalNotifier;
use session_http::session::{LocalSession, Session, SessionEvent};
use session_http::storage::{FileStorage, MemoryStorage, Storage, TOKEN_KEY};
use session_http::ClientFactory;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::TryRecvError;

/// session-http - authenticated API client
///
/// Sends requests to the configured API with the stored bearer token.
/// Failed requests are reported on stderr; a rejected token clears the
/// stored session.
///
/// Examples:
///   session-http login <TOKEN>
///   session-http get /api/default/streams
///   session-http post /api/default/_search --data '{"query":{}}'
#[derive(Parser, Debug)]
#[command(author, version = env!("SESSION_HTTP_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// API base URL (also via API_ENDPOINT)
    #[arg(
        long = "api-url",
        env = "API_ENDPOINT",
        value_name = "URL",
        default_value = DEFAULT_API_ENDPOINT,
        global = true
    )]
    pub api_url: String,

    /// Directory holding persistent storage (also via SESSION_HTTP_DIR)
    #[arg(
        long = "storage-dir",
        env = "SESSION_HTTP_DIR",
        value_name = "PATH",
        global = true
    )]
    pub storage_dir: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS", global = true)]
    pub timeout: Option<u64>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Store a bearer token for subsequent requests
    Login(LoginArgs),

    /// Forget the stored token
    Logout,

    /// Send a GET request
    Get(PathArgs),

    /// Send a DELETE request
    Delete(PathArgs),

    /// Send a POST request
    Post(BodyArgs),

    /// Send a PUT request
    Put(BodyArgs),

    /// Send a PATCH request
    Patch(BodyArgs),
}

#[derive(clap::Args, Debug)]
pub struct LoginArgs {
    #[arg(value_name = "TOKEN")]
    pub token: String,
}

#[derive(clap::Args, Debug)]
pub struct PathArgs {
    /// Path relative to the API base URL, or an absolute URL
    #[arg(value_name = "PATH")]
    pub path: String,
}

#[derive(clap::Args, Debug)]
pub struct BodyArgs {
    #[arg(value_name = "PATH")]
    pub path: String,

    /// JSON request body
    #[arg(long, short = 'd', value_name = "JSON")]
    pub data: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let storage_dir = match cli.storage_dir {
        Some(dir) => dir,
        None => default_storage_dir()?,
    };
    let persistent = Arc::new(FileStorage::in_dir(&storage_dir));
    let session = Arc::new(LocalSession::new(
        persistent.clone(),
        Arc::new(MemoryStorage::new()),
    ));

    let (method, path, data) = match cli.command {
        Commands::Login(args) => {
            persistent.set(TOKEN_KEY, &args.token)?;
            println!("Token stored in {}", persistent.path().display());
            return Ok(());
        }
        Commands::Logout => {
            session.clear_persistent_storage()?;
            println!("Logged out");
            return Ok(());
        }
        Commands::Get(args) => (Method::GET, args.path, None),
        Commands::Delete(args) => (Method::DELETE, args.path, None),
        Commands::Post(args) => (Method::POST, args.path, args.data),
        Commands::Put(args) => (Method::PUT, args.path, args.data),
        Commands::Patch(args) => (Method::PATCH, args.path, args.data),
    };

    let mut config = ClientConfig::new(cli.api_url);
    if let Some(secs) = cli.timeout {
        config = config.timeout(Duration::from_secs(secs));
    }

    let mut events = session.subscribe();
    let factory = ClientFactory::new(config, session, Arc::new(TerminalNotifier));
    let client = factory.create_client()?;

    let mut request = client.request(method, &path);
    if let Some(data) = data {
        let body: serde_json::Value =
            serde_json::from_str(&data).context("--data is not valid JSON")?;
        request = request.json(&body);
    }

    match client.execute(request).await {
        Ok(response) => {
            if !response.data.is_null() {
                println!("{}", serde_json::to_string_pretty(&response.data)?);
            }
            Ok(())
        }
        Err(e) => {
            if reload_requested(&mut events) {
                eprintln!("Session expired, please log in again.");
            }
            Err(e.into())
        }
    }
}

fn reload_requested(events: &mut tokio::sync::broadcast::Receiver<SessionEvent>) -> bool {
    loop {
        match events.try_recv() {
            Ok(SessionEvent::ReloadRequested) => return true,
            Ok(_) | Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_get_parsing() {
        let cli = Cli::try_parse_from(["session-http", "get", "/api/orgs"]).unwrap();
        match cli.command {
            Commands::Get(args) => assert_eq!(args.path, "/api/orgs"),
            _ => panic!("Expected Get command"),
        }
        assert_eq!(cli.timeout, None);
    }

    #[test]
    fn test_cli_post_with_data() {
        let cli = Cli::try_parse_from([
            "session-http",
            "post",
            "/api/_search",
            "--data",
            r#"{"sql":"select 1"}"#,
        ])
        .unwrap();
        match cli.command {
            Commands::Post(args) => {
                assert_eq!(args.path, "/api/_search");
                assert_eq!(args.data.as_deref(), Some(r#"{"sql":"select 1"}"#));
            }
            _ => panic!("Expected Post command"),
        }
    }

    #[test]
    fn test_cli_global_flags() {
        let cli = Cli::try_parse_from([
            "session-http",
            "--api-url",
            "https://api.example.com",
            "--storage-dir",
            "/tmp/s",
            "--timeout",
            "5",
            "logout",
        ])
        .unwrap();
        assert_eq!(cli.api_url, "https://api.example.com");
        assert_eq!(cli.storage_dir, Some(PathBuf::from("/tmp/s")));
        assert_eq!(cli.timeout, Some(5));
    }

    #[test]
    fn test_cli_login_requires_token() {
        assert!(Cli::try_parse_from(["session-http", "login"]).is_err());
    }

    #[test]
    fn test_reload_requested_drains_events() {
        let (tx, mut rx) = tokio::sync::broadcast::channel(4);
        assert!(!reload_requested(&mut rx));

        tx.send(SessionEvent::LogoutRequested).unwrap();
        tx.send(SessionEvent::ReloadRequested).unwrap();
        assert!(reload_requested(&mut rx));
    }
}
