//! seller-console command-line client.
//!
//! Sends one request to the seller backend through [`HttpClient`], so the
//! same cookie handling, refresh-and-retry and forced logout apply as for
//! the console pages.

use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use seller_console::config::{self, ClientConfig};
use seller_console::observability::logging;
use seller_console::session::SessionEvent;
use seller_console::{HttpClient, MultipartForm};

#[derive(Parser)]
#[command(name = "seller-console")]
#[command(about = "Command-line access to the seller console backend", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the API base URL
    #[arg(short, long)]
    base_url: Option<String>,

    /// Sign in first, as `username:password`
    #[arg(long)]
    login: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// GET a resource
    Get {
        path: String,
        /// Query parameter as key=value (repeatable)
        #[arg(short = 'q', long = "param", value_parser = parse_pair)]
        params: Vec<(String, String)>,
    },
    /// POST a JSON body
    Post {
        path: String,
        /// JSON body
        #[arg(short, long)]
        data: Option<String>,
    },
    /// PUT a JSON body
    Put {
        path: String,
        /// JSON body
        #[arg(short, long)]
        data: Option<String>,
    },
    /// DELETE a resource
    Delete { path: String },
    /// POST a multipart form
    Upload {
        path: String,
        /// Text field as name=value (repeatable)
        #[arg(long = "field", value_parser = parse_pair)]
        fields: Vec<(String, String)>,
        /// File field as name=path (repeatable)
        #[arg(long = "file", value_parser = parse_pair)]
        files: Vec<(String, String)>,
    },
    /// Refresh the current session
    Refresh,
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", raw))
}

fn parse_body(data: Option<String>) -> Result<Value, serde_json::Error> {
    match data {
        Some(raw) => serde_json::from_str(&raw),
        None => Ok(json!({})),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config: ClientConfig = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => config::load_from_env()?,
    };
    if let Some(base_url) = cli.base_url {
        config.api.base_url = base_url;
    }

    logging::init(&config.observability);
    tracing::info!("Seller console v{} starting", env!("CARGO_PKG_VERSION"));

    let poller_config = config.session.poller.clone();
    let client = HttpClient::from_config(config)?;
    let mut events = client.subscribe();

    if let Some(login) = &cli.login {
        let (username, password) = login
            .split_once(':')
            .ok_or("--login expects username:password")?;
        client
            .login(&json!({ "username": username, "password": password }))
            .await?;
        tracing::info!(username, "Signed in");
    }

    let poller = poller_config.enabled.then(|| {
        client.session_poller(Duration::from_secs(poller_config.interval_secs))
    });
    if let Some(poller) = &poller {
        poller.start()?;
    }

    let result = match cli.command {
        Commands::Get { path, params } => {
            let params: Vec<(&str, &str)> =
                params.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect();
            client.get(&path, &params).await
        }
        Commands::Post { path, data } => client.post(&path, &parse_body(data)?).await,
        Commands::Put { path, data } => client.put(&path, &parse_body(data)?).await,
        Commands::Delete { path } => client.delete(&path).await,
        Commands::Upload { path, fields, files } => {
            let mut form = MultipartForm::new();
            for (name, value) in fields {
                form = form.text(name, value);
            }
            for (name, file) in files {
                let data = tokio::fs::read(&file).await?;
                let file_name = Path::new(&file)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| file.clone());
                form = form.file(name, file_name, None, data);
            }
            client.post_media(&path, form).await
        }
        Commands::Refresh => client.refresh_session().await.map(|()| Value::Null),
    };

    if let Some(poller) = &poller {
        poller.stop();
    }

    while let Ok(SessionEvent::Expired { login_url, .. }) = events.try_recv() {
        eprintln!("Session expired. Sign in again at {}", login_url);
    }

    match result {
        Ok(payload) => {
            println!("{}", serde_json::to_string_pretty(&payload)?);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            if let Some(body) = e.body() {
                eprintln!("Response: {}", body);
            }
            Err(e.into())
        }
    }
}
