use std::path::PathBuf;
use std::sync::Mutex;

use clap::{Parser, Subcommand};
use client::{ChatClient, ChatError, ClientConfig, FileUpload, MessageLog, Navigator, PostForm, StatusLine, SubmitError, Submitter};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("could not read {path}: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("{0}")]
    Submit(#[from] SubmitError),
    #[error("{0}")]
    Chat(#[from] ChatError),
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server returned HTTP {status} for {path}")]
    ServerError { status: u16, path: String },
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("stdin read failed: {0}")]
    Stdin(std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "quad", about = "Quadrangles image board CLI")]
struct Cli {
    #[arg(long, env = "QUAD_BASE_URL", default_value = client::config::DEFAULT_BASE_URL)]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check that the server answers `/healthz`.
    Ping,
    /// Upload an image and create a post referencing it.
    Post {
        #[arg(long)]
        file: PathBuf,
        #[arg(long)]
        topic: String,
        #[arg(long)]
        text: String,
    },
    /// Join a post's comment channel: print inbound frames, send stdin lines.
    Chat { pid: i64 },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ClientConfig::new(cli.base_url);

    match cli.command {
        Command::Ping => run_ping(&config).await,
        Command::Post { file, topic, text } => run_post(&config, file, topic, text).await,
        Command::Chat { pid } => run_chat(&config, pid).await,
    }
}

// =============================================================================
// TERMINAL PAGE
// =============================================================================

/// Status goes to stderr; navigation is remembered so it can be followed.
#[derive(Default)]
struct TerminalPage {
    location: Mutex<Option<String>>,
}

impl StatusLine for TerminalPage {
    fn set_status(&self, text: &str) {
        eprintln!("{text}");
    }
}

impl Navigator for TerminalPage {
    fn navigate(&self, path: &str) {
        if let Ok(mut location) = self.location.lock() {
            *location = Some(path.to_owned());
        }
    }
}

struct StdoutLog;

impl MessageLog for StdoutLog {
    fn append(&mut self, message: &str) {
        println!("{message}");
    }
}

// =============================================================================
// COMMANDS
// =============================================================================

async fn run_ping(config: &ClientConfig) -> Result<(), CliError> {
    get_json(config, "/healthz", false).await?;
    println!("ok");
    Ok(())
}

async fn run_post(config: &ClientConfig, file: PathBuf, topic: String, text: String) -> Result<(), CliError> {
    let upload = FileUpload::from_path(&file)
        .await
        .map_err(|source| CliError::ReadFile { path: file.clone(), source })?;
    let form = PostForm { file: upload, topic, text };

    let page = TerminalPage::default();
    Submitter::new(config.clone()).submit(&form, &page, &page).await?;

    let location = page.location.lock().ok().and_then(|l| l.clone());
    if let Some(path) = location {
        let post = get_json(config, &path, true).await?;
        print_json(&post)?;
    }
    Ok(())
}

async fn run_chat(config: &ClientConfig, pid: i64) -> Result<(), CliError> {
    let (sender, mut receiver) = ChatClient::new(config.clone()).join(pid).await?;
    let mut pump = tokio::spawn(async move { receiver.pump(&mut StdoutLog).await });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = &mut pump => return Ok(()),
            line = lines.next_line() => match line.map_err(CliError::Stdin)? {
                Some(line) => sender.send(&line),
                None => return Ok(()),
            },
        }
    }
}

async fn get_json(config: &ClientConfig, path: &str, parse: bool) -> Result<Value, CliError> {
    let response = reqwest::get(config.api_url(path)).await?;
    let status = response.status();
    if !status.is_success() {
        return Err(CliError::ServerError { status: status.as_u16(), path: path.to_owned() });
    }
    if !parse {
        return Ok(Value::Null);
    }
    Ok(response.json::<Value>().await?)
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
