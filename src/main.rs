use std::fs::{self, OpenOptions};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tabstash::native::{ChromeLauncher, CommandChannel};
use tabstash::web::{run_server, ServerConfig, WebAppState};
use tabstash::{util, CompanionCore, Config};
use tracing_subscriber::EnvFilter;

/// Browsers pass the calling extension's origin when they start a native host.
const EXTENSION_ORIGIN_PREFIX: &str = "chrome-extension://";

#[derive(Parser, Debug)]
#[command(
    name = "tabstash",
    about = "Companion process that keeps browser profiles, tabs and saved pages in sync",
    version
)]
struct Cli {
    /// Data directory (defaults to ~/.tabstash)
    #[arg(long, global = true, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Run as a native messaging host on stdin/stdout
    #[arg(long)]
    native_messaging: bool,

    /// Parent window handle passed by the browser on Windows
    #[arg(long, hide = true)]
    parent_window: Option<String>,

    /// Arguments appended by the browser (the caller origin)
    #[arg(hide = true)]
    browser_args: Vec<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API used by the extension (default)
    Serve {
        /// Host address to bind to
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run as a native messaging host on stdin/stdout
    NativeMessaging,
}

enum Mode {
    Serve {
        host: Option<String>,
        port: Option<u16>,
    },
    NativeMessaging,
}

impl Cli {
    fn mode(self) -> Mode {
        let started_by_browser = self
            .browser_args
            .iter()
            .any(|arg| arg.starts_with(EXTENSION_ORIGIN_PREFIX));
        match self.command {
            Some(Command::NativeMessaging) => Mode::NativeMessaging,
            Some(Command::Serve { host, port }) => Mode::Serve { host, port },
            None if self.native_messaging || started_by_browser => Mode::NativeMessaging,
            None => Mode::Serve {
                host: None,
                port: None,
            },
        }
    }
}

/// Log to ~/.tabstash/logs/tabstash.log. stdout is reserved for native
/// messaging frames.
fn init_logging() -> Result<()> {
    fs::create_dir_all(util::logs_dir()).context("Failed to create logs directory")?;

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(util::log_file_path())
        .context("Failed to open log file")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(log_file)
        .with_ansi(false) // Disable ANSI colors in log file
        .init();
    Ok(())
}

async fn serve(config: Config, host: Option<String>, port: Option<u16>) -> Result<()> {
    let server_config = ServerConfig {
        host: host.unwrap_or_else(|| config.host.clone()),
        port: port.unwrap_or(config.port),
        ..ServerConfig::default()
    };
    let core = CompanionCore::open(config).context("Failed to open database")?;
    run_server(WebAppState::new(core), server_config).await
}

async fn native_messaging(config: Config) -> Result<()> {
    let launcher = ChromeLauncher::new(config.browser_executable.clone());
    let core = CompanionCore::open(config).context("Failed to open database")?;
    let channel = CommandChannel::new(core.profile_store_clone(), launcher);

    tracing::info!("Starting in native messaging mode");
    channel
        .serve(tokio::io::stdin(), tokio::io::stdout())
        .await
        .context("Native messaging stream failed")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    util::init_data_dir(cli.data_dir.clone());
    init_logging()?;

    let config = Config::load();
    match cli.mode() {
        Mode::Serve { host, port } => serve(config, host, port).await,
        Mode::NativeMessaging => native_messaging(config).await,
    }
}
