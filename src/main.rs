//! Interactive disaster-response console.
//!
//! Reads one command per line from stdin, feeds it to the sync driver, and
//! prints views to stdout. Logs go to stderr (`RUST_LOG` controls the level).

mod command;
mod render;

use std::rc::Rc;
use std::time::Duration;

use clap::Parser;
use relief_client::clock::{Clock, SystemClock};
use relief_client::config::SyncConfig;
use relief_client::error::TransportError;
use relief_client::net::http::ReqwestTransport;
use relief_client::net::push_ws::WsPushTransport;
use relief_client::sync::driver::SyncDriver;
use relief_client::sync::orchestrator::Orchestrator;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::LocalSet;
use tracing_subscriber::EnvFilter;

use crate::command::{Command, CommandError, HELP};
use crate::render::TerminalRenderer;

#[derive(Debug, thiserror::Error)]
enum ConsoleError {
    #[error("http client setup failed: {0}")]
    Http(#[from] TransportError),
    #[error("stdin read failed: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(name = "relief-console", about = "Disaster-response coordination console")]
struct Cli {
    /// REST API origin (no `/api` suffix).
    #[arg(long, env = "RELIEF_API_BASE_URL")]
    api_base_url: Option<String>,

    /// Push server origin; defaults to the API origin.
    #[arg(long, env = "RELIEF_PUSH_URL")]
    push_url: Option<String>,

    #[arg(long, env = "RELIEF_USER_ID")]
    user_id: Option<String>,

    #[arg(long, env = "RELIEF_MIN_CALL_INTERVAL_MS")]
    min_call_interval_ms: Option<u64>,

    #[arg(long, env = "RELIEF_DEBOUNCE_MS")]
    debounce_ms: Option<u64>,
}

impl Cli {
    fn config(&self) -> SyncConfig {
        let mut config = SyncConfig::from_lookup(|key| match key {
            "RELIEF_API_BASE_URL" => self.api_base_url.clone(),
            "RELIEF_PUSH_URL" => self.push_url.clone(),
            "RELIEF_USER_ID" => self.user_id.clone(),
            _ => None,
        });
        if let Some(ms) = self.min_call_interval_ms {
            config.min_call_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = self.debounce_ms {
            config.debounce = Duration::from_millis(ms);
        }
        config
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), ConsoleError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let config = Cli::parse().config();
    tracing::info!(api = %config.api_base_url, push = %config.push_url, user = %config.user_id, "relief console starting");

    LocalSet::new().run_until(run(config)).await
}

async fn run(config: SyncConfig) -> Result<(), ConsoleError> {
    let clock: Rc<dyn Clock> = Rc::new(SystemClock);
    let transport = Rc::new(ReqwestTransport::new()?);
    let renderer = Rc::new(TerminalRenderer::stdout());
    let orchestrator = Orchestrator::new(&config, transport, renderer, Rc::clone(&clock));
    let driver = SyncDriver::new(&config, orchestrator, Rc::new(WsPushTransport::new()), clock);

    let (actions, rx) = mpsc::unbounded_channel();
    let running = tokio::task::spawn_local(driver.run(rx));

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match command::parse(&line) {
            Ok(Command::Action(action)) => {
                if actions.send(action).is_err() {
                    tracing::warn!("sync driver stopped");
                    break;
                }
            }
            Ok(Command::Help) => println!("{HELP}"),
            Ok(Command::Quit) => break,
            Err(CommandError::Empty) => {}
            Err(e) => println!("{e}"),
        }
    }

    drop(actions);
    if let Err(e) = running.await {
        tracing::error!(error = %e, "sync driver task failed");
    }
    tracing::info!("relief console stopped");
    Ok(())
}
