//! Line-oriented front end for the query orchestrator.
//!
//! Usage:
//!
//! ```text
//! gropius [--config <path>]
//! ```
//!
//! Every line read from standard input is submitted as a prompt, except for
//! these commands:
//!
//! ```text
//! /status             report state, session and uptime
//! /interrupt          cancel the active stream
//! /reload             reload the agent's capability registry
//! /restart [kickoff]  discard the conversation, optionally submitting kickoff
//! ```
//!
//! Domain events, state changes and command replies are written to standard
//! output as JSON lines. Logs go to standard error. Failing to initialise the
//! agent is fatal.

use camino::Utf8PathBuf;
use clap::Parser;
use gropius::config::{ConfigError, Settings};
use gropius::query::adapters::cli::CliAgentConnector;
use gropius::query::adapters::{FileSessionStore, JsonLinesSubscriber};
use gropius::query::ports::{EventSubscriber, SessionStoreError};
use gropius::query::services::{
    ControlRequest, ControlResponse, ControlSurface, OrchestratorError, QueryOrchestrator,
};
use gropius::telemetry::{TelemetryError, init_tracing};
use mockable::DefaultClock;
use serde_json::json;
use std::io;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, BufReader, Stdout};
use tokio::runtime::Builder;
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "gropius", version, about = "Single-flight query orchestrator")]
struct Cli {
    /// TOML configuration file; defaults apply when omitted.
    #[arg(short, long)]
    config: Option<Utf8PathBuf>,
}

/// Errors that end the process.
#[derive(Debug, Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),
    #[error("runtime init failed: {0}")]
    RuntimeInit(#[source] io::Error),
    #[error("session store unavailable: {0}")]
    SessionStore(#[from] SessionStoreError),
    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),
    #[error("failed to read standard input: {0}")]
    Input(#[source] io::Error),
}

/// One parsed input line.
#[derive(Debug, PartialEq, Eq)]
enum Command {
    Submit(String),
    Interrupt,
    Control(ControlRequest),
    Unknown(String),
}

type Output = JsonLinesSubscriber<Stdout>;
type Control = ControlSurface<CliAgentConnector, FileSessionStore, DefaultClock>;

fn main() -> Result<(), AppError> {
    let cli = Cli::parse();
    let settings = Settings::load_or_default(cli.config.as_deref())?;
    init_tracing(&settings.log_filter)?;
    let runtime = Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(AppError::RuntimeInit)?;
    runtime.block_on(run(settings))
}

async fn run(settings: Settings) -> Result<(), AppError> {
    let store = Arc::new(FileSessionStore::open(&settings.session_file)?);
    let connector = Arc::new(CliAgentConnector::new(settings.agent.clone()));
    let orchestrator = QueryOrchestrator::new(
        connector,
        store,
        Arc::new(DefaultClock),
        settings.orchestrator.to_orchestrator_config(),
    );
    orchestrator.initialize().await?;

    let output: Arc<Output> = Arc::new(JsonLinesSubscriber::new(tokio::io::stdout()));
    orchestrator.subscribe(Arc::clone(&output) as Arc<dyn EventSubscriber>);
    let control = ControlSurface::new(orchestrator);
    info!(session_file = %settings.session_file, "gropius ready");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.map_err(AppError::Input)? {
        if let Some(command) = parse_command(&line) {
            execute(&control, &output, command).await;
        }
    }

    info!("standard input closed; shutting down");
    control.orchestrator().shutdown().await;
    Ok(())
}

async fn execute(control: &Control, output: &Output, command: Command) {
    match command {
        Command::Submit(text) => match control.orchestrator().submit(text).await {
            Ok(outcome) => output.write_line(&outcome).await,
            Err(err) => {
                output
                    .write_line(&ControlResponse::Error {
                        message: err.to_string(),
                    })
                    .await;
            }
        },
        Command::Interrupt => {
            let interrupted = control.orchestrator().interrupt().await;
            output.write_line(&json!({ "interrupted": interrupted })).await;
        }
        Command::Control(request) => output.write_line(&control.handle(request).await).await,
        Command::Unknown(name) => {
            output
                .write_line(&ControlResponse::Error {
                    message: format!("unknown command '/{name}'"),
                })
                .await;
        }
    }
}

/// Parses one input line. Blank lines yield `None`.
fn parse_command(line: &str) -> Option<Command> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }
    let Some(command) = trimmed.strip_prefix('/') else {
        return Some(Command::Submit(trimmed.to_owned()));
    };
    let (name, argument) = command
        .split_once(char::is_whitespace)
        .map_or((command, ""), |(name, rest)| (name, rest.trim()));
    let parsed = match name {
        "status" => Command::Control(ControlRequest::GetStatus),
        "interrupt" => Command::Interrupt,
        "reload" => Command::Control(ControlRequest::ReloadConfig),
        "restart" => Command::Control(ControlRequest::RestartAgent {
            kickoff: (!argument.is_empty()).then(|| argument.to_owned()),
        }),
        other => Command::Unknown(other.to_owned()),
    };
    Some(parsed)
}
