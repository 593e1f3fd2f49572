//! Command-line agent connector and capability.

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};
use std::process::Stdio;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::process::Command;
use tracing::{debug, info};

use super::process::{ProcessCanceller, drain_stderr, event_lines, supervise};
use super::{CapabilityRegistry, CliAgentConfig};
use crate::query::{
    domain::StartOptions,
    ports::{AgentCapability, AgentConnector, AgentError, AgentResult, AgentStream},
};

/// Validates the environment and builds a [`CliAgent`].
#[derive(Debug, Clone, Default)]
pub struct CliAgentConnector {
    config: CliAgentConfig,
}

impl CliAgentConnector {
    /// Creates a connector for the given configuration.
    #[must_use]
    pub const fn new(config: CliAgentConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl AgentConnector for CliAgentConnector {
    type Agent = CliAgent;

    async fn connect(&self) -> AgentResult<CliAgent> {
        let program = resolve_program(&self.config.program)
            .ok_or_else(|| AgentError::ProgramNotFound(self.config.program.clone()))?;

        if let Some(variable) = &self.config.credential_env {
            let present = std::env::var_os(variable).is_some_and(|value| !value.is_empty());
            if !present {
                return Err(AgentError::MissingCredential(variable.clone()));
            }
        }

        let registry = self
            .config
            .capability_config
            .as_deref()
            .map(CapabilityRegistry::load)
            .transpose()?;

        info!(%program, "agent program located");
        Ok(CliAgent {
            program,
            config: self.config.clone(),
            registry: Arc::new(RwLock::new(registry)),
        })
    }
}

/// Agent capability that spawns one process per stream.
#[derive(Debug, Clone)]
pub struct CliAgent {
    program: Utf8PathBuf,
    config: CliAgentConfig,
    registry: Arc<RwLock<Option<CapabilityRegistry>>>,
}

impl CliAgent {
    /// Resolved agent program path.
    #[must_use]
    pub fn program(&self) -> &Utf8Path {
        &self.program
    }

    /// Snapshot of the most recently loaded capability registry.
    #[must_use]
    pub fn registry(&self) -> Option<CapabilityRegistry> {
        self.registry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn command(&self, prompt: &str, options: &StartOptions) -> Command {
        let mut command = Command::new(self.program.as_std_path());
        command.args(&self.config.args);
        if let Some(session_id) = &options.session_id {
            command.arg(&self.config.resume_flag).arg(session_id.as_str());
        }
        if options.auto_approve_tools {
            command.args(&self.config.auto_approve_args);
        }
        if let Some(registry) = self.registry() {
            command
                .arg(&self.config.capability_flag)
                .arg(registry.path().as_str());
        }
        // The prompt is positional even when it starts with a dash.
        command.arg("--").arg(prompt);
        if let Some(dir) = &self.config.working_dir {
            command.current_dir(dir.as_std_path());
        }
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

#[async_trait]
impl AgentCapability for CliAgent {
    async fn start(&self, prompt: &str, options: &StartOptions) -> AgentResult<AgentStream> {
        let mut child = self.command(prompt, options).spawn().map_err(AgentError::runtime)?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| AgentError::Protocol("agent stdout is not captured".to_owned()))?;
        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(drain_stderr(stderr));
        }
        debug!(pid = ?child.id(), resume = options.session_id.is_some(), "agent process spawned");

        let (canceller, kill_requests) = ProcessCanceller::channel();
        tokio::spawn(supervise(child, kill_requests));
        Ok(AgentStream::new(event_lines(stdout), Arc::new(canceller)))
    }

    async fn reload_config(&self) -> AgentResult<()> {
        let Some(path) = &self.config.capability_config else {
            debug!("no capability registry configured; nothing to reload");
            return Ok(());
        };
        let registry = CapabilityRegistry::load(path)?;
        info!(servers = registry.servers().len(), "capability registry reloaded");
        *self
            .registry
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(registry);
        Ok(())
    }
}

fn resolve_program(program: &str) -> Option<Utf8PathBuf> {
    let candidate = Utf8Path::new(program);
    if candidate.is_absolute() || candidate.components().count() > 1 {
        return candidate.is_file().then(|| candidate.to_owned());
    }
    let search_path = std::env::var_os("PATH")?;
    std::env::split_paths(&search_path)
        .filter_map(|dir| Utf8PathBuf::from_path_buf(dir).ok())
        .map(|dir| dir.join(program))
        .find(|path| path.is_file())
}
