//! Agent capability backed by a stream-JSON command-line agent.
//!
//! Each stream start spawns the configured program with the prompt as its
//! final argument, after a `--` separator, and reads newline-delimited JSON events from its standard
//! output. Cancellation kills the child process.

mod agent;
mod process;
mod registry;

pub use agent::{CliAgent, CliAgentConnector};
pub use registry::CapabilityRegistry;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Configuration for the command-line agent adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliAgentConfig {
    /// Program name (looked up on `PATH`) or path.
    pub program: String,
    /// Arguments placed before every other argument.
    pub args: Vec<String>,
    /// Flag introducing the session identifier to resume.
    pub resume_flag: String,
    /// Arguments appended when every tool call is auto-approved.
    pub auto_approve_args: Vec<String>,
    /// Flag introducing the capability registry path.
    pub capability_flag: String,
    /// Capability registry (tool server configuration) file.
    pub capability_config: Option<Utf8PathBuf>,
    /// Environment variable that must hold the agent credential.
    pub credential_env: Option<String>,
    /// Working directory of the agent process.
    pub working_dir: Option<Utf8PathBuf>,
}

impl Default for CliAgentConfig {
    fn default() -> Self {
        Self {
            program: "claude".to_owned(),
            args: vec![
                "--print".to_owned(),
                "--output-format".to_owned(),
                "stream-json".to_owned(),
                "--verbose".to_owned(),
            ],
            resume_flag: "--resume".to_owned(),
            auto_approve_args: vec![
                "--permission-mode".to_owned(),
                "bypassPermissions".to_owned(),
            ],
            capability_flag: "--mcp-config".to_owned(),
            capability_config: None,
            credential_env: None,
            working_dir: None,
        }
    }
}
