//! Runtime configuration loaded from a TOML file.
//!
//! Every field has a default, so an empty file (or no file at all) yields a
//! working configuration that drives the `claude` CLI and keeps the session
//! identifier under `.gropius/`.
//!
//! ```toml
//! session_file = "/var/lib/gropius/session.json"
//! log_filter = "gropius=debug"
//!
//! [orchestrator]
//! publish_timeout_ms = 2000
//! max_stream_duration_secs = 600
//!
//! [agent]
//! program = "claude"
//! capability_config = "mcp.json"
//! credential_env = "ANTHROPIC_API_KEY"
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::query::adapters::cli::CliAgentConfig;
use crate::query::services::OrchestratorConfig;

const DEFAULT_SESSION_FILE: &str = ".gropius/session.json";
const DEFAULT_LOG_FILTER: &str = "info";
const DEFAULT_PUBLISH_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_SUBSCRIBER_BUFFER: usize = 256;

/// Errors raised while loading configuration.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration '{path}': {source}")]
    Read {
        /// Path that was read.
        path: Utf8PathBuf,
        /// Underlying I/O failure.
        source: Arc<std::io::Error>,
    },

    /// The configuration file is not valid TOML for [`Settings`].
    #[error("invalid configuration: {0}")]
    Parse(Arc<toml::de::Error>),
}

/// Top-level settings for the `gropius` binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// File holding the resumable session identifier.
    pub session_file: Utf8PathBuf,
    /// Fallback `tracing` filter when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Orchestrator tuning.
    pub orchestrator: OrchestratorSettings,
    /// Command-line agent adapter settings.
    pub agent: CliAgentConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            session_file: Utf8PathBuf::from(DEFAULT_SESSION_FILE),
            log_filter: DEFAULT_LOG_FILTER.to_owned(),
            orchestrator: OrchestratorSettings::default(),
            agent: CliAgentConfig::default(),
        }
    }
}

/// `[orchestrator]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorSettings {
    /// Longest a publish waits on one slow subscriber, in milliseconds.
    pub publish_timeout_ms: u64,
    /// Per-subscriber notification queue size.
    pub subscriber_buffer: usize,
    /// Optional cap on a single stream's duration, in seconds.
    pub max_stream_duration_secs: Option<u64>,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self {
            publish_timeout_ms: DEFAULT_PUBLISH_TIMEOUT_MS,
            subscriber_buffer: DEFAULT_SUBSCRIBER_BUFFER,
            max_stream_duration_secs: None,
        }
    }
}

impl OrchestratorSettings {
    /// Converts the section into orchestrator runtime configuration.
    #[must_use]
    pub fn to_orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            publish_timeout: Duration::from_millis(self.publish_timeout_ms),
            subscriber_buffer: self.subscriber_buffer,
            max_stream_duration: self.max_stream_duration_secs.map(Duration::from_secs),
        }
    }
}

impl Settings {
    /// Parses settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the text is not valid TOML or a
    /// field has the wrong type.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|err| ConfigError::Parse(Arc::new(err)))
    }

    /// Reads settings from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] when the file cannot be read and
    /// [`ConfigError::Parse`] when its contents are invalid.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let contents = read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.to_owned(),
            source: Arc::new(err),
        })?;
        Self::from_toml_str(&contents)
    }

    /// Reads settings from `path` when given, otherwise returns defaults.
    ///
    /// # Errors
    ///
    /// See [`Self::load`].
    pub fn load_or_default(path: Option<&Utf8Path>) -> Result<Self, ConfigError> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }
}

fn read_to_string(path: &Utf8Path) -> std::io::Result<String> {
    let file_name = path.file_name().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name")
    })?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    Dir::open_ambient_dir(parent, ambient_authority())?.read_to_string(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn empty_document_yields_defaults() {
        let settings = Settings::from_toml_str("").expect("empty TOML is valid");

        assert_eq!(settings, Settings::default());
        assert_eq!(settings.agent.program, "claude");
        assert_eq!(
            settings.orchestrator.to_orchestrator_config(),
            OrchestratorConfig::default()
        );
    }

    #[rstest]
    fn sections_override_defaults() {
        let settings = Settings::from_toml_str(
            r#"
            session_file = "state/session.json"

            [orchestrator]
            publish_timeout_ms = 250
            max_stream_duration_secs = 30

            [agent]
            program = "/opt/agent/bin/agent"
            credential_env = "AGENT_TOKEN"
            "#,
        )
        .expect("valid settings");

        assert_eq!(settings.session_file, "state/session.json");
        assert_eq!(settings.agent.program, "/opt/agent/bin/agent");
        assert_eq!(settings.agent.credential_env.as_deref(), Some("AGENT_TOKEN"));
        assert_eq!(settings.agent.resume_flag, "--resume");
        let config = settings.orchestrator.to_orchestrator_config();
        assert_eq!(config.publish_timeout, Duration::from_millis(250));
        assert_eq!(config.max_stream_duration, Some(Duration::from_secs(30)));
        assert_eq!(config.subscriber_buffer, DEFAULT_SUBSCRIBER_BUFFER);
    }

    #[rstest]
    fn wrong_field_type_is_a_parse_error() {
        let result = Settings::from_toml_str("[orchestrator]\npublish_timeout_ms = \"soon\"");

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[rstest]
    fn load_reads_a_file_and_reports_missing_ones() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = Utf8PathBuf::from_path_buf(dir.path().join("gropius.toml")).expect("utf8 path");

        let missing = Settings::load(&path);
        assert!(matches!(missing, Err(ConfigError::Read { .. })));

        std::fs::write(&path, "log_filter = \"debug\"").expect("write config");
        let settings = Settings::load(&path).expect("valid settings");
        assert_eq!(settings.log_filter, "debug");
    }
}
