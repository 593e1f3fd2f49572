//! Capability registry: the tool server configuration handed to the agent.

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs_utf8::Dir;
use serde_json::Value;

use crate::query::ports::{AgentError, AgentResult};

const SERVERS_KEY: &str = "mcpServers";

/// Validated snapshot of the capability registry file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityRegistry {
    path: Utf8PathBuf,
    servers: Vec<String>,
}

impl CapabilityRegistry {
    /// Reads and validates the registry at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfig`] when the file cannot be read, is
    /// not JSON, or lacks an `mcpServers` object.
    pub fn load(path: &Utf8Path) -> AgentResult<Self> {
        let contents = read_file(path)
            .map_err(|err| AgentError::InvalidConfig(format!("cannot read '{path}': {err}")))?;
        Self::parse(path, &contents)
    }

    /// Validates registry contents read from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::InvalidConfig`] when the contents are not JSON or
    /// lack an `mcpServers` object.
    pub fn parse(path: &Utf8Path, contents: &str) -> AgentResult<Self> {
        let document: Value = serde_json::from_str(contents)
            .map_err(|err| AgentError::InvalidConfig(format!("'{path}' is not JSON: {err}")))?;
        let servers = document
            .get(SERVERS_KEY)
            .and_then(Value::as_object)
            .ok_or_else(|| {
                AgentError::InvalidConfig(format!("'{path}' has no '{SERVERS_KEY}' object"))
            })?;
        let mut names: Vec<String> = servers.keys().cloned().collect();
        names.sort();
        Ok(Self {
            path: path.to_owned(),
            servers: names,
        })
    }

    /// Registry file path.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Configured server names, sorted.
    #[must_use]
    pub fn servers(&self) -> &[String] {
        &self.servers
    }
}

fn read_file(path: &Utf8Path) -> std::io::Result<String> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    let file_name = path.file_name().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name")
    })?;
    Dir::open_ambient_dir(parent, ambient_authority())?.read_to_string(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(r#"{"mcpServers": {"search": {}, "files": {"command": "fs"}}}"#, &["files", "search"])]
    #[case(r#"{"mcpServers": {}}"#, &[])]
    fn parse_lists_server_names(#[case] contents: &str, #[case] expected: &[&str]) {
        let registry =
            CapabilityRegistry::parse(Utf8Path::new("tools.json"), contents).expect("valid registry");

        assert_eq!(registry.servers(), expected);
    }

    #[rstest]
    #[case("not json")]
    #[case(r#"{"servers": {}}"#)]
    #[case(r#"{"mcpServers": []}"#)]
    fn parse_rejects_invalid_documents(#[case] contents: &str) {
        let result = CapabilityRegistry::parse(Utf8Path::new("tools.json"), contents);

        assert!(matches!(result, Err(AgentError::InvalidConfig(_))));
    }
}
