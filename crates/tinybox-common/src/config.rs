//! Container policy: the values handed to the container that carry no
//! isolation semantics of their own.

use crate::constants::{CONTAINER_MARKER_VAR, DEFAULT_HOSTNAME, DEFAULT_PATH};
use crate::error::{Result, TinyboxError};

/// Hostname and environment given to the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerPolicy {
    /// Hostname set inside the UTS namespace.
    pub hostname: String,
    /// Complete environment of the target program. Nothing from the host
    /// environment is added to it.
    pub env: Vec<(String, String)>,
}

impl ContainerPolicy {
    /// Builds a policy from a hostname and `KEY=VALUE` strings.
    ///
    /// An empty `env` list selects the default environment.
    ///
    /// # Errors
    ///
    /// Returns [`TinyboxError::Usage`] if the hostname is empty or an entry
    /// has no `=` or an empty key.
    pub fn new(hostname: impl Into<String>, env: &[String]) -> Result<Self> {
        let hostname = hostname.into();
        if hostname.is_empty() {
            return Err(TinyboxError::usage("hostname must not be empty"));
        }
        let env = if env.is_empty() {
            default_env()
        } else {
            env.iter()
                .map(|entry| parse_env_entry(entry))
                .collect::<Result<Vec<_>>>()?
        };
        Ok(Self { hostname, env })
    }

    /// Renders the environment back into `KEY=VALUE` strings.
    pub fn env_entries(&self) -> Vec<String> {
        self.env.iter().map(|(k, v)| format!("{k}={v}")).collect()
    }
}

impl Default for ContainerPolicy {
    fn default() -> Self {
        Self {
            hostname: DEFAULT_HOSTNAME.to_string(),
            env: default_env(),
        }
    }
}

fn default_env() -> Vec<(String, String)> {
    vec![
        ("PATH".to_string(), DEFAULT_PATH.to_string()),
        (CONTAINER_MARKER_VAR.to_string(), "1".to_string()),
    ]
}

fn parse_env_entry(entry: &str) -> Result<(String, String)> {
    match entry.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(TinyboxError::usage(format!(
            "environment entry must be KEY=VALUE: {entry}"
        ))),
    }
}
