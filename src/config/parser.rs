use crate::error::{Error, Result};
use crate::server::LaunchArgs;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Inclusive range of local TCP ports the allocator may hand out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRange {
    /// First candidate port
    pub start: u16,
    /// Last candidate port (inclusive)
    pub end: u16,
}

impl Default for PortRange {
    fn default() -> Self {
        Self {
            start: 8600,
            end: 8900,
        }
    }
}

/// A named tool server that can be started from configuration.
///
/// # Examples
///
/// ```
/// use mcp_server_manager::config::ServerDefinition;
/// use serde_json::json;
///
/// let definition: ServerDefinition = serde_json::from_value(json!({
///     "script": "servers/random_server.py",
///     "port": 8765,
///     "args": { "seed": 42, "debug": true }
/// })).unwrap();
///
/// assert_eq!(definition.launch_args().to_cli_args(), vec!["--seed", "42", "--debug"]);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerDefinition {
    /// Path to the server script, relative to the working directory.
    pub script: PathBuf,

    /// Fixed port; allocated from `portRange` when absent.
    #[serde(default)]
    pub port: Option<u16>,

    /// Log file override; defaults to `{logDir}/{name}_server.log`.
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Extra flags passed to the script, in declaration order.
    #[serde(default)]
    pub args: Map<String, Value>,
}

impl ServerDefinition {
    /// Converts the JSON `args` object into ordered launch arguments.
    pub fn launch_args(&self) -> LaunchArgs {
        self.args
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect()
    }
}

/// Main configuration for the server manager.
///
/// Every field has a default, so an empty JSON object is a valid config.
///
/// # JSON Schema
///
/// ```json
/// {
///   "interpreter": "python3",
///   "portRange": { "start": 8600, "end": 8900 },
///   "logDir": "logs",
///   "warmupDelayMs": 2000,
///   "mcpServers": {
///     "random": {
///       "script": "servers/random_server.py",
///       "args": { "seed": 42 }
///     }
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ManagerConfig {
    /// Program used to run server scripts.
    pub interpreter: String,

    /// Host the control endpoints listen on.
    pub host: String,

    /// Path of the control endpoint on every server.
    pub endpoint_path: String,

    /// Range the port allocator draws from.
    pub port_range: PortRange,

    /// Directory for default log files.
    pub log_dir: PathBuf,

    /// Pause between spawning a server and its first health check.
    pub warmup_delay_ms: u64,

    /// Grace period after the termination signal.
    pub stop_timeout_ms: u64,

    /// Network timeout of a single health probe.
    pub health_check_timeout_ms: u64,

    /// Directory scanned for bundled example servers.
    pub examples_dir: Option<PathBuf>,

    /// Named server definitions.
    #[serde(rename = "mcpServers")]
    pub mcp_servers: BTreeMap<String, ServerDefinition>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter().to_string(),
            host: "127.0.0.1".to_string(),
            endpoint_path: "/mcp".to_string(),
            port_range: PortRange::default(),
            log_dir: PathBuf::from("."),
            warmup_delay_ms: 2000,
            stop_timeout_ms: 3000,
            health_check_timeout_ms: 5000,
            examples_dir: None,
            mcp_servers: BTreeMap::new(),
        }
    }
}

fn default_interpreter() -> &'static str {
    if cfg!(windows) { "python" } else { "python3" }
}

impl ManagerConfig {
    /// Loads a configuration from a file path.
    ///
    /// Files ending in `.yaml` or `.yml` are parsed as YAML, everything else
    /// as JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * The file cannot be read
    /// * The file contents do not parse
    /// * The parsed values fail validation
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::ConfigParse(format!("Failed to read config file: {}", e)))?;

        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

        if is_yaml {
            Self::parse_from_yaml(&content)
        } else {
            Self::parse_from_str(&content)
        }
    }

    /// Parses and validates a configuration from a JSON string.
    pub fn parse_from_str(content: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(content)
            .map_err(|e| Error::ConfigParse(format!("Failed to parse JSON config: {}", e)))?;
        super::validate_config(&config)?;
        Ok(config)
    }

    /// Parses and validates a configuration from a YAML string.
    pub fn parse_from_yaml(content: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| Error::ConfigParse(format!("Failed to parse YAML config: {}", e)))?;
        super::validate_config(&config)?;
        Ok(config)
    }

    /// URL of the control endpoint of a server listening on `port`.
    pub fn endpoint_url(&self, port: u16) -> String {
        format!("http://{}:{}{}", self.host, port, self.endpoint_path)
    }

    /// Default log file for a logical server name.
    pub fn default_log_file(&self, name: &str) -> PathBuf {
        self.log_dir.join(format!("{}_server.log", name))
    }

    pub fn warmup_delay(&self) -> Duration {
        Duration::from_millis(self.warmup_delay_ms)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }

    pub fn health_check_timeout(&self) -> Duration {
        Duration::from_millis(self.health_check_timeout_ms)
    }
}
