/*!
 # MCP Server Manager

 A Rust library for launching local MCP tool servers as subprocesses and
 routing tool calls to them.

 ## Overview

 MCP Server Manager provides functionality to:
 - Start server scripts on free local ports, with their output captured to log files
 - Health-check servers through their HTTP control endpoint
 - List the tools every running server exposes and build a tool-to-server lookup
 - Invoke tools by server and name, with results wrapped in status envelopes
 - Tail and de-noise server logs
 - Show a script's source and the command-line flags it declares
 - Stop, restart and tear down servers

 Every public [`ServerManager`] operation answers with a report envelope
 (see [`report`]) instead of an error, so a UI layer can render
 `ok`/`warning`/`error` without error plumbing of its own.

 ## Basic Usage

 ```no_run
 use mcp_server_manager::{ServerManager, StartOptions, config::ManagerConfig};
 use serde_json::json;

 #[tokio::main]
 async fn main() {
     let mut manager = ServerManager::new(ManagerConfig::default());

     // Launch a server script on a fixed port with an extra flag
     let report = manager
         .start("random", "servers/random_server.py", StartOptions::new().port(8765).arg("seed", 42))
         .await;
     println!("{}: {}", report.port.unwrap_or_default(), report.message);

     // Discover tools and call one
     for tool in manager.list_tools("random").await {
         println!("Tool: {} - {}", tool.name, tool.description);
     }
     let outcome = manager.test_tool("random", "numbers", json!({ "count": 3 })).await;
     println!("{:?}", outcome);

     // Tear everything down
     manager.stop_all().await;
 }
 ```

 ## Concurrency

 Operations are `async` and run on tokio; they suspend only at network
 round trips, the post-launch warm-up and the bounded wait after a
 termination signal. Mutating operations take `&mut self`, so lifecycle
 calls on one manager never interleave. Batch operations walk the servers
 one at a time.
*/

pub mod client;
pub mod config;
pub mod error;
pub mod report;
pub mod server;
pub mod tools;
pub mod transport;

pub use client::{McpClient, Tool};
pub use config::ManagerConfig;
pub use error::{Error, Result};
pub use report::{
    ArgumentsReport, HealthReport, LogReport, SourceReport, StartReport, Status, StatusReport,
    StopAllReport, ToolOutcome,
};
pub use server::{CliArgument, LaunchArgs, Registry, ServerState};

use serde_json::Value;
use server::{inspect, logs};
use server::{
    ArgValue, HealthChecker, PortAllocator, ServerEvent, ServerLifecycleEvent,
    ServerLifecycleManager, ServerProcess, ServerRecord,
};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use transport::HttpTransport;
use walkdir::WalkDir;

/// Per-launch settings for [`ServerManager::start`].
///
/// # Examples
///
/// ```
/// use mcp_server_manager::StartOptions;
///
/// let options = StartOptions::new()
///     .port(8765)
///     .arg("seed", 42)
///     .arg("debug", true);
///
/// assert_eq!(options.port, Some(8765));
/// assert_eq!(options.args.to_cli_args(), vec!["--seed", "42", "--debug"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StartOptions {
    /// Fixed port; allocated from the configured range when `None`
    pub port: Option<u16>,
    /// Log file; defaults to `{log_dir}/{name}_server.log`
    pub log_file: Option<PathBuf>,
    /// Extra flags passed to the script
    pub args: LaunchArgs,
}

impl StartOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    pub fn arg(mut self, key: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.args.push(key, value);
        self
    }

    pub fn args(mut self, args: LaunchArgs) -> Self {
        self.args = args;
        self
    }
}

/// Identifies a script for [`ServerManager::show_server_source`] and
/// [`ServerManager::inspect_cli_arguments`].
#[derive(Debug, Clone, Copy)]
pub enum ScriptTarget<'a> {
    /// A registered (or configured) logical server name
    Name(&'a str),
    /// An explicit path on disk
    Path(&'a Path),
}

/// Launches, tracks and tears down local tool servers.
///
/// The manager owns its [`Registry`]; independent managers never share state,
/// which keeps tests isolated. All public methods are instrumented with
/// `tracing` spans.
pub struct ServerManager {
    /// Configuration
    config: ManagerConfig,
    /// Running servers by name
    registry: Registry,
    /// Per-name states and event history
    lifecycle: ServerLifecycleManager,
    /// Liveness prober
    health: HealthChecker,
    /// Port source for servers started without a fixed port
    ports: PortAllocator,
}

impl Default for ServerManager {
    fn default() -> Self {
        Self::new(ManagerConfig::default())
    }
}

impl ServerManager {
    /// Create a new manager from a configuration file path
    #[tracing::instrument(skip(path), fields(config_path = ?path.as_ref()))]
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self> {
        tracing::info!("Loading configuration from file");
        let config = ManagerConfig::from_file(path)?;
        Ok(Self::new(config))
    }

    /// Create a new manager from a JSON configuration string
    #[tracing::instrument(skip(config))]
    pub fn from_config_str(config: &str) -> Result<Self> {
        tracing::info!("Loading configuration from string");
        let config = ManagerConfig::parse_from_str(config)?;
        Ok(Self::new(config))
    }

    /// Create a new manager with an empty registry
    pub fn new(config: ManagerConfig) -> Self {
        Self::with_registry(config, Registry::new())
    }

    /// Create a new manager around an existing registry
    #[tracing::instrument(skip(config, registry), fields(num_servers = registry.len()))]
    pub fn with_registry(config: ManagerConfig, registry: Registry) -> Self {
        tracing::debug!("Creating new ServerManager");
        let mut lifecycle = ServerLifecycleManager::new();
        for name in registry.names() {
            lifecycle.transition(&name, ServerState::Running);
        }

        Self {
            health: HealthChecker::from_config(&config),
            ports: PortAllocator::new(config.port_range),
            config,
            registry,
            lifecycle,
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Whether `name` is registered
    pub fn is_running(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    /// Lifecycle state of `name`
    pub fn state(&self, name: &str) -> ServerState {
        self.lifecycle.state(name)
    }

    /// Lifecycle events recorded for `name`, newest first
    pub fn events(&self, name: &str) -> Vec<ServerEvent> {
        self.lifecycle.get_server_events(name, None)
    }

    /// Lifecycle events of every server, newest first
    pub fn all_events(&self) -> Vec<ServerEvent> {
        self.lifecycle.get_all_events(None)
    }

    /// `{name: port}` for every running server
    pub fn server_ports(&self) -> BTreeMap<String, u16> {
        self.registry.ports()
    }

    /// Launch a server script as a subprocess
    ///
    /// Allocates a port unless one is given, spawns the script, registers it,
    /// waits the warm-up delay and health-checks it. An unhealthy server stays
    /// registered and is reported with `status: warning`.
    #[tracing::instrument(skip(self, script, options), fields(server_name = %name, script_path = %script.as_ref().display()))]
    pub async fn start(&mut self, name: &str, script: impl AsRef<Path>, options: StartOptions) -> StartReport {
        match self.try_start(name, script.as_ref(), options).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(error = %e, "Failed to start server");
                StartReport::from(e)
            }
        }
    }

    async fn try_start(&mut self, name: &str, script: &Path, options: StartOptions) -> Result<StartReport> {
        if self.registry.contains(name) {
            return Err(Error::AlreadyRunning(name.to_string()));
        }

        let script = server::resolve_script(script)?;

        self.lifecycle.transition(name, ServerState::Starting);
        let record = match self.launch(name, script, options) {
            Ok(record) => record,
            Err(e) => {
                self.lifecycle.transition(name, ServerState::Absent);
                self.lifecycle
                    .record_event(name, ServerLifecycleEvent::Failed, Some(e.to_string()));
                return Err(e);
            }
        };

        let port = record.port();
        let pid = record.pid();
        let log_file = record.log_file().to_path_buf();
        self.registry.insert(record)?;
        tracing::info!(port, pid, "Server process launched");

        tokio::time::sleep(self.config.warmup_delay()).await;
        let healthy = self.health.check(port).await;

        self.lifecycle.transition(name, ServerState::Running);
        let message = format!("Started '{}' on port {} (PID={})", name, port, pid);
        self.lifecycle
            .record_event(name, ServerLifecycleEvent::Started, Some(message.clone()));

        if healthy {
            tracing::info!(port, "Server started and healthy");
        } else {
            tracing::warn!(port, "Server started but did not pass the health check");
        }

        Ok(StartReport {
            status: if healthy { Status::Ok } else { Status::Warning },
            message,
            healthy: Some(healthy),
            port: Some(port),
            log_file: Some(log_file),
        })
    }

    fn launch(&self, name: &str, script: PathBuf, options: StartOptions) -> Result<ServerRecord> {
        let port = match options.port {
            Some(port) => port,
            None => self.ports.allocate()?,
        };
        let log_file = options
            .log_file
            .unwrap_or_else(|| self.config.default_log_file(name));

        let process = ServerProcess::launch(
            &self.config.interpreter,
            &script,
            port,
            &options.args,
            &log_file,
        )?;

        Ok(ServerRecord::new(name, process, port, log_file, options.args, script))
    }

    /// Start a server from its `mcpServers` definition
    #[tracing::instrument(skip(self), fields(server_name = %name))]
    pub async fn start_configured(&mut self, name: &str) -> StartReport {
        let Some(definition) = self.config.mcp_servers.get(name).cloned() else {
            tracing::warn!("No definition for server");
            return StartReport::from(Error::NotConfigured(name.to_string()));
        };

        let options = StartOptions {
            port: definition.port,
            log_file: definition.log_file.clone(),
            args: definition.launch_args(),
        };
        self.start(name, &definition.script, options).await
    }

    /// Start every configured server, one after the other
    #[tracing::instrument(skip(self))]
    pub async fn start_all_configured(&mut self) -> BTreeMap<String, StartReport> {
        let names: Vec<String> = self.config.mcp_servers.keys().cloned().collect();
        tracing::info!(servers_to_start = ?names, "Starting all configured servers");

        let mut reports = BTreeMap::new();
        for name in names {
            let report = self.start_configured(&name).await;
            reports.insert(name, report);
        }
        reports
    }

    /// Terminate a running server
    ///
    /// A process that already exited is simply forgotten. Otherwise the
    /// server gets a termination signal and a bounded grace period; if it is
    /// still alive afterwards the error is reported and the record is kept.
    #[tracing::instrument(skip(self), fields(server_name = %name))]
    pub async fn stop(&mut self, name: &str) -> StatusReport {
        match self.try_stop(name).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(error = %e, "Failed to stop server");
                StatusReport::from(e)
            }
        }
    }

    async fn try_stop(&mut self, name: &str) -> Result<StatusReport> {
        let stop_timeout = self.config.stop_timeout();
        let record = self
            .registry
            .get_mut(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        let port = record.port();
        let pid = record.pid();

        if let Some(status) = record.process_mut().try_exit_status()? {
            tracing::info!(pid, exit = %status, "Process already exited");
            if let Some(record) = self.registry.remove(name) {
                record.release();
            }
            self.lifecycle.transition(name, ServerState::Absent);
            self.lifecycle
                .record_event(name, ServerLifecycleEvent::Exited, Some(status.to_string()));
            return Ok(StatusReport::ok(format!(
                "Process for '{}' already stopped.",
                name
            )));
        }

        self.lifecycle.transition(name, ServerState::Stopping);
        let process = record.process_mut();
        let waited = match process.terminate() {
            Ok(()) => process.wait(stop_timeout).await,
            Err(e) => Err(e),
        };

        match waited {
            Ok(Some(status)) => {
                tracing::debug!(pid, exit = %status, "Process exited after termination signal");
            }
            Ok(None) => {
                self.lifecycle.transition(name, ServerState::Running);
                let error = Error::TerminationTimeout {
                    name: name.to_string(),
                    timeout: stop_timeout,
                };
                self.lifecycle
                    .record_event(name, ServerLifecycleEvent::Failed, Some(error.to_string()));
                return Err(error);
            }
            Err(e) => {
                self.lifecycle.transition(name, ServerState::Running);
                self.lifecycle
                    .record_event(name, ServerLifecycleEvent::Failed, Some(e.to_string()));
                return Err(e);
            }
        }

        if let Some(record) = self.registry.remove(name) {
            record.release();
        }
        self.lifecycle.transition(name, ServerState::Absent);

        let message = format!("Stopped '{}' (port={}, PID={}).", name, port, pid);
        self.lifecycle
            .record_event(name, ServerLifecycleEvent::Stopped, Some(message.clone()));
        tracing::info!(port, pid, "Server stopped");
        Ok(StatusReport::ok(message))
    }

    /// Stop every running server and return the individual results
    #[tracing::instrument(skip(self))]
    pub async fn stop_all(&mut self) -> StopAllReport {
        if self.registry.is_empty() {
            return StopAllReport::Idle(StatusReport::ok("No servers running."));
        }

        let names = self.registry.names();
        tracing::info!(servers_to_stop = ?names, "Stopping all servers");

        let mut reports = Vec::with_capacity(names.len());
        for name in names {
            reports.push(self.stop(&name).await);
        }

        let failed = reports.iter().filter(|r| !r.is_ok()).count();
        if failed > 0 {
            tracing::warn!(error_count = failed, "Some servers failed to stop");
        }
        StopAllReport::Stopped(reports)
    }

    /// Stop a server and start it again with the same script, arguments and
    /// log file, on the same port unless `new_port` overrides it
    ///
    /// The two halves are not atomic: if the second start fails, the server
    /// stays stopped.
    #[tracing::instrument(skip(self), fields(server_name = %name))]
    pub async fn restart(&mut self, name: &str, new_port: Option<u16>) -> StartReport {
        let Some(record) = self.registry.get(name) else {
            return StartReport::from(Error::NotFound(name.to_string()));
        };
        let script = record.script_path().to_path_buf();
        let options = StartOptions {
            port: Some(new_port.unwrap_or(record.port())),
            log_file: Some(record.log_file().to_path_buf()),
            args: record.launch_args().clone(),
        };

        let stopped = self.stop(name).await;
        if !stopped.is_ok() {
            return StartReport::error(stopped.message);
        }

        let report = self.start(name, &script, options).await;
        if !report.is_error() {
            self.lifecycle
                .record_event(name, ServerLifecycleEvent::Restarted, report.port.map(|p| format!("port={}", p)));
        }
        report
    }

    /// Health of a registered server; `false` when the name is unknown
    #[tracing::instrument(skip(self), fields(server_name = %name))]
    pub async fn check_health(&self, name: &str) -> bool {
        match self.registry.port_of(name) {
            Some(port) => self.health.check(port).await,
            None => false,
        }
    }

    /// Health of whatever listens on `port`
    pub async fn check_port(&self, port: u16) -> bool {
        self.health.check(port).await
    }

    /// `{name: healthy}` for every registered server
    #[tracing::instrument(skip(self))]
    pub async fn check_all(&self) -> HealthReport {
        if self.registry.is_empty() {
            return HealthReport::Idle(StatusReport::ok("No servers running."));
        }

        let mut results = BTreeMap::new();
        for record in self.registry.iter() {
            let healthy = self.health.check(record.port()).await;
            results.insert(record.name().to_string(), healthy);
        }
        HealthReport::Checked(results)
    }

    /// Opens an initialized session with the server on `port`.
    async fn connect(&self, name: &str, port: u16) -> Result<McpClient> {
        let transport = HttpTransport::new(name, self.config.endpoint_url(port), None)?;
        let client = McpClient::new(name.to_string(), transport);
        client.initialize().await?;
        Ok(client)
    }

    async fn close_session(client: &McpClient) {
        if let Err(e) = client.close().await {
            tracing::debug!(server = %client.name(), error = %e, "Failed to close session");
        }
    }

    async fn try_list_tools(&self, name: &str) -> Result<Vec<Tool>> {
        let port = self
            .registry
            .port_of(name)
            .ok_or_else(|| Error::ServerNotRunning(name.to_string()))?;

        let client = self.connect(name, port).await?;
        let tools = client.list_tools().await;
        Self::close_session(&client).await;
        tools
    }

    /// Tools exposed by a running server
    ///
    /// Unknown names and unreachable servers yield an empty list.
    #[tracing::instrument(skip(self), fields(server_name = %name))]
    pub async fn list_tools(&self, name: &str) -> Vec<Tool> {
        if !self.registry.contains(name) {
            tracing::debug!("Tools requested for unknown server");
            return Vec::new();
        }

        match self.try_list_tools(name).await {
            Ok(tools) => {
                tracing::info!(num_tools = tools.len(), "Retrieved tools");
                tools
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to list tools");
                Vec::new()
            }
        }
    }

    async fn catalogs(&self) -> Vec<(String, Vec<Tool>)> {
        let mut catalogs = Vec::with_capacity(self.registry.len());
        for name in self.registry.names() {
            let tools = self.list_tools(&name).await;
            catalogs.push((name, tools));
        }
        catalogs
    }

    /// `{tool_name: server_name}` across every running server
    #[tracing::instrument(skip(self))]
    pub async fn tool_to_server_map(&self) -> BTreeMap<String, String> {
        tools::tool_server_map(self.catalogs().await)
    }

    /// Every running server's tools in LLM function-calling format
    #[tracing::instrument(skip(self))]
    pub async fn function_specs(&self) -> Vec<Value> {
        self.catalogs()
            .await
            .iter()
            .flat_map(|(_, catalog)| catalog.iter().map(tools::function_spec))
            .collect()
    }

    async fn try_invoke(&self, server_name: &str, tool_name: &str, args: Value) -> Result<Value> {
        let port = self
            .registry
            .port_of(server_name)
            .ok_or_else(|| Error::ServerNotRunning(server_name.to_string()))?;
        let args = client::tool_arguments(args)?;

        let client = self.connect(server_name, port).await?;
        let result = client.call_tool(tool_name, args).await;
        Self::close_session(&client).await;
        result
    }

    /// Execute a tool on a named server
    ///
    /// Never fails: the outcome is `{status: ok, result}` or
    /// `{status: error, message}`.
    #[tracing::instrument(skip(self, args), fields(server_name = %server_name, tool = %tool_name))]
    pub async fn invoke(&self, server_name: &str, tool_name: &str, args: Value) -> ToolOutcome {
        let outcome = self.try_invoke(server_name, tool_name, args).await;
        if let Err(e) = &outcome {
            tracing::warn!(error = %e, "Tool invocation failed");
        }
        ToolOutcome::from(outcome)
    }

    /// Alias of [`invoke`](Self::invoke) for interactive tool testing.
    pub async fn test_tool(&self, server_name: &str, tool_name: &str, args: Value) -> ToolOutcome {
        self.invoke(server_name, tool_name, args).await
    }

    /// Execute a tool on whichever running server exposes it
    #[tracing::instrument(skip(self, args), fields(tool = %tool_name))]
    pub async fn call_tool_by_name(&self, tool_name: &str, args: Value) -> ToolOutcome {
        let map = self.tool_to_server_map().await;
        match map.get(tool_name) {
            Some(server_name) => self.invoke(server_name, tool_name, args).await,
            None => ToolOutcome::Error {
                message: format!("Tool '{}' not found in any MCP server.", tool_name),
            },
        }
    }

    /// Last `n` lines of a server's log, optionally with noise removed
    ///
    /// Falls back to the default log path for names that are not running, so
    /// logs stay readable after a stop.
    #[tracing::instrument(skip(self), fields(server_name = %name))]
    pub async fn show_logs(&self, name: &str, n: usize, remove_noise: bool) -> LogReport {
        let log_file = self
            .registry
            .get(name)
            .map(|record| record.log_file().to_path_buf())
            .unwrap_or_else(|| self.config.default_log_file(name));

        match logs::read_tail(name, &log_file, n, remove_noise).await {
            Ok(lines) => LogReport::Ok { lines, log_file },
            Err(e) => {
                tracing::debug!(error = %e, log_file = %log_file.display(), "Logs unavailable");
                LogReport::Error {
                    message: e.to_string(),
                }
            }
        }
    }

    fn resolve_source_path(&self, target: ScriptTarget<'_>) -> Option<PathBuf> {
        match target {
            ScriptTarget::Path(path) => std::path::absolute(path).ok(),
            ScriptTarget::Name(name) => self
                .registry
                .get(name)
                .map(|record| record.script_path().to_path_buf())
                .or_else(|| {
                    self.config
                        .mcp_servers
                        .get(name)
                        .and_then(|definition| std::path::absolute(&definition.script).ok())
                }),
        }
    }

    async fn read_script(&self, target: ScriptTarget<'_>) -> Result<(PathBuf, String)> {
        let path = self.resolve_source_path(target).ok_or(Error::UnknownScript)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok((path, content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(Error::ScriptNotFound(path)),
            Err(source) => Err(Error::ScriptRead { path, source }),
        }
    }

    /// Source code of a server script, optionally with line numbers
    #[tracing::instrument(skip(self))]
    pub async fn show_server_source(&self, target: ScriptTarget<'_>, line_numbers: bool) -> SourceReport {
        let (path, content) = match self.read_script(target).await {
            Ok(script) => script,
            Err(e) => {
                return SourceReport::Error {
                    message: e.to_string(),
                };
            }
        };

        let source = if line_numbers {
            number_lines(&content)
        } else {
            content
        };
        SourceReport::Ok { path, source }
    }

    /// Command-line flags a server script declares through `add_argument`
    ///
    /// The keys of the `--name` flags found here are what
    /// [`StartOptions::arg`] accepts for that script.
    #[tracing::instrument(skip(self))]
    pub async fn inspect_cli_arguments(&self, target: ScriptTarget<'_>) -> ArgumentsReport {
        let (path, content) = match self.read_script(target).await {
            Ok(script) => script,
            Err(e) => {
                return ArgumentsReport::Error {
                    message: e.to_string(),
                };
            }
        };

        match inspect::scan_arguments(&content) {
            Ok(arguments) if arguments.is_empty() => ArgumentsReport::Warning {
                message: "No argparse configuration detected. The script may rely on manual sys.argv parsing."
                    .to_string(),
                arguments,
            },
            Ok(arguments) => {
                tracing::debug!(num_arguments = arguments.len(), "Found declared arguments");
                ArgumentsReport::Ok { path, arguments }
            }
            Err(e) => {
                tracing::warn!(error = %e, script_path = %path.display(), "Failed to scan script");
                ArgumentsReport::Error {
                    message: e.to_string(),
                }
            }
        }
    }

    /// Example servers under the configured `examples_dir`
    pub fn example_servers(&self) -> Vec<PathBuf> {
        self.config
            .examples_dir
            .as_deref()
            .map(Self::list_example_servers)
            .unwrap_or_default()
    }

    /// Absolute paths of every `*_server.*` script below `dir`, sorted
    pub fn list_example_servers(dir: &Path) -> Vec<PathBuf> {
        let mut found: Vec<PathBuf> = WalkDir::new(dir)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_file())
            .filter(|entry| {
                let path = entry.path();
                path.extension().is_some()
                    && path
                        .file_stem()
                        .and_then(|stem| stem.to_str())
                        .is_some_and(|stem| stem.ends_with("_server"))
            })
            .filter_map(|entry| std::path::absolute(entry.path()).ok())
            .collect();
        found.sort();
        found
    }
}

fn number_lines(content: &str) -> String {
    content
        .lines()
        .enumerate()
        .map(|(idx, line)| format!("{:>4}: {}", idx + 1, line))
        .collect::<Vec<_>>()
        .join("\n")
}
