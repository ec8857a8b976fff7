//! Error handling module for the server manager.
//!
//! This module defines the error types used throughout the library.
//! The `Display` text of each variant is the message callers see inside
//! report envelopes, so it is phrased for humans rather than for logs.
//!
//! # Example
//!
//! ```
//! use mcp_server_manager::error::{Error, Result};
//!
//! fn handle_error(result: Result<()>) {
//!     match result {
//!         Ok(_) => println!("Operation succeeded"),
//!         Err(Error::AlreadyRunning(name)) => println!("'{}' is already up", name),
//!         Err(Error::ServerNotRunning(name)) => println!("'{}' is not running", name),
//!         Err(e) => println!("Other error: {}", e),
//!     }
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur in the mcp-server-manager library.
///
/// Errors local to a single server (unhealthy probe, failing tool call) are
/// folded into report envelopes by [`ServerManager`](crate::ServerManager);
/// the remaining variants describe caller misuse or plumbing failures.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to parse configuration from a file or string.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    /// Configuration parsed but contains invalid values.
    ///
    /// This error occurs when:
    /// - The interpreter is empty
    /// - The port range is empty or inverted
    /// - A server definition has no script
    #[error("Invalid configuration: {0}")]
    ConfigInvalid(String),

    /// A server with this logical name is already registered.
    #[error("Server '{0}' already running.")]
    AlreadyRunning(String),

    /// The script to launch does not exist on disk.
    #[error("Script not found: {}", .0.display())]
    ScriptNotFound(PathBuf),

    /// A script lookup by name matched neither a running nor a configured server.
    #[error("Server not found.")]
    UnknownScript,

    /// A script exists but could not be read.
    #[error("Failed to read '{}': {source}", .path.display())]
    ScriptRead {
        /// Script path
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// A script's source could not be scanned.
    #[error("Unable to parse script: {0}")]
    ScriptParse(String),

    /// An operation referenced a server that is not registered.
    ///
    /// Used by tool invocation, where the server must be live.
    #[error("Server '{0}' not running.")]
    ServerNotRunning(String),

    /// A lifecycle operation referenced an unknown logical name.
    #[error("No server named '{0}' found.")]
    NotFound(String),

    /// The name has no definition in the `mcpServers` configuration.
    #[error("Server '{0}' not found in configuration")]
    NotConfigured(String),

    /// No bindable port was found in the configured range.
    #[error("No free port available in range {start}–{end}.")]
    ResourceExhausted {
        /// First port of the range
        start: u16,
        /// Last port of the range (inclusive)
        end: u16,
    },

    /// The control endpoint did not answer a ping.
    #[error("Health check failed: {0}")]
    HealthCheckFailed(String),

    /// A tool call failed, either in transit or on the server side.
    #[error("{0}")]
    ToolInvocation(String),

    /// The server did not exit within the grace period after a termination signal.
    #[error("Server '{name}' did not exit within {}s of the termination signal.", .timeout.as_secs_f64())]
    TerminationTimeout {
        /// Logical server name
        name: String,
        /// Grace period that elapsed
        timeout: Duration,
    },

    /// No log file exists for the server.
    #[error("No logs found for '{0}'.")]
    LogsUnavailable(String),

    /// Spawning, signalling or reaping a process failed.
    #[error("Server process error: {0}")]
    Process(String),

    /// The HTTP exchange with a control endpoint failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The server answered with a JSON-RPC error object.
    #[error("JSON-RPC error: {0}")]
    JsonRpc(String),

    /// Error in serializing or deserializing data.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Result type for mcp-server-manager operations.
pub type Result<T> = std::result::Result<T, Error>;
