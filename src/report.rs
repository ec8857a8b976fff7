//! Caller-facing result envelopes.
//!
//! Every public [`ServerManager`](crate::ServerManager) operation answers with
//! one of these instead of an error, so presentation code can branch on
//! `status` alone. They serialize to the flat JSON shapes UI layers expect,
//! e.g. `{"status": "ok", "result": ...}`.

use crate::error::{Error, Result};
use crate::server::CliArgument;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// Outcome class of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Warning,
    Error,
}

/// `{status, message}`: the answer of `stop` and of no-op batch calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: Status,
    pub message: String,
}

impl StatusReport {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            status: Status::Ok,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: message.into(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Status::Ok
    }
}

impl From<Error> for StatusReport {
    fn from(error: Error) -> Self {
        Self::error(error.to_string())
    }
}

/// Answer of `start` and `restart`.
///
/// `warning` means the process runs and is tracked but did not answer the
/// post-launch health check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartReport {
    pub status: Status,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub healthy: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl StartReport {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            message: message.into(),
            healthy: None,
            port: None,
            log_file: None,
        }
    }

    pub fn is_error(&self) -> bool {
        self.status == Status::Error
    }
}

impl From<Error> for StartReport {
    fn from(error: Error) -> Self {
        Self::error(error.to_string())
    }
}

/// Answer of `show_logs`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum LogReport {
    Ok { lines: Vec<String>, log_file: PathBuf },
    Error { message: String },
}

/// Answer of a tool invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ToolOutcome {
    Ok { result: Value },
    Error { message: String },
}

impl ToolOutcome {
    pub fn is_ok(&self) -> bool {
        matches!(self, ToolOutcome::Ok { .. })
    }

    /// The payload of a successful call.
    pub fn result(&self) -> Option<&Value> {
        match self {
            ToolOutcome::Ok { result } => Some(result),
            ToolOutcome::Error { .. } => None,
        }
    }
}

impl From<Result<Value>> for ToolOutcome {
    fn from(outcome: Result<Value>) -> Self {
        match outcome {
            Ok(result) => ToolOutcome::Ok { result },
            Err(e) => ToolOutcome::Error {
                message: e.to_string(),
            },
        }
    }
}

/// Answer of `stop_all`: one report per server, or a no-op message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StopAllReport {
    Idle(StatusReport),
    Stopped(Vec<StatusReport>),
}

/// Answer of `check_all`: `{name: healthy}`, or a no-op message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HealthReport {
    Idle(StatusReport),
    Checked(BTreeMap<String, bool>),
}

/// Answer of `show_server_source`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum SourceReport {
    Ok { path: PathBuf, source: String },
    Error { message: String },
}

/// Answer of `inspect_cli_arguments`.
///
/// `warning` means the script was read but declares no `add_argument`
/// flags; it may parse its command line by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ArgumentsReport {
    Ok {
        path: PathBuf,
        arguments: Vec<CliArgument>,
    },
    Warning {
        message: String,
        arguments: Vec<CliArgument>,
    },
    Error {
        message: String,
    },
}
