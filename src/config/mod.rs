//! Configuration module for the server manager.
//!
//! This module handles parsing, validation, and access to the manager's
//! tunables (interpreter, port range, timeouts, log directory) and to the
//! named server definitions that can be started by name. Configurations
//! load from JSON or YAML files.
//!
//! # Examples
//!
//! Loading a configuration from a file:
//!
//! ```no_run
//! use mcp_server_manager::config::ManagerConfig;
//!
//! let config = ManagerConfig::from_file("servers.json").unwrap();
//! println!("Loaded configuration with {} servers", config.mcp_servers.len());
//! ```
//!
//! Creating a configuration programmatically:
//!
//! ```
//! use mcp_server_manager::{ServerManager, config::{ManagerConfig, PortRange}};
//!
//! let config = ManagerConfig {
//!     interpreter: "python3".to_string(),
//!     port_range: PortRange { start: 9000, end: 9100 },
//!     ..ManagerConfig::default()
//! };
//! let manager = ServerManager::new(config);
//! ```
mod parser;
pub mod validator;

pub use parser::{ManagerConfig, PortRange, ServerDefinition};
pub use validator::validate_config;
