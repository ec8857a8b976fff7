use crate::config::{ManagerConfig, ServerDefinition};
use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// Validates a single server definition
pub fn validate_server_definition(name: &str, definition: &ServerDefinition) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::ConfigInvalid("Server name must not be empty".to_string()));
    }

    if definition.script.as_os_str().is_empty() {
        return Err(Error::ConfigInvalid(format!("Server '{}' has empty script", name)));
    }

    // Whether the script exists is checked at launch time, not here.

    if definition.port == Some(0) {
        return Err(Error::ConfigInvalid(format!("Server '{}' has port 0", name)));
    }

    Ok(())
}

/// Validates a map of server definitions
pub fn validate_server_definitions(definitions: &BTreeMap<String, ServerDefinition>) -> Result<()> {
    for (name, definition) in definitions {
        validate_server_definition(name, definition)?;
    }

    Ok(())
}

/// Full configuration validation
pub fn validate_config(config: &ManagerConfig) -> Result<()> {
    if config.interpreter.trim().is_empty() {
        return Err(Error::ConfigInvalid("Interpreter must not be empty".to_string()));
    }

    let range = config.port_range;
    if range.start == 0 || range.start > range.end {
        return Err(Error::ConfigInvalid(format!(
            "Invalid port range {}-{}",
            range.start, range.end
        )));
    }

    if !config.endpoint_path.starts_with('/') {
        return Err(Error::ConfigInvalid(format!(
            "Endpoint path '{}' must start with '/'",
            config.endpoint_path
        )));
    }

    validate_server_definitions(&config.mcp_servers)?;

    Ok(())
}
