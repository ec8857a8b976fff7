use assert_fs::prelude::*;
use mcp_server_manager::config::validator::validate_server_definition;
use mcp_server_manager::config::{ManagerConfig, PortRange, ServerDefinition, validate_config};
use mcp_server_manager::error::{Error, Result};
use std::path::PathBuf;

#[test]
fn test_parse_config() -> Result<()> {
    let config_str = r#"{
        "interpreter": "python3.11",
        "portRange": { "start": 9000, "end": 9010 },
        "logDir": "logs",
        "warmupDelayMs": 500,
        "mcpServers": {
            "random": {
                "script": "servers/random_server.py",
                "args": { "seed": 42, "verbose": true }
            },
            "ascii": {
                "script": "servers/ascii_server.py",
                "port": 8765,
                "logFile": "ascii.log"
            }
        }
    }"#;

    let config = ManagerConfig::parse_from_str(config_str)?;

    assert_eq!(config.interpreter, "python3.11");
    assert_eq!(config.port_range, PortRange { start: 9000, end: 9010 });
    assert_eq!(config.log_dir, PathBuf::from("logs"));
    assert_eq!(config.warmup_delay_ms, 500);
    // Unspecified tunables keep their defaults
    assert_eq!(config.stop_timeout_ms, 3000);
    assert_eq!(config.host, "127.0.0.1");

    assert_eq!(config.mcp_servers.len(), 2);

    let random = &config.mcp_servers["random"];
    assert_eq!(random.script, PathBuf::from("servers/random_server.py"));
    assert_eq!(random.port, None);
    assert_eq!(random.launch_args().to_cli_args(), vec!["--seed", "42", "--verbose"]);

    let ascii = &config.mcp_servers["ascii"];
    assert_eq!(ascii.port, Some(8765));
    assert_eq!(ascii.log_file, Some(PathBuf::from("ascii.log")));
    assert!(ascii.launch_args().is_empty());

    Ok(())
}

#[test]
fn test_parse_yaml_config() -> Result<()> {
    let config_str = r#"
interpreter: python3
endpointPath: /rpc
mcpServers:
  random:
    script: random_server.py
    args:
      count: 3
      label: dice
"#;

    let config = ManagerConfig::parse_from_yaml(config_str)?;

    assert_eq!(config.endpoint_path, "/rpc");
    assert_eq!(config.endpoint_url(8700), "http://127.0.0.1:8700/rpc");
    assert_eq!(
        config.mcp_servers["random"].launch_args().to_cli_args(),
        vec!["--count", "3", "--label", "dice"]
    );

    Ok(())
}

#[test]
fn test_from_file_picks_format_by_extension() -> Result<()> {
    let temp = assert_fs::TempDir::new().unwrap();

    let json_file = temp.child("servers.json");
    json_file
        .write_str(r#"{"mcpServers": {"a": {"script": "a_server.py"}}}"#)
        .unwrap();
    let yaml_file = temp.child("servers.yml");
    yaml_file
        .write_str("mcpServers:\n  b:\n    script: b_server.py\n")
        .unwrap();

    let from_json = ManagerConfig::from_file(json_file.path())?;
    assert!(from_json.mcp_servers.contains_key("a"));

    let from_yaml = ManagerConfig::from_file(yaml_file.path())?;
    assert!(from_yaml.mcp_servers.contains_key("b"));

    Ok(())
}

#[test]
fn test_missing_file_is_parse_error() {
    let result = ManagerConfig::from_file("/nonexistent/servers.json");
    assert!(matches!(result, Err(Error::ConfigParse(_))));
}

#[test]
fn test_malformed_config_is_parse_error() {
    let result = ManagerConfig::parse_from_str(r#"{"mcpServers": {"a": {}}}"#);
    assert!(matches!(result, Err(Error::ConfigParse(_))));
}

#[test]
fn test_validate_config() -> Result<()> {
    validate_config(&ManagerConfig::default())?;

    let inverted = ManagerConfig {
        port_range: PortRange { start: 9000, end: 8000 },
        ..ManagerConfig::default()
    };
    assert!(matches!(validate_config(&inverted), Err(Error::ConfigInvalid(_))));

    let no_interpreter = ManagerConfig {
        interpreter: "  ".to_string(),
        ..ManagerConfig::default()
    };
    assert!(validate_config(&no_interpreter).is_err());

    let relative_endpoint = ManagerConfig {
        endpoint_path: "mcp".to_string(),
        ..ManagerConfig::default()
    };
    assert!(validate_config(&relative_endpoint).is_err());

    Ok(())
}

#[test]
fn test_validate_server_definition() {
    let valid = ServerDefinition {
        script: PathBuf::from("random_server.py"),
        port: Some(8765),
        log_file: None,
        args: Default::default(),
    };
    assert!(validate_server_definition("random", &valid).is_ok());

    let empty_script = ServerDefinition {
        script: PathBuf::new(),
        ..valid.clone()
    };
    assert!(validate_server_definition("random", &empty_script).is_err());

    let zero_port = ServerDefinition {
        port: Some(0),
        ..valid.clone()
    };
    assert!(validate_server_definition("random", &zero_port).is_err());

    assert!(validate_server_definition("", &valid).is_err());
}

#[test]
fn test_invalid_definition_rejected_on_parse() {
    let result = ManagerConfig::parse_from_str(r#"{"mcpServers": {"a": {"script": "a.py", "port": 0}}}"#);
    match result {
        Err(Error::ConfigInvalid(msg)) => assert!(msg.contains("'a'")),
        other => panic!("Expected ConfigInvalid, got: {:?}", other.map(|_| ())),
    }
}
