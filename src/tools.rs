//! Tool directory helpers.
//!
//! Pure functions over per-server tool catalogs: flattening them into a
//! tool-name lookup table and exporting them in the function-calling format
//! LLM chat APIs accept.

use crate::client::Tool;
use serde_json::{Value, json};
use std::collections::BTreeMap;

/// Flattens `(server, catalog)` pairs into `{tool_name: server_name}`.
///
/// Tool names are expected to be unique across servers; on a collision the
/// server that comes later in iteration order wins.
pub fn tool_server_map<I, S>(catalogs: I) -> BTreeMap<String, String>
where
    I: IntoIterator<Item = (S, Vec<Tool>)>,
    S: Into<String>,
{
    let mut map = BTreeMap::new();
    for (server, tools) in catalogs {
        let server = server.into();
        for tool in tools {
            if let Some(previous) = map.insert(tool.name.clone(), server.clone()) {
                if previous != server {
                    tracing::warn!(
                        tool = %tool.name,
                        shadowed = %previous,
                        server = %server,
                        "Tool name exposed by more than one server"
                    );
                }
            }
        }
    }
    map
}

/// Describes a tool as a `{"type": "function", ...}` entry for LLM function calling.
pub fn function_spec(tool: &Tool) -> Value {
    json!({
        "type": "function",
        "function": {
            "name": tool.name,
            "description": tool.description,
            "parameters": tool.input_schema,
        }
    })
}
