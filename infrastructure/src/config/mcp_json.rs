//! MCP server descriptor (`mcp.json`)
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "sqlite": { "command": "uvx", "args": ["mcp-server-sqlite", "--db-path", "test.db"] },
//!     "remote": { "url": "http://localhost:8000/sse", "headers": { "Authorization": "Bearer x" } }
//!   },
//!   "defaultServer": "sqlite"
//! }
//! ```
//!
//! Server selection: explicit name, then `defaultServer`, then the first
//! entry in file order.

use super::settings::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_READ_TIMEOUT, McpServerSettings, McpTransportSettings,
    SettingsError, SseSettings, StdioSettings,
};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

/// Load the selected server from a descriptor file.
///
/// A missing file, or one without servers, means no tool server.
pub fn load_mcp_server(
    path: &Path,
    selection: Option<&str>,
) -> Result<Option<McpServerSettings>, SettingsError> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("{} not found; running without an MCP server", path.display());
            return Ok(None);
        }
        Err(source) => {
            return Err(SettingsError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    let value: Value = serde_json::from_str(&content).map_err(|source| SettingsError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    parse_mcp_servers(&value, selection)
}

/// Select and validate one server from a parsed descriptor.
pub fn parse_mcp_servers(
    value: &Value,
    selection: Option<&str>,
) -> Result<Option<McpServerSettings>, SettingsError> {
    let root = value
        .as_object()
        .ok_or_else(|| SettingsError::validation("$", "must be a JSON object"))?;

    let servers = match root.get("mcpServers") {
        Some(Value::Object(servers)) if !servers.is_empty() => servers,
        Some(value) if !is_blank(value) => {
            return Err(SettingsError::validation("mcpServers", "must be an object"));
        }
        _ => {
            debug!("mcpServers is empty; running without an MCP server");
            return Ok(None);
        }
    };

    let selection = selection.map(str::trim).filter(|name| !name.is_empty());
    let name = match selection {
        Some(name) => {
            if !servers.contains_key(name) {
                return Err(SettingsError::validation(
                    format!("mcpServers.{}", name),
                    "server is not defined",
                ));
            }
            name.to_string()
        }
        None => match root.get("defaultServer") {
            Some(Value::String(name)) if servers.contains_key(name.trim()) => {
                name.trim().to_string()
            }
            Some(Value::String(name)) => {
                return Err(SettingsError::validation(
                    "defaultServer",
                    format!("server '{}' is not defined in mcpServers", name),
                ));
            }
            // Anything other than a string is ignored
            _ => match servers.keys().next() {
                Some(first) => first.clone(),
                None => return Ok(None),
            },
        },
    };

    let field = format!("mcpServers.{}", name);
    let entry = servers[&name]
        .as_object()
        .ok_or_else(|| SettingsError::validation(&field, "must be an object"))?;

    let transport = match transport_kind(entry, &field)? {
        TransportKind::Stdio => McpTransportSettings::Stdio(parse_stdio(entry, &field)?),
        TransportKind::Sse => McpTransportSettings::Sse(parse_sse(entry, &field)?),
    };

    info!("Selected MCP server '{}' ({})", name, transport.kind());
    Ok(Some(McpServerSettings { name, transport }))
}

enum TransportKind {
    Stdio,
    Sse,
}

/// JSON values treated as "not set": null, false, zero and empty containers.
fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(flag) => !flag,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
    }
}

fn transport_kind(entry: &Map<String, Value>, field: &str) -> Result<TransportKind, SettingsError> {
    let declared = match entry.get("transport") {
        Some(Value::String(kind)) => Some(Value::String(kind.trim().to_ascii_lowercase())),
        other => other.cloned(),
    };

    match declared.as_ref() {
        None => infer_transport(entry, field),
        Some(value) if is_blank(value) => infer_transport(entry, field),
        Some(Value::String(kind)) => match kind.as_str() {
            "stdio" => Ok(TransportKind::Stdio),
            "sse" => Ok(TransportKind::Sse),
            other => Err(SettingsError::validation(
                format!("{}.transport", field),
                format!("unsupported transport '{}' (expected stdio or sse)", other),
            )),
        },
        Some(_) => Err(SettingsError::validation(
            format!("{}.transport", field),
            "must be a string",
        )),
    }
}

fn infer_transport(entry: &Map<String, Value>, field: &str) -> Result<TransportKind, SettingsError> {
    if entry.contains_key("command") {
        Ok(TransportKind::Stdio)
    } else if entry.contains_key("url") {
        Ok(TransportKind::Sse)
    } else {
        Err(SettingsError::validation(
            field,
            "cannot infer transport; set 'command' (stdio) or 'url' (sse)",
        ))
    }
}

fn parse_stdio(entry: &Map<String, Value>, field: &str) -> Result<StdioSettings, SettingsError> {
    let command = required_string(entry, "command", field)?;

    let args = match entry.get("args") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    SettingsError::validation(format!("{}.args[{}]", field, i), "must be a string")
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => {
            return Err(SettingsError::validation(
                format!("{}.args", field),
                "must be an array of strings",
            ));
        }
    };

    Ok(StdioSettings {
        command,
        args,
        env: string_map(entry.get("env"), &format!("{}.env", field))?,
    })
}

fn parse_sse(entry: &Map<String, Value>, field: &str) -> Result<SseSettings, SettingsError> {
    Ok(SseSettings {
        url: required_string(entry, "url", field)?,
        headers: string_map(entry.get("headers"), &format!("{}.headers", field))?,
        timeout: seconds(
            entry.get("timeout"),
            &format!("{}.timeout", field),
            DEFAULT_CONNECT_TIMEOUT,
        )?,
        read_timeout: seconds(
            entry.get("readTimeout"),
            &format!("{}.readTimeout", field),
            DEFAULT_READ_TIMEOUT,
        )?,
    })
}

fn required_string(
    entry: &Map<String, Value>,
    key: &str,
    field: &str,
) -> Result<String, SettingsError> {
    match entry.get(key) {
        Some(Value::String(value)) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        Some(Value::String(_)) => Err(SettingsError::validation(
            format!("{}.{}", field, key),
            "cannot be empty",
        )),
        None | Some(Value::Null) => Err(SettingsError::validation(
            format!("{}.{}", field, key),
            "is required",
        )),
        Some(_) => Err(SettingsError::validation(
            format!("{}.{}", field, key),
            "must be a string",
        )),
    }
}

fn string_map(value: Option<&Value>, field: &str) -> Result<BTreeMap<String, String>, SettingsError> {
    match value {
        None | Some(Value::Null) => Ok(BTreeMap::new()),
        Some(Value::Object(map)) => map
            .iter()
            .map(|(key, value)| match value {
                Value::String(value) => Ok((key.clone(), value.clone())),
                _ => Err(SettingsError::validation(
                    format!("{}.{}", field, key),
                    "must be a string",
                )),
            })
            .collect(),
        Some(_) => Err(SettingsError::validation(
            field,
            "must be an object of string values",
        )),
    }
}

/// Seconds as a number or numeric string.
fn seconds(value: Option<&Value>, field: &str, default: Duration) -> Result<Duration, SettingsError> {
    let seconds = match value {
        None | Some(Value::Null) => return Ok(default),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    seconds
        .filter(|s| *s > 0.0)
        .and_then(|s| Duration::try_from_secs_f64(s).ok())
        .ok_or_else(|| SettingsError::validation(field, "must be a positive number of seconds"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field_of(err: SettingsError) -> String {
        match err {
            SettingsError::Validation { field, .. } => field,
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_first_server_is_default() {
        let value = json!({"mcpServers": {
            "zeta": {"command": "uvx", "args": ["mcp-server-sqlite"]},
            "alpha": {"url": "http://localhost:8000/sse"}
        }});
        let server = parse_mcp_servers(&value, None).unwrap().unwrap();

        assert_eq!(server.name, "zeta");
        assert_eq!(
            server.transport,
            McpTransportSettings::Stdio(StdioSettings {
                command: "uvx".to_string(),
                args: vec!["mcp-server-sqlite".to_string()],
                env: BTreeMap::new(),
            })
        );
    }

    #[test]
    fn test_default_server_and_explicit_selection() {
        let value = json!({
            "mcpServers": {
                "a": {"command": "a"},
                "b": {"url": "http://localhost:8000/sse", "timeout": "2.5", "readTimeout": 60}
            },
            "defaultServer": "b"
        });

        let server = parse_mcp_servers(&value, None).unwrap().unwrap();
        match server.transport {
            McpTransportSettings::Sse(sse) => {
                assert_eq!(sse.timeout, Duration::from_millis(2500));
                assert_eq!(sse.read_timeout, Duration::from_secs(60));
            }
            other => panic!("Expected sse, got {:?}", other),
        }

        let server = parse_mcp_servers(&value, Some("a")).unwrap().unwrap();
        assert_eq!(server.name, "a");
    }

    #[test]
    fn test_undefined_selection_is_an_error() {
        let value = json!({"mcpServers": {"a": {"command": "a"}}});
        assert_eq!(
            field_of(parse_mcp_servers(&value, Some("missing")).unwrap_err()),
            "mcpServers.missing"
        );

        let value = json!({"mcpServers": {"a": {"command": "a"}}, "defaultServer": "nope"});
        assert_eq!(
            field_of(parse_mcp_servers(&value, None).unwrap_err()),
            "defaultServer"
        );
    }

    #[test]
    fn test_no_servers() {
        assert!(parse_mcp_servers(&json!({}), None).unwrap().is_none());
        assert!(
            parse_mcp_servers(&json!({"mcpServers": {}}), None)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_blank_servers_mean_no_tool_server() {
        for servers in [json!([]), json!(""), json!(false), json!(0), json!(null)] {
            let value = json!({"mcpServers": servers});
            assert!(parse_mcp_servers(&value, None).unwrap().is_none());
        }

        let value = json!({"mcpServers": ["a"]});
        assert_eq!(
            field_of(parse_mcp_servers(&value, None).unwrap_err()),
            "mcpServers"
        );
    }

    #[test]
    fn test_non_string_default_server_falls_back_to_first() {
        let value = json!({
            "mcpServers": {"first": {"command": "a"}, "second": {"command": "b"}},
            "defaultServer": 5
        });
        let server = parse_mcp_servers(&value, None).unwrap().unwrap();
        assert_eq!(server.name, "first");
    }

    #[test]
    fn test_blank_transport_is_inferred() {
        let value = json!({"mcpServers": {"s": {"transport": "  ", "command": "uvx"}}});
        let server = parse_mcp_servers(&value, None).unwrap().unwrap();
        assert_eq!(server.transport.kind(), "stdio");

        let value = json!({"mcpServers": {"s": {"transport": "", "url": "http://x/sse"}}});
        let server = parse_mcp_servers(&value, None).unwrap().unwrap();
        assert_eq!(server.transport.kind(), "sse");

        let value = json!({"mcpServers": {"s": {"transport": 3, "command": "uvx"}}});
        assert_eq!(
            field_of(parse_mcp_servers(&value, None).unwrap_err()),
            "mcpServers.s.transport"
        );
    }

    #[test]
    fn test_explicit_transport_is_case_insensitive() {
        let value = json!({"mcpServers": {"s": {"transport": " SSE ", "url": "http://x/sse"}}});
        let server = parse_mcp_servers(&value, None).unwrap().unwrap();
        assert_eq!(server.transport.kind(), "sse");

        let value = json!({"mcpServers": {"s": {"transport": "websocket", "url": "ws://x"}}});
        assert_eq!(
            field_of(parse_mcp_servers(&value, None).unwrap_err()),
            "mcpServers.s.transport"
        );

        let value = json!({"mcpServers": {"s": {"name": "neither"}}});
        assert_eq!(
            field_of(parse_mcp_servers(&value, None).unwrap_err()),
            "mcpServers.s"
        );
    }

    #[test]
    fn test_field_paths_in_errors() {
        let cases = [
            (json!({"command": "  "}), "mcpServers.s.command"),
            (json!({"command": "x", "args": ["ok", 3]}), "mcpServers.s.args[1]"),
            (json!({"command": "x", "args": "a b"}), "mcpServers.s.args"),
            (json!({"command": "x", "env": {"PATH": 1}}), "mcpServers.s.env.PATH"),
            (json!({"url": "http://x", "headers": []}), "mcpServers.s.headers"),
            (json!({"url": "http://x", "timeout": "soon"}), "mcpServers.s.timeout"),
            (json!({"url": "http://x", "readTimeout": -1}), "mcpServers.s.readTimeout"),
            (json!({"url": "http://x", "timeout": 1e300}), "mcpServers.s.timeout"),
            (json!({"url": "http://x", "readTimeout": "inf"}), "mcpServers.s.readTimeout"),
        ];

        for (entry, expected) in cases {
            let value = json!({"mcpServers": {"s": entry}});
            assert_eq!(field_of(parse_mcp_servers(&value, None).unwrap_err()), expected);
        }
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mcp.json");

        assert!(load_mcp_server(&path, None).unwrap().is_none());

        std::fs::write(&path, r#"{"mcpServers": {"db": {"command": "python", "env": {"DB": "test.db"}}}}"#)
            .unwrap();
        let server = load_mcp_server(&path, None).unwrap().unwrap();
        match server.transport {
            McpTransportSettings::Stdio(stdio) => assert_eq!(stdio.env["DB"], "test.db"),
            other => panic!("Expected stdio, got {:?}", other),
        }

        std::fs::write(&path, "{").unwrap();
        assert!(matches!(
            load_mcp_server(&path, None),
            Err(SettingsError::Json { .. })
        ));
    }
}
