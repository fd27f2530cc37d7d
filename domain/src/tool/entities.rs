//! Tool domain entities: descriptors and the per-session catalog.

use serde::{Deserialize, Serialize};

/// Metadata for one capability exposed by a tool server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name, unique within a session
    pub name: String,
    /// Human-readable description (may be empty)
    #[serde(default)]
    pub description: String,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Read-only snapshot of the tools known for the current connection.
///
/// Built once at startup (or on forced refresh) and replaced wholesale;
/// it is never mutated in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolCatalog {
    tools: Vec<ToolDescriptor>,
}

impl ToolCatalog {
    pub fn new(tools: Vec<ToolDescriptor>) -> Self {
        Self { tools }
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether a tool with exactly this name is known.
    pub fn contains(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name == name)
    }

    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.iter().find(|t| t.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tools.iter().map(|t| t.name.as_str())
    }
}

impl From<Vec<ToolDescriptor>> for ToolCatalog {
    fn from(tools: Vec<ToolDescriptor>) -> Self {
        Self::new(tools)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lookup() {
        let catalog = ToolCatalog::new(vec![
            ToolDescriptor::new("execute_sql", "Run a SQL query"),
            ToolDescriptor::new("list_tables", ""),
        ]);

        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains("execute_sql"));
        assert!(!catalog.contains("EXECUTE_SQL"));
        assert_eq!(catalog.get("list_tables").unwrap().description, "");
        assert_eq!(
            catalog.names().collect::<Vec<_>>(),
            vec!["execute_sql", "list_tables"]
        );
    }

    #[test]
    fn test_descriptor_description_defaults_to_empty() {
        let tool: ToolDescriptor = serde_json::from_str(r#"{"name": "ping"}"#).unwrap();
        assert_eq!(tool.name, "ping");
        assert!(tool.description.is_empty());
    }
}
