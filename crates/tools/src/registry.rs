//! Tool registry
//!
//! Holds the registered tools, exposes their schemas for discovery and
//! executes calls with validation and a per-tool timeout.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use maxwell_config::MailConfig;

use crate::email::Mailer;
use crate::mcp::{Tool, ToolError, ToolOutput, ToolSchema};
use crate::sales::{
    CreateFollowupTaskTool, GenerateProposalTool, GetNotesTool, ScheduleMeetingTool,
    SearchKnowledgeBaseTool, SendEmailTool, TakeNoteTool,
};
use crate::workspace::{AgentWorkspace, WorkspaceError};

/// Executes tools by name
#[async_trait]
pub trait ToolExecutor: Send + Sync {
    /// Execute a named tool with the given arguments
    async fn execute(&self, name: &str, arguments: Value) -> Result<ToolOutput, ToolError>;

    /// List schemas of all registered tools
    fn list_tools(&self) -> Vec<ToolSchema>;
}

/// Registry of available tools
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register one tool under its own name
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    /// Look up a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[async_trait]
impl ToolExecutor for ToolRegistry {
    async fn execute(&self, name: &str, arguments: Value) -> Result<ToolOutput, ToolError> {
        let tool = self
            .get(name)
            .ok_or_else(|| ToolError::not_found(format!("Tool not found: {}", name)))?;

        tool.validate(&arguments)?;

        let timeout = Duration::from_secs(tool.timeout_secs());
        match tokio::time::timeout(timeout, tool.execute(arguments)).await {
            Ok(result) => result,
            Err(_) => Err(ToolError::timeout(name, tool.timeout_secs())),
        }
    }

    fn list_tools(&self) -> Vec<ToolSchema> {
        let mut schemas: Vec<ToolSchema> = self.tools.values().map(|t| t.schema()).collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }
}

/// Build the default sales tool registry over one workspace directory
pub fn create_default_registry(
    work_dir: impl Into<std::path::PathBuf>,
    mail: MailConfig,
) -> Result<ToolRegistry, WorkspaceError> {
    let workspace = Arc::new(AgentWorkspace::new(work_dir)?);
    let mailer = Arc::new(Mailer::new(mail));

    let mut registry = ToolRegistry::new();
    registry.register(Arc::new(TakeNoteTool::new(workspace.clone())));
    registry.register(Arc::new(GetNotesTool::new(workspace.clone())));
    registry.register(Arc::new(SendEmailTool::new(workspace.clone(), mailer)));
    registry.register(Arc::new(ScheduleMeetingTool::new(workspace.clone())));
    registry.register(Arc::new(CreateFollowupTaskTool::new(workspace.clone())));
    registry.register(Arc::new(GenerateProposalTool::new(workspace)));
    registry.register(Arc::new(SearchKnowledgeBaseTool::new()));

    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn registry(dir: &TempDir) -> ToolRegistry {
        create_default_registry(dir.path().join("agent_data"), MailConfig::default()).unwrap()
    }

    #[test]
    fn test_default_registry_has_all_tools() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);

        assert_eq!(registry.len(), 7);
        let names: Vec<String> = registry.list_tools().into_iter().map(|s| s.name).collect();
        assert!(names.contains(&"take_note".to_string()));
        assert!(names.contains(&"send_email".to_string()));
        assert!(names.contains(&"search_knowledge_base".to_string()));
    }

    #[tokio::test]
    async fn test_execute_unknown_tool() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);

        let result = registry.execute("warp_drive", json!({})).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_execute_validates_input() {
        let dir = TempDir::new().unwrap();
        let registry = registry(&dir);

        // Missing required fields is rejected before execution.
        let result = registry.execute("take_note", json!({})).await;
        assert!(result.is_err());

        let result = registry
            .execute(
                "take_note",
                json!({
                    "contact_name": "Jane",
                    "company_name": "Acme",
                    "note_content": "hello",
                }),
            )
            .await
            .unwrap();
        assert_eq!(result.as_json().unwrap()["status"], "success");
    }
}
