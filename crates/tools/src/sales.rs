//! Sales domain tools
//!
//! The cold-calling toolset: notes, email, meetings, follow-up tasks,
//! proposals and the knowledge-base search. Each tool wraps the shared
//! [`AgentWorkspace`] and reports the uniform `{status, message, payload}`
//! result shape; domain failures come back as an error result, never as a
//! panic or a transport-level failure.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::email::{EmailRequest, MailError, Mailer};
use crate::knowledge::KnowledgeBase;
use crate::mcp::{InputSchema, PropertySchema, Tool, ToolError, ToolOutput, ToolSchema};
use crate::workspace::{render_template, AgentWorkspace, NoteFilter, WorkspaceError};

fn success(message: impl Into<String>) -> Value {
    json!({ "status": "success", "message": message.into() })
}

fn failure(message: impl Into<String>) -> Value {
    json!({ "status": "error", "message": message.into() })
}

fn required_str<'a>(input: &'a Value, field: &str) -> Result<&'a str, ToolError> {
    input
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::invalid_params(format!("{} is required", field)))
}

fn optional_str(input: &Value, field: &str) -> Option<String> {
    input
        .get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

fn string_list(input: &Value, field: &str) -> Vec<String> {
    input
        .get(field)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

fn workspace_failure(action: &str, e: WorkspaceError) -> ToolOutput {
    tracing::warn!("{} failed: {}", action, e);
    ToolOutput::json(failure(format!("Failed to {}: {}", action, e)))
}

/// Take a note about a conversation or contact
pub struct TakeNoteTool {
    workspace: Arc<AgentWorkspace>,
}

impl TakeNoteTool {
    pub fn new(workspace: Arc<AgentWorkspace>) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for TakeNoteTool {
    fn name(&self) -> &str {
        "take_note"
    }

    fn description(&self) -> &str {
        "Take a note about a conversation or contact for later follow-up"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: InputSchema::object()
                .property("contact_name", PropertySchema::string("Name of the contact"), true)
                .property("company_name", PropertySchema::string("Name of the company"), true)
                .property("note_content", PropertySchema::string("Content of the note"), true)
                .property("tags", PropertySchema::string_array("Tags for categorization"), false),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        let contact = required_str(&input, "contact_name")?;
        let company = required_str(&input, "company_name")?;
        let content = required_str(&input, "note_content")?;
        let tags = string_list(&input, "tags");

        match self.workspace.take_note(contact, company, content, tags) {
            Ok(note) => {
                let mut result = success(format!("Note created successfully with ID: {}", note.id));
                result["note"] = serde_json::to_value(&note).unwrap_or(Value::Null);
                Ok(ToolOutput::json(result))
            }
            Err(e) => Ok(workspace_failure("create note", e)),
        }
    }
}

/// Retrieve notes matching filters
pub struct GetNotesTool {
    workspace: Arc<AgentWorkspace>,
}

impl GetNotesTool {
    pub fn new(workspace: Arc<AgentWorkspace>) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for GetNotesTool {
    fn name(&self) -> &str {
        "get_notes"
    }

    fn description(&self) -> &str {
        "Retrieve stored notes, filtered by contact, company or tags"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: InputSchema::object()
                .property("contact_name", PropertySchema::string("Filter by contact name"), false)
                .property("company_name", PropertySchema::string("Filter by company name"), false)
                .property("tags", PropertySchema::string_array("Filter by tags"), false),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        let filter = NoteFilter {
            contact_name: optional_str(&input, "contact_name"),
            company_name: optional_str(&input, "company_name"),
            tags: string_list(&input, "tags"),
        };

        match self.workspace.get_notes(&filter) {
            Ok(notes) => {
                let mut result = success(format!("Found {} notes", notes.len()));
                result["count"] = json!(notes.len());
                result["notes"] = serde_json::to_value(&notes).unwrap_or_else(|_| json!([]));
                Ok(ToolOutput::json(result))
            }
            Err(e) => {
                let mut result = failure(format!("Failed to retrieve notes: {}", e));
                result["notes"] = json!([]);
                Ok(ToolOutput::json(result))
            }
        }
    }
}

/// Send an email, optionally rendered from a named template
pub struct SendEmailTool {
    workspace: Arc<AgentWorkspace>,
    mailer: Arc<Mailer>,
}

impl SendEmailTool {
    pub fn new(workspace: Arc<AgentWorkspace>, mailer: Arc<Mailer>) -> Self {
        Self { workspace, mailer }
    }
}

#[async_trait]
impl Tool for SendEmailTool {
    fn name(&self) -> &str {
        "send_email"
    }

    fn description(&self) -> &str {
        "Send an email to a contact, optionally from a named template"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: InputSchema::object()
                .property("to_email", PropertySchema::string("Recipient email address"), true)
                .property("subject", PropertySchema::string("Email subject"), false)
                .property("body", PropertySchema::string("Email body text"), false)
                .property("cc", PropertySchema::string_array("CC recipients"), false)
                .property("bcc", PropertySchema::string_array("BCC recipients"), false)
                .property("template_name", PropertySchema::string("Template to render"), false)
                .property(
                    "template_variables",
                    PropertySchema::object("Placeholder values for the template"),
                    false,
                ),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        let to = required_str(&input, "to_email")?;
        let mut subject = optional_str(&input, "subject").unwrap_or_default();
        let mut body = optional_str(&input, "body").unwrap_or_default();
        let cc = string_list(&input, "cc");
        let bcc = string_list(&input, "bcc");

        // Template rendering may supply both subject and body.
        if let Some(template_name) = optional_str(&input, "template_name") {
            match self.workspace.load_template("email", &template_name) {
                Some(template) => {
                    let variables: Vec<(String, String)> = input
                        .get("template_variables")
                        .and_then(Value::as_object)
                        .map(|obj| {
                            obj.iter()
                                .filter_map(|(k, v)| {
                                    v.as_str().map(|s| (k.clone(), s.to_string()))
                                })
                                .collect()
                        })
                        .unwrap_or_default();

                    let (template_subject, template_body) = render_template(&template, &variables);
                    if let Some(s) = template_subject {
                        subject = s;
                    }
                    body = template_body;
                }
                None => {
                    return Ok(ToolOutput::json(failure(format!(
                        "Unknown email template: {}",
                        template_name
                    ))));
                }
            }
        }

        let request = EmailRequest {
            to: to.to_string(),
            subject: subject.clone(),
            body,
            cc: cc.clone(),
            bcc: bcc.clone(),
        };

        match self.mailer.send(&request).await {
            Ok(()) => {
                if let Err(e) = self.workspace.log_email(to, &subject, &cc, &bcc) {
                    tracing::warn!("Failed to log sent email: {}", e);
                }
                Ok(ToolOutput::json(success(format!(
                    "Email sent successfully to {}",
                    to
                ))))
            }
            Err(e @ MailError::NotConfigured) => Ok(ToolOutput::json(failure(e.to_string()))),
            Err(e) => Ok(ToolOutput::json(failure(format!(
                "Failed to send email: {}",
                e
            )))),
        }
    }

    /// SMTP relays can be slow to answer
    fn timeout_secs(&self) -> u64 {
        60
    }
}

/// Schedule a meeting with a contact
pub struct ScheduleMeetingTool {
    workspace: Arc<AgentWorkspace>,
}

impl ScheduleMeetingTool {
    pub fn new(workspace: Arc<AgentWorkspace>) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for ScheduleMeetingTool {
    fn name(&self) -> &str {
        "schedule_meeting"
    }

    fn description(&self) -> &str {
        "Schedule a meeting with a contact"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: InputSchema::object()
                .property("contact_name", PropertySchema::string("Name of the contact"), true)
                .property("email", PropertySchema::string("Email of the contact"), true)
                .property("date", PropertySchema::string("Date of the meeting (YYYY-MM-DD)"), true)
                .property("time", PropertySchema::string("Time of the meeting (HH:MM)"), true)
                .property("duration", PropertySchema::integer("Duration in minutes"), true)
                .property("topic", PropertySchema::string("Meeting topic"), true)
                .property(
                    "meeting_type",
                    PropertySchema::enum_type(
                        "Type of meeting",
                        vec!["zoom".into(), "teams".into(), "phone".into(), "in_person".into()],
                    )
                    .with_default(json!("zoom")),
                    false,
                ),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        let contact = required_str(&input, "contact_name")?;
        let email = required_str(&input, "email")?;
        let date = required_str(&input, "date")?;
        let time = required_str(&input, "time")?;
        let duration = input
            .get("duration")
            .and_then(Value::as_u64)
            .ok_or_else(|| ToolError::invalid_params("duration is required"))? as u32;
        let topic = required_str(&input, "topic")?;
        let meeting_type = optional_str(&input, "meeting_type").unwrap_or_else(|| "zoom".into());

        match self
            .workspace
            .schedule_meeting(contact, email, date, time, duration, topic, &meeting_type)
        {
            Ok(meeting) => {
                let mut result = success(format!(
                    "Meeting scheduled successfully for {} at {}",
                    date, time
                ));
                result["meeting"] = serde_json::to_value(&meeting).unwrap_or(Value::Null);
                Ok(ToolOutput::json(result))
            }
            Err(e) => Ok(workspace_failure("schedule meeting", e)),
        }
    }
}

/// Create a follow-up task for a contact
pub struct CreateFollowupTaskTool {
    workspace: Arc<AgentWorkspace>,
}

impl CreateFollowupTaskTool {
    pub fn new(workspace: Arc<AgentWorkspace>) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for CreateFollowupTaskTool {
    fn name(&self) -> &str {
        "create_followup_task"
    }

    fn description(&self) -> &str {
        "Create a follow-up task for a contact"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: InputSchema::object()
                .property("contact_name", PropertySchema::string("Name of the contact"), true)
                .property("company_name", PropertySchema::string("Name of the company"), true)
                .property("followup_date", PropertySchema::string("Date for the follow-up (YYYY-MM-DD)"), true)
                .property(
                    "followup_type",
                    PropertySchema::enum_type(
                        "Type of follow-up",
                        vec!["call".into(), "email".into(), "meeting".into()],
                    ),
                    true,
                )
                .property("notes", PropertySchema::string("Additional notes"), false),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        let contact = required_str(&input, "contact_name")?;
        let company = required_str(&input, "company_name")?;
        let date = required_str(&input, "followup_date")?;
        let followup_type = required_str(&input, "followup_type")?;
        let notes = optional_str(&input, "notes").unwrap_or_default();

        match self
            .workspace
            .create_followup_task(contact, company, date, followup_type, &notes)
        {
            Ok(task) => {
                let mut result = success(format!("Follow-up task created for {}", date));
                result["task"] = serde_json::to_value(&task).unwrap_or(Value::Null);
                Ok(ToolOutput::json(result))
            }
            Err(e) => Ok(workspace_failure("create follow-up task", e)),
        }
    }
}

/// Generate a sales proposal from conversation findings
pub struct GenerateProposalTool {
    workspace: Arc<AgentWorkspace>,
}

impl GenerateProposalTool {
    pub fn new(workspace: Arc<AgentWorkspace>) -> Self {
        Self { workspace }
    }
}

#[async_trait]
impl Tool for GenerateProposalTool {
    fn name(&self) -> &str {
        "generate_proposal"
    }

    fn description(&self) -> &str {
        "Generate a sales proposal based on conversation findings"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: InputSchema::object()
                .property("company_name", PropertySchema::string("Company name"), true)
                .property("contact_name", PropertySchema::string("Contact name"), true)
                .property("pain_points", PropertySchema::string_array("Identified pain points"), true)
                .property("solutions", PropertySchema::string_array("Proposed solutions"), true)
                .property("timeline", PropertySchema::string("Project timeline"), true)
                .property("budget_range", PropertySchema::string("Estimated budget range"), true),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        let company = required_str(&input, "company_name")?;
        let contact = required_str(&input, "contact_name")?;
        let timeline = required_str(&input, "timeline")?;
        let budget = required_str(&input, "budget_range")?;
        let pain_points = string_list(&input, "pain_points");
        let solutions = string_list(&input, "solutions");

        match self
            .workspace
            .generate_proposal(company, contact, pain_points, solutions, timeline, budget)
        {
            Ok((proposal, path)) => {
                let mut result = success(format!("Proposal generated for {}", company));
                result["proposal"] = serde_json::to_value(&proposal).unwrap_or(Value::Null);
                result["file_path"] = json!(path.display().to_string());
                Ok(ToolOutput::json(result))
            }
            Err(e) => Ok(workspace_failure("generate proposal", e)),
        }
    }
}

/// Search the mocked company knowledge base
pub struct SearchKnowledgeBaseTool {
    knowledge: KnowledgeBase,
}

impl SearchKnowledgeBaseTool {
    pub fn new() -> Self {
        Self {
            knowledge: KnowledgeBase::new(),
        }
    }
}

#[async_trait]
impl Tool for SearchKnowledgeBaseTool {
    fn name(&self) -> &str {
        "search_knowledge_base"
    }

    fn description(&self) -> &str {
        "Search the company knowledge base for frameworks and collateral"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            input_schema: InputSchema::object()
                .property("query", PropertySchema::string("Search query"), true)
                .property(
                    "category",
                    PropertySchema::enum_type(
                        "Category to search within",
                        vec![
                            "AI Strategy".into(),
                            "Digital Transformation".into(),
                            "Market Intelligence".into(),
                        ],
                    ),
                    false,
                ),
        }
    }

    async fn execute(&self, input: Value) -> Result<ToolOutput, ToolError> {
        let query = required_str(&input, "query")?;
        let category = optional_str(&input, "category");

        let results = self.knowledge.search(category.as_deref());

        let mut result = success(format!("Found {} results", results.len()));
        result["query"] = json!(query);
        result["category"] = json!(category);
        result["results_count"] = json!(results.len());
        result["results"] = serde_json::to_value(&results).unwrap_or_else(|_| json!([]));
        Ok(ToolOutput::json(result))
    }
}

impl Default for SearchKnowledgeBaseTool {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maxwell_config::MailConfig;
    use tempfile::TempDir;

    fn workspace(dir: &TempDir) -> Arc<AgentWorkspace> {
        Arc::new(AgentWorkspace::new(dir.path().join("agent_data")).unwrap())
    }

    #[tokio::test]
    async fn test_take_note_then_get_notes_roundtrip() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir);

        let take = TakeNoteTool::new(ws.clone());
        let output = take
            .execute(json!({
                "contact_name": "Jane Smith",
                "company_name": "Acme Corp",
                "note_content": "Wants an AI roadmap by Q4",
                "tags": ["hot-lead"],
            }))
            .await
            .unwrap();
        let created = output.as_json().unwrap();
        assert_eq!(created["status"], "success");

        let get = GetNotesTool::new(ws);
        let output = get
            .execute(json!({ "contact_name": "jane" }))
            .await
            .unwrap();
        let found = output.as_json().unwrap();
        assert_eq!(found["status"], "success");
        assert_eq!(found["count"], 1);
        assert_eq!(found["notes"][0]["company_name"], "Acme Corp");

        let get2 = GetNotesTool::new(workspace(&dir));
        let output = get2
            .execute(json!({ "contact_name": "somebody else" }))
            .await
            .unwrap();
        assert_eq!(output.as_json().unwrap()["count"], 0);
    }

    #[tokio::test]
    async fn test_take_note_requires_contact() {
        let dir = TempDir::new().unwrap();
        let tool = TakeNoteTool::new(workspace(&dir));

        let result = tool
            .execute(json!({ "company_name": "Acme", "note_content": "x" }))
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_send_email_without_credentials_is_error_result() {
        let dir = TempDir::new().unwrap();
        let tool = SendEmailTool::new(
            workspace(&dir),
            Arc::new(Mailer::new(MailConfig::default())),
        );

        let output = tool
            .execute(json!({
                "to_email": "prospect@example.com",
                "subject": "Hello",
                "body": "Quick note",
            }))
            .await
            .unwrap();

        let result = output.as_json().unwrap();
        assert_eq!(result["status"], "error");
        assert!(result["message"]
            .as_str()
            .unwrap()
            .contains("configuration is incomplete"));

        // No send means no email log either.
        assert!(!dir
            .path()
            .join("agent_data/email_logs/email_log.json")
            .exists());
    }

    #[tokio::test]
    async fn test_send_email_unknown_template_is_error_result() {
        let dir = TempDir::new().unwrap();
        let tool = SendEmailTool::new(
            workspace(&dir),
            Arc::new(Mailer::new(MailConfig::default())),
        );

        let output = tool
            .execute(json!({
                "to_email": "prospect@example.com",
                "template_name": "nonexistent",
            }))
            .await
            .unwrap();

        let result = output.as_json().unwrap();
        assert_eq!(result["status"], "error");
        assert!(result["message"].as_str().unwrap().contains("Unknown email template"));
    }

    #[tokio::test]
    async fn test_schedule_meeting_tool() {
        let dir = TempDir::new().unwrap();
        let tool = ScheduleMeetingTool::new(workspace(&dir));

        let output = tool
            .execute(json!({
                "contact_name": "Jane",
                "email": "jane@acme.com",
                "date": "2025-09-01",
                "time": "15:00",
                "duration": 30,
                "topic": "AI roadmap",
            }))
            .await
            .unwrap();

        let result = output.as_json().unwrap();
        assert_eq!(result["status"], "success");
        assert_eq!(result["meeting"]["meeting_type"], "zoom");
        assert_eq!(result["meeting"]["status"], "scheduled");
    }

    #[tokio::test]
    async fn test_followup_and_proposal_tools() {
        let dir = TempDir::new().unwrap();
        let ws = workspace(&dir);

        let followup = CreateFollowupTaskTool::new(ws.clone());
        let output = followup
            .execute(json!({
                "contact_name": "Jane",
                "company_name": "Acme",
                "followup_date": "2025-09-10",
                "followup_type": "call",
            }))
            .await
            .unwrap();
        assert_eq!(output.as_json().unwrap()["status"], "success");

        let proposal = GenerateProposalTool::new(ws);
        let output = proposal
            .execute(json!({
                "company_name": "Acme",
                "contact_name": "Jane",
                "pain_points": ["slow reporting"],
                "solutions": ["AI dashboards"],
                "timeline": "3 months",
                "budget_range": "50-80k",
            }))
            .await
            .unwrap();
        let result = output.as_json().unwrap();
        assert_eq!(result["status"], "success");
        assert!(result["file_path"].as_str().unwrap().contains("proposal_"));
    }

    #[tokio::test]
    async fn test_search_knowledge_base_fixed_category() {
        let tool = SearchKnowledgeBaseTool::new();

        let output = tool
            .execute(json!({ "query": "AI", "category": "AI Strategy" }))
            .await
            .unwrap();

        let result = output.as_json().unwrap();
        assert_eq!(result["status"], "success");
        assert_eq!(result["results_count"], 2);
        assert_eq!(result["results"][0]["title"], "AI Strategy Framework");
        assert_eq!(result["results"][0]["relevance"], 0.95);
        assert_eq!(result["results"][1]["title"], "AI ROI Calculator");
        assert_eq!(result["results"][1]["relevance"], 0.85);
    }
}
