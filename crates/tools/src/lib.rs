//! Sales tools for the Maxwell voice assistant
//!
//! Implements an MCP-compatible tool interface with file-backed CRUD tools
//! for the cold-calling workflow: notes, emails, meetings, follow-up tasks,
//! proposals and a mocked knowledge-base search. Every tool returns the
//! uniform `{status, message, payload}` result shape.

pub mod email;
pub mod knowledge;
pub mod mcp;
pub mod registry;
pub mod sales;
pub mod workspace;

pub use email::{EmailRequest, Mailer};
pub use knowledge::{KbEntry, KnowledgeBase};
pub use mcp::{
    ContentBlock, InputSchema, PropertySchema, Tool, ToolError, ToolOutput, ToolSchema,
};
pub use registry::{create_default_registry, ToolExecutor, ToolRegistry};
pub use sales::{
    CreateFollowupTaskTool, GenerateProposalTool, GetNotesTool, ScheduleMeetingTool,
    SearchKnowledgeBaseTool, SendEmailTool, TakeNoteTool,
};
pub use workspace::{AgentWorkspace, Meeting, Note, NoteFilter, Proposal, Task, WorkspaceError};
