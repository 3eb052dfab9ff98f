//! Agent workspace
//!
//! File-backed storage for the sales tools: one JSON document per note,
//! meeting, follow-up task and proposal, each in its own subdirectory of
//! the working directory, plus message templates and the email send log.
//! There are no cross-file transactions; every operation stands alone.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;
use uuid::Uuid;

/// Workspace error types
#[derive(Error, Debug)]
pub enum WorkspaceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A note about a conversation or contact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub contact_name: String,
    pub company_name: String,
    pub content: String,
    pub tags: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// A scheduled meeting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meeting {
    pub id: String,
    pub contact_name: String,
    pub email: String,
    pub date: String,
    pub time: String,
    pub duration: u32,
    pub topic: String,
    pub meeting_type: String,
    pub scheduled_at: String,
    pub status: String,
}

/// A follow-up task
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub contact_name: String,
    pub company_name: String,
    pub followup_date: String,
    pub followup_type: String,
    pub notes: String,
    pub created_at: String,
    pub status: String,
}

/// A generated sales proposal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proposal {
    pub id: String,
    pub company_name: String,
    pub contact_name: String,
    pub date: String,
    pub pain_points: Vec<String>,
    pub solutions: Vec<String>,
    pub timeline: String,
    pub budget_range: String,
    pub created_at: String,
    pub status: String,
}

/// Filters for note retrieval; all matches are case-insensitive substrings
#[derive(Debug, Clone, Default)]
pub struct NoteFilter {
    pub contact_name: Option<String>,
    pub company_name: Option<String>,
    pub tags: Vec<String>,
}

/// Default templates materialized on first use
const DEFAULT_TEMPLATES: &[(&str, &str)] = &[
    (
        "email_proposal.txt",
        "Subject: AI Strategy Proposal for {company_name}\n\n\
         Dear {contact_name},\n\n\
         Thank you for our conversation about {pain_point}. As discussed, Critical Future can help with:\n\n\
         1. {solution_point_1}\n2. {solution_point_2}\n3. {solution_point_3}\n\n\
         I've attached a brief overview of our approach. Would you be available for a 30-minute call next week to discuss this further?\n\n\
         Best regards,\nMaxwell\nCritical Future LTD\n",
    ),
    (
        "email_followup.txt",
        "Subject: Following up on our conversation about {topic}\n\n\
         Dear {contact_name},\n\n\
         I hope this email finds you well. I wanted to follow up on our recent conversation about {topic} and {company_name}'s challenges with {pain_point}.\n\n\
         Would you be interested in scheduling a brief call with one of our specialists to explore potential solutions?\n\n\
         Best regards,\nMaxwell\nCritical Future LTD\n",
    ),
    (
        "followup_call.txt",
        "Key points to discuss on the follow-up call with {contact_name} from {company_name}:\n\n\
         1. Recap of previous conversation about {pain_point}\n\
         2. Present our solution approach for {solution_area}\n\
         3. Discuss timeline and expected outcomes\n\
         4. Next steps and potential engagement options\n",
    ),
];

/// File-backed agent workspace
#[derive(Debug, Clone)]
pub struct AgentWorkspace {
    work_dir: PathBuf,
}

impl AgentWorkspace {
    /// Open (or initialize) a workspace rooted at `work_dir`
    pub fn new(work_dir: impl Into<PathBuf>) -> Result<Self, WorkspaceError> {
        let workspace = Self {
            work_dir: work_dir.into(),
        };

        for dir in [
            workspace.work_dir.clone(),
            workspace.notes_dir(),
            workspace.templates_dir(),
            workspace.calendar_dir(),
            workspace.tasks_dir(),
            workspace.proposals_dir(),
            workspace.email_log_dir(),
        ] {
            fs::create_dir_all(dir)?;
        }

        workspace.create_default_templates()?;
        Ok(workspace)
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    fn notes_dir(&self) -> PathBuf {
        self.work_dir.join("notes")
    }

    fn templates_dir(&self) -> PathBuf {
        self.work_dir.join("templates")
    }

    fn calendar_dir(&self) -> PathBuf {
        self.work_dir.join("calendar")
    }

    fn tasks_dir(&self) -> PathBuf {
        self.work_dir.join("tasks")
    }

    fn proposals_dir(&self) -> PathBuf {
        self.work_dir.join("proposals")
    }

    fn email_log_dir(&self) -> PathBuf {
        self.work_dir.join("email_logs")
    }

    fn create_default_templates(&self) -> Result<(), WorkspaceError> {
        for (filename, content) in DEFAULT_TEMPLATES {
            let path = self.templates_dir().join(filename);
            if !path.exists() {
                fs::write(path, content)?;
            }
        }
        Ok(())
    }

    /// Take a note about a conversation or contact
    pub fn take_note(
        &self,
        contact_name: &str,
        company_name: &str,
        content: &str,
        tags: Vec<String>,
    ) -> Result<Note, WorkspaceError> {
        let now = Utc::now();
        let note = Note {
            id: format!(
                "note_{}_{}",
                now.format("%Y%m%d_%H%M%S"),
                short_hex()
            ),
            contact_name: contact_name.to_string(),
            company_name: company_name.to_string(),
            content: content.to_string(),
            tags,
            created_at: now.to_rfc3339(),
            updated_at: now.to_rfc3339(),
        };

        let path = self.notes_dir().join(format!("{}.json", note.id));
        write_document(&path, &note)?;
        tracing::info!(note_id = %note.id, "Note created");
        Ok(note)
    }

    /// Retrieve notes matching the filter
    ///
    /// Unreadable note files are skipped with a warning rather than failing
    /// the whole listing.
    pub fn get_notes(&self, filter: &NoteFilter) -> Result<Vec<Note>, WorkspaceError> {
        let mut notes = Vec::new();

        for entry in fs::read_dir(self.notes_dir())?.flatten() {
            let path = entry.path();
            let is_note = path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.starts_with("note_") && n.ends_with(".json"))
                .unwrap_or(false);
            if !is_note {
                continue;
            }

            let note: Note = match fs::read_to_string(&path)
                .map_err(WorkspaceError::from)
                .and_then(|c| serde_json::from_str(&c).map_err(WorkspaceError::from))
            {
                Ok(note) => note,
                Err(e) => {
                    tracing::warn!("Error reading note file {}: {}", path.display(), e);
                    continue;
                }
            };

            if let Some(contact) = &filter.contact_name {
                if !note
                    .contact_name
                    .to_lowercase()
                    .contains(&contact.to_lowercase())
                {
                    continue;
                }
            }

            if let Some(company) = &filter.company_name {
                if !note
                    .company_name
                    .to_lowercase()
                    .contains(&company.to_lowercase())
                {
                    continue;
                }
            }

            if !filter.tags.is_empty() && !filter.tags.iter().any(|t| note.tags.contains(t)) {
                continue;
            }

            notes.push(note);
        }

        Ok(notes)
    }

    /// Schedule a meeting with a contact
    pub fn schedule_meeting(
        &self,
        contact_name: &str,
        email: &str,
        date: &str,
        time: &str,
        duration: u32,
        topic: &str,
        meeting_type: &str,
    ) -> Result<Meeting, WorkspaceError> {
        let meeting = Meeting {
            id: format!("meeting_{}", short_hex()),
            contact_name: contact_name.to_string(),
            email: email.to_string(),
            date: date.to_string(),
            time: time.to_string(),
            duration,
            topic: topic.to_string(),
            meeting_type: meeting_type.to_string(),
            scheduled_at: Utc::now().to_rfc3339(),
            status: "scheduled".to_string(),
        };

        let path = self.calendar_dir().join(format!("{}.json", meeting.id));
        write_document(&path, &meeting)?;
        tracing::info!(meeting_id = %meeting.id, date = %date, "Meeting scheduled");
        Ok(meeting)
    }

    /// Create a follow-up task for a contact
    pub fn create_followup_task(
        &self,
        contact_name: &str,
        company_name: &str,
        followup_date: &str,
        followup_type: &str,
        notes: &str,
    ) -> Result<Task, WorkspaceError> {
        let task = Task {
            id: format!("task_{}", short_hex()),
            contact_name: contact_name.to_string(),
            company_name: company_name.to_string(),
            followup_date: followup_date.to_string(),
            followup_type: followup_type.to_string(),
            notes: notes.to_string(),
            created_at: Utc::now().to_rfc3339(),
            status: "pending".to_string(),
        };

        let path = self.tasks_dir().join(format!("{}.json", task.id));
        write_document(&path, &task)?;
        tracing::info!(task_id = %task.id, "Follow-up task created");
        Ok(task)
    }

    /// Generate a sales proposal from conversation findings
    ///
    /// Returns the proposal and the path it was written to.
    pub fn generate_proposal(
        &self,
        company_name: &str,
        contact_name: &str,
        pain_points: Vec<String>,
        solutions: Vec<String>,
        timeline: &str,
        budget_range: &str,
    ) -> Result<(Proposal, PathBuf), WorkspaceError> {
        let now = Utc::now();
        let proposal = Proposal {
            id: format!("proposal_{}", short_hex()),
            company_name: company_name.to_string(),
            contact_name: contact_name.to_string(),
            date: now.format("%Y-%m-%d").to_string(),
            pain_points,
            solutions,
            timeline: timeline.to_string(),
            budget_range: budget_range.to_string(),
            created_at: now.to_rfc3339(),
            status: "draft".to_string(),
        };

        let path = self.proposals_dir().join(format!("{}.json", proposal.id));
        write_document(&path, &proposal)?;
        tracing::info!(proposal_id = %proposal.id, company = %company_name, "Proposal generated");
        Ok((proposal, path))
    }

    /// Load a named template from the templates directory
    pub fn load_template(&self, kind: &str, name: &str) -> Option<String> {
        let path = self.templates_dir().join(format!("{}_{}.txt", kind, name));
        fs::read_to_string(path).ok()
    }

    /// Append one entry to the email send log
    pub fn log_email(
        &self,
        to: &str,
        subject: &str,
        cc: &[String],
        bcc: &[String],
    ) -> Result<(), WorkspaceError> {
        let log_path = self.email_log_dir().join("email_log.json");

        let mut data: Value = fs::read_to_string(&log_path)
            .ok()
            .and_then(|c| serde_json::from_str(&c).ok())
            .unwrap_or_else(|| json!({ "emails": [] }));

        if !data["emails"].is_array() {
            data["emails"] = json!([]);
        }
        if let Some(emails) = data["emails"].as_array_mut() {
            emails.push(json!({
                "timestamp": Utc::now().to_rfc3339(),
                "to": to,
                "subject": subject,
                "cc": cc,
                "bcc": bcc,
            }));
        }

        fs::write(&log_path, serde_json::to_string_pretty(&data)?)?;
        Ok(())
    }
}

/// Apply `{placeholder}` substitutions and split off a `Subject:` first line
///
/// Returns `(subject, body)`; subject is None when the template does not
/// start with a subject line.
pub fn render_template(
    template: &str,
    variables: &[(String, String)],
) -> (Option<String>, String) {
    let mut rendered = template.to_string();
    for (key, value) in variables {
        rendered = rendered.replace(&format!("{{{}}}", key), value);
    }

    if let Some(rest) = rendered.strip_prefix("Subject:") {
        if let Some((subject_line, body)) = rest.split_once('\n') {
            return (
                Some(subject_line.trim().to_string()),
                body.trim().to_string(),
            );
        }
        return (Some(rest.trim().to_string()), String::new());
    }

    (None, rendered)
}

fn write_document<T: Serialize>(path: &Path, document: &T) -> Result<(), WorkspaceError> {
    fs::write(path, serde_json::to_string_pretty(document)?)?;
    Ok(())
}

fn short_hex() -> String {
    Uuid::new_v4().simple().to_string()[..8].to_string()
}
