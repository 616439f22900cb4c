//! Audit trail
//!
//! Entries are written after the action they describe, as a separate
//! statement. A failed write is logged and swallowed; it never fails or
//! rolls back the action itself.

use std::fmt;

use serde_json::Value;

use crate::data::types::{AuditLogRow, NewAuditLog};
use crate::data::{DataError, TransactionalRepository};

/// Action tags stored in the audit log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    UserLogin,
    UserCreated,
    UserStatusChanged,
    QuestionnaireCreated,
    QuestionnaireDeleted,
    QuestionnaireAssigned,
    ReminderSent,
    AnswerSubmitted,
    SessionProgressUpdated,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserLogin => "user_login",
            Self::UserCreated => "user_created",
            Self::UserStatusChanged => "user_status_changed",
            Self::QuestionnaireCreated => "questionnaire_created",
            Self::QuestionnaireDeleted => "questionnaire_deleted",
            Self::QuestionnaireAssigned => "questionnaire_assigned",
            Self::ReminderSent => "reminder_sent",
            Self::AnswerSubmitted => "answer_submitted",
            Self::SessionProgressUpdated => "session_progress_updated",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of object an audit entry refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditObject {
    User,
    Questionnaire,
    Session,
    Answer,
}

impl AuditObject {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Questionnaire => "Questionnaire",
            Self::Session => "Session",
            Self::Answer => "Answer",
        }
    }
}

/// Audit entry under construction
#[derive(Debug, Clone)]
pub struct AuditEntry {
    action: AuditAction,
    actor_id: Option<String>,
    object: Option<(AuditObject, String)>,
    payload: Value,
}

impl AuditEntry {
    pub fn new(action: AuditAction) -> Self {
        Self {
            action,
            actor_id: None,
            object: None,
            payload: serde_json::json!({}),
        }
    }

    pub fn actor(mut self, actor_id: impl Into<String>) -> Self {
        self.actor_id = Some(actor_id.into());
        self
    }

    pub fn object(mut self, kind: AuditObject, id: impl Into<String>) -> Self {
        self.object = Some((kind, id.into()));
        self
    }

    pub fn payload(mut self, payload: Value) -> Self {
        self.payload = payload;
        self
    }

    fn into_new(self) -> NewAuditLog {
        let (object_type, object_id) = match self.object {
            Some((kind, id)) => (Some(kind.as_str().to_string()), Some(id)),
            None => (None, None),
        };
        NewAuditLog {
            actor_id: self.actor_id,
            action: self.action.as_str().to_string(),
            object_type,
            object_id,
            payload: self.payload,
        }
    }
}

/// Append an audit entry; failures are logged at warn and otherwise ignored
pub async fn record(repo: &dyn TransactionalRepository, entry: AuditEntry) {
    let action = entry.action;
    if let Err(e) = repo.insert_audit_log(&entry.into_new()).await {
        tracing::warn!(%action, error = %e, "Failed to write audit log entry");
    }
}

/// Audit entry rendered for the dashboard activity feed
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityItem {
    pub id: i64,
    pub kind: String,
    pub title: String,
    pub description: String,
    pub timestamp: i64,
}

impl From<AuditLogRow> for ActivityItem {
    fn from(row: AuditLogRow) -> Self {
        let kind = row.action.replace('_', " ");
        let title = title_case(&kind);
        let description = format!(
            "Action performed by {}",
            row.actor_name.as_deref().unwrap_or("System")
        );
        Self {
            id: row.id,
            kind,
            title,
            description,
            timestamp: row.created_at,
        }
    }
}

/// Most recent audit entries as activity items
pub async fn recent_activity(
    repo: &dyn TransactionalRepository,
    limit: i64,
) -> Result<Vec<ActivityItem>, DataError> {
    let rows = repo.list_recent_audit_logs(limit).await?;
    Ok(rows.into_iter().map(ActivityItem::from).collect())
}

/// Uppercase the first letter of every word, lowercase the rest
fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TransactionalService;

    fn row(action: &str, actor_name: Option<&str>) -> AuditLogRow {
        AuditLogRow {
            id: 7,
            actor_id: actor_name.map(|_| "u1".to_string()),
            actor_name: actor_name.map(String::from),
            action: action.to_string(),
            object_type: None,
            object_id: None,
            payload: serde_json::json!({}),
            created_at: 1_704_067_200,
        }
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("user login"), "User Login");
        assert_eq!(title_case("QUESTIONNAIRE assigned"), "Questionnaire Assigned");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn test_activity_item_with_actor() {
        let item = ActivityItem::from(row("questionnaire_assigned", Some("Jane Doe")));
        assert_eq!(item.id, 7);
        assert_eq!(item.kind, "questionnaire assigned");
        assert_eq!(item.title, "Questionnaire Assigned");
        assert_eq!(item.description, "Action performed by Jane Doe");
    }

    #[test]
    fn test_activity_item_without_actor() {
        let item = ActivityItem::from(row("user_login", None));
        assert_eq!(item.description, "Action performed by System");
    }

    #[test]
    fn test_entry_into_new() {
        let new = AuditEntry::new(AuditAction::ReminderSent)
            .actor("admin")
            .object(AuditObject::User, "u1")
            .payload(serde_json::json!({"email": "a@b.c"}))
            .into_new();
        assert_eq!(new.action, "reminder_sent");
        assert_eq!(new.actor_id.as_deref(), Some("admin"));
        assert_eq!(new.object_type.as_deref(), Some("User"));
        assert_eq!(new.object_id.as_deref(), Some("u1"));
        assert_eq!(new.payload["email"], "a@b.c");
    }

    #[tokio::test]
    async fn test_record_and_read_back() {
        let db = TransactionalService::in_memory().await;
        let repo = db.repository();

        record(repo.as_ref(), AuditEntry::new(AuditAction::UserLogin)).await;
        record(
            repo.as_ref(),
            AuditEntry::new(AuditAction::QuestionnaireCreated).payload(serde_json::json!({"title": "T"})),
        )
        .await;

        let items = recent_activity(repo.as_ref(), 10).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Questionnaire Created");
        assert_eq!(items[1].title, "User Login");
    }

    #[tokio::test]
    async fn test_record_failure_is_swallowed() {
        let db = TransactionalService::in_memory().await;
        let repo = db.repository();
        // Unknown actor violates the foreign key; the write fails quietly
        record(repo.as_ref(), AuditEntry::new(AuditAction::UserLogin).actor("ghost")).await;

        let items = recent_activity(repo.as_ref(), 10).await.unwrap();
        assert!(items.is_empty());
    }
}
