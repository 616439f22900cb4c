//! Aggregate count types

use serde::{Deserialize, Serialize};

/// Raw table counts for the dashboard
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardCounts {
    pub total_users: i64,
    pub active_users: i64,
    pub total_questionnaires: i64,
    pub active_questionnaires: i64,
    pub total_sessions: i64,
    pub completed_sessions: i64,
    pub total_questions: i64,
    pub total_answers: i64,
    pub total_audit_logs: i64,
}
