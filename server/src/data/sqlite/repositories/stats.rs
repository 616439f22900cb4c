//! Dashboard count queries

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::DashboardCounts;

/// Raw table counts, computed in a single statement
pub async fn dashboard_counts(pool: &SqlitePool) -> Result<DashboardCounts, SqliteError> {
    let (
        total_users,
        active_users,
        total_questionnaires,
        active_questionnaires,
        total_sessions,
        completed_sessions,
        total_questions,
        total_answers,
        total_audit_logs,
    ) = sqlx::query_as::<_, (i64, i64, i64, i64, i64, i64, i64, i64, i64)>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM users),
            (SELECT COUNT(*) FROM users WHERE is_active = 1),
            (SELECT COUNT(*) FROM questionnaires),
            (SELECT COUNT(*) FROM questionnaires WHERE is_active = 1),
            (SELECT COUNT(*) FROM sessions),
            (SELECT COUNT(*) FROM sessions WHERE is_completed = 1),
            (SELECT COUNT(*) FROM questions),
            (SELECT COUNT(*) FROM answers),
            (SELECT COUNT(*) FROM audit_logs)
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(DashboardCounts {
        total_users,
        active_users,
        total_questionnaires,
        active_questionnaires,
        total_sessions,
        completed_sessions,
        total_questions,
        total_answers,
        total_audit_logs,
    })
}
