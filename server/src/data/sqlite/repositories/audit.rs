//! Audit log repository for SQLite operations
//!
//! The audit log is append-only: there are no update or delete functions.

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::{AuditLogRow, NewAuditLog};

/// Append an audit entry, returning its id
pub async fn insert_audit_log(pool: &SqlitePool, entry: &NewAuditLog) -> Result<i64, SqliteError> {
    let now = chrono::Utc::now().timestamp();
    let payload = serde_json::to_string(&entry.payload).unwrap_or_else(|_| "{}".to_string());

    let result = sqlx::query(
        "INSERT INTO audit_logs (actor_id, action, object_type, object_id, payload, created_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&entry.actor_id)
    .bind(&entry.action)
    .bind(&entry.object_type)
    .bind(&entry.object_id)
    .bind(&payload)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Most recent audit entries, newest first, with the actor's display name
pub async fn list_recent(pool: &SqlitePool, limit: i64) -> Result<Vec<AuditLogRow>, SqliteError> {
    let rows = sqlx::query_as::<
        _,
        (
            i64,
            Option<String>,
            Option<String>,
            Option<String>,
            Option<String>,
            String,
            Option<String>,
            Option<String>,
            String,
            i64,
        ),
    >(
        r#"
        SELECT l.id, l.actor_id, u.username, u.first_name, u.last_name,
               l.action, l.object_type, l.object_id, l.payload, l.created_at
        FROM audit_logs l
        LEFT JOIN users u ON u.id = l.actor_id
        ORDER BY l.id DESC
        LIMIT ?
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(
            |(
                id,
                actor_id,
                username,
                first_name,
                last_name,
                action,
                object_type,
                object_id,
                payload,
                created_at,
            )| {
                let actor_name = username.map(|username| {
                    let full = format!(
                        "{} {}",
                        first_name.unwrap_or_default(),
                        last_name.unwrap_or_default()
                    );
                    let full = full.trim();
                    if full.is_empty() {
                        username
                    } else {
                        full.to_string()
                    }
                });
                AuditLogRow {
                    id,
                    actor_id,
                    actor_name,
                    action,
                    object_type,
                    object_id,
                    payload: serde_json::from_str(&payload)
                        .unwrap_or_else(|_| serde_json::json!({})),
                    created_at,
                }
            },
        )
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sqlite::repositories::test_support::{insert_user, setup_test_pool};

    fn entry(actor_id: Option<String>, action: &str) -> NewAuditLog {
        NewAuditLog {
            actor_id,
            action: action.to_string(),
            object_type: Some("User".to_string()),
            object_id: Some("obj".to_string()),
            payload: serde_json::json!({"ip_address": "127.0.0.1"}),
        }
    }

    #[tokio::test]
    async fn test_ids_are_monotonic() {
        let pool = setup_test_pool().await;
        let a = insert_audit_log(&pool, &entry(None, "user_login")).await.unwrap();
        let b = insert_audit_log(&pool, &entry(None, "user_login")).await.unwrap();
        assert!(b > a);
    }

    #[tokio::test]
    async fn test_list_recent_newest_first_with_limit() {
        let pool = setup_test_pool().await;
        let actor = insert_user(&pool, "actor").await;
        for action in ["user_created", "questionnaire_created", "reminder_sent"] {
            insert_audit_log(&pool, &entry(Some(actor.clone()), action))
                .await
                .unwrap();
        }

        let recent = list_recent(&pool, 2).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].action, "reminder_sent");
        assert_eq!(recent[1].action, "questionnaire_created");
        assert_eq!(recent[0].actor_name.as_deref(), Some("Test User"));
        assert_eq!(recent[0].payload["ip_address"], "127.0.0.1");
    }

    #[tokio::test]
    async fn test_deleted_actor_becomes_null() {
        let pool = setup_test_pool().await;
        let actor = insert_user(&pool, "leaver").await;
        insert_audit_log(&pool, &entry(Some(actor.clone()), "user_login"))
            .await
            .unwrap();

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(&actor)
            .execute(&pool)
            .await
            .unwrap();

        let recent = list_recent(&pool, 10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert!(recent[0].actor_id.is_none());
        assert!(recent[0].actor_name.is_none());
    }
}
