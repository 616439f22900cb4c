//! Session and answer repository for SQLite operations

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::{AnswerRow, NewAnswer, ResponseRow, SessionAnswerRow, SessionRow};

type SessionTuple = (String, String, String, i64, i64, bool, i64, i64, Option<i64>);

const SESSION_COLUMNS: &str = "id, user_id, questionnaire_id, current_index, total_questions, is_completed, created_at, updated_at, expires_at";

fn session_from_tuple(row: SessionTuple) -> SessionRow {
    let (
        id,
        user_id,
        questionnaire_id,
        current_index,
        total_questions,
        is_completed,
        created_at,
        updated_at,
        expires_at,
    ) = row;
    SessionRow {
        id,
        user_id,
        questionnaire_id,
        current_index,
        total_questions,
        is_completed,
        created_at,
        updated_at,
        expires_at,
    }
}

/// Create or reset the session for a (user, questionnaire) pair
///
/// A new session starts at index 0 with the given question count. An existing
/// one keeps its id and is reset the same way; its answers are untouched.
pub async fn upsert_session(
    pool: &SqlitePool,
    user_id: &str,
    questionnaire_id: &str,
    total_questions: i64,
) -> Result<SessionRow, SqliteError> {
    let id = cuid2::create_id();
    let now = chrono::Utc::now().timestamp();

    let row = sqlx::query_as::<_, SessionTuple>(&format!(
        r#"
        INSERT INTO sessions (id, user_id, questionnaire_id, current_index, total_questions, is_completed, created_at, updated_at)
        VALUES (?, ?, ?, 0, ?, 0, ?, ?)
        ON CONFLICT(user_id, questionnaire_id) DO UPDATE SET
            current_index = 0,
            total_questions = excluded.total_questions,
            is_completed = 0,
            expires_at = NULL,
            updated_at = excluded.updated_at
        RETURNING {}
        "#,
        SESSION_COLUMNS
    ))
    .bind(&id)
    .bind(user_id)
    .bind(questionnaire_id)
    .bind(total_questions)
    .bind(now)
    .bind(now)
    .fetch_one(pool)
    .await?;

    Ok(session_from_tuple(row))
}

/// Get a session, only if it belongs to the given user
pub async fn get_user_session(
    pool: &SqlitePool,
    id: &str,
    user_id: &str,
) -> Result<Option<SessionRow>, SqliteError> {
    let row = sqlx::query_as::<_, SessionTuple>(&format!(
        "SELECT {} FROM sessions WHERE id = ? AND user_id = ?",
        SESSION_COLUMNS
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(session_from_tuple))
}

/// The user's most recently updated incomplete session
pub async fn get_current_session(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Option<SessionRow>, SqliteError> {
    let row = sqlx::query_as::<_, SessionTuple>(&format!(
        "SELECT {} FROM sessions WHERE user_id = ? AND is_completed = 0 \
         ORDER BY updated_at DESC, rowid DESC LIMIT 1",
        SESSION_COLUMNS
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(session_from_tuple))
}

/// Overwrite cursor and/or completion flag on a user's session
///
/// `None` leaves the field unchanged. Returns None if the session doesn't
/// exist or belongs to someone else.
pub async fn override_session_progress(
    pool: &SqlitePool,
    id: &str,
    user_id: &str,
    current_index: Option<i64>,
    is_completed: Option<bool>,
) -> Result<Option<SessionRow>, SqliteError> {
    let now = chrono::Utc::now().timestamp();
    let result = sqlx::query(
        "UPDATE sessions SET current_index = COALESCE(?, current_index), \
         is_completed = COALESCE(?, is_completed), updated_at = ? \
         WHERE id = ? AND user_id = ?",
    )
    .bind(current_index)
    .bind(is_completed)
    .bind(now)
    .bind(id)
    .bind(user_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_user_session(pool, id, user_id).await
}

/// Append an answer and advance the session cursor in one transaction
///
/// The cursor moves only if it still equals `expected_index`. Otherwise the
/// transaction is rolled back and `Conflict` is returned.
pub async fn record_answer(pool: &SqlitePool, new: &NewAnswer) -> Result<AnswerRow, SqliteError> {
    let id = cuid2::create_id();
    let now = chrono::Utc::now().timestamp();
    let answer_json = serde_json::to_string(&new.answer_json).unwrap_or_else(|_| "{}".to_string());

    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO answers (id, session_id, question_id, answer_text, answer_json, answered_at) \
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(&id)
    .bind(&new.session_id)
    .bind(&new.question_id)
    .bind(&new.answer_text)
    .bind(&answer_json)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    let result = sqlx::query(
        "UPDATE sessions SET current_index = ?, is_completed = ?, updated_at = ? \
         WHERE id = ? AND current_index = ?",
    )
    .bind(new.next_index)
    .bind(new.completed)
    .bind(now)
    .bind(&new.session_id)
    .bind(new.expected_index)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() == 0 {
        tx.rollback().await?;
        return Err(SqliteError::Conflict(
            "Session was updated concurrently, please retry".to_string(),
        ));
    }

    tx.commit().await?;

    Ok(AnswerRow {
        id,
        session_id: new.session_id.clone(),
        question_id: new.question_id.clone(),
        answer_text: new.answer_text.clone(),
        answer_json: new.answer_json.clone(),
        answered_at: now,
    })
}

/// Answers of a session in submission order, with question text
pub async fn list_session_answers(
    pool: &SqlitePool,
    session_id: &str,
) -> Result<Vec<SessionAnswerRow>, SqliteError> {
    let rows = sqlx::query_as::<_, (String, String, String, Option<String>, i64)>(
        r#"
        SELECT a.id, a.question_id, q.question_text, a.answer_text, a.answered_at
        FROM answers a
        JOIN questions q ON q.id = a.question_id
        WHERE a.session_id = ?
        ORDER BY a.answered_at, a.rowid
        "#,
    )
    .bind(session_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(
            |(id, question_id, question_text, answer_text, answered_at)| SessionAnswerRow {
                id,
                question_id,
                question_text,
                answer_text,
                answered_at,
            },
        )
        .collect())
}

/// All answers across all sessions, newest first
pub async fn list_responses(pool: &SqlitePool) -> Result<Vec<ResponseRow>, SqliteError> {
    let rows = sqlx::query_as::<_, (String, String, String, String, Option<String>, i64)>(
        r#"
        SELECT a.id, s.user_id, s.questionnaire_id, q.question_text, a.answer_text, a.answered_at
        FROM answers a
        JOIN sessions s ON s.id = a.session_id
        JOIN questions q ON q.id = a.question_id
        ORDER BY a.answered_at DESC, a.rowid DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(
            |(id, user_id, questionnaire_id, question_text, answer_text, answered_at)| ResponseRow {
                id,
                user_id,
                questionnaire_id,
                question_text,
                answer_text,
                answered_at,
            },
        )
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sqlite::repositories::list_questions;
    use crate::data::sqlite::repositories::test_support::{
        insert_questionnaire, insert_user, setup_test_pool,
    };

    fn answer(session: &SessionRow, question_id: &str, expected: i64) -> NewAnswer {
        let next = expected + 1;
        NewAnswer {
            session_id: session.id.clone(),
            question_id: question_id.to_string(),
            answer_text: Some(format!("answer {}", next)),
            answer_json: serde_json::json!({}),
            expected_index: expected,
            next_index: next,
            completed: next >= session.total_questions,
        }
    }

    #[tokio::test]
    async fn test_upsert_creates_then_resets() {
        let pool = setup_test_pool().await;
        let user = insert_user(&pool, "u").await;
        let q = insert_questionnaire(&pool, "Q", 2).await;

        let first = upsert_session(&pool, &user, &q, 2).await.unwrap();
        assert_eq!(first.current_index, 0);
        assert_eq!(first.total_questions, 2);
        assert!(!first.is_completed);

        override_session_progress(&pool, &first.id, &user, Some(2), Some(true))
            .await
            .unwrap()
            .unwrap();

        let second = upsert_session(&pool, &user, &q, 2).await.unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.current_index, 0);
        assert!(!second.is_completed);

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sessions")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_get_user_session_checks_owner() {
        let pool = setup_test_pool().await;
        let owner = insert_user(&pool, "owner").await;
        let other = insert_user(&pool, "other").await;
        let q = insert_questionnaire(&pool, "Q", 1).await;
        let session = upsert_session(&pool, &owner, &q, 1).await.unwrap();

        assert!(get_user_session(&pool, &session.id, &owner).await.unwrap().is_some());
        assert!(get_user_session(&pool, &session.id, &other).await.unwrap().is_none());
        assert!(
            override_session_progress(&pool, &session.id, &other, Some(1), None)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_current_session_skips_completed() {
        let pool = setup_test_pool().await;
        let user = insert_user(&pool, "u").await;
        let q1 = insert_questionnaire(&pool, "Q1", 1).await;
        let q2 = insert_questionnaire(&pool, "Q2", 1).await;

        assert!(get_current_session(&pool, &user).await.unwrap().is_none());

        let s1 = upsert_session(&pool, &user, &q1, 1).await.unwrap();
        let s2 = upsert_session(&pool, &user, &q2, 1).await.unwrap();

        // Same-second updates fall back to insertion order
        let current = get_current_session(&pool, &user).await.unwrap().unwrap();
        assert_eq!(current.id, s2.id);

        override_session_progress(&pool, &s2.id, &user, None, Some(true))
            .await
            .unwrap();
        let current = get_current_session(&pool, &user).await.unwrap().unwrap();
        assert_eq!(current.id, s1.id);
    }

    #[tokio::test]
    async fn test_record_answer_advances_cursor() {
        let pool = setup_test_pool().await;
        let user = insert_user(&pool, "u").await;
        let q = insert_questionnaire(&pool, "Q", 2).await;
        let questions = list_questions(&pool, &q).await.unwrap();
        let session = upsert_session(&pool, &user, &q, 2).await.unwrap();

        record_answer(&pool, &answer(&session, &questions[0].id, 0))
            .await
            .unwrap();
        let after_one = get_user_session(&pool, &session.id, &user).await.unwrap().unwrap();
        assert_eq!(after_one.current_index, 1);
        assert!(!after_one.is_completed);

        record_answer(&pool, &answer(&session, &questions[1].id, 1))
            .await
            .unwrap();
        let after_two = get_user_session(&pool, &session.id, &user).await.unwrap().unwrap();
        assert_eq!(after_two.current_index, 2);
        assert!(after_two.is_completed);

        let answers = list_session_answers(&pool, &session.id).await.unwrap();
        assert_eq!(answers.len(), 2);
        assert_eq!(answers[0].question_id, questions[0].id);
        assert_eq!(answers[1].answer_text.as_deref(), Some("answer 2"));
    }

    #[tokio::test]
    async fn test_stale_cursor_leaves_no_answer() {
        let pool = setup_test_pool().await;
        let user = insert_user(&pool, "u").await;
        let q = insert_questionnaire(&pool, "Q", 3).await;
        let questions = list_questions(&pool, &q).await.unwrap();
        let session = upsert_session(&pool, &user, &q, 3).await.unwrap();

        record_answer(&pool, &answer(&session, &questions[0].id, 0))
            .await
            .unwrap();
        let err = record_answer(&pool, &answer(&session, &questions[1].id, 0))
            .await
            .unwrap_err();
        assert!(matches!(err, SqliteError::Conflict(_)));

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM answers")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 1);
        let stored = get_user_session(&pool, &session.id, &user).await.unwrap().unwrap();
        assert_eq!(stored.current_index, 1);
    }

    #[tokio::test]
    async fn test_list_responses_newest_first() {
        let pool = setup_test_pool().await;
        let user = insert_user(&pool, "u").await;
        let q = insert_questionnaire(&pool, "Q", 2).await;
        let questions = list_questions(&pool, &q).await.unwrap();
        let session = upsert_session(&pool, &user, &q, 2).await.unwrap();

        record_answer(&pool, &answer(&session, &questions[0].id, 0))
            .await
            .unwrap();
        let latest = record_answer(&pool, &answer(&session, &questions[1].id, 1))
            .await
            .unwrap();

        let responses = list_responses(&pool).await.unwrap();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].id, latest.id);
        assert_eq!(responses[0].user_id, user);
        assert_eq!(responses[0].questionnaire_id, q);
        assert_eq!(responses[0].question_text, questions[1].question_text);
    }

    #[tokio::test]
    async fn test_reassign_keeps_answers() {
        let pool = setup_test_pool().await;
        let user = insert_user(&pool, "u").await;
        let q = insert_questionnaire(&pool, "Q", 1).await;
        let questions = list_questions(&pool, &q).await.unwrap();
        let session = upsert_session(&pool, &user, &q, 1).await.unwrap();
        record_answer(&pool, &answer(&session, &questions[0].id, 0))
            .await
            .unwrap();

        upsert_session(&pool, &user, &q, 1).await.unwrap();
        assert_eq!(list_session_answers(&pool, &session.id).await.unwrap().len(), 1);
    }
}
