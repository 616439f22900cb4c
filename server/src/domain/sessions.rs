//! Session service: assignment, answer submission and session views
//!
//! Handlers call these instead of the repository when an operation touches
//! more than one table or depends on the progress state machine.

use thiserror::Error;

use super::progress::Progress;
use crate::data::types::{
    AnswerRow, NewAnswer, QuestionRow, QuestionnaireRow, SessionAnswerRow, SessionRow, UserRow,
};
use crate::data::{DataError, TransactionalRepository};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{0}")]
    NotFound(&'static str),
    #[error(transparent)]
    Data(#[from] DataError),
}

/// Result of assigning a questionnaire to a user
#[derive(Debug, Clone)]
pub struct Assignment {
    pub user: UserRow,
    pub questionnaire: QuestionnaireRow,
    pub session: SessionRow,
}

/// An accepted answer and the progress it produced
#[derive(Debug, Clone)]
pub struct SubmittedAnswer {
    pub answer: AnswerRow,
    pub progress: Progress,
}

/// A session with its questionnaire and ordered questions
#[derive(Debug, Clone)]
pub struct SessionView {
    pub session: SessionRow,
    pub questionnaire: QuestionnaireRow,
    pub questions: Vec<QuestionRow>,
}

impl SessionView {
    /// Question under the cursor, if the cursor is inside the list
    pub fn current_question(&self) -> Option<&QuestionRow> {
        usize::try_from(self.session.current_index)
            .ok()
            .and_then(|i| self.questions.get(i))
    }

    pub fn progress(&self) -> Progress {
        Progress::of(&self.session)
    }
}

/// A session with its questionnaire and submitted answers
#[derive(Debug, Clone)]
pub struct SessionDetail {
    pub session: SessionRow,
    pub questionnaire: QuestionnaireRow,
    pub answers: Vec<SessionAnswerRow>,
}

impl SessionDetail {
    pub fn progress(&self) -> Progress {
        Progress::of(&self.session)
    }
}

/// Assign (or reassign) a questionnaire to a user
///
/// Creates the user's session for the questionnaire, or resets the existing
/// one to index 0 with a fresh question count. Earlier answers stay in the
/// answer log.
pub async fn assign_questionnaire(
    repo: &dyn TransactionalRepository,
    user_id: &str,
    questionnaire_id: &str,
) -> Result<Assignment, SessionError> {
    let user = repo
        .get_user(user_id)
        .await?
        .ok_or(SessionError::NotFound("User not found"))?;
    let questionnaire = repo
        .get_questionnaire(questionnaire_id)
        .await?
        .ok_or(SessionError::NotFound("Questionnaire not found"))?;

    let progress = Progress::assigned(repo.count_questions(questionnaire_id).await?);
    let session = repo
        .upsert_session(user_id, questionnaire_id, progress.total)
        .await?;

    tracing::debug!(
        session_id = %session.id,
        %user_id,
        %questionnaire_id,
        total = progress.total,
        "Questionnaire assigned"
    );

    Ok(Assignment {
        user,
        questionnaire,
        session,
    })
}

/// Record an answer and advance the session cursor by one
///
/// The session must belong to `user_id` and the question to the session's
/// questionnaire. If another submission moved the cursor first, nothing is
/// written and `DataError::Conflict` is returned.
pub async fn submit_answer(
    repo: &dyn TransactionalRepository,
    user_id: &str,
    session_id: &str,
    question_id: &str,
    answer_text: String,
    answer_json: Option<serde_json::Value>,
) -> Result<SubmittedAnswer, SessionError> {
    let session = repo
        .get_user_session(session_id, user_id)
        .await?
        .ok_or(SessionError::NotFound("Session not found"))?;
    repo.get_question(&session.questionnaire_id, question_id)
        .await?
        .ok_or(SessionError::NotFound("Question not found"))?;

    let current = Progress::of(&session);
    let next = current.advance();

    let answer = repo
        .record_answer(&NewAnswer {
            session_id: session.id.clone(),
            question_id: question_id.to_string(),
            answer_text: Some(answer_text),
            answer_json: answer_json.unwrap_or_else(|| serde_json::json!({})),
            expected_index: current.current_index,
            next_index: next.current_index,
            completed: next.is_completed,
        })
        .await?;

    Ok(SubmittedAnswer {
        answer,
        progress: next,
    })
}

/// The user's current incomplete session with its questions
pub async fn current_session(
    repo: &dyn TransactionalRepository,
    user_id: &str,
) -> Result<SessionView, SessionError> {
    let session = repo
        .get_current_session(user_id)
        .await?
        .ok_or(SessionError::NotFound("No active session found"))?;
    let questionnaire = repo
        .get_questionnaire(&session.questionnaire_id)
        .await?
        .ok_or(SessionError::NotFound("Questionnaire not found"))?;
    let questions = repo.list_questions(&session.questionnaire_id).await?;

    Ok(SessionView {
        session,
        questionnaire,
        questions,
    })
}

/// A user's session with the answers submitted so far
pub async fn session_detail(
    repo: &dyn TransactionalRepository,
    user_id: &str,
    session_id: &str,
) -> Result<SessionDetail, SessionError> {
    let session = repo
        .get_user_session(session_id, user_id)
        .await?
        .ok_or(SessionError::NotFound("Session not found"))?;
    let questionnaire = repo
        .get_questionnaire(&session.questionnaire_id)
        .await?
        .ok_or(SessionError::NotFound("Questionnaire not found"))?;
    let answers = repo.list_session_answers(&session.id).await?;

    Ok(SessionDetail {
        session,
        questionnaire,
        answers,
    })
}

/// Overwrite cursor and/or completion flag, bypassing the state machine
pub async fn override_progress(
    repo: &dyn TransactionalRepository,
    user_id: &str,
    session_id: &str,
    current_index: Option<i64>,
    is_completed: Option<bool>,
) -> Result<SessionRow, SessionError> {
    repo.override_session_progress(session_id, user_id, current_index, is_completed)
        .await?
        .ok_or(SessionError::NotFound("Session not found"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TransactionalService;
    use crate::data::sqlite::repositories::test_support::{insert_questionnaire, insert_user};

    async fn setup(n: usize) -> (TransactionalService, String, String) {
        let db = TransactionalService::in_memory().await;
        let user = insert_user(db.pool(), "respondent").await;
        let q = insert_questionnaire(db.pool(), "Survey", n).await;
        (db, user, q)
    }

    #[tokio::test]
    async fn test_assign_snapshots_question_count() {
        let (db, user, q) = setup(3).await;
        let repo = db.repository();

        let assignment = assign_questionnaire(repo.as_ref(), &user, &q).await.unwrap();
        assert_eq!(assignment.session.total_questions, 3);
        assert_eq!(assignment.session.current_index, 0);
        assert!(!assignment.session.is_completed);
        assert_eq!(assignment.questionnaire.title, "Survey");
    }

    #[tokio::test]
    async fn test_assign_missing_targets() {
        let (db, user, q) = setup(1).await;
        let repo = db.repository();

        let err = assign_questionnaire(repo.as_ref(), "nobody", &q)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NotFound("User not found")));

        let err = assign_questionnaire(repo.as_ref(), &user, "nothing")
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NotFound("Questionnaire not found")));
    }

    #[tokio::test]
    async fn test_submitting_all_answers_completes_session() {
        let (db, user, q) = setup(3).await;
        let repo = db.repository();
        let session = assign_questionnaire(repo.as_ref(), &user, &q)
            .await
            .unwrap()
            .session;
        let questions = repo.list_questions(&q).await.unwrap();

        for (i, question) in questions.iter().enumerate() {
            let submitted = submit_answer(
                repo.as_ref(),
                &user,
                &session.id,
                &question.id,
                format!("answer {}", i),
                None,
            )
            .await
            .unwrap();
            assert_eq!(submitted.progress.current_index, i as i64 + 1);
            assert_eq!(submitted.progress.is_completed, i == questions.len() - 1);
        }

        let stored = repo
            .get_user_session(&session.id, &user)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.current_index, 3);
        assert!(stored.is_completed);
    }

    #[tokio::test]
    async fn test_resubmission_over_advances() {
        let (db, user, q) = setup(2).await;
        let repo = db.repository();
        let session = assign_questionnaire(repo.as_ref(), &user, &q)
            .await
            .unwrap()
            .session;
        let first = repo.list_questions(&q).await.unwrap().remove(0);

        for _ in 0..3 {
            submit_answer(repo.as_ref(), &user, &session.id, &first.id, "again".into(), None)
                .await
                .unwrap();
        }

        let detail = session_detail(repo.as_ref(), &user, &session.id)
            .await
            .unwrap();
        assert_eq!(detail.answers.len(), 3);
        assert_eq!(detail.session.current_index, 3);
        assert!(detail.session.is_completed);
    }

    #[tokio::test]
    async fn test_submit_rejects_foreign_question_and_session() {
        let (db, user, q) = setup(1).await;
        let repo = db.repository();
        let session = assign_questionnaire(repo.as_ref(), &user, &q)
            .await
            .unwrap()
            .session;
        let other_q = insert_questionnaire(db.pool(), "Other", 1).await;
        let foreign = repo.list_questions(&other_q).await.unwrap().remove(0);

        let err = submit_answer(repo.as_ref(), &user, &session.id, &foreign.id, "x".into(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NotFound("Question not found")));

        let intruder = insert_user(db.pool(), "intruder").await;
        let own = repo.list_questions(&q).await.unwrap().remove(0);
        let err = submit_answer(repo.as_ref(), &intruder, &session.id, &own.id, "x".into(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NotFound("Session not found")));
    }

    #[tokio::test]
    async fn test_reassign_resets_existing_session() {
        let (db, user, q) = setup(1).await;
        let repo = db.repository();
        let first = assign_questionnaire(repo.as_ref(), &user, &q)
            .await
            .unwrap()
            .session;
        let question = repo.list_questions(&q).await.unwrap().remove(0);
        submit_answer(repo.as_ref(), &user, &first.id, &question.id, "done".into(), None)
            .await
            .unwrap();

        let second = assign_questionnaire(repo.as_ref(), &user, &q)
            .await
            .unwrap()
            .session;
        assert_eq!(second.id, first.id);
        assert_eq!(second.current_index, 0);
        assert!(!second.is_completed);
    }

    #[tokio::test]
    async fn test_current_session_view() {
        let (db, user, q) = setup(2).await;
        let repo = db.repository();

        let err = current_session(repo.as_ref(), &user).await.unwrap_err();
        assert!(matches!(err, SessionError::NotFound("No active session found")));

        let session = assign_questionnaire(repo.as_ref(), &user, &q)
            .await
            .unwrap()
            .session;
        let view = current_session(repo.as_ref(), &user).await.unwrap();
        assert_eq!(view.session.id, session.id);
        assert_eq!(view.questions.len(), 2);
        assert_eq!(view.current_question().map(|q| q.position), Some(1));

        let moved = override_progress(repo.as_ref(), &user, &session.id, Some(2), None)
            .await
            .unwrap();
        assert_eq!(moved.current_index, 2);
        let view = current_session(repo.as_ref(), &user).await.unwrap();
        assert!(view.current_question().is_none());
        assert_eq!(view.progress().percent(), 100.0);
    }

    #[tokio::test]
    async fn test_deleting_questionnaire_removes_sessions_and_answers() {
        let (db, user, q) = setup(2).await;
        let repo = db.repository();
        let session = assign_questionnaire(repo.as_ref(), &user, &q)
            .await
            .unwrap()
            .session;
        let first = repo.list_questions(&q).await.unwrap().remove(0);
        submit_answer(repo.as_ref(), &user, &session.id, &first.id, "yes".into(), None)
            .await
            .unwrap();

        let before = repo.dashboard_counts().await.unwrap();
        assert_eq!((before.total_sessions, before.total_answers), (1, 1));

        assert!(repo.delete_questionnaire(&q).await.unwrap());

        let after = repo.dashboard_counts().await.unwrap();
        assert_eq!(after.total_sessions, 0);
        assert_eq!(after.total_answers, 0);
        assert_eq!(after.total_questions, 0);
        assert!(repo.get_user_session(&session.id, &user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_override_missing_session() {
        let (db, user, _) = setup(1).await;
        let repo = db.repository();
        let err = override_progress(repo.as_ref(), &user, "missing", Some(1), None)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NotFound(_)));
    }
}
