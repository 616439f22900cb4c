//! Questionnaire and question repository for SQLite operations

use std::collections::HashMap;

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::{
    NewQuestionnaire, QuestionRow, QuestionType, QuestionnaireRow, QuestionnaireWithQuestions,
};

type QuestionnaireTuple = (String, String, Option<String>, String, Option<String>, bool, i64);
type QuestionTuple = (String, String, i64, String, String, String, bool);

fn questionnaire_from_tuple(row: QuestionnaireTuple) -> QuestionnaireRow {
    let (id, title, description, meta, created_by, is_active, created_at) = row;
    QuestionnaireRow {
        id,
        title,
        description,
        meta: serde_json::from_str(&meta).unwrap_or_else(|_| serde_json::json!({})),
        created_by,
        is_active,
        created_at,
    }
}

fn question_from_tuple(row: QuestionTuple) -> QuestionRow {
    let (id, questionnaire_id, position, question_text, question_type, options, required) = row;
    QuestionRow {
        id,
        questionnaire_id,
        position,
        question_text,
        question_type: QuestionType::parse(&question_type),
        options: serde_json::from_str(&options).unwrap_or_default(),
        required,
    }
}

/// Create a questionnaire and its questions atomically
///
/// Questions get positions 1..n in the order given.
pub async fn create_questionnaire(
    pool: &SqlitePool,
    new: &NewQuestionnaire,
) -> Result<QuestionnaireWithQuestions, SqliteError> {
    let id = cuid2::create_id();
    let now = chrono::Utc::now().timestamp();
    let meta = serde_json::to_string(&new.meta).unwrap_or_else(|_| "{}".to_string());

    let mut tx = pool.begin().await?;

    sqlx::query(
        "INSERT INTO questionnaires (id, title, description, meta, created_by, is_active, created_at) \
         VALUES (?, ?, ?, ?, ?, 1, ?)",
    )
    .bind(&id)
    .bind(&new.title)
    .bind(&new.description)
    .bind(&meta)
    .bind(&new.created_by)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    let mut questions = Vec::with_capacity(new.questions.len());
    for (i, q) in new.questions.iter().enumerate() {
        let question_id = cuid2::create_id();
        let position = i as i64 + 1;
        let options = serde_json::to_string(&q.options).unwrap_or_else(|_| "[]".to_string());

        sqlx::query(
            "INSERT INTO questions (id, questionnaire_id, position, question_text, question_type, options, required) \
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&question_id)
        .bind(&id)
        .bind(position)
        .bind(&q.text)
        .bind(q.question_type.as_str())
        .bind(&options)
        .bind(q.required)
        .execute(&mut *tx)
        .await?;

        questions.push(QuestionRow {
            id: question_id,
            questionnaire_id: id.clone(),
            position,
            question_text: q.text.clone(),
            question_type: q.question_type,
            options: q.options.clone(),
            required: q.required,
        });
    }

    tx.commit().await?;

    Ok(QuestionnaireWithQuestions {
        questionnaire: QuestionnaireRow {
            id,
            title: new.title.clone(),
            description: new.description.clone(),
            meta: new.meta.clone(),
            created_by: new.created_by.clone(),
            is_active: true,
            created_at: now,
        },
        questions,
    })
}

/// Get a questionnaire by ID
pub async fn get_questionnaire(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<QuestionnaireRow>, SqliteError> {
    let row = sqlx::query_as::<_, QuestionnaireTuple>(
        "SELECT id, title, description, meta, created_by, is_active, created_at FROM questionnaires WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(questionnaire_from_tuple))
}

/// List all questionnaires newest first, each with its ordered questions
pub async fn list_questionnaires(
    pool: &SqlitePool,
) -> Result<Vec<QuestionnaireWithQuestions>, SqliteError> {
    let questionnaires = sqlx::query_as::<_, QuestionnaireTuple>(
        "SELECT id, title, description, meta, created_by, is_active, created_at FROM questionnaires \
         ORDER BY created_at DESC, rowid DESC",
    )
    .fetch_all(pool)
    .await?;

    let questions = sqlx::query_as::<_, QuestionTuple>(
        "SELECT id, questionnaire_id, position, question_text, question_type, options, required \
         FROM questions ORDER BY questionnaire_id, position, rowid",
    )
    .fetch_all(pool)
    .await?;

    let mut by_questionnaire: HashMap<String, Vec<QuestionRow>> = HashMap::new();
    for row in questions {
        let question = question_from_tuple(row);
        by_questionnaire
            .entry(question.questionnaire_id.clone())
            .or_default()
            .push(question);
    }

    Ok(questionnaires
        .into_iter()
        .map(|row| {
            let questionnaire = questionnaire_from_tuple(row);
            let questions = by_questionnaire
                .remove(&questionnaire.id)
                .unwrap_or_default();
            QuestionnaireWithQuestions {
                questionnaire,
                questions,
            }
        })
        .collect())
}

/// List a questionnaire's questions in presentation order
pub async fn list_questions(
    pool: &SqlitePool,
    questionnaire_id: &str,
) -> Result<Vec<QuestionRow>, SqliteError> {
    let rows = sqlx::query_as::<_, QuestionTuple>(
        "SELECT id, questionnaire_id, position, question_text, question_type, options, required \
         FROM questions WHERE questionnaire_id = ? ORDER BY position, rowid",
    )
    .bind(questionnaire_id)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(question_from_tuple).collect())
}

/// Get a question, only if it belongs to the given questionnaire
pub async fn get_question(
    pool: &SqlitePool,
    questionnaire_id: &str,
    question_id: &str,
) -> Result<Option<QuestionRow>, SqliteError> {
    let row = sqlx::query_as::<_, QuestionTuple>(
        "SELECT id, questionnaire_id, position, question_text, question_type, options, required \
         FROM questions WHERE id = ? AND questionnaire_id = ?",
    )
    .bind(question_id)
    .bind(questionnaire_id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(question_from_tuple))
}

/// Count the questions of a questionnaire
pub async fn count_questions(pool: &SqlitePool, questionnaire_id: &str) -> Result<i64, SqliteError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM questions WHERE questionnaire_id = ?")
        .bind(questionnaire_id)
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Delete a questionnaire (cascades to questions, sessions and answers)
///
/// Returns true if a row was deleted.
pub async fn delete_questionnaire(pool: &SqlitePool, id: &str) -> Result<bool, SqliteError> {
    let result = sqlx::query("DELETE FROM questionnaires WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
