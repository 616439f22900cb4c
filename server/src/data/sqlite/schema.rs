//! SQLite schema definitions
//!
//! Initial schema with all tables. Timestamps are unix seconds; listings that
//! sort by time break ties on `rowid` so insertion order wins.

/// Current schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Complete schema SQL
pub const SCHEMA: &str = r#"
-- =============================================================================
-- Infrastructure: Schema version tracking
-- =============================================================================
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    version INTEGER NOT NULL,
    applied_at INTEGER NOT NULL,
    description TEXT
);

CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at INTEGER NOT NULL,
    checksum TEXT NOT NULL,
    execution_time_ms INTEGER,
    success INTEGER NOT NULL DEFAULT 1
);

-- =============================================================================
-- 1. Users
-- =============================================================================
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    username TEXT NOT NULL UNIQUE CHECK(length(username) >= 1 AND length(username) <= 150),
    email TEXT NOT NULL UNIQUE CHECK(length(email) >= 3),
    first_name TEXT NOT NULL DEFAULT '',
    last_name TEXT NOT NULL DEFAULT '',
    password_hash TEXT NOT NULL,
    is_admin INTEGER NOT NULL DEFAULT 0,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_users_created ON users(created_at DESC);

-- =============================================================================
-- 2. Questionnaires (created_by survives user deletion as NULL)
-- =============================================================================
CREATE TABLE IF NOT EXISTS questionnaires (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL CHECK(length(title) >= 1 AND length(title) <= 255),
    description TEXT,
    meta TEXT NOT NULL DEFAULT '{}',
    created_by TEXT REFERENCES users(id) ON DELETE SET NULL,
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_questionnaires_created ON questionnaires(created_at DESC);

-- =============================================================================
-- 3. Questions (owned by a questionnaire)
-- =============================================================================
CREATE TABLE IF NOT EXISTS questions (
    id TEXT PRIMARY KEY,
    questionnaire_id TEXT NOT NULL REFERENCES questionnaires(id) ON DELETE CASCADE,
    position INTEGER NOT NULL DEFAULT 0,
    question_text TEXT NOT NULL,
    question_type TEXT NOT NULL DEFAULT 'text'
        CHECK(question_type IN ('text', 'textarea', 'choice', 'checkbox', 'rating')),
    options TEXT NOT NULL DEFAULT '[]',
    required INTEGER NOT NULL DEFAULT 1
);

CREATE INDEX IF NOT EXISTS idx_questions_questionnaire ON questions(questionnaire_id, position);

-- =============================================================================
-- 4. Sessions (one per user/questionnaire pair)
-- =============================================================================
CREATE TABLE IF NOT EXISTS sessions (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
    questionnaire_id TEXT NOT NULL REFERENCES questionnaires(id) ON DELETE CASCADE,
    current_index INTEGER NOT NULL DEFAULT 0 CHECK(current_index >= 0),
    total_questions INTEGER NOT NULL DEFAULT 0 CHECK(total_questions >= 0),
    is_completed INTEGER NOT NULL DEFAULT 0,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,
    expires_at INTEGER,
    UNIQUE(user_id, questionnaire_id)
);

CREATE INDEX IF NOT EXISTS idx_sessions_user_open ON sessions(user_id, is_completed, updated_at DESC);

-- =============================================================================
-- 5. Answers (one row per submission)
-- =============================================================================
CREATE TABLE IF NOT EXISTS answers (
    id TEXT PRIMARY KEY,
    session_id TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
    question_id TEXT NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
    answer_text TEXT,
    answer_json TEXT NOT NULL DEFAULT '{}',
    answered_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_answers_session ON answers(session_id, answered_at);
CREATE INDEX IF NOT EXISTS idx_answers_answered ON answers(answered_at DESC);

-- =============================================================================
-- 6. Audit log (append-only; actor survives user deletion as NULL)
-- =============================================================================
CREATE TABLE IF NOT EXISTS audit_logs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    actor_id TEXT REFERENCES users(id) ON DELETE SET NULL,
    action TEXT NOT NULL,
    object_type TEXT,
    object_id TEXT,
    payload TEXT NOT NULL DEFAULT '{}',
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_audit_logs_created ON audit_logs(created_at DESC);
CREATE INDEX IF NOT EXISTS idx_audit_logs_actor ON audit_logs(actor_id);
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_declares_all_tables() {
        for table in [
            "schema_version",
            "schema_migrations",
            "users",
            "questionnaires",
            "questions",
            "sessions",
            "answers",
            "audit_logs",
        ] {
            assert!(
                SCHEMA.contains(&format!("CREATE TABLE IF NOT EXISTS {} (", table)),
                "missing table {}",
                table
            );
        }
    }

    #[test]
    fn test_session_pair_is_unique() {
        assert!(SCHEMA.contains("UNIQUE(user_id, questionnaire_id)"));
    }
}
