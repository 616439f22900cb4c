//! User repository for SQLite operations

use sqlx::SqlitePool;

use crate::data::sqlite::SqliteError;
use crate::data::types::{NewUser, UserRow, UserWithAssignment};

type UserTuple = (
    String,
    String,
    String,
    String,
    String,
    String,
    bool,
    bool,
    i64,
    i64,
);

const USER_COLUMNS: &str = "id, username, email, first_name, last_name, password_hash, is_admin, is_active, created_at, updated_at";

fn user_from_tuple(row: UserTuple) -> UserRow {
    let (
        id,
        username,
        email,
        first_name,
        last_name,
        password_hash,
        is_admin,
        is_active,
        created_at,
        updated_at,
    ) = row;
    UserRow {
        id,
        username,
        email,
        first_name,
        last_name,
        password_hash,
        is_admin,
        is_active,
        created_at,
        updated_at,
    }
}

/// Column named in a SQLite `UNIQUE constraint failed: users.<column>` error
fn violated_column(e: &sqlx::Error) -> Option<&str> {
    let sqlx::Error::Database(db) = e else {
        return None;
    };
    db.message()
        .strip_prefix("UNIQUE constraint failed: ")
        .and_then(|cols| cols.split(", ").next())
        .and_then(|col| col.strip_prefix("users."))
}

/// Create a new user with a generated CUID2 ID
///
/// Returns `Conflict` when the email or username is already taken.
pub async fn create_user(pool: &SqlitePool, new: &NewUser) -> Result<UserRow, SqliteError> {
    let id = cuid2::create_id();
    let now = chrono::Utc::now().timestamp();

    sqlx::query(
        "INSERT INTO users (id, username, email, first_name, last_name, password_hash, is_admin, is_active, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, 1, ?, ?)",
    )
    .bind(&id)
    .bind(&new.username)
    .bind(&new.email)
    .bind(&new.first_name)
    .bind(&new.last_name)
    .bind(&new.password_hash)
    .bind(new.is_admin)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .map_err(|e| {
        let message = if violated_column(&e) == Some("username") {
            format!("User with username {} already exists", new.username)
        } else {
            format!("User with email {} already exists", new.email)
        };
        SqliteError::on_unique_violation(e, message)
    })?;

    Ok(UserRow {
        id,
        username: new.username.clone(),
        email: new.email.clone(),
        first_name: new.first_name.clone(),
        last_name: new.last_name.clone(),
        password_hash: new.password_hash.clone(),
        is_admin: new.is_admin,
        is_active: true,
        created_at: now,
        updated_at: now,
    })
}

/// Get a user by ID
pub async fn get_user(pool: &SqlitePool, id: &str) -> Result<Option<UserRow>, SqliteError> {
    let row = sqlx::query_as::<_, UserTuple>(&format!(
        "SELECT {} FROM users WHERE id = ?",
        USER_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(user_from_tuple))
}

/// Get a user by email
pub async fn get_by_email(pool: &SqlitePool, email: &str) -> Result<Option<UserRow>, SqliteError> {
    let row = sqlx::query_as::<_, UserTuple>(&format!(
        "SELECT {} FROM users WHERE email = ?",
        USER_COLUMNS
    ))
    .bind(email)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(user_from_tuple))
}

/// Check whether a username is already taken
pub async fn username_exists(pool: &SqlitePool, username: &str) -> Result<bool, SqliteError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = ?)")
        .bind(username)
        .fetch_one(pool)
        .await?;
    Ok(exists)
}

/// List all users, newest first, with their current in-progress questionnaire
pub async fn list_users(pool: &SqlitePool) -> Result<Vec<UserWithAssignment>, SqliteError> {
    let rows = sqlx::query_as::<
        _,
        (
            String,
            String,
            String,
            String,
            String,
            String,
            bool,
            bool,
            i64,
            i64,
            Option<String>,
        ),
    >(
        r#"
        SELECT u.id, u.username, u.email, u.first_name, u.last_name, u.password_hash,
               u.is_admin, u.is_active, u.created_at, u.updated_at,
               (SELECT s.questionnaire_id FROM sessions s
                WHERE s.user_id = u.id AND s.is_completed = 0
                ORDER BY s.updated_at DESC, s.rowid DESC LIMIT 1)
        FROM users u
        ORDER BY u.created_at DESC, u.rowid DESC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(
            |(
                id,
                username,
                email,
                first_name,
                last_name,
                password_hash,
                is_admin,
                is_active,
                created_at,
                updated_at,
                assigned_questionnaire_id,
            )| UserWithAssignment {
                user: UserRow {
                    id,
                    username,
                    email,
                    first_name,
                    last_name,
                    password_hash,
                    is_admin,
                    is_active,
                    created_at,
                    updated_at,
                },
                assigned_questionnaire_id,
            },
        )
        .collect())
}

/// Questionnaire of the user's most recently updated incomplete session
pub async fn current_questionnaire_id(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Option<String>, SqliteError> {
    let id: Option<String> = sqlx::query_scalar(
        "SELECT questionnaire_id FROM sessions WHERE user_id = ? AND is_completed = 0 \
         ORDER BY updated_at DESC, rowid DESC LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(id)
}

/// Set the active flag. Returns None if the user doesn't exist.
pub async fn set_user_active(
    pool: &SqlitePool,
    id: &str,
    is_active: bool,
) -> Result<Option<UserRow>, SqliteError> {
    let now = chrono::Utc::now().timestamp();
    let result = sqlx::query("UPDATE users SET is_active = ?, updated_at = ? WHERE id = ?")
        .bind(is_active)
        .bind(now)
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Ok(None);
    }
    get_user(pool, id).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sqlite::repositories::test_support::{insert_user, setup_test_pool};

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            first_name: "Test".to_string(),
            last_name: "User".to_string(),
            password_hash: "hash".to_string(),
            is_admin: false,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_user() {
        let pool = setup_test_pool().await;
        let user = create_user(&pool, &new_user("test", "test@example.com"))
            .await
            .unwrap();

        assert!(!user.id.is_empty());
        assert!(user.is_active);

        let fetched = get_user(&pool, &user.id).await.unwrap().unwrap();
        assert_eq!(fetched.email, "test@example.com");
        assert_eq!(fetched.display_name(), "Test User");

        let by_email = get_by_email(&pool, "test@example.com").await.unwrap();
        assert_eq!(by_email.unwrap().id, user.id);
    }

    #[tokio::test]
    async fn test_get_missing_user() {
        let pool = setup_test_pool().await;
        assert!(get_user(&pool, "nope").await.unwrap().is_none());
        assert!(get_by_email(&pool, "nope@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let pool = setup_test_pool().await;
        create_user(&pool, &new_user("a", "dup@example.com"))
            .await
            .unwrap();
        let err = create_user(&pool, &new_user("b", "dup@example.com"))
            .await
            .unwrap_err();
        match err {
            SqliteError::Conflict(msg) => {
                assert_eq!(msg, "User with email dup@example.com already exists")
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_duplicate_username_names_the_username() {
        let pool = setup_test_pool().await;
        create_user(&pool, &new_user("same", "one@example.com"))
            .await
            .unwrap();
        let err = create_user(&pool, &new_user("same", "two@example.com"))
            .await
            .unwrap_err();
        match err {
            SqliteError::Conflict(msg) => assert_eq!(msg, "User with username same already exists"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_username_exists() {
        let pool = setup_test_pool().await;
        assert!(!username_exists(&pool, "jane").await.unwrap());
        insert_user(&pool, "jane").await;
        assert!(username_exists(&pool, "jane").await.unwrap());
    }

    #[tokio::test]
    async fn test_list_users_newest_first() {
        let pool = setup_test_pool().await;
        let first = insert_user(&pool, "first").await;
        let second = insert_user(&pool, "second").await;

        let users = list_users(&pool).await.unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].user.id, second);
        assert_eq!(users[1].user.id, first);
        assert!(users[0].assigned_questionnaire_id.is_none());
    }

    #[tokio::test]
    async fn test_set_user_active() {
        let pool = setup_test_pool().await;
        let id = insert_user(&pool, "toggle").await;

        let updated = set_user_active(&pool, &id, false).await.unwrap().unwrap();
        assert!(!updated.is_active);

        assert!(set_user_active(&pool, "missing", false).await.unwrap().is_none());
    }
}
