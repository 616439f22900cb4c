//! User accounts: creation with derived usernames, credential checks

use thiserror::Error;

use crate::data::types::{NewUser, UserRole, UserRow};
use crate::data::{DataError, TransactionalRepository};
use crate::utils::password::{PasswordError, hash_password, verify_password};

#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Data(#[from] DataError),
}

/// Parameters for a new account
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: UserRole,
}

/// Local part of an email address, used as the username stem
pub fn username_base(email: &str) -> &str {
    email.split('@').next().unwrap_or(email)
}

/// Split a display name into first name and the remainder
pub fn split_name(name: &str) -> (String, String) {
    let mut words = name.split_whitespace();
    let first = words.next().unwrap_or_default().to_string();
    let rest = words.collect::<Vec<_>>().join(" ");
    (first, rest)
}

/// First free username among `base`, `base1`, `base2`, ...
pub async fn unique_username(
    repo: &dyn TransactionalRepository,
    base: &str,
) -> Result<String, DataError> {
    if !repo.username_exists(base).await? {
        return Ok(base.to_string());
    }
    let mut counter = 1u32;
    loop {
        let candidate = format!("{}{}", base, counter);
        if !repo.username_exists(&candidate).await? {
            return Ok(candidate);
        }
        counter += 1;
    }
}

/// Create an account, deriving a unique username from the email
///
/// Fails with `DataError::Conflict` when the email is already registered.
pub async fn create_user(
    repo: &dyn TransactionalRepository,
    input: CreateUser,
) -> Result<UserRow, UserError> {
    let username = unique_username(repo, username_base(&input.email)).await?;
    let (first_name, last_name) = split_name(&input.name);
    let password_hash = hash_password(&input.password)?;

    let user = repo
        .create_user(&NewUser {
            username,
            email: input.email,
            first_name,
            last_name,
            password_hash,
            is_admin: input.role.is_admin(),
        })
        .await?;

    tracing::debug!(user_id = %user.id, username = %user.username, role = %user.role(), "User created");
    Ok(user)
}

/// Look up an active user by email and check the password
///
/// Unknown emails, inactive accounts and wrong passwords all yield `None`.
pub async fn verify_credentials(
    repo: &dyn TransactionalRepository,
    email: &str,
    password: &str,
) -> Result<Option<UserRow>, UserError> {
    let Some(user) = repo.get_user_by_email(email).await? else {
        return Ok(None);
    };
    if !user.is_active {
        return Ok(None);
    }
    match verify_password(password, &user.password_hash) {
        Ok(true) => Ok(Some(user)),
        Ok(false) => Ok(None),
        Err(e) => {
            tracing::warn!(user_id = %user.id, error = %e, "Stored password hash is unreadable");
            Ok(None)
        }
    }
}
