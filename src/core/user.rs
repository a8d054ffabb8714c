//! User business logic - Staff accounts and roles.
//!
//! Users carry a role for the office tooling; API callers authenticate with API keys,
//! so no credentials are stored here.

use crate::{
    core::{Pagination, required_text},
    entities::{User, UserRole, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, QuerySelect, QueryTrait, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

/// Input for creating a user
#[derive(Debug, Clone, Deserialize)]
pub struct NewUser {
    /// Login name, unique
    pub username: String,
    /// Email address, unique
    pub email: String,
    /// Display name
    pub full_name: String,
    /// Role, defaults to office staff
    #[serde(default = "default_role")]
    pub role: UserRole,
}

const fn default_role() -> UserRole {
    UserRole::OfficeStaff
}

fn validate_email(email: &str) -> Result<String> {
    let email = required_text("email", email)?;
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(Error::validation(format!("invalid email address: {email}"))),
    }
}

/// Creates a user account.
///
/// # Errors
/// Returns a validation error for a blank username or a malformed email, and
/// [`Error::Conflict`] if the username or email is taken.
#[instrument(skip(db, input), fields(username = %input.username))]
pub async fn create_user<C>(db: &C, input: NewUser) -> Result<user::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let username = required_text("username", &input.username)?;
    let email = validate_email(&input.email)?;
    let full_name = required_text("full_name", &input.full_name)?;

    let now = chrono::Utc::now();
    let user = user::ActiveModel {
        username: Set(username),
        email: Set(email.to_lowercase()),
        full_name: Set(full_name),
        role: Set(input.role),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let created = user.insert(db).await?;
    info!(user_id = created.id, role = ?created.role, "Created user");
    Ok(created)
}

/// Finds a user by ID.
pub async fn get_user_by_id<C>(db: &C, user_id: i64) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find_by_id(user_id).one(db).await.map_err(Into::into)
}

/// Lists users by username, optionally filtered on role.
pub async fn list_users<C>(
    db: &C,
    role: Option<UserRole>,
    page: Pagination,
) -> Result<Vec<user::Model>>
where
    C: ConnectionTrait,
{
    User::find()
        .apply_if(role, |q, role| q.filter(user::Column::Role.eq(role)))
        .order_by_asc(user::Column::Username)
        .offset(page.skip)
        .limit(page.limit())
        .all(db)
        .await
        .map_err(Into::into)
}

/// Changes a user's role.
pub async fn set_user_role<C>(db: &C, user_id: i64, role: UserRole) -> Result<user::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let existing = get_user_by_id(db, user_id)
        .await?
        .ok_or_else(|| Error::not_found("user", user_id))?;

    let mut user: user::ActiveModel = existing.into();
    user.role = Set(role);
    user.updated_at = Set(chrono::Utc::now());
    user.update(db).await.map_err(Into::into)
}

/// Deactivates a user account.
pub async fn deactivate_user<C>(db: &C, user_id: i64) -> Result<user::Model>
where
    C: ConnectionTrait + TransactionTrait,
{
    let existing = get_user_by_id(db, user_id)
        .await?
        .ok_or_else(|| Error::not_found("user", user_id))?;

    let mut user: user::ActiveModel = existing.into();
    user.is_active = Set(false);
    user.updated_at = Set(chrono::Utc::now());
    let updated = user.update(db).await?;
    info!(user_id, "Deactivated user");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.to_string(),
            email: email.to_string(),
            full_name: "Office Staff".to_string(),
            role: UserRole::OfficeStaff,
        }
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("ops@example.com").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("ops@").is_err());
    }

    #[tokio::test]
    async fn test_create_user_and_duplicate() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_user(&db, new_user("amy", "Amy@Example.com")).await?;
        assert_eq!(user.email, "amy@example.com");
        assert_eq!(user.role, UserRole::OfficeStaff);

        let result = create_user(&db, new_user("amy", "other@example.com")).await;
        assert!(matches!(result.unwrap_err(), Error::Conflict { .. }));
        Ok(())
    }

    #[tokio::test]
    async fn test_set_role_and_deactivate() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_user(&db, new_user("bob", "bob@example.com")).await?;

        let promoted = set_user_role(&db, user.id, UserRole::Manager).await?;
        assert_eq!(promoted.role, UserRole::Manager);

        let managers = list_users(&db, Some(UserRole::Manager), Pagination::default()).await?;
        assert_eq!(managers.len(), 1);

        let inactive = deactivate_user(&db, user.id).await?;
        assert!(!inactive.is_active);
        Ok(())
    }

    #[tokio::test]
    async fn test_missing_user() -> Result<()> {
        let db = setup_test_db().await?;
        let result = set_user_role(&db, 42, UserRole::Driver).await;
        assert!(matches!(result.unwrap_err(), Error::NotFound { .. }));
        Ok(())
    }
}
