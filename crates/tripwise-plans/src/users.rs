//! Registered accounts.

use crate::{json_column, label_column, now_timestamp, PlanError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tripwise_types::{default_user_preferences, UserRole};
use uuid::Uuid;

/// A user as exposed to API clients. Never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub name: String,
    pub avatar: Option<String>,
    pub role: UserRole,
    pub preferences: Value,
    pub created_at: String,
    pub updated_at: String,
}

/// A user row together with its stored bcrypt hash, for login checks only.
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// Parameters for registering a user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    /// Already-hashed password.
    pub password_hash: String,
    pub name: String,
    pub role: UserRole,
}

/// Profile fields a user may change. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub preferences: Option<Value>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.avatar.is_none() && self.preferences.is_none()
    }
}

const USER_COLUMNS: &str = "id, email, name, avatar, role, preferences, created_at, updated_at";

/// Inserts a user with default travel preferences.
///
/// Returns [`PlanError::Conflict`] if the email is already registered.
pub fn create_user(conn: &Connection, new_user: &NewUser) -> Result<User, PlanError> {
    let now = now_timestamp();
    let preferences = serde_json::to_string(&default_user_preferences())?;

    conn.query_row(
        &format!(
            "INSERT INTO users (id, email, password, name, role, preferences, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?7)
             RETURNING {USER_COLUMNS}"
        ),
        params![
            Uuid::new_v4().to_string(),
            new_user.email,
            new_user.password_hash,
            new_user.name,
            new_user.role.as_str(),
            preferences,
            now,
        ],
        map_row_to_user,
    )
    .map_err(|e| {
        if PlanError::is_constraint(&e) {
            PlanError::Conflict(format!("email already registered: {}", new_user.email))
        } else {
            PlanError::Database(e)
        }
    })
}

/// Retrieves a user by ID.
pub fn get_user(conn: &Connection, user_id: &str) -> Result<User, PlanError> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        [user_id],
        map_row_to_user,
    )
    .optional()?
    .ok_or(PlanError::NotFound("user"))
}

/// Retrieves a user by email, if registered.
pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>, PlanError> {
    Ok(conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
            [email],
            map_row_to_user,
        )
        .optional()?)
}

/// Retrieves a user and their password hash by email.
pub fn get_user_credentials(
    conn: &Connection,
    email: &str,
) -> Result<Option<UserCredentials>, PlanError> {
    Ok(conn
        .query_row(
            &format!("SELECT {USER_COLUMNS}, password FROM users WHERE email = ?1"),
            [email],
            |row| {
                Ok(UserCredentials {
                    user: map_row_to_user(row)?,
                    password_hash: row.get(8)?,
                })
            },
        )
        .optional()?)
}

/// Applies a profile update and returns the refreshed user.
pub fn update_user_profile(
    conn: &Connection,
    user_id: &str,
    update: &ProfileUpdate,
) -> Result<User, PlanError> {
    if update.is_empty() {
        return Err(PlanError::Invalid("no profile fields to update".to_string()));
    }
    if let Some(name) = &update.name {
        if name.trim().is_empty() {
            return Err(PlanError::Invalid("name cannot be empty".to_string()));
        }
    }
    let preferences = update
        .preferences
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    conn.query_row(
        &format!(
            "UPDATE users SET
                name = COALESCE(?1, name),
                avatar = COALESCE(?2, avatar),
                preferences = COALESCE(?3, preferences),
                updated_at = ?4
             WHERE id = ?5
             RETURNING {USER_COLUMNS}"
        ),
        params![update.name, update.avatar, preferences, now_timestamp(), user_id],
        map_row_to_user,
    )
    .optional()?
    .ok_or(PlanError::NotFound("user"))
}

/// Counts registered users.
pub fn count_users(conn: &Connection) -> Result<u64, PlanError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?)
}

fn map_row_to_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        avatar: row.get(3)?,
        role: label_column(4, row.get(4)?)?,
        preferences: json_column(5, row.get(5)?)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_user, setup_db};
    use serde_json::json;

    #[test]
    fn test_user_lifecycle() {
        let conn = setup_db();
        let user = seed_user(&conn, "ada@example.com");
        assert_eq!(user.role, UserRole::User);
        assert_eq!(user.preferences, default_user_preferences());
        assert!(user.avatar.is_none());

        let fetched = get_user(&conn, &user.id).unwrap();
        assert_eq!(fetched, user);

        let by_email = get_user_by_email(&conn, "ada@example.com").unwrap();
        assert_eq!(by_email.map(|u| u.id), Some(user.id.clone()));

        let creds = get_user_credentials(&conn, "ada@example.com")
            .unwrap()
            .unwrap();
        assert_eq!(creds.password_hash, "hash");
        assert_eq!(count_users(&conn).unwrap(), 1);
    }

    #[test]
    fn test_duplicate_email_conflicts() {
        let conn = setup_db();
        seed_user(&conn, "dup@example.com");

        let err = create_user(
            &conn,
            &NewUser {
                email: "dup@example.com".to_string(),
                password_hash: "other".to_string(),
                name: "Twin".to_string(),
                role: UserRole::User,
            },
        )
        .unwrap_err();
        assert!(matches!(err, PlanError::Conflict(_)));
    }

    #[test]
    fn test_profile_update_is_partial() {
        let conn = setup_db();
        let user = seed_user(&conn, "grace@example.com");

        let updated = update_user_profile(
            &conn,
            &user.id,
            &ProfileUpdate {
                avatar: Some("https://cdn.example.com/g.png".to_string()),
                preferences: Some(json!({ "interests": ["museums"] })),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(updated.name, "Traveller");
        assert_eq!(updated.avatar.as_deref(), Some("https://cdn.example.com/g.png"));
        assert_eq!(updated.preferences["interests"][0], "museums");
    }

    #[test]
    fn test_profile_update_rejects_empty_and_missing() {
        let conn = setup_db();
        let user = seed_user(&conn, "x@example.com");

        assert!(matches!(
            update_user_profile(&conn, &user.id, &ProfileUpdate::default()),
            Err(PlanError::Invalid(_))
        ));

        let rename = ProfileUpdate {
            name: Some("New".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            update_user_profile(&conn, "no-such-user", &rename),
            Err(PlanError::NotFound("user"))
        ));
    }

    #[test]
    fn test_unknown_user() {
        let conn = setup_db();
        assert!(matches!(get_user(&conn, "missing"), Err(PlanError::NotFound("user"))));
        assert!(get_user_by_email(&conn, "nobody@example.com").unwrap().is_none());
    }
}
