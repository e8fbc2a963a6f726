//! User model and its request/response projections

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// User entity as stored in the `users` table
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string, never part of any outward representation
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// `false` marks a soft-deleted record
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a not-yet-persisted user. The repository assigns `id`,
    /// `created_at` and `updated_at` on insert.
    pub fn new(
        username: String,
        email: String,
        password_hash: String,
        first_name: Option<String>,
        last_name: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::nil(),
            username,
            email,
            password_hash,
            first_name,
            last_name,
            is_active: true,
            created_at: DateTime::<Utc>::MIN_UTC,
            updated_at: DateTime::<Utc>::MIN_UTC,
        }
    }

    /// Apply the fields present in `update`, leaving absent ones untouched
    pub fn apply_update(&mut self, update: UpdateUserRequest) {
        if let Some(username) = update.username {
            self.username = username;
        }
        if let Some(email) = update.email {
            self.email = email;
        }
        if let Some(first_name) = update.first_name {
            self.first_name = Some(first_name);
        }
        if let Some(last_name) = update.last_name {
            self.last_name = Some(last_name);
        }
        if let Some(is_active) = update.is_active {
            self.is_active = is_active;
        }
    }

    pub fn to_response(&self) -> UserResponse {
        UserResponse {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Request for user registration
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

/// Partial update payload; `None` (absent or `null`) means "leave unchanged"
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

/// Response for user operations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        let mut user = User::new(
            "alice".to_string(),
            "a@x.com".to_string(),
            "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            Some("Alice".to_string()),
            None,
        );
        user.id = Uuid::new_v4();
        user.created_at = Utc::now();
        user.updated_at = user.created_at;
        user
    }

    #[test]
    fn test_user_serialization_omits_password_hash() {
        let json = serde_json::to_value(sample_user()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["username"], "alice");
    }

    #[test]
    fn test_response_has_no_password_material() {
        let user = sample_user();
        let json = serde_json::to_string(&user.to_response()).unwrap();
        assert!(!json.contains("password"));
        assert!(!json.contains(&user.password_hash));
        assert!(!json.contains("last_name"));
    }

    #[test]
    fn test_apply_update_only_touches_present_fields() {
        let mut user = sample_user();
        let before = user.clone();

        user.apply_update(UpdateUserRequest {
            first_name: Some("Alicia".to_string()),
            ..Default::default()
        });

        assert_eq!(user.first_name.as_deref(), Some("Alicia"));
        assert_eq!(user.username, before.username);
        assert_eq!(user.email, before.email);
        assert_eq!(user.last_name, before.last_name);
        assert_eq!(user.is_active, before.is_active);
    }

    #[test]
    fn test_update_request_null_means_no_change() {
        let update: UpdateUserRequest =
            serde_json::from_str(r#"{"first_name": null, "email": "b@x.com"}"#).unwrap();
        assert!(update.first_name.is_none());
        assert_eq!(update.email.as_deref(), Some("b@x.com"));
        assert!(update.username.is_none());
    }

    #[test]
    fn test_new_user_is_active() {
        let user = User::new(
            "bob".to_string(),
            "b@x.com".to_string(),
            "hash".to_string(),
            None,
            None,
        );
        assert!(user.is_active);
        assert!(user.id.is_nil());
    }
}
