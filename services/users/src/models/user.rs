//! User model and related functionality

use chrono::{DateTime, Utc};
use common::jwt::Role;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User entity
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub contact: String,
    pub role: Role,
    pub profile_picture: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// New user creation payload, password already hashed
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub contact: String,
    pub role: Role,
}

/// User update payload
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub contact: Option<String>,
    pub profile_picture: Option<String>,
}

/// Request for user registration
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub contact: String,
    pub role: Option<String>,
}

/// User login credentials
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Profile update request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub contact: Option<String>,
    pub profile_picture: Option<String>,
}

/// Public view of a user. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub contact: String,
    pub role: Role,
    pub profile_picture: String,
    pub bookings: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            contact: user.contact.clone(),
            role: user.role,
            profile_picture: user.profile_picture.clone(),
            bookings: Vec::new(),
            created_at: user.created_at,
        }
    }
}

/// Response for register and login
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub user: UserResponse,
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "jane_doe".to_string(),
            email: "jane@example.com".to_string(),
            password_hash: "$argon2id$v=19$secret".to_string(),
            contact: "+254 700 000000".to_string(),
            role: Role::VenueOwner,
            profile_picture: "default.jpg".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_user_response_hides_password() {
        let user = sample_user();
        let json = serde_json::to_value(UserResponse::from(&user)).unwrap();

        assert_eq!(json["_id"], user.id.to_string());
        assert_eq!(json["role"], "VENUE_OWNER");
        assert_eq!(json["profilePicture"], "default.jpg");
        assert!(json.get("password").is_none());
        assert!(json.get("passwordHash").is_none());
        assert!(!json.to_string().contains("argon2"));
    }

    #[test]
    fn test_auth_response_flattens_user() {
        let user = sample_user();
        let response = AuthResponse {
            user: UserResponse::from(&user),
            token: "abc".to_string(),
        };
        let json = serde_json::to_value(response).unwrap();

        assert_eq!(json["token"], "abc");
        assert_eq!(json["username"], "jane_doe");
    }
}
