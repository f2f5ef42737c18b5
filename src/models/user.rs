use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_code: Option<String>,
    pub phone_number: Option<String>,
    pub profile_picture: Option<String>,
    pub auth_token: Option<String>,
    pub fcm_token: Option<String>,
    pub email_verification_otp: Option<String>,
    pub forgot_password_otp: Option<String>,
    pub is_email_verified: bool,
    pub status: UserStatus,
    pub role: UserRole,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Inactive,
    Active,
    Blocked,
    Deleted,
}

impl Default for UserStatus {
    fn default() -> Self {
        Self::Active
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    User,
    Admin,
}

impl Default for UserRole {
    fn default() -> Self {
        Self::User
    }
}

/// Client-facing view of a user. Credentials and OTP codes never leave the
/// server; dates are rendered in the caller's requested timezone.
#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_code: Option<String>,
    pub phone_number: Option<String>,
    pub profile_picture: Option<String>,
    pub is_email_verified: bool,
    pub status: UserStatus,
    pub role: UserRole,
    pub created_at: String,
    pub updated_at: String,
}

impl UserResponse {
    pub fn new(user: &User, timezone: &str) -> Self {
        // Unknown zones fall back to UTC
        let tz: Tz = timezone.parse().unwrap_or(chrono_tz::UTC);
        Self {
            id: user.id,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone_code: user.phone_code.clone(),
            phone_number: user.phone_number.clone(),
            profile_picture: user.profile_picture.clone(),
            is_email_verified: user.is_email_verified,
            status: user.status,
            role: user.role,
            created_at: format_in_zone(user.created_at, tz),
            updated_at: format_in_zone(user.updated_at, tz),
        }
    }
}

fn format_in_zone(dt: DateTime<Utc>, tz: Tz) -> String {
    dt.with_timezone(&tz).format("%Y-%m-%d %H:%M:%S").to_string()
}
