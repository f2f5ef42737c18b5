use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{error::AppResult, models::User};

pub mod postgres;
pub mod redis;
pub mod s3;

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_code: Option<String>,
    pub phone_number: Option<String>,
    pub profile_picture: Option<String>,
    pub email_verification_otp: String,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_code: Option<String>,
    pub phone_number: Option<String>,
    pub profile_picture: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPage {
    pub users: Vec<User>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

/// Persistence seam for user records. Every lookup excludes soft-deleted
/// rows and matches emails case-insensitively; every mutation drops the
/// cached list pages without blocking the caller.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn insert(&self, user: NewUser) -> AppResult<User>;
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Overwrite the pending email-verification code.
    async fn set_email_verification_otp(&self, id: Uuid, otp: &str) -> AppResult<()>;

    /// Consume the email-verification code: mark the email verified, store
    /// the freshly issued token and push handle, clear the code.
    async fn mark_email_verified(
        &self,
        id: Uuid,
        token: &str,
        fcm_token: Option<&str>,
    ) -> AppResult<User>;

    /// Store a freshly issued token and push handle, replacing whatever
    /// session existed before.
    async fn store_session(
        &self,
        id: Uuid,
        token: &str,
        fcm_token: Option<&str>,
    ) -> AppResult<User>;

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> AppResult<()>;
    async fn set_forgot_password_otp(&self, id: Uuid, otp: &str) -> AppResult<()>;

    /// Consume the forgot-password code: clear both codes and mark the
    /// email verified (proving control of the inbox verifies it).
    async fn clear_otps_mark_verified(&self, id: Uuid) -> AppResult<()>;

    async fn clear_session(&self, id: Uuid) -> AppResult<()>;
    async fn soft_delete(&self, id: Uuid) -> AppResult<()>;
    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> AppResult<User>;
    async fn list(&self, page: i64, per_page: i64) -> AppResult<UserPage>;
}
