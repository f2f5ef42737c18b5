use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use userhub_backend::{
    config::JwtConfig,
    error::{AppError, AppResult},
    models::{User, UserRole, UserStatus},
    services::{
        accounts::{AccountService, RegisterInput},
        mailer::Mailer,
        otp::OtpGenerator,
        tokens::TokenIssuer,
    },
    storage::{NewUser, ProfileUpdate, UserPage, UserStore},
};

pub const SUPPORT_CONTACT: &str = "support@userhub.local";

/// In-memory credential store for driving the account service and guard
/// without a database.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: Uuid) -> Option<User> {
        self.users.lock().unwrap().get(&id).cloned()
    }

    /// Live-record lookup, like the real store. Used by tests to read
    /// generated OTP codes back out.
    pub fn get_by_email(&self, email: &str) -> Option<User> {
        self.users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.deleted_at.is_none() && u.email.eq_ignore_ascii_case(email))
            .cloned()
    }

    pub fn count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    pub fn set_role(&self, id: Uuid, role: UserRole) {
        if let Some(user) = self.users.lock().unwrap().get_mut(&id) {
            user.role = role;
        }
    }

    pub fn set_status(&self, id: Uuid, status: UserStatus) {
        if let Some(user) = self.users.lock().unwrap().get_mut(&id) {
            user.status = status;
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert(&self, new: NewUser) -> AppResult<User> {
        let mut users = self.users.lock().unwrap();
        let duplicate = users
            .values()
            .any(|u| u.deleted_at.is_none() && u.email.eq_ignore_ascii_case(&new.email));
        if duplicate {
            return Err(AppError::UserAlreadyExists);
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email: new.email.to_lowercase(),
            password_hash: new.password_hash,
            first_name: new.first_name,
            last_name: new.last_name,
            phone_code: new.phone_code,
            phone_number: new.phone_number,
            profile_picture: new.profile_picture,
            auth_token: None,
            fcm_token: None,
            email_verification_otp: Some(new.email_verification_otp),
            forgot_password_otp: None,
            is_email_verified: false,
            status: UserStatus::Active,
            role: UserRole::User,
            deleted_at: None,
            created_at: now,
            updated_at: now,
        };
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.get_by_email(email))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .get(&id)
            .filter(|u| u.deleted_at.is_none())
            .cloned())
    }

    async fn set_email_verification_otp(&self, id: Uuid, otp: &str) -> AppResult<()> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.get_mut(&id).filter(|u| u.deleted_at.is_none()) {
            user.email_verification_otp = Some(otp.to_string());
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn mark_email_verified(
        &self,
        id: Uuid,
        token: &str,
        fcm_token: Option<&str>,
    ) -> AppResult<User> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(&id)
            .filter(|u| u.deleted_at.is_none())
            .ok_or(AppError::UserNotFound)?;
        user.auth_token = Some(token.to_string());
        user.fcm_token = fcm_token.map(str::to_string);
        user.email_verification_otp = None;
        user.is_email_verified = true;
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn store_session(
        &self,
        id: Uuid,
        token: &str,
        fcm_token: Option<&str>,
    ) -> AppResult<User> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(&id)
            .filter(|u| u.deleted_at.is_none())
            .ok_or(AppError::UserNotFound)?;
        user.auth_token = Some(token.to_string());
        user.fcm_token = fcm_token.map(str::to_string);
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.get_mut(&id).filter(|u| u.deleted_at.is_none()) {
            user.password_hash = password_hash.to_string();
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn set_forgot_password_otp(&self, id: Uuid, otp: &str) -> AppResult<()> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.get_mut(&id).filter(|u| u.deleted_at.is_none()) {
            user.forgot_password_otp = Some(otp.to_string());
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn clear_otps_mark_verified(&self, id: Uuid) -> AppResult<()> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.get_mut(&id).filter(|u| u.deleted_at.is_none()) {
            user.forgot_password_otp = None;
            user.email_verification_otp = None;
            user.is_email_verified = true;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn clear_session(&self, id: Uuid) -> AppResult<()> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.get_mut(&id).filter(|u| u.deleted_at.is_none()) {
            user.auth_token = None;
            user.fcm_token = None;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn soft_delete(&self, id: Uuid) -> AppResult<()> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.get_mut(&id).filter(|u| u.deleted_at.is_none()) {
            user.deleted_at = Some(Utc::now());
            user.status = UserStatus::Deleted;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> AppResult<User> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .get_mut(&id)
            .filter(|u| u.deleted_at.is_none())
            .ok_or(AppError::UserNotFound)?;
        if let Some(v) = update.first_name {
            user.first_name = v;
        }
        if let Some(v) = update.last_name {
            user.last_name = v;
        }
        if let Some(v) = update.phone_code {
            user.phone_code = Some(v);
        }
        if let Some(v) = update.phone_number {
            user.phone_number = Some(v);
        }
        if let Some(v) = update.profile_picture {
            user.profile_picture = Some(v);
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn list(&self, page: i64, per_page: i64) -> AppResult<UserPage> {
        let users = self.users.lock().unwrap();
        let mut live: Vec<User> = users
            .values()
            .filter(|u| u.deleted_at.is_none())
            .cloned()
            .collect();
        live.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = live.len() as i64;
        let start = ((page - 1) * per_page) as usize;
        let paged: Vec<User> = live
            .into_iter()
            .skip(start)
            .take(per_page as usize)
            .collect();

        Ok(UserPage {
            users: paged,
            total,
            page,
            per_page,
        })
    }
}

pub fn test_tokens() -> TokenIssuer {
    TokenIssuer::new(&JwtConfig {
        secret: "test-secret".to_string(),
        ttl_secs: 3600,
        issuer: "userhub-test".to_string(),
    })
}

pub fn test_service(store: Arc<MemoryStore>) -> AccountService {
    AccountService::new(store, test_tokens(), OtpGenerator::new(6), Mailer::log_only())
}

pub fn register_input(email: &str, password: &str) -> RegisterInput {
    RegisterInput {
        email: email.to_string(),
        password: password.to_string(),
        first_name: "Test".to_string(),
        last_name: "User".to_string(),
        phone_code: None,
        phone_number: None,
        profile_picture: None,
    }
}
