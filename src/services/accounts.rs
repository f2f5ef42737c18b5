use std::sync::Arc;

use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::User,
    services::{mailer::Mailer, otp::OtpGenerator, password, tokens::TokenIssuer},
    storage::{NewUser, ProfileUpdate, UserPage, UserStore},
};

#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_code: Option<String>,
    pub phone_number: Option<String>,
    pub profile_picture: Option<String>,
}

/// Account lifecycle: registration, email-OTP verification, login,
/// password reset, logout, soft delete. Exactly one session token is live
/// per user; issuing a new one invalidates the previous session.
pub struct AccountService {
    store: Arc<dyn UserStore>,
    tokens: TokenIssuer,
    otp: OtpGenerator,
    mailer: Mailer,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn UserStore>,
        tokens: TokenIssuer,
        otp: OtpGenerator,
        mailer: Mailer,
    ) -> Self {
        Self {
            store,
            tokens,
            otp,
            mailer,
        }
    }

    /// Create an unverified account and dispatch the verification code.
    /// No token is issued until the email is verified.
    pub async fn register(&self, input: RegisterInput) -> AppResult<User> {
        if self.store.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::UserAlreadyExists);
        }

        let password_hash = password::hash_password(&input.password)?;
        let code = self.otp.generate();

        let user = self
            .store
            .insert(NewUser {
                email: input.email.to_lowercase(),
                password_hash,
                first_name: input.first_name,
                last_name: input.last_name,
                phone_code: input.phone_code,
                phone_number: input.phone_number,
                profile_picture: input.profile_picture,
                email_verification_otp: code.clone(),
            })
            .await?;

        self.dispatch_verification_email(user.email.clone(), code);
        Ok(user)
    }

    pub async fn resend_otp(&self, email: &str) -> AppResult<()> {
        let user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AppError::UserNotFound)?;

        if user.is_email_verified {
            return Err(AppError::AlreadyVerified);
        }

        let code = self.otp.generate();
        self.store.set_email_verification_otp(user.id, &code).await?;
        self.dispatch_verification_email(user.email, code);
        Ok(())
    }

    /// Consume the verification code and open the first session.
    pub async fn verify_otp(
        &self,
        email: &str,
        otp: &str,
        fcm_token: Option<&str>,
    ) -> AppResult<(String, User)> {
        let user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AppError::UserNotFound)?;

        match &user.email_verification_otp {
            Some(stored) if stored == otp => {}
            _ => return Err(AppError::InvalidOtp),
        }

        let token = self.tokens.issue(user.id, user.role)?;
        let user = self
            .store
            .mark_email_verified(user.id, &token, fcm_token)
            .await?;

        Ok((token, user))
    }

    /// Unknown email and wrong password fail identically.
    pub async fn login(
        &self,
        email: &str,
        password_plain: &str,
        fcm_token: Option<&str>,
    ) -> AppResult<(String, User)> {
        let user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !password::verify_password(password_plain, &user.password_hash) {
            return Err(AppError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id, user.role)?;
        let user = self.store.store_session(user.id, &token, fcm_token).await?;

        Ok((token, user))
    }

    pub async fn change_password(&self, user_id: Uuid, new_password: &str) -> AppResult<()> {
        let password_hash = password::hash_password(new_password)?;
        self.store.set_password_hash(user_id, &password_hash).await
    }

    pub async fn forgot_password(&self, email: &str) -> AppResult<()> {
        let user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidEmail)?;

        let code = self.otp.generate();
        self.store.set_forgot_password_otp(user.id, &code).await?;
        self.dispatch_reset_email(user.email, code);
        Ok(())
    }

    /// Consume the forgot-password code. A missing user looks the same as
    /// a wrong code. No token is issued; the caller must reset next.
    pub async fn verify_forgot_password_otp(&self, email: &str, otp: &str) -> AppResult<()> {
        let user = self
            .store
            .find_by_email(email)
            .await?
            .ok_or(AppError::InvalidOtp)?;

        match &user.forgot_password_otp {
            Some(stored) if stored == otp => {}
            _ => return Err(AppError::InvalidOtp),
        }

        self.store.clear_otps_mark_verified(user.id).await
    }

    /// Allowed only once the forgot-password code has been consumed.
    pub async fn reset_password(&self, user_id: Uuid, new_password: &str) -> AppResult<()> {
        let user = self
            .store
            .find_by_id(user_id)
            .await?
            .ok_or(AppError::UserNotFound)?;

        if user.forgot_password_otp.is_some() {
            return Err(AppError::OtpNotVerified);
        }

        let password_hash = password::hash_password(new_password)?;
        self.store.set_password_hash(user.id, &password_hash).await
    }

    pub async fn logout(&self, user_id: Uuid) -> AppResult<()> {
        self.store.clear_session(user_id).await
    }

    pub async fn delete_account(&self, user_id: Uuid) -> AppResult<()> {
        self.store.soft_delete(user_id).await
    }

    pub async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> AppResult<User> {
        self.store.update_profile(user_id, update).await
    }

    pub async fn list_users(&self, page: i64, per_page: i64) -> AppResult<UserPage> {
        self.store.list(page, per_page).await
    }

    fn dispatch_verification_email(&self, email: String, code: String) {
        let mailer = self.mailer.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer.send_verification_otp(&email, &code).await {
                tracing::warn!("Failed to send verification email to {}: {}", email, e);
            }
        });
    }

    fn dispatch_reset_email(&self, email: String, code: String) {
        let mailer = self.mailer.clone();
        tokio::spawn(async move {
            if let Err(e) = mailer.send_password_reset_otp(&email, &code).await {
                tracing::warn!("Failed to send password reset email to {}: {}", email, e);
            }
        });
    }
}
