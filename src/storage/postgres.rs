use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{User, UserStatus},
    storage::{redis::RedisClient, NewUser, ProfileUpdate, UserPage, UserStore},
};

const LIST_CACHE_TTL: Duration = Duration::from_secs(60);

pub struct PgUserStore {
    db: PgPool,
    cache: RedisClient,
}

impl PgUserStore {
    pub fn new(db: PgPool, cache: RedisClient) -> Self {
        Self { db, cache }
    }

    /// Drop cached list pages without holding up the mutation that made
    /// them stale. Failures are only observable in the logs.
    fn invalidate_list_cache(&self) {
        let cache = self.cache.clone();
        tokio::spawn(async move {
            if let Err(e) = cache.drop_list_pages().await {
                tracing::warn!("Failed to drop cached user list pages: {}", e);
            }
        });
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn insert(&self, user: NewUser) -> AppResult<User> {
        let created: User = sqlx::query_as(
            r#"
            INSERT INTO users (id, email, password_hash, first_name, last_name,
                               phone_code, phone_number, profile_picture,
                               email_verification_otp)
            VALUES ($1, LOWER($2), $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.phone_code)
        .bind(&user.phone_number)
        .bind(&user.profile_picture)
        .bind(&user.email_verification_otp)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            // Two concurrent registrations can both pass the existence
            // check; the partial unique index decides the winner.
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                AppError::UserAlreadyExists
            } else {
                AppError::Database(e)
            }
        })?;

        self.invalidate_list_cache();
        Ok(created)
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let user: Option<User> = sqlx::query_as(
            "SELECT * FROM users WHERE LOWER(email) = LOWER($1) AND deleted_at IS NULL",
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let user: Option<User> =
            sqlx::query_as("SELECT * FROM users WHERE id = $1 AND deleted_at IS NULL")
                .bind(id)
                .fetch_optional(&self.db)
                .await?;
        Ok(user)
    }

    async fn set_email_verification_otp(&self, id: Uuid, otp: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE users SET email_verification_otp = $1, updated_at = NOW()
            WHERE id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(otp)
        .bind(id)
        .execute(&self.db)
        .await?;

        self.invalidate_list_cache();
        Ok(())
    }

    async fn mark_email_verified(
        &self,
        id: Uuid,
        token: &str,
        fcm_token: Option<&str>,
    ) -> AppResult<User> {
        let user: User = sqlx::query_as(
            r#"
            UPDATE users
            SET auth_token = $1,
                fcm_token = $2,
                email_verification_otp = NULL,
                is_email_verified = TRUE,
                updated_at = NOW()
            WHERE id = $3 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(token)
        .bind(fcm_token)
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::UserNotFound)?;

        self.invalidate_list_cache();
        Ok(user)
    }

    async fn store_session(
        &self,
        id: Uuid,
        token: &str,
        fcm_token: Option<&str>,
    ) -> AppResult<User> {
        let user: User = sqlx::query_as(
            r#"
            UPDATE users SET auth_token = $1, fcm_token = $2, updated_at = NOW()
            WHERE id = $3 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(token)
        .bind(fcm_token)
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::UserNotFound)?;

        self.invalidate_list_cache();
        Ok(user)
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE users SET password_hash = $1, updated_at = NOW()
            WHERE id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(password_hash)
        .bind(id)
        .execute(&self.db)
        .await?;

        self.invalidate_list_cache();
        Ok(())
    }

    async fn set_forgot_password_otp(&self, id: Uuid, otp: &str) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE users SET forgot_password_otp = $1, updated_at = NOW()
            WHERE id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(otp)
        .bind(id)
        .execute(&self.db)
        .await?;

        self.invalidate_list_cache();
        Ok(())
    }

    async fn clear_otps_mark_verified(&self, id: Uuid) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET forgot_password_otp = NULL,
                email_verification_otp = NULL,
                is_email_verified = TRUE,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&self.db)
        .await?;

        self.invalidate_list_cache();
        Ok(())
    }

    async fn clear_session(&self, id: Uuid) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE users SET auth_token = NULL, fcm_token = NULL, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&self.db)
        .await?;

        self.invalidate_list_cache();
        Ok(())
    }

    async fn soft_delete(&self, id: Uuid) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE users SET deleted_at = NOW(), status = $1, updated_at = NOW()
            WHERE id = $2 AND deleted_at IS NULL
            "#,
        )
        .bind(UserStatus::Deleted)
        .bind(id)
        .execute(&self.db)
        .await?;

        self.invalidate_list_cache();
        Ok(())
    }

    async fn update_profile(&self, id: Uuid, update: ProfileUpdate) -> AppResult<User> {
        let user: User = sqlx::query_as(
            r#"
            UPDATE users
            SET first_name = COALESCE($1, first_name),
                last_name = COALESCE($2, last_name),
                phone_code = COALESCE($3, phone_code),
                phone_number = COALESCE($4, phone_number),
                profile_picture = COALESCE($5, profile_picture),
                updated_at = NOW()
            WHERE id = $6 AND deleted_at IS NULL
            RETURNING *
            "#,
        )
        .bind(&update.first_name)
        .bind(&update.last_name)
        .bind(&update.phone_code)
        .bind(&update.phone_number)
        .bind(&update.profile_picture)
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .ok_or(AppError::UserNotFound)?;

        self.invalidate_list_cache();
        Ok(user)
    }

    async fn list(&self, page: i64, per_page: i64) -> AppResult<UserPage> {
        match self.cache.get_list_page(page, per_page).await {
            Ok(Some(cached)) => {
                if let Ok(page) = serde_json::from_str::<UserPage>(&cached) {
                    return Ok(page);
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to read cached user list page: {}", e),
        }

        let users: Vec<User> = sqlx::query_as(
            r#"
            SELECT * FROM users WHERE deleted_at IS NULL
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(per_page)
        .bind((page - 1) * per_page)
        .fetch_all(&self.db)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE deleted_at IS NULL")
            .fetch_one(&self.db)
            .await?;

        let result = UserPage {
            users,
            total,
            page,
            per_page,
        };

        if let Ok(payload) = serde_json::to_string(&result) {
            if let Err(e) = self
                .cache
                .set_list_page(page, per_page, &payload, LIST_CACHE_TTL)
                .await
            {
                tracing::warn!("Failed to cache user list page: {}", e);
            }
        }

        Ok(result)
    }
}
