use axum::{
    extract::{Multipart, State},
    http::HeaderMap,
    Json,
};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    api::{
        response::{fcm_token, requested_timezone, ApiResponse},
        websocket::Notification,
    },
    error::{AppError, AppResult},
    models::UserResponse,
    services::accounts::RegisterInput,
    AppState,
};

use super::{account_service, image_extension, is_valid_email};

#[derive(Debug, Serialize)]
pub struct AuthData {
    pub token: String,
    pub user: UserResponse,
}

pub async fn register(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<UserResponse>> {
    let mut email = None;
    let mut password = None;
    let mut first_name = None;
    let mut last_name = None;
    let mut phone_code = None;
    let mut phone_number = None;
    let mut picture: Option<(Bytes, String)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read multipart field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "email" => email = Some(read_text(field).await?),
            "password" => password = Some(read_text(field).await?),
            "first_name" => first_name = Some(read_text(field).await?),
            "last_name" => last_name = Some(read_text(field).await?),
            "phone_code" => phone_code = Some(read_text(field).await?),
            "phone_number" => phone_number = Some(read_text(field).await?),
            "profile_picture" => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read file: {}", e)))?;
                picture = Some((data, content_type));
            }
            _ => {}
        }
    }

    let email = required(email, "email")?;
    let password = required(password, "password")?;
    let first_name = required(first_name, "first_name")?;
    let last_name = required(last_name, "last_name")?;

    if !is_valid_email(&email) {
        return Err(AppError::Validation("A valid email is required".to_string()));
    }
    validate_password(&password)?;
    validate_phone_pair(&phone_code, &phone_number)?;

    let profile_picture = match picture {
        Some((data, content_type)) if !data.is_empty() => {
            let key = format!("avatars/{}.{}", Uuid::new_v4(), image_extension(&content_type));
            Some(state.objects.upload(&key, data, &content_type).await?)
        }
        _ => None,
    };

    let user = account_service(&state)
        .register(RegisterInput {
            email,
            password,
            first_name,
            last_name,
            phone_code,
            phone_number,
            profile_picture,
        })
        .await?;

    Ok(ApiResponse::created(
        "Registration successful, please verify your email",
        UserResponse::new(&user, requested_timezone(&headers)),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ResendOtpRequest {
    pub email: String,
}

pub async fn resend_otp(
    State(state): State<AppState>,
    Json(req): Json<ResendOtpRequest>,
) -> AppResult<ApiResponse<()>> {
    account_service(&state).resend_otp(&req.email).await?;
    Ok(ApiResponse::message("OTP sent successfully"))
}

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    pub email: String,
    pub otp: String,
}

pub async fn verify_otp(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<VerifyOtpRequest>,
) -> AppResult<ApiResponse<AuthData>> {
    let (token, user) = account_service(&state)
        .verify_otp(&req.email, &req.otp, fcm_token(&headers))
        .await?;

    Ok(ApiResponse::ok(
        "Email verified successfully",
        AuthData {
            token,
            user: UserResponse::new(&user, requested_timezone(&headers)),
        },
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn login(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> AppResult<ApiResponse<AuthData>> {
    let (token, user) = account_service(&state)
        .login(&req.email, &req.password, fcm_token(&headers))
        .await?;

    // Tell any socket still open on the previous session that it is done
    let hub = state.hub.clone();
    let user_id = user.id;
    tokio::spawn(async move {
        hub.send_to_user(user_id, Notification::session_replaced())
            .await;
    });

    Ok(ApiResponse::ok(
        "Logged in successfully",
        AuthData {
            token,
            user: UserResponse::new(&user, requested_timezone(&headers)),
        },
    ))
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(req): Json<ForgotPasswordRequest>,
) -> AppResult<ApiResponse<()>> {
    account_service(&state).forgot_password(&req.email).await?;
    Ok(ApiResponse::message("Password reset OTP sent successfully"))
}

#[derive(Debug, Deserialize)]
pub struct VerifyForgotPasswordOtpRequest {
    pub email: String,
    pub otp: String,
}

pub async fn verify_forgot_password_otp(
    State(state): State<AppState>,
    Json(req): Json<VerifyForgotPasswordOtpRequest>,
) -> AppResult<ApiResponse<()>> {
    account_service(&state)
        .verify_forgot_password_otp(&req.email, &req.otp)
        .await?;
    Ok(ApiResponse::message("OTP verified successfully"))
}

#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub user_id: Uuid,
    pub new_password: String,
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(req): Json<ResetPasswordRequest>,
) -> AppResult<ApiResponse<()>> {
    validate_password(&req.new_password)?;
    account_service(&state)
        .reset_password(req.user_id, &req.new_password)
        .await?;
    Ok(ApiResponse::message("Password reset successfully"))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> AppResult<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read multipart field: {}", e)))
}

fn required(value: Option<String>, name: &str) -> AppResult<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::Validation(format!("{} is required", name))),
    }
}

pub(super) fn validate_password(password: &str) -> AppResult<()> {
    if password.len() < 8 {
        return Err(AppError::Validation(
            "Password must be at least 8 characters".to_string(),
        ));
    }
    Ok(())
}

pub(super) fn validate_phone_pair(
    phone_code: &Option<String>,
    phone_number: &Option<String>,
) -> AppResult<()> {
    if phone_code.is_some() != phone_number.is_some() {
        return Err(AppError::Validation(
            "phone_code and phone_number must be provided together".to_string(),
        ));
    }
    Ok(())
}
