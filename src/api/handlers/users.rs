use axum::{
    extract::{Multipart, Query, State},
    http::HeaderMap,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    api::response::{requested_timezone, ApiResponse},
    error::{AppError, AppResult},
    models::{User, UserResponse},
    storage::ProfileUpdate,
    AppState,
};

use super::{
    account_service,
    auth::{validate_password, validate_phone_pair},
    image_extension,
};

pub async fn profile(
    Extension(user): Extension<User>,
    headers: HeaderMap,
) -> AppResult<ApiResponse<UserResponse>> {
    Ok(ApiResponse::ok(
        "Profile fetched successfully",
        UserResponse::new(&user, requested_timezone(&headers)),
    ))
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_code: Option<String>,
    pub phone_number: Option<String>,
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    headers: HeaderMap,
    Json(req): Json<UpdateProfileRequest>,
) -> AppResult<ApiResponse<UserResponse>> {
    if req.first_name.is_none()
        && req.last_name.is_none()
        && req.phone_code.is_none()
        && req.phone_number.is_none()
    {
        return Err(AppError::BadRequest("No fields to update".to_string()));
    }
    validate_phone_pair(&req.phone_code, &req.phone_number)?;

    let updated = account_service(&state)
        .update_profile(
            user.id,
            ProfileUpdate {
                first_name: req.first_name,
                last_name: req.last_name,
                phone_code: req.phone_code,
                phone_number: req.phone_number,
                profile_picture: None,
            },
        )
        .await?;

    Ok(ApiResponse::ok(
        "Profile updated successfully",
        UserResponse::new(&updated, requested_timezone(&headers)),
    ))
}

pub async fn upload_profile_picture(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> AppResult<ApiResponse<UserResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read multipart field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        if name != "profile_picture" {
            continue;
        }

        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read file: {}", e)))?;

        let key = format!("avatars/{}.{}", user.id, image_extension(&content_type));
        let url = state.objects.upload(&key, data, &content_type).await?;

        let updated = account_service(&state)
            .update_profile(
                user.id,
                ProfileUpdate {
                    profile_picture: Some(url),
                    ..Default::default()
                },
            )
            .await?;

        return Ok(ApiResponse::ok(
            "Profile picture updated successfully",
            UserResponse::new(&updated, requested_timezone(&headers)),
        ));
    }

    Err(AppError::BadRequest(
        "profile_picture file required".to_string(),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub new_password: String,
}

pub async fn change_password(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(req): Json<ChangePasswordRequest>,
) -> AppResult<ApiResponse<()>> {
    validate_password(&req.new_password)?;
    account_service(&state)
        .change_password(user.id, &req.new_password)
        .await?;
    Ok(ApiResponse::message("Password changed successfully"))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<ApiResponse<()>> {
    account_service(&state).logout(user.id).await?;
    Ok(ApiResponse::message("Logged out successfully"))
}

pub async fn delete_account(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<ApiResponse<()>> {
    account_service(&state).delete_account(user.id).await?;
    Ok(ApiResponse::message("Account deleted successfully"))
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_per_page")]
    pub per_page: i64,
}

fn default_page() -> i64 {
    1
}

fn default_per_page() -> i64 {
    20
}

#[derive(Debug, Serialize)]
pub struct UserListData {
    pub users: Vec<UserResponse>,
    pub total: i64,
    pub page: i64,
    pub per_page: i64,
}

pub async fn list_users(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<UserListData>> {
    let page = query.page.max(1);
    let per_page = query.per_page.clamp(1, 100);

    let result = account_service(&state).list_users(page, per_page).await?;
    let timezone = requested_timezone(&headers);

    Ok(ApiResponse::ok(
        "Users fetched successfully",
        UserListData {
            users: result
                .users
                .iter()
                .map(|u| UserResponse::new(u, timezone))
                .collect(),
            total: result.total,
            page: result.page,
            per_page: result.per_page,
        },
    ))
}
