use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use crate::{
    error::{AppError, AppResult},
    models::{User, UserRole, UserStatus},
    services::tokens::TokenIssuer,
    storage::UserStore,
    AppState,
};

/// Resolve a bearer token to a live user.
///
/// A cryptographically valid token is not enough: it must also equal the
/// token currently stored on the user record, which is how logout and
/// re-login invalidate earlier sessions before they expire.
pub async fn authenticate(
    store: &dyn UserStore,
    tokens: &TokenIssuer,
    bearer: &str,
    required_role: Option<UserRole>,
    support_contact: &str,
) -> AppResult<User> {
    let claims = tokens.verify(bearer)?;

    // Soft-deleted users are excluded by the lookup itself
    let user = store
        .find_by_id(claims.sub)
        .await?
        .ok_or(AppError::Unauthorized)?;

    match &user.auth_token {
        Some(stored) if stored == bearer => {}
        _ => return Err(AppError::Unauthorized),
    }

    if let Some(required) = required_role {
        if user.role != required {
            return Err(AppError::Forbidden);
        }
    }

    match user.status {
        UserStatus::Active => {}
        UserStatus::Inactive | UserStatus::Blocked | UserStatus::Deleted => {
            return Err(AppError::AccountBlocked(support_contact.to_string()));
        }
    }

    Ok(user)
}

fn bearer_from_request(request: &Request) -> AppResult<String> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
        .ok_or(AppError::Unauthorized)
}

/// Authentication middleware: attaches the resolved user to the request.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_from_request(&request)?;
    let user = authenticate(
        state.store.as_ref(),
        &state.tokens,
        &token,
        None,
        &state.config.server.support_email,
    )
    .await?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Like `auth_middleware`, but only admins get through.
pub async fn admin_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_from_request(&request)?;
    let user = authenticate(
        state.store.as_ref(),
        &state.tokens,
        &token,
        Some(UserRole::Admin),
        &state.config.server.support_email,
    )
    .await?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
