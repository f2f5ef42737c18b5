use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use super::{
    handlers,
    middleware::{admin_middleware, auth_middleware},
    websocket::handle_websocket,
};
use crate::AppState;

pub fn create_router(state: AppState) -> Router<AppState> {
    // Public account routes
    let public_routes = Router::new()
        .route("/users/create", post(handlers::auth::register))
        .route("/users/resend-otp", post(handlers::auth::resend_otp))
        .route("/users/verify", post(handlers::auth::verify_otp))
        .route("/users/login", post(handlers::auth::login))
        .route("/users/forgot-password", post(handlers::auth::forgot_password))
        .route(
            "/users/forgot-password/verify-otp",
            post(handlers::auth::verify_forgot_password_otp),
        )
        .route("/users/reset-password", post(handlers::auth::reset_password));

    // Routes for the authenticated user
    let protected_routes = Router::new()
        .route("/users/profile", get(handlers::users::profile))
        .route("/users/profile", put(handlers::users::update_profile))
        .route(
            "/users/profile-picture",
            post(handlers::users::upload_profile_picture),
        )
        .route("/users/change-password", post(handlers::users::change_password))
        .route("/users/logout", get(handlers::users::logout))
        .route("/users", delete(handlers::users::delete_account))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    // Admin routes
    let admin_routes = Router::new()
        .route("/users", get(handlers::users::list_users))
        .layer(middleware::from_fn_with_state(state.clone(), admin_middleware));

    // WebSocket route authenticates its own handshake
    let ws_route = Router::new().route("/ws", get(handle_websocket));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .merge(ws_route)
        .with_state(state)
}
