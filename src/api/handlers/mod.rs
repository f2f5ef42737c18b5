use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    services::{accounts::AccountService, otp::OtpGenerator},
    AppState,
};

pub mod auth;
pub mod users;

pub(crate) fn account_service(state: &AppState) -> AccountService {
    AccountService::new(
        state.store.clone(),
        state.tokens.clone(),
        OtpGenerator::new(state.config.otp.length),
        state.mailer.clone(),
    )
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn image_extension(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "bin",
    }
}
