pub mod accounts;
pub mod mailer;
pub mod otp;
pub mod password;
pub mod tokens;
