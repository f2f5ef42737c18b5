mod common;

use std::sync::Arc;

use common::{register_input, test_service, MemoryStore};
use userhub_backend::error::AppError;

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    let service = test_service(store.clone());

    service
        .register(register_input("a@x.com", "Passw0rd!"))
        .await
        .expect("first registration");

    let err = service
        .register(register_input("a@x.com", "Different1!"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::UserAlreadyExists));
    assert_eq!(store.count(), 1);
}

#[tokio::test]
async fn duplicate_check_is_case_insensitive() {
    let store = Arc::new(MemoryStore::new());
    let service = test_service(store.clone());

    service
        .register(register_input("a@x.com", "Passw0rd!"))
        .await
        .unwrap();

    let err = service
        .register(register_input("A@X.COM", "Passw0rd!"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::UserAlreadyExists));
}

#[tokio::test]
async fn registration_then_otp_verification() {
    let store = Arc::new(MemoryStore::new());
    let service = test_service(store.clone());

    let user = service
        .register(register_input("a@x.com", "Passw0rd!"))
        .await
        .unwrap();
    assert!(!user.is_email_verified);
    assert!(user.auth_token.is_none());

    // Wrong code is rejected
    let err = service
        .verify_otp("a@x.com", "000000", None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidOtp));

    // The right code opens the first session
    let code = store
        .get_by_email("a@x.com")
        .unwrap()
        .email_verification_otp
        .unwrap();
    let (token, verified) = service
        .verify_otp("a@x.com", &code, Some("fcm-handle"))
        .await
        .unwrap();
    assert!(!token.is_empty());
    assert!(verified.is_email_verified);
    assert_eq!(verified.auth_token.as_deref(), Some(token.as_str()));
    assert_eq!(verified.fcm_token.as_deref(), Some("fcm-handle"));
    assert!(verified.email_verification_otp.is_none());

    // A consumed code never works twice
    let err = service
        .verify_otp("a@x.com", &code, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidOtp));
}

#[tokio::test]
async fn verify_otp_for_unknown_user_is_not_found() {
    let store = Arc::new(MemoryStore::new());
    let service = test_service(store);

    let err = service
        .verify_otp("nobody@x.com", "123456", None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::UserNotFound));
}

#[tokio::test]
async fn resend_otp_replaces_the_pending_code() {
    let store = Arc::new(MemoryStore::new());
    let service = test_service(store.clone());

    service
        .register(register_input("a@x.com", "Passw0rd!"))
        .await
        .unwrap();
    let first = store
        .get_by_email("a@x.com")
        .unwrap()
        .email_verification_otp
        .unwrap();

    service.resend_otp("a@x.com").await.unwrap();
    let second = store
        .get_by_email("a@x.com")
        .unwrap()
        .email_verification_otp
        .unwrap();
    assert_ne!(first, second);

    // Old code is gone
    let err = service.verify_otp("a@x.com", &first, None).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidOtp));
    service.verify_otp("a@x.com", &second, None).await.unwrap();
}

#[tokio::test]
async fn resend_otp_fails_once_verified() {
    let store = Arc::new(MemoryStore::new());
    let service = test_service(store.clone());

    service
        .register(register_input("a@x.com", "Passw0rd!"))
        .await
        .unwrap();
    let code = store
        .get_by_email("a@x.com")
        .unwrap()
        .email_verification_otp
        .unwrap();
    service.verify_otp("a@x.com", &code, None).await.unwrap();

    let err = service.resend_otp("a@x.com").await.unwrap_err();
    assert!(matches!(err, AppError::AlreadyVerified));

    let err = service.resend_otp("nobody@x.com").await.unwrap_err();
    assert!(matches!(err, AppError::UserNotFound));
}

#[tokio::test]
async fn login_rejects_unknown_email_and_wrong_password_identically() {
    let store = Arc::new(MemoryStore::new());
    let service = test_service(store);

    service
        .register(register_input("a@x.com", "Passw0rd!"))
        .await
        .unwrap();

    let unknown = service
        .login("nobody@x.com", "Passw0rd!", None)
        .await
        .unwrap_err();
    let wrong = service.login("a@x.com", "WrongPass1!", None).await.unwrap_err();
    assert!(matches!(unknown, AppError::InvalidCredentials));
    assert!(matches!(wrong, AppError::InvalidCredentials));
}

#[tokio::test]
async fn login_accepts_any_email_casing() {
    let store = Arc::new(MemoryStore::new());
    let service = test_service(store);

    service
        .register(register_input("Mixed@Case.com", "Passw0rd!"))
        .await
        .unwrap();

    let (token, user) = service
        .login("mixed@case.COM", "Passw0rd!", None)
        .await
        .unwrap();
    assert!(!token.is_empty());
    assert_eq!(user.email, "mixed@case.com");
}

#[tokio::test]
async fn forgot_password_flow_requires_otp_verification() {
    let store = Arc::new(MemoryStore::new());
    let service = test_service(store.clone());

    let user = service
        .register(register_input("a@x.com", "Passw0rd!"))
        .await
        .unwrap();

    service.forgot_password("a@x.com").await.unwrap();
    let code = store
        .get_by_email("a@x.com")
        .unwrap()
        .forgot_password_otp
        .expect("reset code stored");

    // Skipping verification is refused while the code is outstanding
    let err = service.reset_password(user.id, "NewPass1!").await.unwrap_err();
    assert!(matches!(err, AppError::OtpNotVerified));

    // Wrong code is refused and keeps the gate closed
    let err = service
        .verify_forgot_password_otp("a@x.com", "000000")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::InvalidOtp));
    let err = service.reset_password(user.id, "NewPass1!").await.unwrap_err();
    assert!(matches!(err, AppError::OtpNotVerified));

    // Correct code opens the gate exactly once
    service
        .verify_forgot_password_otp("a@x.com", &code)
        .await
        .unwrap();
    service.reset_password(user.id, "NewPass1!").await.unwrap();

    // New password works, old one does not
    service.login("a@x.com", "NewPass1!", None).await.unwrap();
    let err = service.login("a@x.com", "Passw0rd!", None).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));
}

#[tokio::test]
async fn forgot_password_for_unknown_email_fails() {
    let store = Arc::new(MemoryStore::new());
    let service = test_service(store);

    let err = service.forgot_password("nobody@x.com").await.unwrap_err();
    assert!(matches!(err, AppError::InvalidEmail));
}

#[tokio::test]
async fn forgot_password_verification_marks_email_verified() {
    let store = Arc::new(MemoryStore::new());
    let service = test_service(store.clone());

    // Never verified through the registration flow
    service
        .register(register_input("a@x.com", "Passw0rd!"))
        .await
        .unwrap();
    service.forgot_password("a@x.com").await.unwrap();
    let code = store
        .get_by_email("a@x.com")
        .unwrap()
        .forgot_password_otp
        .unwrap();

    service
        .verify_forgot_password_otp("a@x.com", &code)
        .await
        .unwrap();

    let user = store.get_by_email("a@x.com").unwrap();
    assert!(user.is_email_verified);
    assert!(user.forgot_password_otp.is_none());
    assert!(user.email_verification_otp.is_none());
}

#[tokio::test]
async fn reset_password_for_unknown_user_fails() {
    let store = Arc::new(MemoryStore::new());
    let service = test_service(store);

    let err = service
        .reset_password(uuid::Uuid::new_v4(), "NewPass1!")
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::UserNotFound));
}

#[tokio::test]
async fn change_password_takes_effect_immediately() {
    let store = Arc::new(MemoryStore::new());
    let service = test_service(store);

    let user = service
        .register(register_input("a@x.com", "Passw0rd!"))
        .await
        .unwrap();

    service.change_password(user.id, "Changed1!").await.unwrap();
    service.login("a@x.com", "Changed1!", None).await.unwrap();
    let err = service.login("a@x.com", "Passw0rd!", None).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));
}

#[tokio::test]
async fn deleted_account_cannot_log_in_or_reregister_conflict() {
    let store = Arc::new(MemoryStore::new());
    let service = test_service(store.clone());

    let user = service
        .register(register_input("a@x.com", "Passw0rd!"))
        .await
        .unwrap();
    service.delete_account(user.id).await.unwrap();

    // Indistinguishable from an account that never existed
    let err = service.login("a@x.com", "Passw0rd!", None).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidCredentials));

    // The email is free again for a fresh registration
    service
        .register(register_input("a@x.com", "Passw0rd!"))
        .await
        .expect("email is reusable after soft delete");
}

#[tokio::test]
async fn profile_update_changes_only_the_given_fields() {
    let store = Arc::new(MemoryStore::new());
    let service = test_service(store);

    let user = service
        .register(register_input("a@x.com", "Passw0rd!"))
        .await
        .unwrap();

    let updated = service
        .update_profile(
            user.id,
            userhub_backend::storage::ProfileUpdate {
                first_name: Some("Grace".to_string()),
                phone_code: Some("+1".to_string()),
                phone_number: Some("5550100".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.first_name, "Grace");
    assert_eq!(updated.last_name, "User");
    assert_eq!(updated.phone_code.as_deref(), Some("+1"));
    assert_eq!(updated.phone_number.as_deref(), Some("5550100"));
}

#[tokio::test]
async fn listing_excludes_soft_deleted_users() {
    let store = Arc::new(MemoryStore::new());
    let service = test_service(store.clone());

    let a = service
        .register(register_input("a@x.com", "Passw0rd!"))
        .await
        .unwrap();
    service
        .register(register_input("b@x.com", "Passw0rd!"))
        .await
        .unwrap();
    service.delete_account(a.id).await.unwrap();

    let page = service.list_users(1, 20).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.users.len(), 1);
    assert_eq!(page.users[0].email, "b@x.com");
}
