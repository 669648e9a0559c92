use chrono::Duration;
use claim::{assert_err, assert_ok, assert_some};
use fitness_gym::core::password::Credential;
use fitness_gym::core::AppErrorType;
use fitness_gym::db::{tokens, users};
use fitness_gym::models::subscriptions::CurrentMembership;
use fitness_gym::models::tokens::TokenPurpose;
use fitness_gym::models::users::{
    ChangePasswordRequest, EmailRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
    Role, UpdateProfileRequest, UserStatus,
};
use fitness_gym::services::accounts;

use crate::helpers::{RecordingMailer, TestApp, PASSWORD};

fn registration(email: &str) -> RegisterRequest {
    RegisterRequest {
        name: "Amina Yusuf".to_string(),
        email: email.to_string(),
        password: "s3cure-pass".to_string(),
        phone: Some("0800000000".to_string()),
        address: None,
        birth_date: None,
    }
}

fn login_request(email: &str, password: &str) -> LoginRequest {
    LoginRequest {
        email: email.to_string(),
        password: password.to_string(),
    }
}

#[tokio::test]
async fn register_creates_unverified_account_and_sends_link() {
    let app = TestApp::spawn().await;

    let response = accounts::register(&app.pool, app.mailer.as_ref(), &app.app, registration("Amina@Gym.test"))
        .await
        .unwrap();

    assert!(response.requires_verification);
    assert!(response.verification_email_sent);
    assert_eq!(response.email, "amina@gym.test");

    let user = assert_some!(users::find_user_by_email(&app.pool, "amina@gym.test").await.unwrap());
    assert_eq!(user.status, UserStatus::Inactive);
    assert_eq!(user.role, Role::Client);
    assert!(!user.email_verified);
    assert!(!Credential::from_stored(&user.password).is_legacy());

    let token = assert_some!(app.open_token(user.id, TokenPurpose::EmailVerification).await);
    let sent = app.mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "amina@gym.test");
    assert!(sent[0].body.contains(&format!("http://gym.test/verify-email/{}", token)));
}

#[tokio::test]
async fn duplicate_registration_is_a_conflict() {
    let app = TestApp::spawn().await;
    assert_ok!(accounts::register(&app.pool, app.mailer.as_ref(), &app.app, registration("dup@gym.test")).await);

    let error = accounts::register(&app.pool, app.mailer.as_ref(), &app.app, registration("DUP@gym.test"))
        .await
        .unwrap_err();
    assert_eq!(error.error_type, AppErrorType::ConflictError);
}

#[tokio::test]
async fn registration_survives_a_failed_verification_email() {
    let app = TestApp::with_mailer(RecordingMailer::failing()).await;

    let response = accounts::register(&app.pool, app.mailer.as_ref(), &app.app, registration("quiet@gym.test"))
        .await
        .unwrap();

    assert!(!response.verification_email_sent);
    assert_some!(users::find_user_by_email(&app.pool, "quiet@gym.test").await.unwrap());
}

#[tokio::test]
async fn unverified_account_cannot_log_in_until_verified() {
    let app = TestApp::spawn().await;
    accounts::register(&app.pool, app.mailer.as_ref(), &app.app, registration("new@gym.test"))
        .await
        .unwrap();

    let error = accounts::login(&app.pool, &app.keys, login_request("new@gym.test", "s3cure-pass"))
        .await
        .unwrap_err();
    assert_eq!(
        error.error_type,
        AppErrorType::VerificationRequired {
            email: "new@gym.test".to_string()
        }
    );

    let user = users::find_user_by_email(&app.pool, "new@gym.test").await.unwrap().unwrap();
    let token = app.open_token(user.id, TokenPurpose::EmailVerification).await.unwrap();

    let session = accounts::verify_email(&app.pool, &app.keys, &token).await.unwrap();
    assert_eq!(session.user.status, UserStatus::Active);
    assert!(session.user.email_verified);
    assert_ok!(app.keys.verify(&session.token));

    assert_ok!(accounts::login(&app.pool, &app.keys, login_request("new@gym.test", "s3cure-pass")).await);
}

#[tokio::test]
async fn verification_token_is_single_use() {
    let app = TestApp::spawn().await;
    accounts::register(&app.pool, app.mailer.as_ref(), &app.app, registration("once@gym.test"))
        .await
        .unwrap();
    let user = users::find_user_by_email(&app.pool, "once@gym.test").await.unwrap().unwrap();
    let token = app.open_token(user.id, TokenPurpose::EmailVerification).await.unwrap();

    assert_ok!(accounts::verify_email(&app.pool, &app.keys, &token).await);
    let error = accounts::verify_email(&app.pool, &app.keys, &token).await.unwrap_err();
    assert_eq!(error.error_type, AppErrorType::InvalidTokenError);
}

#[tokio::test]
async fn tokens_only_work_for_their_own_purpose() {
    let app = TestApp::spawn().await;
    accounts::register(&app.pool, app.mailer.as_ref(), &app.app, registration("scope@gym.test"))
        .await
        .unwrap();
    let user = users::find_user_by_email(&app.pool, "scope@gym.test").await.unwrap().unwrap();
    let token = app.open_token(user.id, TokenPurpose::EmailVerification).await.unwrap();

    let error = accounts::check_reset_token(&app.pool, &token).await.unwrap_err();
    assert_eq!(error.error_type, AppErrorType::InvalidTokenError);

    let reset = ResetPasswordRequest {
        password: "hijacked".to_string(),
    };
    assert_err!(accounts::reset_password(&app.pool, &token, reset).await);
}

#[tokio::test]
async fn expired_verification_token_is_reported_as_expired() {
    let app = TestApp::spawn().await;
    let user = app.seed_user_with(Role::Client, UserStatus::Inactive, false, PASSWORD).await;

    let token = {
        let mut conn = app.pool.acquire().await.unwrap();
        tokens::issue_token(&mut conn, user.user_id, TokenPurpose::EmailVerification, Duration::hours(-1))
            .await
            .unwrap()
    };

    let error = accounts::verify_email(&app.pool, &app.keys, &token.token).await.unwrap_err();
    assert_eq!(error.error_type, AppErrorType::ExpiredTokenError);
}

#[tokio::test]
async fn resend_replaces_the_outstanding_verification_token() {
    let app = TestApp::spawn().await;
    accounts::register(&app.pool, app.mailer.as_ref(), &app.app, registration("again@gym.test"))
        .await
        .unwrap();
    let user = users::find_user_by_email(&app.pool, "again@gym.test").await.unwrap().unwrap();
    let first = app.open_token(user.id, TokenPurpose::EmailVerification).await.unwrap();

    let request = EmailRequest {
        email: "again@gym.test".to_string(),
    };
    assert_ok!(accounts::resend_verification(&app.pool, app.mailer.as_ref(), &app.app, request).await);

    let second = app.open_token(user.id, TokenPurpose::EmailVerification).await.unwrap();
    assert_ne!(first, second);
    assert_eq!(app.mailer.sent().len(), 2);

    let error = accounts::verify_email(&app.pool, &app.keys, &first).await.unwrap_err();
    assert_eq!(error.error_type, AppErrorType::InvalidTokenError);
    assert_ok!(accounts::verify_email(&app.pool, &app.keys, &second).await);
}

#[tokio::test]
async fn unknown_email_gets_the_generic_answer() {
    let app = TestApp::spawn().await;
    let request = || EmailRequest {
        email: "ghost@gym.test".to_string(),
    };

    assert_ok!(accounts::resend_verification(&app.pool, app.mailer.as_ref(), &app.app, request()).await);
    assert_ok!(accounts::forgot_password(&app.pool, app.mailer.as_ref(), &app.app, request()).await);
    assert!(app.mailer.sent().is_empty());
}

#[tokio::test]
async fn legacy_plaintext_password_is_upgraded_on_login() {
    let app = TestApp::spawn().await;
    let user = app.seed_user_with(Role::Client, UserStatus::Active, true, "old-school").await;

    let session = accounts::login(&app.pool, &app.keys, login_request(&user.email, "old-school"))
        .await
        .unwrap();
    assert_eq!(session.user.id, user.user_id);

    let stored = users::get_user_by_id(&app.pool, user.user_id).await.unwrap().password;
    assert!(stored.starts_with("$argon2"));
    assert!(!Credential::from_stored(&stored).is_legacy());

    assert_ok!(accounts::login(&app.pool, &app.keys, login_request(&user.email, "old-school")).await);
}

#[tokio::test]
async fn failed_credential_upgrade_does_not_fail_the_login() {
    let app = TestApp::spawn().await;
    let user = app.seed_user_with(Role::Client, UserStatus::Active, true, "old-school").await;
    sqlx::query(
        r#"
        CREATE TRIGGER reject_password_writes BEFORE UPDATE OF password ON users
        BEGIN
            SELECT RAISE(ABORT, 'password column is read-only');
        END
        "#,
    )
    .execute(&app.pool)
    .await
    .unwrap();

    let session = assert_ok!(
        accounts::login(&app.pool, &app.keys, login_request(&user.email, "old-school")).await
    );
    assert_eq!(session.user.id, user.user_id);

    let stored = users::get_user_by_id(&app.pool, user.user_id).await.unwrap().password;
    assert_eq!(Credential::from_stored(&stored), Credential::Plaintext("old-school".to_string()));
}

#[tokio::test]
async fn wrong_password_and_unknown_email_look_the_same() {
    let app = TestApp::spawn().await;
    let user = app.seed_user(Role::Client).await;

    let wrong = accounts::login(&app.pool, &app.keys, login_request(&user.email, "nope"))
        .await
        .unwrap_err();
    let unknown = accounts::login(&app.pool, &app.keys, login_request("nobody@gym.test", "nope"))
        .await
        .unwrap_err();

    assert_eq!(wrong.error_type, AppErrorType::AuthError);
    assert_eq!(wrong.message(), unknown.message());
}

#[tokio::test]
async fn suspended_account_cannot_log_in() {
    let app = TestApp::spawn().await;
    let user = app.seed_user_with(Role::Client, UserStatus::Suspended, true, PASSWORD).await;

    let error = accounts::login(&app.pool, &app.keys, login_request(&user.email, PASSWORD))
        .await
        .unwrap_err();
    assert_eq!(error.error_type, AppErrorType::AuthError);
}

#[tokio::test]
async fn password_reset_flow_consumes_the_token() {
    let app = TestApp::spawn().await;
    let user = app.seed_user(Role::Client).await;

    let request = EmailRequest {
        email: user.email.clone(),
    };
    accounts::forgot_password(&app.pool, app.mailer.as_ref(), &app.app, request)
        .await
        .unwrap();
    let token = app.open_token(user.user_id, TokenPurpose::PasswordReset).await.unwrap();
    assert!(app.mailer.sent()[0].body.contains(&format!("/reset-password/{}", token)));

    assert_ok!(accounts::check_reset_token(&app.pool, &token).await);
    let reset = |password: &str| ResetPasswordRequest {
        password: password.to_string(),
    };
    assert_ok!(accounts::reset_password(&app.pool, &token, reset("brand-new-pass")).await);
    assert_err!(accounts::reset_password(&app.pool, &token, reset("second-try")).await);

    assert_err!(accounts::login(&app.pool, &app.keys, login_request(&user.email, PASSWORD)).await);
    assert_ok!(accounts::login(&app.pool, &app.keys, login_request(&user.email, "brand-new-pass")).await);
}

#[tokio::test]
async fn change_password_requires_the_current_one() {
    let app = TestApp::spawn().await;
    let user = app.seed_user(Role::Client).await;

    let error = accounts::change_password(
        &app.pool,
        &user,
        ChangePasswordRequest {
            current_password: "not-it".to_string(),
            new_password: "next-password".to_string(),
        },
    )
    .await
    .unwrap_err();
    assert_eq!(error.error_type, AppErrorType::PayloadValidationError);

    assert_ok!(
        accounts::change_password(
            &app.pool,
            &user,
            ChangePasswordRequest {
                current_password: PASSWORD.to_string(),
                new_password: "next-password".to_string(),
            },
        )
        .await
    );
    assert_ok!(accounts::login(&app.pool, &app.keys, login_request(&user.email, "next-password")).await);
}

#[tokio::test]
async fn profile_update_rejects_an_email_in_use() {
    let app = TestApp::spawn().await;
    let first = app.seed_user(Role::Client).await;
    let second = app.seed_user(Role::Client).await;

    let request = UpdateProfileRequest {
        name: "Renamed Person".to_string(),
        email: second.email.clone(),
        phone: None,
        address: None,
        birth_date: None,
    };
    let error = accounts::update_profile(&app.pool, &first, request).await.unwrap_err();
    assert_eq!(error.error_type, AppErrorType::ConflictError);
}

#[tokio::test]
async fn client_without_subscriptions_reports_inactive_membership() {
    let app = TestApp::spawn().await;
    let user = app.seed_user(Role::Client).await;

    let current = accounts::current_user(&app.pool, user.user_id).await.unwrap();

    assert!(matches!(
        current.membership,
        Some(CurrentMembership::Inactive { user_id }) if user_id == user.user_id
    ));
    assert!(current.coach_profile.is_none());
}
