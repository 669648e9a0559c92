use chrono::Duration;
use sqlx::{SqliteConnection, SqlitePool};
use validator::Validate;

use crate::core::config::ApplicationConfig;
use crate::core::email_service::{
    password_reset_email_body, verification_email_body, PASSWORD_RESET_SUBJECT,
    RESEND_VERIFICATION_SUBJECT, VERIFICATION_SUBJECT,
};
use crate::core::jwt_auth::{SessionKeys, SessionUser};
use crate::core::password::{hash_password, Credential};
use crate::core::{AppError, Mailer};
use crate::db::users::NewUser;
use crate::db::{activity, tokens, users};
use crate::models::dashboard::ActivityType;
use crate::models::tokens::{TokenPurpose, UserToken};
use crate::models::users::{
    ChangePasswordRequest, CurrentUser, EmailRequest, LoginRequest, LoginResponse,
    MessageResponse, RegisterRequest, RegistrationResponse, ResetPasswordRequest, Role,
    UpdateProfileRequest, User, UserProfile, UserStatus,
};
use crate::services::{assignments, memberships};

const GENERIC_VERIFICATION_MESSAGE: &str =
    "If the email is registered, a new verification link has been sent.";
const GENERIC_RESET_MESSAGE: &str =
    "If the email is registered, you will receive a link to reset your password.";

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[tracing::instrument(
    name = "Register account",
    skip(pool, mailer, app, request),
    fields(email = %request.email)
)]
pub async fn register(
    pool: &SqlitePool,
    mailer: &dyn Mailer,
    app: &ApplicationConfig,
    request: RegisterRequest,
) -> Result<RegistrationResponse, AppError> {
    request.validate()?;
    let email = normalize_email(&request.email);
    let name = request.name.trim();

    if users::find_user_by_email(pool, &email).await?.is_some() {
        return Err(AppError::conflict("This email is already registered"));
    }

    let password_hash = hash_password(&request.password)?;

    let mut tx = pool.begin().await?;
    let user_id = users::insert_user(
        &mut *tx,
        &NewUser {
            name,
            email: &email,
            password_hash: &password_hash,
            phone: request.phone.as_deref(),
            address: request.address.as_deref(),
            birth_date: request.birth_date,
            role: Role::Client,
            status: UserStatus::Inactive,
            email_verified: false,
        },
    )
    .await?;
    let token = tokens::issue_token(
        &mut tx,
        user_id,
        TokenPurpose::EmailVerification,
        Duration::hours(app.verification_token_hours),
    )
    .await?;
    activity::record_activity(
        &mut *tx,
        ActivityType::NewUser,
        &format!("New user registered: {}", name),
        Some(user_id),
    )
    .await;
    tx.commit().await?;

    let body = verification_email_body(name, &app.verification_link(&token.token), app.verification_token_hours);
    let verification_email_sent = match mailer.send_html(&email, VERIFICATION_SUBJECT, &body) {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("Verification email to {} failed, account kept: {}", email, e);
            false
        }
    };

    Ok(RegistrationResponse {
        requires_verification: true,
        email,
        verification_email_sent,
    })
}

/// Finds an unconsumed token of the given purpose and rejects expired ones.
async fn open_token(
    conn: &mut SqliteConnection,
    token: &str,
    purpose: TokenPurpose,
    invalid_message: &str,
    expired_message: &str,
) -> Result<UserToken, AppError> {
    let token = tokens::find_open_token(&mut *conn, token, purpose)
        .await?
        .ok_or_else(|| AppError::invalid_token(invalid_message))?;

    if token.is_expired() {
        return Err(AppError::expired_token(expired_message));
    }
    Ok(token)
}

fn start_session(keys: &SessionKeys, user: User) -> Result<LoginResponse, AppError> {
    let session = keys.issue(user.id, &user.email, user.role)?;
    Ok(LoginResponse {
        token: session.token,
        expires_at: session.expires_at,
        user: user.into(),
    })
}

#[tracing::instrument(name = "Verify email", skip(pool, keys, token))]
pub async fn verify_email(pool: &SqlitePool, keys: &SessionKeys, token: &str) -> Result<LoginResponse, AppError> {
    let mut tx = pool.begin().await?;

    let token = open_token(
        &mut tx,
        token,
        TokenPurpose::EmailVerification,
        "Invalid verification link or account already verified",
        "The verification link has expired. Please request a new one.",
    )
    .await?;

    let mut user = users::get_user_by_id(&mut *tx, token.user_id).await?;
    if user.status != UserStatus::Inactive || user.email_verified {
        return Err(AppError::invalid_token(
            "Invalid verification link or account already verified",
        ));
    }

    users::mark_email_verified(&mut *tx, user.id).await?;
    tokens::consume_token(&mut *tx, token.id).await?;
    tx.commit().await?;

    user.status = UserStatus::Active;
    user.email_verified = true;
    tracing::info!("Email verified for user {}", user.id);

    start_session(keys, user)
}

#[tracing::instrument(name = "Resend verification", skip(pool, mailer, app, request), fields(email = %request.email))]
pub async fn resend_verification(
    pool: &SqlitePool,
    mailer: &dyn Mailer,
    app: &ApplicationConfig,
    request: EmailRequest,
) -> Result<MessageResponse, AppError> {
    request.validate()?;
    let email = normalize_email(&request.email);

    let Some(user) = users::find_user_by_email(pool, &email).await? else {
        return Ok(MessageResponse::new(GENERIC_VERIFICATION_MESSAGE));
    };
    if user.email_verified {
        return Err(AppError::bad_request("This account is already verified"));
    }

    let mut tx = pool.begin().await?;
    let token = tokens::issue_token(
        &mut tx,
        user.id,
        TokenPurpose::EmailVerification,
        Duration::hours(app.verification_token_hours),
    )
    .await?;
    tx.commit().await?;

    let body = verification_email_body(&user.name, &app.verification_link(&token.token), app.verification_token_hours);
    mailer.send_html(&user.email, RESEND_VERIFICATION_SUBJECT, &body)?;

    Ok(MessageResponse::new(GENERIC_VERIFICATION_MESSAGE))
}

/// Rewrites a plaintext credential as a hash. Failures never fail the login.
async fn upgrade_legacy_credential(pool: &SqlitePool, user_id: i64, password: &str) {
    let hash = match hash_password(password) {
        Ok(hash) => hash,
        Err(e) => {
            tracing::warn!("Could not hash legacy credential of user {}: {}", user_id, e);
            return;
        }
    };

    match users::update_password(pool, user_id, &hash).await {
        Ok(()) => tracing::info!("Upgraded legacy credential of user {}", user_id),
        Err(e) => tracing::warn!("Could not store upgraded credential of user {}: {}", user_id, e),
    }
}

#[tracing::instrument(name = "Login", skip(pool, keys, request), fields(email = %request.email))]
pub async fn login(pool: &SqlitePool, keys: &SessionKeys, request: LoginRequest) -> Result<LoginResponse, AppError> {
    request.validate()?;
    let email = normalize_email(&request.email);

    let user = users::find_user_by_email(pool, &email)
        .await?
        .ok_or_else(|| AppError::unauthorized("Invalid email or password"))?;

    if user.status == UserStatus::Inactive && !user.email_verified {
        return Err(AppError::verification_required(&user.email));
    }
    if user.status != UserStatus::Active {
        return Err(AppError::unauthorized(
            "Your account is not active. Please contact the administrator.",
        ));
    }

    let credential = Credential::from_stored(&user.password);
    let matches = credential.verify(&request.password).unwrap_or_else(|e| {
        tracing::error!("Stored credential of user {} is unreadable: {}", user.id, e);
        false
    });
    if !matches {
        return Err(AppError::unauthorized("Invalid email or password"));
    }

    if credential.is_legacy() {
        upgrade_legacy_credential(pool, user.id, &request.password).await;
    }

    start_session(keys, user)
}

#[tracing::instrument(name = "Forgot password", skip(pool, mailer, app, request), fields(email = %request.email))]
pub async fn forgot_password(
    pool: &SqlitePool,
    mailer: &dyn Mailer,
    app: &ApplicationConfig,
    request: EmailRequest,
) -> Result<MessageResponse, AppError> {
    request.validate()?;
    let email = normalize_email(&request.email);

    let Some(user) = users::find_user_by_email(pool, &email).await? else {
        return Ok(MessageResponse::new(GENERIC_RESET_MESSAGE));
    };

    let mut tx = pool.begin().await?;
    let token = tokens::issue_token(
        &mut tx,
        user.id,
        TokenPurpose::PasswordReset,
        Duration::minutes(app.reset_token_minutes),
    )
    .await?;
    tx.commit().await?;

    let body = password_reset_email_body(&user.name, &app.reset_link(&token.token), app.reset_token_minutes);
    mailer.send_html(&user.email, PASSWORD_RESET_SUBJECT, &body)?;

    Ok(MessageResponse::new(GENERIC_RESET_MESSAGE))
}

/// Checks a reset token without consuming it.
pub async fn check_reset_token(pool: &SqlitePool, token: &str) -> Result<MessageResponse, AppError> {
    let mut conn = pool.acquire().await?;
    open_token(
        &mut conn,
        token,
        TokenPurpose::PasswordReset,
        "Invalid password reset link",
        "The password reset link has expired",
    )
    .await?;
    Ok(MessageResponse::new("The reset link is valid"))
}

#[tracing::instrument(name = "Reset password", skip(pool, token, request))]
pub async fn reset_password(
    pool: &SqlitePool,
    token: &str,
    request: ResetPasswordRequest,
) -> Result<MessageResponse, AppError> {
    request.validate()?;

    let mut tx = pool.begin().await?;
    let token = open_token(
        &mut tx,
        token,
        TokenPurpose::PasswordReset,
        "Invalid password reset link",
        "The password reset link has expired",
    )
    .await?;

    let password_hash = hash_password(&request.password)?;
    users::update_password(&mut *tx, token.user_id, &password_hash).await?;
    tokens::consume_token(&mut *tx, token.id).await?;
    tx.commit().await?;

    Ok(MessageResponse::new("Your password has been reset. You can now log in."))
}

pub async fn current_user(pool: &SqlitePool, user_id: i64) -> Result<CurrentUser, AppError> {
    let user = users::get_user_by_id(pool, user_id).await?;

    let membership = match user.role {
        Role::Client => Some(memberships::get_current_membership(pool, user.id).await),
        _ => None,
    };
    let coach_profile = match user.role {
        Role::Coach => assignments::coach_for_user(pool, user.id).await?,
        _ => None,
    };

    Ok(CurrentUser {
        profile: user.into(),
        membership,
        coach_profile,
    })
}

#[tracing::instrument(name = "Update profile", skip(pool, actor, request), fields(actor = actor.user_id))]
pub async fn update_profile(
    pool: &SqlitePool,
    actor: &SessionUser,
    mut request: UpdateProfileRequest,
) -> Result<UserProfile, AppError> {
    request.validate()?;
    request.email = normalize_email(&request.email);

    if users::email_taken(pool, &request.email, Some(actor.user_id)).await? {
        return Err(AppError::conflict("This email is already in use"));
    }

    users::update_profile(pool, actor.user_id, &request).await?;
    Ok(users::get_user_by_id(pool, actor.user_id).await?.into())
}

#[tracing::instrument(name = "Change password", skip(pool, actor, request), fields(actor = actor.user_id))]
pub async fn change_password(
    pool: &SqlitePool,
    actor: &SessionUser,
    request: ChangePasswordRequest,
) -> Result<MessageResponse, AppError> {
    request.validate()?;
    let user = users::get_user_by_id(pool, actor.user_id).await?;

    let current_matches = Credential::from_stored(&user.password)
        .verify(&request.current_password)
        .unwrap_or(false);
    if !current_matches {
        return Err(AppError::bad_request("Current password is incorrect"));
    }

    let password_hash = hash_password(&request.new_password)?;
    users::update_password(pool, user.id, &password_hash).await?;

    Ok(MessageResponse::new("Password changed successfully"))
}
