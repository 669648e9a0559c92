use crate::core::config::ApplicationConfig;
use crate::core::jwt_auth::{SessionKeys, SessionUser};
use crate::core::{AppError, AppSuccessResponse, Mailer};
use crate::models::users::{
    ChangePasswordRequest, EmailRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
    UpdateProfileRequest,
};
use crate::services::accounts;

use actix_web::{get, post, put, web, HttpResponse, Result};
use sqlx::SqlitePool;

#[tracing::instrument(name = "Register Account", skip(pool, mailer, app, request))]
#[post("/register")]
pub async fn register(
    pool: web::Data<SqlitePool>,
    mailer: web::Data<dyn Mailer>,
    app: web::Data<ApplicationConfig>,
    request: web::Json<RegisterRequest>,
) -> Result<HttpResponse, AppError> {
    let registration =
        accounts::register(&pool, mailer.get_ref(), &app, request.into_inner()).await?;

    let message = if registration.verification_email_sent {
        "Registration successful. Please check your email to verify your account."
    } else {
        "Registration successful, but we could not send the verification email. Please request a new one."
    };

    Ok(HttpResponse::Created().json(AppSuccessResponse::new(registration, message)))
}

#[tracing::instrument(name = "Verify Email", skip(pool, keys, path))]
#[get("/verify/{token}")]
pub async fn verify_email(
    pool: web::Data<SqlitePool>,
    keys: web::Data<SessionKeys>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let session = accounts::verify_email(&pool, &keys, &path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        session,
        "Your account has been verified",
    )))
}

#[tracing::instrument(name = "Resend Verification", skip(pool, mailer, app, request))]
#[post("/resend-verification")]
pub async fn resend_verification(
    pool: web::Data<SqlitePool>,
    mailer: web::Data<dyn Mailer>,
    app: web::Data<ApplicationConfig>,
    request: web::Json<EmailRequest>,
) -> Result<HttpResponse, AppError> {
    let response =
        accounts::resend_verification(&pool, mailer.get_ref(), &app, request.into_inner()).await?;
    let message = response.message.clone();

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(response, message)))
}

#[tracing::instrument(name = "Login", skip(pool, keys, request))]
#[post("/login")]
pub async fn login(
    pool: web::Data<SqlitePool>,
    keys: web::Data<SessionKeys>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse, AppError> {
    let session = accounts::login(&pool, &keys, request.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(session, "Login successful")))
}

#[tracing::instrument(name = "Forgot Password", skip(pool, mailer, app, request))]
#[post("/forgot-password")]
pub async fn forgot_password(
    pool: web::Data<SqlitePool>,
    mailer: web::Data<dyn Mailer>,
    app: web::Data<ApplicationConfig>,
    request: web::Json<EmailRequest>,
) -> Result<HttpResponse, AppError> {
    let response =
        accounts::forgot_password(&pool, mailer.get_ref(), &app, request.into_inner()).await?;
    let message = response.message.clone();

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(response, message)))
}

#[tracing::instrument(name = "Check Reset Token", skip(pool, path))]
#[get("/reset-password/{token}")]
pub async fn check_reset_token(
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
    let response = accounts::check_reset_token(&pool, &path.into_inner()).await?;
    let message = response.message.clone();

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(response, message)))
}

#[tracing::instrument(name = "Reset Password", skip(pool, path, request))]
#[post("/reset-password/{token}")]
pub async fn reset_password(
    pool: web::Data<SqlitePool>,
    path: web::Path<String>,
    request: web::Json<ResetPasswordRequest>,
) -> Result<HttpResponse, AppError> {
    let response = accounts::reset_password(&pool, &path.into_inner(), request.into_inner()).await?;
    let message = response.message.clone();

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(response, message)))
}

#[tracing::instrument(name = "Current User", skip(pool, session))]
#[get("/me")]
pub async fn me(pool: web::Data<SqlitePool>, session: SessionUser) -> Result<HttpResponse, AppError> {
    let user = accounts::current_user(&pool, session.user_id).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(user, "Profile retrieved successfully")))
}

#[tracing::instrument(name = "Update Profile", skip(pool, session, request))]
#[put("/profile")]
pub async fn update_profile(
    pool: web::Data<SqlitePool>,
    session: SessionUser,
    request: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, AppError> {
    let profile = accounts::update_profile(&pool, &session, request.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(profile, "Profile updated successfully")))
}

#[tracing::instrument(name = "Change Password", skip(pool, session, request))]
#[put("/change-password")]
pub async fn change_password(
    pool: web::Data<SqlitePool>,
    session: SessionUser,
    request: web::Json<ChangePasswordRequest>,
) -> Result<HttpResponse, AppError> {
    let response = accounts::change_password(&pool, &session, request.into_inner()).await?;
    let message = response.message.clone();

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(response, message)))
}
