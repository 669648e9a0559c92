use sqlx::SqlitePool;
use validator::Validate;

use crate::core::jwt_auth::SessionUser;
use crate::core::password::hash_password;
use crate::core::AppError;
use crate::db::users::NewUser;
use crate::db::{activity, coaches, users};
use crate::models::coaches::{CoachDetails, CoachListing, CreateCoachRequest, UpdateCoachRequest};
use crate::models::dashboard::ActivityType;
use crate::models::users::{
    AdminCreateUserRequest, AdminUpdateUserRequest, MessageResponse, Role, UserProfile, UserStatus,
};
use crate::services::accounts::normalize_email;
use crate::services::events::{self, DomainEvent};

pub async fn list_users(pool: &SqlitePool, actor: &SessionUser) -> Result<Vec<UserProfile>, AppError> {
    actor.require_admin()?;
    let users = users::list_users(pool).await?;
    Ok(users.into_iter().map(UserProfile::from).collect())
}

/// Accounts created by an admin skip email verification.
#[tracing::instrument(name = "Admin create user", skip(pool, actor, request), fields(email = %request.email))]
pub async fn create_user(
    pool: &SqlitePool,
    actor: &SessionUser,
    request: AdminCreateUserRequest,
) -> Result<UserProfile, AppError> {
    actor.require_admin()?;
    request.validate()?;
    let email = normalize_email(&request.email);

    if users::email_taken(pool, &email, None).await? {
        return Err(AppError::conflict("This email is already registered"));
    }
    let password_hash = hash_password(&request.password)?;

    let mut tx = pool.begin().await?;
    let user_id = users::insert_user(
        &mut *tx,
        &NewUser {
            name: request.name.trim(),
            email: &email,
            password_hash: &password_hash,
            phone: request.phone.as_deref(),
            address: request.address.as_deref(),
            birth_date: request.birth_date,
            role: request.role,
            status: request.status.unwrap_or(UserStatus::Active),
            email_verified: true,
        },
    )
    .await?;
    if request.role == Role::Coach {
        coaches::insert_coach(&mut *tx, user_id, &CoachDetails::default()).await?;
    }
    activity::record_activity(
        &mut *tx,
        ActivityType::NewUser,
        &format!("New {} created by an administrator: {}", request.role.as_str(), request.name.trim()),
        Some(user_id),
    )
    .await;
    tx.commit().await?;

    Ok(users::get_user_by_id(pool, user_id).await?.into())
}

#[tracing::instrument(name = "Admin update user", skip(pool, actor, request), fields(actor = actor.user_id))]
pub async fn update_user(
    pool: &SqlitePool,
    actor: &SessionUser,
    user_id: i64,
    mut request: AdminUpdateUserRequest,
) -> Result<UserProfile, AppError> {
    actor.require_admin()?;
    request.validate()?;
    if request.is_empty() {
        return Err(AppError::bad_request("No fields to update"));
    }
    request.email = request.email.as_deref().map(normalize_email);

    if user_id == actor.user_id && request.status.is_some_and(|s| s != UserStatus::Active) {
        return Err(AppError::bad_request("You cannot deactivate your own account"));
    }

    let mut tx = pool.begin().await?;
    let existing = users::get_user_by_id(&mut *tx, user_id).await?;

    if let Some(email) = &request.email {
        if users::email_taken(&mut *tx, email, Some(user_id)).await? {
            return Err(AppError::conflict("This email is already in use"));
        }
    }

    let password_hash = match &request.password {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };
    users::apply_admin_update(&mut tx, user_id, &request, password_hash.as_deref()).await?;

    if request.role == Some(Role::Coach) && coaches::find_coach_by_user(&mut *tx, user_id).await?.is_none() {
        coaches::insert_coach(&mut *tx, user_id, &CoachDetails::default()).await?;
    }
    if request.status == Some(UserStatus::Inactive) && existing.status != UserStatus::Inactive {
        events::dispatch(&mut tx, DomainEvent::UserDeactivated { user_id }).await?;
    }

    tx.commit().await?;
    Ok(users::get_user_by_id(pool, user_id).await?.into())
}

/// Soft delete: the account is kept with status `inactive`.
#[tracing::instrument(name = "Admin deactivate user", skip(pool, actor), fields(actor = actor.user_id))]
pub async fn deactivate_user(
    pool: &SqlitePool,
    actor: &SessionUser,
    user_id: i64,
) -> Result<MessageResponse, AppError> {
    actor.require_admin()?;
    if user_id == actor.user_id {
        return Err(AppError::bad_request("You cannot deactivate your own account"));
    }

    let mut tx = pool.begin().await?;
    let user = users::get_user_by_id(&mut *tx, user_id).await?;
    if user.status != UserStatus::Inactive {
        users::update_status(&mut *tx, user_id, UserStatus::Inactive).await?;
        events::dispatch(&mut tx, DomainEvent::UserDeactivated { user_id }).await?;
    }
    tx.commit().await?;

    Ok(MessageResponse::new("User deactivated successfully"))
}

pub async fn list_coaches(pool: &SqlitePool, actor: &SessionUser) -> Result<Vec<CoachListing>, AppError> {
    actor.require_admin()?;
    coaches::list_all_coaches(pool).await
}

#[tracing::instrument(name = "Admin create coach", skip(pool, actor, request), fields(email = %request.email))]
pub async fn create_coach(
    pool: &SqlitePool,
    actor: &SessionUser,
    request: CreateCoachRequest,
) -> Result<CoachListing, AppError> {
    actor.require_admin()?;
    request.validate()?;
    let email = normalize_email(&request.email);

    if users::email_taken(pool, &email, None).await? {
        return Err(AppError::conflict("This email is already registered"));
    }
    let password_hash = hash_password(&request.password)?;

    let mut tx = pool.begin().await?;
    let user_id = users::insert_user(
        &mut *tx,
        &NewUser {
            name: request.name.trim(),
            email: &email,
            password_hash: &password_hash,
            phone: request.phone.as_deref(),
            address: None,
            birth_date: None,
            role: Role::Coach,
            status: UserStatus::Active,
            email_verified: true,
        },
    )
    .await?;
    let coach_id = coaches::insert_coach(&mut *tx, user_id, &request.details).await?;
    tx.commit().await?;

    coaches::find_coach_listing(pool, coach_id)
        .await?
        .ok_or_else(|| AppError::internal_error("Coach disappeared after insert"))
}

#[tracing::instrument(name = "Admin update coach", skip(pool, actor, request), fields(actor = actor.user_id))]
pub async fn update_coach(
    pool: &SqlitePool,
    actor: &SessionUser,
    coach_id: i64,
    request: UpdateCoachRequest,
) -> Result<CoachListing, AppError> {
    actor.require_admin()?;
    request.validate()?;

    let mut tx = pool.begin().await?;
    let coach = coaches::find_coach_by_id(&mut *tx, coach_id)
        .await?
        .ok_or_else(|| AppError::not_found("Coach not found"))?;

    if request.name.is_some() || request.phone.is_some() {
        let user_changes = AdminUpdateUserRequest {
            name: request.name.clone(),
            phone: request.phone.clone(),
            ..Default::default()
        };
        users::apply_admin_update(&mut tx, coach.user_id, &user_changes, None).await?;
    }
    coaches::update_coach_details(&mut *tx, coach_id, &request.details).await?;
    tx.commit().await?;

    coaches::find_coach_listing(pool, coach_id)
        .await?
        .ok_or_else(|| AppError::not_found("Coach not found"))
}
