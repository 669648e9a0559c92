use crate::core::jwt_auth::SessionUser;
use crate::core::{AppError, AppSuccessResponse};
use crate::models::coaches::{CreateCoachRequest, UpdateCoachRequest};
use crate::models::dashboard::{ActivityQuery, TimeframeQuery};
use crate::models::plans::CreatePlanRequest;
use crate::models::subscriptions::UpdateSubscriptionRequest;
use crate::models::users::{AdminCreateUserRequest, AdminUpdateUserRequest};
use crate::services::{admin, dashboard, memberships};

use actix_web::{delete, get, post, put, web, HttpResponse, Result};
use chrono::Utc;
use sqlx::SqlitePool;

#[tracing::instrument(name = "Admin List Users", skip(pool, session))]
#[get("/users")]
pub async fn list_users(pool: web::Data<SqlitePool>, session: SessionUser) -> Result<HttpResponse, AppError> {
    let users = admin::list_users(&pool, &session).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(users, "Users retrieved successfully")))
}

#[tracing::instrument(name = "Admin Create User", skip(pool, session, request))]
#[post("/users")]
pub async fn create_user(
    pool: web::Data<SqlitePool>,
    session: SessionUser,
    request: web::Json<AdminCreateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let user = admin::create_user(&pool, &session, request.into_inner()).await?;

    Ok(HttpResponse::Created().json(AppSuccessResponse::new(user, "User created successfully")))
}

#[tracing::instrument(name = "Admin Update User", skip(pool, session, request))]
#[put("/users/{user_id}")]
pub async fn update_user(
    pool: web::Data<SqlitePool>,
    session: SessionUser,
    path: web::Path<i64>,
    request: web::Json<AdminUpdateUserRequest>,
) -> Result<HttpResponse, AppError> {
    let user = admin::update_user(&pool, &session, path.into_inner(), request.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(user, "User updated successfully")))
}

#[tracing::instrument(name = "Admin Deactivate User", skip(pool, session))]
#[delete("/users/{user_id}")]
pub async fn deactivate_user(
    pool: web::Data<SqlitePool>,
    session: SessionUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let response = admin::deactivate_user(&pool, &session, path.into_inner()).await?;
    let message = response.message.clone();

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(response, message)))
}

#[tracing::instrument(name = "Admin List Coaches", skip(pool, session))]
#[get("/coaches")]
pub async fn list_coaches(pool: web::Data<SqlitePool>, session: SessionUser) -> Result<HttpResponse, AppError> {
    let coaches = admin::list_coaches(&pool, &session).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(coaches, "Coaches retrieved successfully")))
}

#[tracing::instrument(name = "Admin Create Coach", skip(pool, session, request))]
#[post("/coaches")]
pub async fn create_coach(
    pool: web::Data<SqlitePool>,
    session: SessionUser,
    request: web::Json<CreateCoachRequest>,
) -> Result<HttpResponse, AppError> {
    let coach = admin::create_coach(&pool, &session, request.into_inner()).await?;

    Ok(HttpResponse::Created().json(AppSuccessResponse::new(coach, "Coach created successfully")))
}

#[tracing::instrument(name = "Admin Update Coach", skip(pool, session, request))]
#[put("/coaches/{coach_id}")]
pub async fn update_coach(
    pool: web::Data<SqlitePool>,
    session: SessionUser,
    path: web::Path<i64>,
    request: web::Json<UpdateCoachRequest>,
) -> Result<HttpResponse, AppError> {
    let coach = admin::update_coach(&pool, &session, path.into_inner(), request.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(coach, "Coach updated successfully")))
}

#[tracing::instrument(name = "Admin Create Plan", skip(pool, session, request))]
#[post("/plans")]
pub async fn create_plan(
    pool: web::Data<SqlitePool>,
    session: SessionUser,
    request: web::Json<CreatePlanRequest>,
) -> Result<HttpResponse, AppError> {
    let plan = memberships::create_plan(&pool, &session, request.into_inner()).await?;

    Ok(HttpResponse::Created().json(AppSuccessResponse::new(plan, "Plan created successfully")))
}

#[tracing::instrument(name = "Admin Users With Memberships", skip(pool, session))]
#[get("/users-with-memberships")]
pub async fn users_with_memberships(
    pool: web::Data<SqlitePool>,
    session: SessionUser,
) -> Result<HttpResponse, AppError> {
    let users = memberships::users_with_memberships(&pool, &session).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(users, "Users retrieved successfully")))
}

#[tracing::instrument(name = "Admin Update Membership", skip(pool, session, request))]
#[put("/memberships/{subscription_id}")]
pub async fn update_membership(
    pool: web::Data<SqlitePool>,
    session: SessionUser,
    path: web::Path<i64>,
    request: web::Json<UpdateSubscriptionRequest>,
) -> Result<HttpResponse, AppError> {
    let subscription =
        memberships::update_subscription(&pool, &session, path.into_inner(), request.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        subscription,
        "Membership updated successfully",
    )))
}

#[tracing::instrument(name = "Admin Expire Memberships", skip(pool, session))]
#[post("/memberships/expire")]
pub async fn expire_memberships(
    pool: web::Data<SqlitePool>,
    session: SessionUser,
) -> Result<HttpResponse, AppError> {
    let today = Utc::now().date_naive();
    let sweep = memberships::expire_lapsed_subscriptions(&pool, &session, today).await?;
    let message = format!("{} membership(s) expired", sweep.expired);

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(sweep, message)))
}

#[tracing::instrument(name = "Admin Dashboard Stats", skip(pool, session))]
#[get("/dashboard/stats")]
pub async fn dashboard_stats(
    pool: web::Data<SqlitePool>,
    session: SessionUser,
    query: web::Query<TimeframeQuery>,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;

    let timeframe = query.timeframe.unwrap_or_default();
    let stats = dashboard::dashboard_stats(&pool, timeframe, Utc::now().naive_utc()).await;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(stats, "Dashboard stats retrieved")))
}

#[tracing::instrument(name = "Admin Dashboard Comparison", skip(pool, session))]
#[get("/dashboard/stats/comparison")]
pub async fn dashboard_comparison(
    pool: web::Data<SqlitePool>,
    session: SessionUser,
    query: web::Query<TimeframeQuery>,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;

    let timeframe = query.timeframe.unwrap_or_default();
    let comparison = dashboard::dashboard_comparison(&pool, timeframe, Utc::now().naive_utc()).await;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        comparison,
        "Dashboard comparison retrieved",
    )))
}

#[tracing::instrument(name = "Admin Recent Activity", skip(pool, session))]
#[get("/dashboard/activity")]
pub async fn recent_activity(
    pool: web::Data<SqlitePool>,
    session: SessionUser,
    query: web::Query<ActivityQuery>,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;

    let entries = dashboard::recent_activity(&pool, query.into_inner(), Utc::now().naive_utc()).await;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(entries, "Recent activity retrieved")))
}

#[tracing::instrument(name = "Admin Pending Verifications", skip(pool, session))]
#[get("/verification/pending")]
pub async fn pending_verifications(
    pool: web::Data<SqlitePool>,
    session: SessionUser,
) -> Result<HttpResponse, AppError> {
    session.require_admin()?;

    let pending = dashboard::pending_verifications(&pool).await;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        pending,
        "Pending verifications retrieved",
    )))
}
