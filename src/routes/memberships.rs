use crate::core::jwt_auth::SessionUser;
use crate::core::{AppError, AppSuccessResponse};
use crate::models::plans::QuoteQuery;
use crate::models::subscriptions::SubscriptionRequest;
use crate::services::memberships;

use actix_web::{get, post, put, web, HttpResponse, Result};
use sqlx::SqlitePool;

#[tracing::instrument(name = "Get Plans", skip(pool))]
#[get("")]
pub async fn get_plans(pool: web::Data<SqlitePool>) -> Result<HttpResponse, AppError> {
    let plans = memberships::list_plans(&pool).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(plans, "Plans retrieved successfully")))
}

#[tracing::instrument(name = "Quote Plan Price", skip(pool))]
#[get("/{plan_id}/quote")]
pub async fn quote_plan(
    pool: web::Data<SqlitePool>,
    path: web::Path<i64>,
    query: web::Query<QuoteQuery>,
) -> Result<HttpResponse, AppError> {
    let quote = memberships::quote_price(&pool, path.into_inner(), query.plan_type).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(quote, "Price calculated successfully")))
}

#[tracing::instrument(name = "Create Membership", skip(pool, session, request))]
#[post("")]
pub async fn create_membership(
    pool: web::Data<SqlitePool>,
    session: SessionUser,
    request: web::Json<SubscriptionRequest>,
) -> Result<HttpResponse, AppError> {
    let subscription = memberships::create_subscription(&pool, &session, request.into_inner()).await?;

    Ok(HttpResponse::Created().json(AppSuccessResponse::new(
        subscription,
        "Membership created successfully",
    )))
}

#[tracing::instrument(name = "Renew Membership", skip(pool, session, request))]
#[put("/{subscription_id}/renew")]
pub async fn renew_membership(
    pool: web::Data<SqlitePool>,
    session: SessionUser,
    path: web::Path<i64>,
    request: web::Json<SubscriptionRequest>,
) -> Result<HttpResponse, AppError> {
    let subscription =
        memberships::renew_subscription(&pool, &session, path.into_inner(), request.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        subscription,
        "Membership renewed successfully",
    )))
}

#[tracing::instrument(name = "Cancel Membership", skip(pool, session))]
#[post("/{subscription_id}/cancel")]
pub async fn cancel_membership(
    pool: web::Data<SqlitePool>,
    session: SessionUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let subscription = memberships::cancel_subscription(&pool, &session, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        subscription,
        "Membership cancelled successfully",
    )))
}

#[tracing::instrument(name = "Get User Membership", skip(pool, session))]
#[get("/{user_id}/membership")]
pub async fn get_user_membership(
    pool: web::Data<SqlitePool>,
    session: SessionUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let user_id = path.into_inner();
    session.require_self_or_admin(user_id)?;

    let membership = memberships::get_current_membership(&pool, user_id).await;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        membership,
        "Membership retrieved successfully",
    )))
}

#[tracing::instrument(name = "Get Membership History", skip(pool, session))]
#[get("/{user_id}/membership-history")]
pub async fn get_membership_history(
    pool: web::Data<SqlitePool>,
    session: SessionUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let history = memberships::membership_history(&pool, &session, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        history,
        "Membership history retrieved successfully",
    )))
}
