use crate::core::jwt_auth::SessionUser;
use crate::core::{AppError, AppSuccessResponse};
use crate::models::assignments::CoachRequest;
use crate::models::users::MessageResponse;
use crate::services::assignments;

use actix_web::{get, post, web, HttpResponse, Result};
use sqlx::SqlitePool;

#[tracing::instrument(name = "Get Available Coaches", skip(pool))]
#[get("")]
pub async fn get_available_coaches(pool: web::Data<SqlitePool>) -> Result<HttpResponse, AppError> {
    let coaches = assignments::list_available_coaches(&pool).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(coaches, "Coaches retrieved successfully")))
}

#[tracing::instrument(name = "Request Coach", skip(pool, session, request))]
#[post("")]
pub async fn request_coach(
    pool: web::Data<SqlitePool>,
    session: SessionUser,
    request: web::Json<CoachRequest>,
) -> Result<HttpResponse, AppError> {
    let assignment = assignments::request_coach(&pool, &session, request.into_inner()).await?;

    Ok(HttpResponse::Created().json(AppSuccessResponse::new(
        assignment,
        "Coach request sent successfully",
    )))
}

#[tracing::instrument(name = "Accept Coach Request", skip(pool, session))]
#[post("/{assignment_id}/accept")]
pub async fn accept_request(
    pool: web::Data<SqlitePool>,
    session: SessionUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let assignment = assignments::accept_request(&pool, &session, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(assignment, "Request accepted")))
}

#[tracing::instrument(name = "Reject Coach Request", skip(pool, session))]
#[post("/{assignment_id}/reject")]
pub async fn reject_request(
    pool: web::Data<SqlitePool>,
    session: SessionUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let assignment = assignments::reject_request(&pool, &session, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(assignment, "Request rejected")))
}

#[tracing::instrument(name = "Get Coach Clients", skip(pool, session))]
#[get("/{coach_id}/clients")]
pub async fn get_coach_clients(
    pool: web::Data<SqlitePool>,
    session: SessionUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let clients = assignments::list_clients_for_coach(&pool, &session, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(clients, "Clients retrieved successfully")))
}

#[tracing::instrument(name = "Get Pending Coach Requests", skip(pool, session))]
#[get("/{coach_id}/pending-requests")]
pub async fn get_pending_requests(
    pool: web::Data<SqlitePool>,
    session: SessionUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let requests =
        assignments::list_pending_requests_for_coach(&pool, &session, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        requests,
        "Pending requests retrieved successfully",
    )))
}

#[tracing::instrument(name = "Get Coach Status", skip(pool, session))]
#[get("/{client_id}/coach-status")]
pub async fn get_coach_status(
    pool: web::Data<SqlitePool>,
    session: SessionUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    let client_id = path.into_inner();
    session.require_self_or_admin(client_id)?;

    let status = assignments::get_coach_status(&pool, client_id).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(status, "Coach status retrieved")))
}

#[tracing::instrument(name = "Get Notifications", skip(pool, session))]
#[get("")]
pub async fn get_notifications(
    pool: web::Data<SqlitePool>,
    session: SessionUser,
) -> Result<HttpResponse, AppError> {
    let notifications = assignments::list_notifications(&pool, &session).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        notifications,
        "Notifications retrieved successfully",
    )))
}

#[tracing::instrument(name = "Mark Notification Read", skip(pool, session))]
#[post("/{notification_id}/read")]
pub async fn mark_notification_read(
    pool: web::Data<SqlitePool>,
    session: SessionUser,
    path: web::Path<i64>,
) -> Result<HttpResponse, AppError> {
    assignments::mark_notification_read(&pool, &session, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(AppSuccessResponse::new(
        MessageResponse::new("Notification marked as read"),
        "Notification marked as read",
    )))
}
