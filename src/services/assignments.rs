use sqlx::{SqliteConnection, SqlitePool};

use crate::core::jwt_auth::SessionUser;
use crate::core::AppError;
use crate::db::{activity, assignments, coaches, notifications, users};
use crate::models::assignments::{
    AssignmentStatus, CoachClient, CoachClientAssignment, CoachRequest, CoachStatus,
};
use crate::models::coaches::{CoachListing, CoachProfile};
use crate::models::dashboard::ActivityType;
use crate::models::notifications::{NewNotification, Notification, NotificationType};
use crate::models::users::UserStatus;

#[tracing::instrument(name = "Request coach", skip(pool, actor), fields(actor = actor.user_id))]
pub async fn request_coach(
    pool: &SqlitePool,
    actor: &SessionUser,
    request: CoachRequest,
) -> Result<CoachClientAssignment, AppError> {
    let client_id = request.client_id.unwrap_or(actor.user_id);
    actor.require_self_or_admin(client_id)?;

    let mut tx = pool.begin().await?;

    let client = users::find_user_by_id(&mut *tx, client_id)
        .await?
        .ok_or_else(|| AppError::not_found("Client not found"))?;

    let coach = coaches::find_coach_listing(&mut *tx, request.coach_id)
        .await?
        .filter(|coach| coach.status == UserStatus::Active)
        .ok_or_else(|| AppError::not_found("Coach not found or not available"))?;

    if let Some(current) = assignments::find_open_for_client(&mut *tx, client_id).await? {
        return Err(match current.status {
            AssignmentStatus::Active => AppError::conflict("You already have an assigned coach"),
            _ => AppError::conflict("You already have a pending request"),
        });
    }

    let assignment = assignments::insert_pending(&mut *tx, coach.coach_id, client_id).await?;

    notifications::insert_notification(
        &mut *tx,
        &NewNotification {
            user_id: coach.user_id,
            notification_type: NotificationType::CoachRequest,
            title: "New coach request".to_string(),
            message: format!("{} would like you to be their coach.", client.name),
            origin_user_id: Some(client_id),
        },
    )
    .await?;

    tx.commit().await?;
    Ok(assignment)
}

pub async fn accept_request(
    pool: &SqlitePool,
    actor: &SessionUser,
    assignment_id: i64,
) -> Result<CoachClientAssignment, AppError> {
    respond_to_request(pool, actor, assignment_id, AssignmentStatus::Active).await
}

pub async fn reject_request(
    pool: &SqlitePool,
    actor: &SessionUser,
    assignment_id: i64,
) -> Result<CoachClientAssignment, AppError> {
    respond_to_request(pool, actor, assignment_id, AssignmentStatus::Rejected).await
}

/// The coach must own the profile being accessed, unless the actor is an admin.
async fn owned_coach(
    conn: &mut SqliteConnection,
    actor: &SessionUser,
    coach_id: i64,
) -> Result<CoachProfile, AppError> {
    let coach = coaches::find_coach_by_id(&mut *conn, coach_id)
        .await?
        .ok_or_else(|| AppError::not_found("Coach not found"))?;

    if coach.user_id != actor.user_id && !actor.is_admin() {
        return Err(AppError::forbidden_error("You can only manage your own clients"));
    }
    Ok(coach)
}

#[tracing::instrument(name = "Respond to coach request", skip(pool, actor), fields(actor = actor.user_id))]
async fn respond_to_request(
    pool: &SqlitePool,
    actor: &SessionUser,
    assignment_id: i64,
    next: AssignmentStatus,
) -> Result<CoachClientAssignment, AppError> {
    let mut tx = pool.begin().await?;

    let mut assignment = assignments::find_assignment(&mut *tx, assignment_id)
        .await?
        .ok_or_else(|| AppError::not_found("Request not found"))?;

    let coach = owned_coach(&mut tx, actor, assignment.coach_id).await?;

    if assignment.status != AssignmentStatus::Pending || !assignment.status.can_transition_to(next) {
        return Err(AppError::conflict("This request has already been processed"));
    }
    if !assignments::transition(&mut *tx, assignment.id, AssignmentStatus::Pending, next).await? {
        return Err(AppError::conflict("This request has already been processed"));
    }

    let coach_user = users::get_user_by_id(&mut *tx, coach.user_id).await?;
    let (title, message) = match next {
        AssignmentStatus::Active => (
            "Coach request accepted",
            format!("{} accepted your request and is now your coach.", coach_user.name),
        ),
        _ => (
            "Coach request rejected",
            format!("{} is not able to take your request right now.", coach_user.name),
        ),
    };

    notifications::insert_notification(
        &mut *tx,
        &NewNotification {
            user_id: assignment.client_id,
            notification_type: NotificationType::CoachAssignment,
            title: title.to_string(),
            message,
            origin_user_id: Some(coach.user_id),
        },
    )
    .await?;

    if next == AssignmentStatus::Active {
        activity::record_activity(
            &mut *tx,
            ActivityType::CoachAssignment,
            &format!("{} was assigned client {}", coach_user.name, assignment.client_id),
            Some(assignment.client_id),
        )
        .await;
    }

    tx.commit().await?;

    assignment.status = next;
    Ok(assignment)
}

pub async fn get_coach_status(pool: &SqlitePool, client_id: i64) -> Result<CoachStatus, AppError> {
    let current = assignments::find_open_for_client(pool, client_id).await?;
    Ok(CoachStatus::from(current))
}

pub async fn list_clients_for_coach(
    pool: &SqlitePool,
    actor: &SessionUser,
    coach_id: i64,
) -> Result<Vec<CoachClient>, AppError> {
    let mut conn = pool.acquire().await?;
    owned_coach(&mut conn, actor, coach_id).await?;
    assignments::list_clients_for_coach(&mut *conn, coach_id, AssignmentStatus::Active).await
}

pub async fn list_pending_requests_for_coach(
    pool: &SqlitePool,
    actor: &SessionUser,
    coach_id: i64,
) -> Result<Vec<CoachClient>, AppError> {
    let mut conn = pool.acquire().await?;
    owned_coach(&mut conn, actor, coach_id).await?;
    assignments::list_clients_for_coach(&mut *conn, coach_id, AssignmentStatus::Pending).await
}

pub async fn list_available_coaches(pool: &SqlitePool) -> Result<Vec<CoachListing>, AppError> {
    coaches::list_available_coaches(pool).await
}

pub async fn coach_for_user(pool: &SqlitePool, user_id: i64) -> Result<Option<CoachProfile>, AppError> {
    coaches::find_coach_by_user(pool, user_id).await
}

/// Closes the assignments of a deactivated user's coach profile, if any.
pub(crate) async fn on_user_deactivated(conn: &mut SqliteConnection, user_id: i64) -> Result<u64, AppError> {
    let Some(coach) = coaches::find_coach_by_user(&mut *conn, user_id).await? else {
        return Ok(0);
    };

    let closed = assignments::deactivate_for_coach(&mut *conn, coach.id).await?;
    if closed > 0 {
        tracing::info!("Closed {} assignment(s) of coach {}", closed, coach.id);
    }
    Ok(closed)
}

pub async fn list_notifications(pool: &SqlitePool, actor: &SessionUser) -> Result<Vec<Notification>, AppError> {
    notifications::list_for_user(pool, actor.user_id).await
}

pub async fn mark_notification_read(
    pool: &SqlitePool,
    actor: &SessionUser,
    notification_id: i64,
) -> Result<(), AppError> {
    if notifications::mark_read(pool, notification_id, actor.user_id).await? {
        Ok(())
    } else {
        Err(AppError::not_found("Notification not found"))
    }
}
