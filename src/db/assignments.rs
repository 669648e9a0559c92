use crate::core::AppError;
use crate::models::assignments::{
    AssignedCoach, AssignmentStatus, CoachClient, CoachClientAssignment, PENDING_REQUEST_NOTE,
};
use chrono::Utc;
use sqlx::SqliteExecutor;

pub async fn insert_pending<'e, E>(executor: E, coach_id: i64, client_id: i64) -> Result<CoachClientAssignment, AppError>
where
    E: SqliteExecutor<'e>,
{
    let assignment = sqlx::query_as::<_, CoachClientAssignment>(
        r#"
        INSERT INTO coach_client_assignments (coach_id, client_id, status, assigned_at, notes)
        VALUES (?, ?, 'pending', ?, ?)
        RETURNING *
        "#,
    )
    .bind(coach_id)
    .bind(client_id)
    .bind(Utc::now().naive_utc())
    .bind(PENDING_REQUEST_NOTE)
    .fetch_one(executor)
    .await?;

    Ok(assignment)
}

pub async fn find_assignment<'e, E>(executor: E, assignment_id: i64) -> Result<Option<CoachClientAssignment>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let assignment = sqlx::query_as::<_, CoachClientAssignment>(
        "SELECT * FROM coach_client_assignments WHERE id = ?",
    )
    .bind(assignment_id)
    .fetch_optional(executor)
    .await?;

    Ok(assignment)
}

/// The client's most recent pending or active assignment.
pub async fn find_open_for_client<'e, E>(executor: E, client_id: i64) -> Result<Option<AssignedCoach>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let current = sqlx::query_as::<_, AssignedCoach>(
        r#"
        SELECT a.id AS assignment_id, c.id AS coach_id, u.id AS user_id, u.name, u.email, u.phone,
               c.specialization, a.status, a.assigned_at
        FROM coach_client_assignments a
        JOIN coaches c ON c.id = a.coach_id
        JOIN users u ON u.id = c.user_id
        WHERE a.client_id = ? AND a.status IN ('pending', 'active')
        ORDER BY a.assigned_at DESC, a.id DESC
        LIMIT 1
        "#,
    )
    .bind(client_id)
    .fetch_optional(executor)
    .await?;

    Ok(current)
}

/// Moves an assignment from `from` to `to`; returns false if it was no longer in `from`.
pub async fn transition<'e, E>(
    executor: E,
    assignment_id: i64,
    from: AssignmentStatus,
    to: AssignmentStatus,
) -> Result<bool, AppError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("UPDATE coach_client_assignments SET status = ? WHERE id = ? AND status = ?")
        .bind(to)
        .bind(assignment_id)
        .bind(from)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() == 1)
}

/// Closes every pending or active assignment of a coach.
pub async fn deactivate_for_coach<'e, E>(executor: E, coach_id: i64) -> Result<u64, AppError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE coach_client_assignments SET status = 'inactive'
        WHERE coach_id = ? AND status IN ('pending', 'active')
        "#,
    )
    .bind(coach_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

pub async fn list_clients_for_coach<'e, E>(
    executor: E,
    coach_id: i64,
    status: AssignmentStatus,
) -> Result<Vec<CoachClient>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let order = match status {
        AssignmentStatus::Pending => "a.assigned_at DESC, a.id DESC",
        _ => "u.name ASC",
    };
    let query = format!(
        r#"
        SELECT a.id AS assignment_id, u.id AS client_id, u.name, u.email, u.phone,
               a.status, a.assigned_at, a.notes
        FROM coach_client_assignments a
        JOIN users u ON u.id = a.client_id
        WHERE a.coach_id = ? AND a.status = ?
        ORDER BY {}
        "#,
        order
    );

    let clients = sqlx::query_as::<_, CoachClient>(&query)
        .bind(coach_id)
        .bind(status)
        .fetch_all(executor)
        .await?;

    Ok(clients)
}
