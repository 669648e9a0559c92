use crate::core::AppError;
use crate::models::notifications::{NewNotification, Notification};
use chrono::Utc;
use sqlx::SqliteExecutor;

pub async fn insert_notification<'e, E>(executor: E, notification: &NewNotification) -> Result<i64, AppError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO notifications (user_id, notification_type, title, message, is_read, origin_user_id, created_at)
        VALUES (?, ?, ?, ?, 0, ?, ?)
        "#,
    )
    .bind(notification.user_id)
    .bind(notification.notification_type)
    .bind(&notification.title)
    .bind(&notification.message)
    .bind(notification.origin_user_id)
    .bind(Utc::now().naive_utc())
    .execute(executor)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn list_for_user<'e, E>(executor: E, user_id: i64) -> Result<Vec<Notification>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let notifications = sqlx::query_as::<_, Notification>(
        "SELECT * FROM notifications WHERE user_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(executor)
    .await?;

    Ok(notifications)
}

/// Returns false when the notification does not belong to the user.
pub async fn mark_read<'e, E>(executor: E, notification_id: i64, user_id: i64) -> Result<bool, AppError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ? AND user_id = ?")
        .bind(notification_id)
        .bind(user_id)
        .execute(executor)
        .await?;

    Ok(result.rows_affected() == 1)
}
