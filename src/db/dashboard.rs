use crate::core::AppError;
use crate::models::dashboard::Window;
use chrono::NaiveDate;
use sqlx::SqliteExecutor;

pub const TOTAL_USERS: &str = "SELECT COUNT(*) FROM users";
pub const ACTIVE_USERS: &str = "SELECT COUNT(*) FROM users WHERE status = 'active'";
pub const TOTAL_COACHES: &str = "SELECT COUNT(*) FROM coaches";
pub const PENDING_VERIFICATIONS: &str =
    "SELECT COUNT(*) FROM users WHERE email_verified = 0 AND status IN ('inactive', 'pending')";

pub const USERS_REGISTERED: &str =
    "SELECT COUNT(*) FROM users WHERE created_at > ? AND created_at <= ?";
pub const ACTIVE_USERS_REGISTERED: &str =
    "SELECT COUNT(*) FROM users WHERE status = 'active' AND created_at > ? AND created_at <= ?";
pub const COACHES_REGISTERED: &str = r#"
    SELECT COUNT(*) FROM coaches c JOIN users u ON u.id = c.user_id
    WHERE u.created_at > ? AND u.created_at <= ?
"#;
pub const SUBSCRIPTIONS_STARTED: &str = r#"
    SELECT COUNT(*) FROM subscriptions
    WHERE status = 'active' AND start_date > ? AND start_date <= ?
"#;

pub async fn count<'e, E>(executor: E, query: &str) -> Result<i64, AppError>
where
    E: SqliteExecutor<'e>,
{
    let count: i64 = sqlx::query_scalar(query).fetch_one(executor).await?;
    Ok(count)
}

pub async fn count_in_window<'e, E>(executor: E, query: &str, window: Window) -> Result<i64, AppError>
where
    E: SqliteExecutor<'e>,
{
    let count: i64 = sqlx::query_scalar(query)
        .bind(window.start)
        .bind(window.end)
        .fetch_one(executor)
        .await?;
    Ok(count)
}

/// Subscription start dates are plain dates, so the window is compared by day as `(start, end]`.
pub async fn count_in_date_window<'e, E>(executor: E, query: &str, window: Window) -> Result<i64, AppError>
where
    E: SqliteExecutor<'e>,
{
    let count: i64 = sqlx::query_scalar(query)
        .bind(window.start.date())
        .bind(window.end.date())
        .fetch_one(executor)
        .await?;
    Ok(count)
}

pub async fn count_active_subscriptions<'e, E>(executor: E, today: NaiveDate) -> Result<i64, AppError>
where
    E: SqliteExecutor<'e>,
{
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM subscriptions WHERE status = 'active' AND end_date >= ?",
    )
    .bind(today)
    .fetch_one(executor)
    .await?;
    Ok(count)
}
