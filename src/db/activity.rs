use crate::core::AppError;
use crate::models::dashboard::{ActivityEntry, ActivityType};
use chrono::{NaiveDateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteExecutor};

/// Appends to the activity log. The log is optional, so failures are only logged.
pub async fn record_activity<'e, E>(
    executor: E,
    activity_type: ActivityType,
    description: &str,
    user_id: Option<i64>,
) where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        "INSERT INTO activity_log (activity_type, description, user_id, created_at) VALUES (?, ?, ?, ?)",
    )
    .bind(activity_type)
    .bind(description)
    .bind(user_id)
    .bind(Utc::now().naive_utc())
    .execute(executor)
    .await;

    if let Err(e) = result {
        tracing::warn!("Failed to record {:?} activity: {}", activity_type, e);
    }
}

pub async fn activity_table_exists<'e, E>(executor: E) -> Result<bool, AppError>
where
    E: SqliteExecutor<'e>,
{
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'activity_log'",
    )
    .fetch_one(executor)
    .await?;

    Ok(count > 0)
}

pub async fn recent_activity<'e, E>(
    executor: E,
    activity_type: Option<&str>,
    since: Option<NaiveDateTime>,
    limit: i64,
) -> Result<Vec<ActivityEntry>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT id, activity_type, description, user_id, created_at FROM activity_log WHERE 1 = 1",
    );
    if let Some(activity_type) = activity_type {
        query.push(" AND activity_type = ").push_bind(activity_type);
    }
    if let Some(since) = since {
        query.push(" AND created_at >= ").push_bind(since);
    }
    query
        .push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(limit);

    let entries = query
        .build_query_as::<ActivityEntry>()
        .fetch_all(executor)
        .await?;

    Ok(entries)
}

/// Activity synthesized from user registrations, for when the log cannot be read.
pub async fn registration_feed<'e, E>(
    executor: E,
    since: Option<NaiveDateTime>,
    limit: i64,
) -> Result<Vec<ActivityEntry>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
        r#"
        SELECT id, 'new_user' AS activity_type, 'New user registered: ' || name AS description,
               id AS user_id, created_at
        FROM users WHERE 1 = 1
        "#,
    );
    if let Some(since) = since {
        query.push(" AND created_at >= ").push_bind(since);
    }
    query
        .push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(limit);

    let entries = query
        .build_query_as::<ActivityEntry>()
        .fetch_all(executor)
        .await?;

    Ok(entries)
}
