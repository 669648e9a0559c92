use chrono::NaiveDateTime;
use sqlx::SqlitePool;

use crate::core::AppError;
use crate::db::activity;
use crate::db::dashboard as queries;
use crate::models::dashboard::{
    ActivityEntry, ActivityQuery, ComparisonPair, DashboardComparison, DashboardStats,
    PendingVerifications, Timeframe, Window,
};

const DEFAULT_ACTIVITY_LIMIT: i64 = 10;
const MAX_ACTIVITY_LIMIT: i64 = 100;

/// Dashboards always render: a storage failure becomes the zero value.
fn degrade<T: Default>(result: Result<T, AppError>, what: &str) -> T {
    result.unwrap_or_else(|e| {
        tracing::warn!("Dashboard query '{}' failed, using default: {}", what, e);
        T::default()
    })
}

#[tracing::instrument(name = "Dashboard stats", skip(pool))]
pub async fn dashboard_stats(pool: &SqlitePool, timeframe: Timeframe, now: NaiveDateTime) -> DashboardStats {
    DashboardStats {
        total_users: degrade(queries::count(pool, queries::TOTAL_USERS).await, "total users"),
        active_users: degrade(queries::count(pool, queries::ACTIVE_USERS).await, "active users"),
        total_coaches: degrade(queries::count(pool, queries::TOTAL_COACHES).await, "coaches"),
        active_subscriptions: degrade(
            queries::count_active_subscriptions(pool, now.date()).await,
            "active subscriptions",
        ),
        pending_verifications: degrade(
            queries::count(pool, queries::PENDING_VERIFICATIONS).await,
            "pending verifications",
        ),
        new_users: degrade(
            queries::count_in_window(pool, queries::USERS_REGISTERED, timeframe.current_window(now)).await,
            "new users",
        ),
    }
}

async fn compare(pool: &SqlitePool, query: &str, current: Window, previous: Window, by_date: bool) -> ComparisonPair {
    let (current, previous) = if by_date {
        (
            queries::count_in_date_window(pool, query, current).await,
            queries::count_in_date_window(pool, query, previous).await,
        )
    } else {
        (
            queries::count_in_window(pool, query, current).await,
            queries::count_in_window(pool, query, previous).await,
        )
    };

    ComparisonPair {
        current: degrade(current, "comparison current"),
        previous: degrade(previous, "comparison previous"),
    }
}

#[tracing::instrument(name = "Dashboard comparison", skip(pool))]
pub async fn dashboard_comparison(
    pool: &SqlitePool,
    timeframe: Timeframe,
    now: NaiveDateTime,
) -> DashboardComparison {
    let current = timeframe.current_window(now);
    let previous = timeframe.previous_window(now);

    DashboardComparison {
        timeframe,
        total_users: compare(pool, queries::USERS_REGISTERED, current, previous, false).await,
        active_users: compare(pool, queries::ACTIVE_USERS_REGISTERED, current, previous, false).await,
        coaches: compare(pool, queries::COACHES_REGISTERED, current, previous, false).await,
        active_subscriptions: compare(pool, queries::SUBSCRIPTIONS_STARTED, current, previous, true).await,
    }
}

/// Newest activity first, falling back to user registrations when the log is unavailable.
#[tracing::instrument(name = "Recent activity", skip(pool))]
pub async fn recent_activity(pool: &SqlitePool, query: ActivityQuery, now: NaiveDateTime) -> Vec<ActivityEntry> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
        .clamp(1, MAX_ACTIVITY_LIMIT);
    let since = query.time_filter.unwrap_or_default().since(now);
    let activity_type = query.activity_type.as_deref().filter(|t| !t.is_empty() && *t != "all");

    if degrade(activity::activity_table_exists(pool).await, "activity table") {
        match activity::recent_activity(pool, activity_type, since, limit).await {
            Ok(entries) => return entries,
            Err(e) => tracing::warn!("Activity log unreadable, using registrations: {}", e),
        }
    }

    if activity_type.is_some_and(|t| t != "new_user") {
        return Vec::new();
    }
    degrade(activity::registration_feed(pool, since, limit).await, "registration feed")
}

pub async fn pending_verifications(pool: &SqlitePool) -> PendingVerifications {
    PendingVerifications {
        count: degrade(
            queries::count(pool, queries::PENDING_VERIFICATIONS).await,
            "pending verifications",
        ),
    }
}
