use crate::core::AppError;
use crate::models::subscriptions::{
    ActiveMembership, MembershipHistoryEntry, NewSubscription, Subscription, SubscriptionStatus,
    UserWithMembership,
};
use chrono::{NaiveDate, Utc};
use sqlx::SqliteExecutor;

pub async fn find_subscription<'e, E>(executor: E, subscription_id: i64) -> Result<Option<Subscription>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let subscription = sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE id = ?")
        .bind(subscription_id)
        .fetch_optional(executor)
        .await?;

    Ok(subscription)
}

/// Cancels every active subscription of the user except `keep_id`.
pub async fn cancel_active_for_user<'e, E>(
    executor: E,
    user_id: i64,
    keep_id: Option<i64>,
    admin_id: Option<i64>,
) -> Result<u64, AppError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE subscriptions
        SET status = 'cancelled', updated_at = ?, updated_by_admin_id = COALESCE(?, updated_by_admin_id)
        WHERE user_id = ? AND status = 'active' AND id != ?
        "#,
    )
    .bind(Utc::now().naive_utc())
    .bind(admin_id)
    .bind(user_id)
    .bind(keep_id.unwrap_or(0))
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

pub async fn set_status<'e, E>(
    executor: E,
    subscription_id: i64,
    status: SubscriptionStatus,
    admin_id: Option<i64>,
) -> Result<(), AppError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        UPDATE subscriptions
        SET status = ?, updated_at = ?, updated_by_admin_id = COALESCE(?, updated_by_admin_id)
        WHERE id = ?
        "#,
    )
    .bind(status)
    .bind(Utc::now().naive_utc())
    .bind(admin_id)
    .bind(subscription_id)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn insert_active<'e, E>(executor: E, new: &NewSubscription) -> Result<Subscription, AppError>
where
    E: SqliteExecutor<'e>,
{
    let now = Utc::now().naive_utc();

    let subscription = sqlx::query_as::<_, Subscription>(
        r#"
        INSERT INTO subscriptions (user_id, plan_id, plan_type, start_date, end_date, status,
                                   price_paid_cents, payment_method, updated_by_admin_id,
                                   updated_at, created_at)
        VALUES (?, ?, ?, ?, ?, 'active', ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(new.user_id)
    .bind(new.plan_id)
    .bind(new.plan_type)
    .bind(new.start_date)
    .bind(new.end_date)
    .bind(new.price_paid.cents()?)
    .bind(&new.payment_method)
    .bind(new.updated_by_admin_id)
    .bind(now)
    .bind(now)
    .fetch_one(executor)
    .await?;

    Ok(subscription)
}

/// Rewrites the terms of a subscription in place; its status is left alone.
pub async fn update_terms<'e, E>(
    executor: E,
    subscription_id: i64,
    terms: &NewSubscription,
) -> Result<Subscription, AppError>
where
    E: SqliteExecutor<'e>,
{
    let subscription = sqlx::query_as::<_, Subscription>(
        r#"
        UPDATE subscriptions
        SET plan_id = ?, plan_type = ?, start_date = ?, end_date = ?, price_paid_cents = ?,
            payment_method = ?, updated_by_admin_id = ?, updated_at = ?
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(terms.plan_id)
    .bind(terms.plan_type)
    .bind(terms.start_date)
    .bind(terms.end_date)
    .bind(terms.price_paid.cents()?)
    .bind(&terms.payment_method)
    .bind(terms.updated_by_admin_id)
    .bind(Utc::now().naive_utc())
    .bind(subscription_id)
    .fetch_one(executor)
    .await?;

    Ok(subscription)
}

pub async fn find_active_membership<'e, E>(executor: E, user_id: i64) -> Result<Option<ActiveMembership>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let membership = sqlx::query_as::<_, ActiveMembership>(
        r#"
        SELECT s.id AS subscription_id, s.user_id, s.plan_id, p.name AS plan_name,
               p.description AS plan_description, s.plan_type, s.start_date, s.end_date,
               s.price_paid_cents, s.payment_method
        FROM subscriptions s
        JOIN plans p ON p.id = s.plan_id
        WHERE s.user_id = ? AND s.status = 'active'
        ORDER BY s.start_date DESC, s.id DESC
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await?;

    Ok(membership)
}

pub async fn membership_history<'e, E>(executor: E, user_id: i64) -> Result<Vec<MembershipHistoryEntry>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let history = sqlx::query_as::<_, MembershipHistoryEntry>(
        r#"
        SELECT s.id, s.plan_id, p.name AS plan_name, s.plan_type, s.start_date, s.end_date,
               s.status, s.price_paid_cents, s.payment_method,
               a.name AS updated_by_admin_name, s.updated_at
        FROM subscriptions s
        JOIN plans p ON p.id = s.plan_id
        LEFT JOIN users a ON a.id = s.updated_by_admin_id
        WHERE s.user_id = ?
        ORDER BY s.created_at DESC, s.id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await?;

    Ok(history)
}

pub async fn users_with_memberships<'e, E>(executor: E) -> Result<Vec<UserWithMembership>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let rows = sqlx::query_as::<_, UserWithMembership>(
        r#"
        SELECT u.id AS user_id, u.name, u.email, u.status,
               s.id AS subscription_id, p.name AS plan_name, s.plan_type, s.start_date, s.end_date
        FROM users u
        LEFT JOIN subscriptions s ON s.user_id = u.id AND s.status = 'active'
        LEFT JOIN plans p ON p.id = s.plan_id
        WHERE u.role = 'client'
        ORDER BY u.name
        "#,
    )
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// Active subscriptions whose end date is before `today` become expired.
pub async fn expire_lapsed<'e, E>(executor: E, today: NaiveDate) -> Result<u64, AppError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        UPDATE subscriptions
        SET status = 'expired', updated_at = ?
        WHERE status = 'active' AND end_date < ?
        "#,
    )
    .bind(Utc::now().naive_utc())
    .bind(today)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}
