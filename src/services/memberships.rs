use chrono::NaiveDate;
use sqlx::{SqliteConnection, SqlitePool};
use validator::Validate;

use crate::core::jwt_auth::SessionUser;
use crate::core::AppError;
use crate::db::{activity, plans, subscriptions, users};
use crate::models::dashboard::ActivityType;
use crate::models::plans::{CreatePlanRequest, Money, Plan, PriceQuote};
use crate::models::subscriptions::{
    calculate_price, CurrentMembership, ExpirySweep, MembershipHistoryEntry, NewSubscription,
    PlanType, Subscription, SubscriptionRequest, SubscriptionStatus, UpdateSubscriptionRequest,
    UserWithMembership,
};

fn admin_stamp(actor: &SessionUser) -> Option<i64> {
    actor.is_admin().then_some(actor.user_id)
}

fn check_price_paid(price_paid: Money) -> Result<(), AppError> {
    if price_paid.is_negative() {
        return Err(AppError::bad_request("price_paid cannot be negative"));
    }
    price_paid
        .cents()
        .map_err(|_| AppError::bad_request("price_paid is out of range"))?;
    Ok(())
}

/// Validates the request against the stored plan and fixes dates and price.
async fn prepare_subscription(
    conn: &mut SqliteConnection,
    actor: &SessionUser,
    user_id: i64,
    request: &SubscriptionRequest,
) -> Result<NewSubscription, AppError> {
    request.validate()?;
    let (Some(plan_id), Some(plan_type), Some(start_date)) =
        (request.plan_id, request.plan_type, request.start_date)
    else {
        return Err(AppError::bad_request("Missing required fields to create the membership"));
    };

    users::find_user_by_id(&mut *conn, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    let plan = plans::find_plan_by_id(&mut *conn, plan_id)
        .await?
        .ok_or_else(|| AppError::not_found("The selected plan does not exist"))?;

    let price_paid = match request.price_paid {
        Some(amount) => Money::new(amount),
        None => calculate_price(plan.base_price, plan_type),
    };
    check_price_paid(price_paid)?;

    Ok(NewSubscription {
        user_id,
        plan_id,
        plan_type,
        start_date,
        end_date: plan_type.end_date(start_date),
        price_paid,
        payment_method: request.payment_method.clone(),
        updated_by_admin_id: admin_stamp(actor),
    })
}

#[tracing::instrument(name = "Create subscription", skip(pool, actor, request), fields(actor = actor.user_id))]
pub async fn create_subscription(
    pool: &SqlitePool,
    actor: &SessionUser,
    request: SubscriptionRequest,
) -> Result<Subscription, AppError> {
    let user_id = request.user_id.unwrap_or(actor.user_id);
    actor.require_self_or_admin(user_id)?;

    let mut tx = pool.begin().await?;

    let new = prepare_subscription(&mut tx, actor, user_id, &request).await?;
    let cancelled = subscriptions::cancel_active_for_user(&mut *tx, user_id, None, admin_stamp(actor)).await?;
    if cancelled > 0 {
        tracing::info!("Cancelled {} active subscription(s) of user {}", cancelled, user_id);
    }
    let subscription = subscriptions::insert_active(&mut *tx, &new).await?;

    activity::record_activity(
        &mut *tx,
        ActivityType::NewSubscription,
        &format!("New {:?} subscription for user {}", new.plan_type, user_id).to_lowercase(),
        Some(user_id),
    )
    .await;

    tx.commit().await?;
    Ok(subscription)
}

#[tracing::instrument(name = "Renew subscription", skip(pool, actor, request), fields(actor = actor.user_id))]
pub async fn renew_subscription(
    pool: &SqlitePool,
    actor: &SessionUser,
    subscription_id: i64,
    request: SubscriptionRequest,
) -> Result<Subscription, AppError> {
    let mut tx = pool.begin().await?;

    let current = subscriptions::find_subscription(&mut *tx, subscription_id)
        .await?
        .filter(|s| s.user_id == actor.user_id || actor.is_admin())
        .ok_or_else(|| AppError::not_found("Membership not found or not authorized"))?;

    let new = prepare_subscription(&mut tx, actor, current.user_id, &request).await?;

    subscriptions::set_status(&mut *tx, current.id, SubscriptionStatus::Expired, admin_stamp(actor)).await?;
    subscriptions::cancel_active_for_user(&mut *tx, current.user_id, Some(current.id), admin_stamp(actor)).await?;
    let renewed = subscriptions::insert_active(&mut *tx, &new).await?;

    activity::record_activity(
        &mut *tx,
        ActivityType::SubscriptionRenewal,
        &format!("Subscription {} renewed as {}", current.id, renewed.id),
        Some(current.user_id),
    )
    .await;

    tx.commit().await?;
    Ok(renewed)
}

/// Cancelling a subscription that is no longer active changes nothing.
#[tracing::instrument(name = "Cancel subscription", skip(pool, actor), fields(actor = actor.user_id))]
pub async fn cancel_subscription(
    pool: &SqlitePool,
    actor: &SessionUser,
    subscription_id: i64,
) -> Result<Subscription, AppError> {
    let mut tx = pool.begin().await?;

    let mut subscription = subscriptions::find_subscription(&mut *tx, subscription_id)
        .await?
        .filter(|s| s.user_id == actor.user_id || actor.is_admin())
        .ok_or_else(|| AppError::not_found("Membership not found or not authorized"))?;

    if subscription.status != SubscriptionStatus::Active {
        return Ok(subscription);
    }

    subscriptions::set_status(&mut *tx, subscription.id, SubscriptionStatus::Cancelled, admin_stamp(actor)).await?;
    activity::record_activity(
        &mut *tx,
        ActivityType::SubscriptionCancelled,
        &format!("Subscription {} cancelled", subscription.id),
        Some(subscription.user_id),
    )
    .await;

    tx.commit().await?;

    subscription.status = SubscriptionStatus::Cancelled;
    Ok(subscription)
}

/// Admin edit of an existing subscription. The end date follows the new start
/// date and plan type; the price is recalculated when the plan changes and no
/// explicit price is given.
#[tracing::instrument(name = "Update subscription", skip(pool, actor, request), fields(actor = actor.user_id))]
pub async fn update_subscription(
    pool: &SqlitePool,
    actor: &SessionUser,
    subscription_id: i64,
    request: UpdateSubscriptionRequest,
) -> Result<Subscription, AppError> {
    actor.require_admin()?;
    request.validate()?;

    let mut tx = pool.begin().await?;

    let current = subscriptions::find_subscription(&mut *tx, subscription_id)
        .await?
        .ok_or_else(|| AppError::not_found("Membership not found"))?;

    let plan_id = request.plan_id.unwrap_or(current.plan_id);
    let plan_type = request.plan_type.unwrap_or(current.plan_type);
    let start_date = request.start_date.unwrap_or(current.start_date);

    let plan = plans::find_plan_by_id(&mut *tx, plan_id)
        .await?
        .ok_or_else(|| AppError::not_found("The selected plan does not exist"))?;

    let terms_changed = plan_id != current.plan_id || plan_type != current.plan_type;
    let price_paid = match request.price_paid {
        Some(amount) => Money::new(amount),
        None if terms_changed => calculate_price(plan.base_price, plan_type),
        None => current.price_paid,
    };
    check_price_paid(price_paid)?;

    let terms = NewSubscription {
        user_id: current.user_id,
        plan_id,
        plan_type,
        start_date,
        end_date: plan_type.end_date(start_date),
        price_paid,
        payment_method: request.payment_method.or(current.payment_method),
        updated_by_admin_id: Some(actor.user_id),
    };
    let updated = subscriptions::update_terms(&mut *tx, current.id, &terms).await?;

    tx.commit().await?;
    Ok(updated)
}

/// Never fails: storage errors are logged and reported as no membership.
pub async fn get_current_membership(pool: &SqlitePool, user_id: i64) -> CurrentMembership {
    match subscriptions::find_active_membership(pool, user_id).await {
        Ok(Some(membership)) => CurrentMembership::Active(membership),
        Ok(None) => CurrentMembership::Inactive { user_id },
        Err(e) => {
            tracing::warn!("Failed to load membership of user {}: {}", user_id, e);
            CurrentMembership::Inactive { user_id }
        }
    }
}

pub async fn list_plans(pool: &SqlitePool) -> Result<Vec<Plan>, AppError> {
    plans::list_active_plans(pool).await
}

#[tracing::instrument(name = "Create plan", skip(pool, actor, request))]
pub async fn create_plan(
    pool: &SqlitePool,
    actor: &SessionUser,
    request: CreatePlanRequest,
) -> Result<Plan, AppError> {
    actor.require_admin()?;
    request.validate()?;

    let base_price = Money::new(request.base_price);
    if base_price.is_negative() {
        return Err(AppError::bad_request("base_price cannot be negative"));
    }
    base_price
        .cents()
        .map_err(|_| AppError::bad_request("base_price is out of range"))?;

    let plan_id = plans::insert_plan(
        pool,
        request.name.trim(),
        request.description.as_deref(),
        base_price,
    )
    .await?;

    plans::find_plan_by_id(pool, plan_id)
        .await?
        .ok_or_else(|| AppError::internal_error("Plan disappeared after insert"))
}

pub async fn quote_price(pool: &SqlitePool, plan_id: i64, plan_type: PlanType) -> Result<PriceQuote, AppError> {
    let plan = plans::find_plan_by_id(pool, plan_id)
        .await?
        .ok_or_else(|| AppError::not_found("The selected plan does not exist"))?;

    Ok(PriceQuote {
        plan_id,
        plan_type,
        duration_days: plan_type.duration_days(),
        base_price: plan.base_price,
        price: calculate_price(plan.base_price, plan_type),
    })
}

pub async fn membership_history(
    pool: &SqlitePool,
    actor: &SessionUser,
    user_id: i64,
) -> Result<Vec<MembershipHistoryEntry>, AppError> {
    actor.require_self_or_admin(user_id)?;
    users::get_user_by_id(pool, user_id).await?;
    subscriptions::membership_history(pool, user_id).await
}

pub async fn users_with_memberships(
    pool: &SqlitePool,
    actor: &SessionUser,
) -> Result<Vec<UserWithMembership>, AppError> {
    actor.require_admin()?;
    subscriptions::users_with_memberships(pool).await
}

#[tracing::instrument(name = "Expire lapsed subscriptions", skip(pool, actor))]
pub async fn expire_lapsed_subscriptions(
    pool: &SqlitePool,
    actor: &SessionUser,
    today: NaiveDate,
) -> Result<ExpirySweep, AppError> {
    actor.require_admin()?;
    let expired = subscriptions::expire_lapsed(pool, today).await?;
    if expired > 0 {
        tracing::info!("Expired {} subscription(s)", expired);
    }
    Ok(ExpirySweep { expired })
}
