use chrono::{Duration, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::plans::Money;

pub const QUARTERLY_DISCOUNT: Decimal = Decimal::from_parts(90, 0, 0, false, 2);
pub const ANNUAL_DISCOUNT: Decimal = Decimal::from_parts(85, 0, 0, false, 2);

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq, Hash)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    Monthly,
    Quarterly,
    Annual,
}

impl PlanType {
    pub fn duration_days(&self) -> i64 {
        match self {
            PlanType::Monthly => 30,
            PlanType::Quarterly => 90,
            PlanType::Annual => 365,
        }
    }

    pub fn months(&self) -> u32 {
        match self {
            PlanType::Monthly => 1,
            PlanType::Quarterly => 3,
            PlanType::Annual => 12,
        }
    }

    pub fn discount(&self) -> Decimal {
        match self {
            PlanType::Monthly => Decimal::ONE,
            PlanType::Quarterly => QUARTERLY_DISCOUNT,
            PlanType::Annual => ANNUAL_DISCOUNT,
        }
    }

    /// Start date plus the plan's fixed number of days.
    pub fn end_date(&self, start_date: NaiveDate) -> NaiveDate {
        start_date + Duration::days(self.duration_days())
    }
}

/// Base monthly price times the period length, with the multi-month discount applied.
pub fn calculate_price(base_price: Money, plan_type: PlanType) -> Money {
    let months = Decimal::from(plan_type.months());
    Money::new(base_price.amount() * months * plan_type.discount())
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Active,
    Expired,
    Cancelled,
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Subscription {
    pub id: i64,
    pub user_id: i64,
    pub plan_id: i64,
    pub plan_type: PlanType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: SubscriptionStatus,
    #[sqlx(rename = "price_paid_cents", try_from = "i64")]
    pub price_paid: Money,
    pub payment_method: Option<String>,
    pub updated_by_admin_id: Option<i64>,
    pub updated_at: NaiveDateTime,
    pub created_at: NaiveDateTime,
}

/// The active subscription of a user joined with its plan.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct ActiveMembership {
    pub subscription_id: i64,
    pub user_id: i64,
    pub plan_id: i64,
    pub plan_name: String,
    pub plan_description: Option<String>,
    pub plan_type: PlanType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[sqlx(rename = "price_paid_cents", try_from = "i64")]
    pub price_paid: Money,
    pub payment_method: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum CurrentMembership {
    Active(ActiveMembership),
    Inactive { user_id: i64 },
}

impl CurrentMembership {
    pub fn is_active(&self) -> bool {
        matches!(self, CurrentMembership::Active(_))
    }
}

#[derive(Debug, Serialize, Clone, sqlx::FromRow)]
pub struct MembershipHistoryEntry {
    pub id: i64,
    pub plan_id: i64,
    pub plan_name: String,
    pub plan_type: PlanType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub status: SubscriptionStatus,
    #[sqlx(rename = "price_paid_cents", try_from = "i64")]
    pub price_paid: Money,
    pub payment_method: Option<String>,
    pub updated_by_admin_name: Option<String>,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Serialize, Clone, sqlx::FromRow)]
pub struct UserWithMembership {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub status: super::users::UserStatus,
    pub subscription_id: Option<i64>,
    pub plan_name: Option<String>,
    pub plan_type: Option<PlanType>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Body of `POST /memberships` and `PUT /memberships/{id}/renew`.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct SubscriptionRequest {
    pub user_id: Option<i64>,
    #[validate(required)]
    pub plan_id: Option<i64>,
    #[validate(required)]
    pub plan_type: Option<PlanType>,
    #[validate(required)]
    pub start_date: Option<NaiveDate>,
    #[validate(length(max = 50, message = "payment_method is too long"))]
    pub payment_method: Option<String>,
    pub price_paid: Option<Decimal>,
}

/// Body of `PUT /admin/memberships/{id}`. Omitted fields keep their stored value.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateSubscriptionRequest {
    pub plan_id: Option<i64>,
    pub plan_type: Option<PlanType>,
    pub start_date: Option<NaiveDate>,
    #[validate(length(max = 50, message = "payment_method is too long"))]
    pub payment_method: Option<String>,
    pub price_paid: Option<Decimal>,
}

/// A fully validated subscription purchase.
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub user_id: i64,
    pub plan_id: i64,
    pub plan_type: PlanType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub price_paid: Money,
    pub payment_method: Option<String>,
    pub updated_by_admin_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ExpirySweep {
    pub expired: u64,
}
