use chrono::NaiveDateTime;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::subscriptions::PlanType;

#[derive(Debug, thiserror::Error)]
#[error("{0} is out of range for a stored amount")]
pub struct AmountOutOfRange(pub Decimal);

/// An amount of money with two decimal places, persisted as integer cents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    pub fn new(amount: Decimal) -> Self {
        let mut rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(2);
        Money(rounded)
    }

    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    /// The amount in cents, or an error when it does not fit the `i64` column.
    pub fn cents(&self) -> Result<i64, AmountOutOfRange> {
        let mut scaled = self.0;
        scaled.rescale(2);
        i64::try_from(scaled.mantissa()).map_err(|_| AmountOutOfRange(self.0))
    }

    pub fn amount(&self) -> Decimal {
        self.0
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }
}

impl TryFrom<i64> for Money {
    type Error = std::convert::Infallible;

    fn try_from(cents: i64) -> Result<Self, Self::Error> {
        Ok(Money::from_cents(cents))
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Plan {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    #[sqlx(rename = "base_price_cents", try_from = "i64")]
    pub base_price: Money,
    pub duration_unit: String,
    pub is_active: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreatePlanRequest {
    #[validate(length(min = 1, max = 100, message = "Plan name is required"))]
    pub name: String,
    pub description: Option<String>,
    pub base_price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct QuoteQuery {
    pub plan_type: PlanType,
}

#[derive(Debug, Serialize)]
pub struct PriceQuote {
    pub plan_id: i64,
    pub plan_type: PlanType,
    pub duration_days: i64,
    pub base_price: Money,
    pub price: Money,
}
