use chrono::{Duration, Months, NaiveDateTime};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Timeframe {
    Week,
    #[default]
    Month,
    Year,
}

/// Interval `(start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl Timeframe {
    fn step_back(&self, from: NaiveDateTime) -> NaiveDateTime {
        let stepped = match self {
            Timeframe::Week => from.checked_sub_signed(Duration::days(7)),
            Timeframe::Month => from.checked_sub_months(Months::new(1)),
            Timeframe::Year => from.checked_sub_months(Months::new(12)),
        };
        stepped.unwrap_or(NaiveDateTime::MIN)
    }

    /// The window ending at `now`.
    pub fn current_window(&self, now: NaiveDateTime) -> Window {
        Window {
            start: self.step_back(now),
            end: now,
        }
    }

    /// The window of equal length immediately before the current one.
    pub fn previous_window(&self, now: NaiveDateTime) -> Window {
        let current = self.current_window(now);
        Window {
            start: self.step_back(current.start),
            end: current.start,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimeFilter {
    #[default]
    All,
    Today,
    Week,
    Month,
}

impl TimeFilter {
    pub fn since(&self, now: NaiveDateTime) -> Option<NaiveDateTime> {
        match self {
            TimeFilter::All => None,
            TimeFilter::Today => now.date().and_hms_opt(0, 0, 0),
            TimeFilter::Week => now.checked_sub_signed(Duration::days(7)),
            TimeFilter::Month => now.checked_sub_months(Months::new(1)),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct TimeframeQuery {
    pub timeframe: Option<Timeframe>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ActivityQuery {
    #[serde(rename = "type")]
    pub activity_type: Option<String>,
    pub time_filter: Option<TimeFilter>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct DashboardStats {
    pub total_users: i64,
    pub active_users: i64,
    pub total_coaches: i64,
    pub active_subscriptions: i64,
    pub pending_verifications: i64,
    pub new_users: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct ComparisonPair {
    pub current: i64,
    pub previous: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct DashboardComparison {
    pub timeframe: Timeframe,
    pub total_users: ComparisonPair,
    pub active_users: ComparisonPair,
    pub coaches: ComparisonPair,
    pub active_subscriptions: ComparisonPair,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    NewUser,
    NewSubscription,
    SubscriptionRenewal,
    SubscriptionCancelled,
    CoachAssignment,
    UserDeactivated,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, sqlx::FromRow)]
pub struct ActivityEntry {
    pub id: i64,
    pub activity_type: String,
    pub description: String,
    pub user_id: Option<i64>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct PendingVerifications {
    pub count: i64,
}
