use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub const PENDING_REQUEST_NOTE: &str = "Request pending approval";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq, Eq)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AssignmentStatus {
    Pending,
    Active,
    Rejected,
    Inactive,
}

impl AssignmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::Pending => "pending",
            AssignmentStatus::Active => "active",
            AssignmentStatus::Rejected => "rejected",
            AssignmentStatus::Inactive => "inactive",
        }
    }

    /// `pending` and `active` count against the one-open-assignment rule.
    pub fn is_open(&self) -> bool {
        matches!(self, AssignmentStatus::Pending | AssignmentStatus::Active)
    }

    pub fn can_transition_to(&self, next: AssignmentStatus) -> bool {
        use AssignmentStatus::*;
        matches!(
            (self, next),
            (Pending, Active) | (Pending, Rejected) | (Pending, Inactive) | (Active, Inactive)
        )
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct CoachClientAssignment {
    pub id: i64,
    pub coach_id: i64,
    pub client_id: i64,
    pub status: AssignmentStatus,
    pub assigned_at: NaiveDateTime,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct AssignedCoach {
    pub assignment_id: i64,
    pub coach_id: i64,
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub specialization: String,
    pub status: AssignmentStatus,
    pub assigned_at: NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CoachStatus {
    pub has_coach: bool,
    pub pending_request: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coach: Option<AssignedCoach>,
}

impl From<Option<AssignedCoach>> for CoachStatus {
    fn from(current: Option<AssignedCoach>) -> Self {
        match current {
            Some(coach) => CoachStatus {
                has_coach: coach.status == AssignmentStatus::Active,
                pending_request: coach.status == AssignmentStatus::Pending,
                coach: Some(coach),
            },
            None => CoachStatus::default(),
        }
    }
}

/// A client as seen from the coach's side of an assignment.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct CoachClient {
    pub assignment_id: i64,
    pub client_id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub status: AssignmentStatus,
    pub assigned_at: NaiveDateTime,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CoachRequest {
    pub client_id: Option<i64>,
    pub coach_id: i64,
}
