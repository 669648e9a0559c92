use serde::{Deserialize, Serialize};
use validator::Validate;

use super::users::{validate_person_name, UserStatus};

pub const DEFAULT_SPECIALIZATION: &str = "General";

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, sqlx::FromRow)]
pub struct CoachProfile {
    pub id: i64,
    pub user_id: i64,
    pub specialization: String,
    pub certifications: Option<String>,
    pub biography: Option<String>,
    pub available_schedule: Option<String>,
}

/// A coach joined with the owning user's public data.
#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct CoachListing {
    pub coach_id: i64,
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub status: UserStatus,
    pub specialization: String,
    pub certifications: Option<String>,
    pub biography: Option<String>,
    pub available_schedule: Option<String>,
}

#[derive(Debug, Default, Deserialize, Clone)]
pub struct CoachDetails {
    pub specialization: Option<String>,
    pub certifications: Option<String>,
    pub biography: Option<String>,
    pub available_schedule: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCoachRequest {
    #[validate(custom = "validate_person_name")]
    pub name: String,
    #[validate(email(message = "Please provide a valid email address"))]
    pub email: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters long"))]
    pub password: String,
    pub phone: Option<String>,
    #[serde(flatten)]
    pub details: CoachDetails,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCoachRequest {
    #[validate(custom = "validate_person_name")]
    pub name: Option<String>,
    pub phone: Option<String>,
    #[serde(flatten)]
    pub details: CoachDetails,
}
