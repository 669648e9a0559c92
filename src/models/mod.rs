pub mod assignments;
pub mod coaches;
pub mod dashboard;
pub mod notifications;
pub mod plans;
pub mod subscriptions;
pub mod tokens;
pub mod users;
