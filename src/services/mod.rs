pub mod accounts;
pub mod admin;
pub mod assignments;
pub mod dashboard;
pub mod events;
pub mod memberships;
