use sqlx::SqliteConnection;

use crate::core::AppError;
use crate::db::activity;
use crate::models::dashboard::ActivityType;
use crate::services::assignments;

/// Cross-component side effects, handled inside the transaction that raised them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainEvent {
    UserDeactivated { user_id: i64 },
}

#[tracing::instrument(name = "Dispatch domain event", skip(conn))]
pub async fn dispatch(conn: &mut SqliteConnection, event: DomainEvent) -> Result<(), AppError> {
    match event {
        DomainEvent::UserDeactivated { user_id } => {
            let closed = assignments::on_user_deactivated(&mut *conn, user_id).await?;
            activity::record_activity(
                &mut *conn,
                ActivityType::UserDeactivated,
                &format!("User {} deactivated, {} coach assignment(s) closed", user_id, closed),
                Some(user_id),
            )
            .await;
        }
    }
    Ok(())
}
