use crate::core::AppError;
use crate::models::tokens::{generate_token, TokenPurpose, UserToken};
use chrono::{Duration, Utc};
use sqlx::{SqliteConnection, SqliteExecutor};

/// Consumes any outstanding token of the same purpose, then stores a fresh one.
pub async fn issue_token(
    conn: &mut SqliteConnection,
    user_id: i64,
    purpose: TokenPurpose,
    ttl: Duration,
) -> Result<UserToken, AppError> {
    let now = Utc::now().naive_utc();

    sqlx::query(
        r#"
        UPDATE user_tokens SET consumed_at = ?
        WHERE user_id = ? AND purpose = ? AND consumed_at IS NULL
        "#,
    )
    .bind(now)
    .bind(user_id)
    .bind(purpose)
    .execute(&mut *conn)
    .await?;

    let token = generate_token();
    let result = sqlx::query(
        r#"
        INSERT INTO user_tokens (user_id, purpose, token, expires_at, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(purpose)
    .bind(&token)
    .bind(now + ttl)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(UserToken {
        id: result.last_insert_rowid(),
        user_id,
        purpose,
        token,
        expires_at: now + ttl,
        consumed_at: None,
        created_at: now,
    })
}

/// Looks up an unconsumed token for the given purpose.
pub async fn find_open_token<'e, E>(
    executor: E,
    token: &str,
    purpose: TokenPurpose,
) -> Result<Option<UserToken>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let token = sqlx::query_as::<_, UserToken>(
        r#"
        SELECT * FROM user_tokens
        WHERE token = ? AND purpose = ? AND consumed_at IS NULL
        "#,
    )
    .bind(token)
    .bind(purpose)
    .fetch_optional(executor)
    .await?;

    Ok(token)
}

pub async fn consume_token<'e, E>(executor: E, token_id: i64) -> Result<(), AppError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("UPDATE user_tokens SET consumed_at = ? WHERE id = ? AND consumed_at IS NULL")
        .bind(Utc::now().naive_utc())
        .bind(token_id)
        .execute(executor)
        .await?;

    Ok(())
}
