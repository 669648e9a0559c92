use crate::core::AppError;
use crate::models::users::{AdminUpdateUserRequest, Role, UpdateProfileRequest, User, UserStatus};
use chrono::{NaiveDate, Utc};
use sqlx::{SqliteConnection, SqliteExecutor};

pub struct NewUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub phone: Option<&'a str>,
    pub address: Option<&'a str>,
    pub birth_date: Option<NaiveDate>,
    pub role: Role,
    pub status: UserStatus,
    pub email_verified: bool,
}

pub async fn insert_user<'e, E>(executor: E, user: &NewUser<'_>) -> Result<i64, AppError>
where
    E: SqliteExecutor<'e>,
{
    let now = Utc::now().naive_utc();

    let result = sqlx::query(
        r#"
        INSERT INTO users (name, email, password, phone, address, birth_date, role, status,
                           email_verified, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(user.name)
    .bind(user.email)
    .bind(user.password_hash)
    .bind(user.phone)
    .bind(user.address)
    .bind(user.birth_date)
    .bind(user.role)
    .bind(user.status)
    .bind(user.email_verified)
    .bind(now)
    .bind(now)
    .execute(executor)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn find_user_by_id<'e, E>(executor: E, user_id: i64) -> Result<Option<User>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

    Ok(user)
}

pub async fn get_user_by_id<'e, E>(executor: E, user_id: i64) -> Result<User, AppError>
where
    E: SqliteExecutor<'e>,
{
    find_user_by_id(executor, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))
}

pub async fn find_user_by_email<'e, E>(executor: E, email: &str) -> Result<Option<User>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(executor)
        .await?;

    Ok(user)
}

/// True when `email` belongs to an account other than `exclude_user_id`.
pub async fn email_taken<'e, E>(
    executor: E,
    email: &str,
    exclude_user_id: Option<i64>,
) -> Result<bool, AppError>
where
    E: SqliteExecutor<'e>,
{
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ? AND id != ?")
        .bind(email)
        .bind(exclude_user_id.unwrap_or(0))
        .fetch_one(executor)
        .await?;

    Ok(count > 0)
}

pub async fn update_password<'e, E>(executor: E, user_id: i64, password_hash: &str) -> Result<(), AppError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("UPDATE users SET password = ?, updated_at = ? WHERE id = ?")
        .bind(password_hash)
        .bind(Utc::now().naive_utc())
        .bind(user_id)
        .execute(executor)
        .await?;

    Ok(())
}

pub async fn mark_email_verified<'e, E>(executor: E, user_id: i64) -> Result<(), AppError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        "UPDATE users SET status = 'active', email_verified = 1, updated_at = ? WHERE id = ?",
    )
    .bind(Utc::now().naive_utc())
    .bind(user_id)
    .execute(executor)
    .await?;

    Ok(())
}

pub async fn update_status<'e, E>(executor: E, user_id: i64, status: UserStatus) -> Result<(), AppError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query("UPDATE users SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status)
        .bind(Utc::now().naive_utc())
        .bind(user_id)
        .execute(executor)
        .await?;

    Ok(())
}

pub async fn update_profile<'e, E>(
    executor: E,
    user_id: i64,
    request: &UpdateProfileRequest,
) -> Result<(), AppError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        UPDATE users
        SET name = ?, email = ?, phone = ?, address = ?, birth_date = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(request.name.trim())
    .bind(&request.email)
    .bind(&request.phone)
    .bind(&request.address)
    .bind(request.birth_date)
    .bind(Utc::now().naive_utc())
    .bind(user_id)
    .execute(executor)
    .await?;

    Ok(())
}

/// Partial admin edit; absent fields keep their stored value.
pub async fn apply_admin_update(
    conn: &mut SqliteConnection,
    user_id: i64,
    request: &AdminUpdateUserRequest,
    password_hash: Option<&str>,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        UPDATE users
        SET name = COALESCE(?, name),
            email = COALESCE(?, email),
            password = COALESCE(?, password),
            phone = COALESCE(?, phone),
            address = COALESCE(?, address),
            birth_date = COALESCE(?, birth_date),
            role = COALESCE(?, role),
            status = COALESCE(?, status),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(request.name.as_deref().map(str::trim))
    .bind(request.email.as_deref())
    .bind(password_hash)
    .bind(request.phone.as_deref())
    .bind(request.address.as_deref())
    .bind(request.birth_date)
    .bind(request.role)
    .bind(request.status)
    .bind(Utc::now().naive_utc())
    .bind(user_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub async fn list_users<'e, E>(executor: E) -> Result<Vec<User>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY created_at DESC, id DESC")
        .fetch_all(executor)
        .await?;

    Ok(users)
}
