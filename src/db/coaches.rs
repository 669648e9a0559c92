use crate::core::AppError;
use crate::models::coaches::{CoachDetails, CoachListing, CoachProfile, DEFAULT_SPECIALIZATION};
use sqlx::SqliteExecutor;

const COACH_LISTING: &str = r#"
    SELECT c.id AS coach_id, u.id AS user_id, u.name, u.email, u.phone, u.status,
           c.specialization, c.certifications, c.biography, c.available_schedule
    FROM coaches c
    JOIN users u ON u.id = c.user_id
"#;

pub async fn insert_coach<'e, E>(
    executor: E,
    user_id: i64,
    details: &CoachDetails,
) -> Result<i64, AppError>
where
    E: SqliteExecutor<'e>,
{
    let specialization = details
        .specialization
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_SPECIALIZATION);

    let result = sqlx::query(
        r#"
        INSERT INTO coaches (user_id, specialization, certifications, biography, available_schedule)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(specialization)
    .bind(&details.certifications)
    .bind(&details.biography)
    .bind(&details.available_schedule)
    .execute(executor)
    .await?;

    Ok(result.last_insert_rowid())
}

pub async fn find_coach_by_id<'e, E>(executor: E, coach_id: i64) -> Result<Option<CoachProfile>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let coach = sqlx::query_as::<_, CoachProfile>("SELECT * FROM coaches WHERE id = ?")
        .bind(coach_id)
        .fetch_optional(executor)
        .await?;

    Ok(coach)
}

pub async fn find_coach_by_user<'e, E>(executor: E, user_id: i64) -> Result<Option<CoachProfile>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let coach = sqlx::query_as::<_, CoachProfile>("SELECT * FROM coaches WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(executor)
        .await?;

    Ok(coach)
}

pub async fn find_coach_listing<'e, E>(executor: E, coach_id: i64) -> Result<Option<CoachListing>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let query = format!("{} WHERE c.id = ?", COACH_LISTING);
    let coach = sqlx::query_as::<_, CoachListing>(&query)
        .bind(coach_id)
        .fetch_optional(executor)
        .await?;

    Ok(coach)
}

/// Coaches whose owning user is active, by name.
pub async fn list_available_coaches<'e, E>(executor: E) -> Result<Vec<CoachListing>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let query = format!("{} WHERE u.status = 'active' ORDER BY u.name", COACH_LISTING);
    let coaches = sqlx::query_as::<_, CoachListing>(&query)
        .fetch_all(executor)
        .await?;

    Ok(coaches)
}

pub async fn list_all_coaches<'e, E>(executor: E) -> Result<Vec<CoachListing>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let query = format!("{} ORDER BY u.name", COACH_LISTING);
    let coaches = sqlx::query_as::<_, CoachListing>(&query)
        .fetch_all(executor)
        .await?;

    Ok(coaches)
}

pub async fn update_coach_details<'e, E>(
    executor: E,
    coach_id: i64,
    details: &CoachDetails,
) -> Result<(), AppError>
where
    E: SqliteExecutor<'e>,
{
    sqlx::query(
        r#"
        UPDATE coaches
        SET specialization = COALESCE(?, specialization),
            certifications = COALESCE(?, certifications),
            biography = COALESCE(?, biography),
            available_schedule = COALESCE(?, available_schedule)
        WHERE id = ?
        "#,
    )
    .bind(&details.specialization)
    .bind(&details.certifications)
    .bind(&details.biography)
    .bind(&details.available_schedule)
    .bind(coach_id)
    .execute(executor)
    .await?;

    Ok(())
}
