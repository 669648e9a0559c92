use crate::core::AppError;
use crate::models::plans::{Money, Plan};
use chrono::Utc;
use sqlx::SqliteExecutor;

pub async fn list_active_plans<'e, E>(executor: E) -> Result<Vec<Plan>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let plans = sqlx::query_as::<_, Plan>(
        "SELECT * FROM plans WHERE is_active = 1 ORDER BY base_price_cents ASC, id ASC",
    )
    .fetch_all(executor)
    .await?;

    Ok(plans)
}

pub async fn find_plan_by_id<'e, E>(executor: E, plan_id: i64) -> Result<Option<Plan>, AppError>
where
    E: SqliteExecutor<'e>,
{
    let plan = sqlx::query_as::<_, Plan>("SELECT * FROM plans WHERE id = ?")
        .bind(plan_id)
        .fetch_optional(executor)
        .await?;

    Ok(plan)
}

pub async fn insert_plan<'e, E>(
    executor: E,
    name: &str,
    description: Option<&str>,
    base_price: Money,
) -> Result<i64, AppError>
where
    E: SqliteExecutor<'e>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO plans (name, description, base_price_cents, duration_unit, is_active, created_at)
        VALUES (?, ?, ?, 'month', 1, ?)
        "#,
    )
    .bind(name)
    .bind(description)
    .bind(base_price.cents()?)
    .bind(Utc::now().naive_utc())
    .execute(executor)
    .await?;

    Ok(result.last_insert_rowid())
}
