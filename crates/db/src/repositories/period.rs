use std::collections::BTreeSet;

use chrono::NaiveDate;
use classcal_core::models::period::{AcademicPeriod, NewPeriod};
use eyre::Result;
use sqlx::{PgConnection, Pool, Postgres};
use uuid::Uuid;

use crate::models::DbAcademicPeriod;

/// Attaches holidays and weekend sessions to a period row.
async fn hydrate(conn: &mut PgConnection, row: DbAcademicPeriod) -> Result<AcademicPeriod> {
    let holidays: Vec<NaiveDate> = sqlx::query_scalar(
        r#"
        SELECT holiday
        FROM period_holidays
        WHERE period_id = $1
        "#,
    )
    .bind(row.id)
    .fetch_all(&mut *conn)
    .await?;

    let weekend_sessions: Vec<NaiveDate> = sqlx::query_scalar(
        r#"
        SELECT session_date
        FROM period_weekend_sessions
        WHERE period_id = $1
        "#,
    )
    .bind(row.id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(row.into_period(
        holidays.into_iter().collect::<BTreeSet<_>>(),
        weekend_sessions.into_iter().collect::<BTreeSet<_>>(),
    ))
}

pub async fn find_period(conn: &mut PgConnection, id: Uuid) -> Result<Option<AcademicPeriod>> {
    let row = sqlx::query_as::<_, DbAcademicPeriod>(
        r#"
        SELECT id, school_id, start_date, end_date, active
        FROM academic_periods
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => Ok(Some(hydrate(conn, row).await?)),
        None => Ok(None),
    }
}

pub async fn get_period_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<AcademicPeriod>> {
    let mut conn = pool.acquire().await?;
    find_period(&mut conn, id).await
}

/// The school's active period containing `today`, latest start first.
pub async fn get_current_period(
    pool: &Pool<Postgres>,
    school_id: Uuid,
    today: NaiveDate,
) -> Result<Option<AcademicPeriod>> {
    let mut conn = pool.acquire().await?;

    let row = sqlx::query_as::<_, DbAcademicPeriod>(
        r#"
        SELECT id, school_id, start_date, end_date, active
        FROM academic_periods
        WHERE school_id = $1 AND active AND start_date <= $2 AND end_date >= $2
        ORDER BY start_date DESC
        LIMIT 1
        "#,
    )
    .bind(school_id)
    .bind(today)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => Ok(Some(hydrate(&mut conn, row).await?)),
        None => Ok(None),
    }
}

/// The school's active period with the earliest start after `after`.
pub async fn get_next_period(
    pool: &Pool<Postgres>,
    school_id: Uuid,
    after: NaiveDate,
) -> Result<Option<AcademicPeriod>> {
    let mut conn = pool.acquire().await?;

    let row = sqlx::query_as::<_, DbAcademicPeriod>(
        r#"
        SELECT id, school_id, start_date, end_date, active
        FROM academic_periods
        WHERE school_id = $1 AND active AND start_date > $2
        ORDER BY start_date ASC
        LIMIT 1
        "#,
    )
    .bind(school_id)
    .bind(after)
    .fetch_optional(&mut *conn)
    .await?;

    match row {
        Some(row) => Ok(Some(hydrate(&mut conn, row).await?)),
        None => Ok(None),
    }
}

pub async fn create_period(conn: &mut PgConnection, period: &NewPeriod) -> Result<AcademicPeriod> {
    let row = sqlx::query_as::<_, DbAcademicPeriod>(
        r#"
        INSERT INTO academic_periods (id, school_id, start_date, end_date, active)
        VALUES ($1, $2, $3, $4, TRUE)
        RETURNING id, school_id, start_date, end_date, active
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(period.school_id)
    .bind(period.start_date)
    .bind(period.end_date)
    .fetch_one(&mut *conn)
    .await?;

    tracing::debug!(
        "Created period {} from {} to {}",
        row.id,
        row.start_date,
        row.end_date
    );
    Ok(row.into_period(BTreeSet::new(), BTreeSet::new()))
}

/// Moves a period's end date; returns whether the period exists.
pub async fn shorten_period(
    conn: &mut PgConnection,
    id: Uuid,
    end_date: NaiveDate,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE academic_periods
        SET end_date = GREATEST($2, start_date)
        WHERE id = $1
        "#,
    )
    .bind(id)
    .bind(end_date)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}
