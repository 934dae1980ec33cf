use chrono::NaiveTime;
use classcal_core::{
    errors::{TimeError, TimeResult},
    models::calendar::{CalendarSlot, SlotDraft},
    versioning::{PeriodChoice, PeriodCut, SavePlan, SavedSchedule},
};
use eyre::Result;
use sqlx::{PgConnection, Pool, Postgres};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    models::{DbCalendar, DbCalendarSlot, DbClassSlot},
    repositories::period,
};

pub async fn get_active_calendar(
    pool: &Pool<Postgres>,
    class_id: Uuid,
) -> Result<Option<DbCalendar>> {
    let calendar = sqlx::query_as::<_, DbCalendar>(
        r#"
        SELECT id, class_id, period_id, active, version, created_at
        FROM calendars
        WHERE class_id = $1 AND active
        "#,
    )
    .bind(class_id)
    .fetch_optional(pool)
    .await?;

    Ok(calendar)
}

pub async fn get_calendar_slots(
    pool: &Pool<Postgres>,
    calendar_id: Uuid,
) -> Result<Vec<DbCalendarSlot>> {
    let slots = sqlx::query_as::<_, DbCalendarSlot>(
        r#"
        SELECT id, calendar_id, day, start_time, end_time, teacher_id, subject_id
        FROM calendar_slots
        WHERE calendar_id = $1 AND NOT retired
        ORDER BY day ASC, start_time ASC
        "#,
    )
    .bind(calendar_id)
    .fetch_all(pool)
    .await?;

    Ok(slots)
}

/// Slots of every calendar attached to a period, active or retired.
pub async fn get_period_slots(
    pool: &Pool<Postgres>,
    period_id: Uuid,
    class_id: Option<Uuid>,
) -> Result<Vec<DbClassSlot>> {
    let slots = sqlx::query_as::<_, DbClassSlot>(
        r#"
        SELECT c.class_id, s.id, s.calendar_id, s.day, s.start_time, s.end_time,
               s.teacher_id, s.subject_id
        FROM calendar_slots s
        JOIN calendars c ON c.id = s.calendar_id
        WHERE c.period_id = $1 AND NOT s.retired AND ($2::uuid IS NULL OR c.class_id = $2)
        ORDER BY c.class_id, s.day, s.start_time
        "#,
    )
    .bind(period_id)
    .bind(class_id)
    .fetch_all(pool)
    .await?;

    Ok(slots)
}

async fn insert_slot(conn: &mut PgConnection, calendar_id: Uuid, slot: &SlotDraft) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO calendar_slots (id, calendar_id, day, start_time, end_time, teacher_id, subject_id)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (calendar_id, day, start_time) WHERE NOT retired
        DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(calendar_id)
    .bind(slot.day.as_str())
    .bind(slot.start_time)
    .bind(slot.end_time)
    .bind(slot.assignment.map(|a| a.teacher_id))
    .bind(slot.assignment.map(|a| a.subject_id))
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// Retires every live slot that `keep` does not repeat exactly, then drops
/// the retired ones no attendance points at. A slot whose assignment changed
/// is retired and written again as a fresh row, so past attendance keeps the
/// teacher and subject it was taken for.
async fn retire_changed_slots(
    conn: &mut PgConnection,
    calendar_id: Uuid,
    keep: &[SlotDraft],
) -> Result<u64> {
    let days: Vec<String> = keep.iter().map(|slot| slot.day.to_string()).collect();
    let starts: Vec<NaiveTime> = keep.iter().map(|slot| slot.start_time).collect();
    let ends: Vec<NaiveTime> = keep.iter().map(|slot| slot.end_time).collect();
    let teachers: Vec<Option<Uuid>> = keep
        .iter()
        .map(|slot| slot.assignment.map(|a| a.teacher_id))
        .collect();
    let subjects: Vec<Option<Uuid>> = keep
        .iter()
        .map(|slot| slot.assignment.map(|a| a.subject_id))
        .collect();

    let retired = sqlx::query(
        r#"
        UPDATE calendar_slots s
        SET retired = TRUE
        WHERE s.calendar_id = $1
          AND NOT s.retired
          AND NOT EXISTS (
              SELECT 1
              FROM UNNEST($2::varchar[], $3::time[], $4::time[], $5::uuid[], $6::uuid[])
                  AS k(day, start_time, end_time, teacher_id, subject_id)
              WHERE k.day = s.day
                AND k.start_time = s.start_time
                AND k.end_time = s.end_time
                AND k.teacher_id IS NOT DISTINCT FROM s.teacher_id
                AND k.subject_id IS NOT DISTINCT FROM s.subject_id
          )
        "#,
    )
    .bind(calendar_id)
    .bind(days)
    .bind(starts)
    .bind(ends)
    .bind(teachers)
    .bind(subjects)
    .execute(&mut *conn)
    .await?;

    sqlx::query(
        r#"
        DELETE FROM calendar_slots s
        WHERE s.calendar_id = $1
          AND s.retired
          AND NOT EXISTS (SELECT 1 FROM attendances a WHERE a.calendar_slot_id = s.id)
        "#,
    )
    .bind(calendar_id)
    .execute(&mut *conn)
    .await?;

    Ok(retired.rows_affected())
}

async fn insert_calendar(
    conn: &mut PgConnection,
    class_id: Uuid,
    period_id: Uuid,
) -> Result<DbCalendar> {
    let calendar = sqlx::query_as::<_, DbCalendar>(
        r#"
        INSERT INTO calendars (id, class_id, period_id, active, version, created_at)
        VALUES ($1, $2, $3, TRUE, 1, NOW())
        RETURNING id, class_id, period_id, active, version, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(class_id)
    .bind(period_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(calendar)
}

async fn replace_slots(
    conn: &mut PgConnection,
    calendar_id: Uuid,
    expected_version: Option<i32>,
    slots: &[SlotDraft],
) -> TimeResult<SavedSchedule> {
    let current = sqlx::query_as::<_, DbCalendar>(
        r#"
        SELECT id, class_id, period_id, active, version, created_at
        FROM calendars
        WHERE id = $1 AND active
        FOR UPDATE
        "#,
    )
    .bind(calendar_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(eyre::Report::from)?
    .ok_or_else(|| {
        TimeError::NotFound(format!("Active calendar with ID {} not found", calendar_id))
    })?;

    if let Some(expected) = expected_version {
        if current.version != expected {
            return Err(TimeError::Conflict(format!(
                "Calendar {} is at version {}, expected {}",
                calendar_id, current.version, expected
            )));
        }
    }

    let retired = retire_changed_slots(conn, calendar_id, slots).await?;
    for slot in slots {
        insert_slot(conn, calendar_id, slot).await?;
    }
    debug!(
        "Wrote {} slots to calendar {}, retired {}",
        slots.len(),
        calendar_id,
        retired
    );

    let calendar = sqlx::query_as::<_, DbCalendar>(
        r#"
        UPDATE calendars
        SET version = version + 1
        WHERE id = $1
        RETURNING id, class_id, period_id, active, version, created_at
        "#,
    )
    .bind(calendar_id)
    .fetch_one(&mut *conn)
    .await
    .map_err(eyre::Report::from)?;

    let period = period::find_period(conn, calendar.period_id)
        .await?
        .ok_or_else(|| {
            TimeError::NotFound(format!("Period with ID {} not found", calendar.period_id))
        })?;

    Ok(SavedSchedule {
        calendar: calendar.into(),
        period,
    })
}

async fn open_period(
    conn: &mut PgConnection,
    class_id: Uuid,
    shorten: Option<&PeriodCut>,
    choice: &PeriodChoice,
    retire_calendar: Option<Uuid>,
    slots: &[SlotDraft],
) -> TimeResult<SavedSchedule> {
    if let Some(cut) = shorten {
        if !period::shorten_period(conn, cut.period_id, cut.end_date).await? {
            return Err(TimeError::NotFound(format!(
                "Period with ID {} not found",
                cut.period_id
            )));
        }
    }

    if let Some(calendar_id) = retire_calendar {
        sqlx::query(
            r#"
            UPDATE calendars
            SET active = FALSE
            WHERE id = $1
            "#,
        )
        .bind(calendar_id)
        .execute(&mut *conn)
        .await
        .map_err(eyre::Report::from)?;
    }

    let period = match choice {
        PeriodChoice::Existing { period_id } => period::find_period(conn, *period_id)
            .await?
            .ok_or_else(|| {
                TimeError::NotFound(format!("Period with ID {} not found", period_id))
            })?,
        PeriodChoice::Create { period: new_period } => {
            period::create_period(conn, new_period).await?
        }
    };

    let calendar = insert_calendar(conn, class_id, period.id).await?;
    for slot in slots {
        insert_slot(conn, calendar.id, slot).await?;
    }

    Ok(SavedSchedule {
        calendar: calendar.into(),
        period,
    })
}

/// Applies a save plan inside one transaction. Any failure rolls back every
/// write the plan made.
pub async fn apply_save_plan(pool: &Pool<Postgres>, plan: &SavePlan) -> TimeResult<SavedSchedule> {
    let mut tx = pool.begin().await.map_err(eyre::Report::from)?;

    let saved = match plan {
        SavePlan::ReplaceSlots {
            calendar_id,
            expected_version,
            slots,
        } => replace_slots(&mut *tx, *calendar_id, *expected_version, slots).await?,
        SavePlan::OpenPeriod {
            class_id,
            shorten,
            period,
            retire_calendar,
            slots,
        } => {
            open_period(
                &mut *tx,
                *class_id,
                shorten.as_ref(),
                period,
                *retire_calendar,
                slots,
            )
            .await?
        }
    };

    tx.commit().await.map_err(eyre::Report::from)?;

    info!(
        "Committed calendar {} version {}",
        saved.calendar.id, saved.calendar.version
    );
    Ok(saved)
}

/// Converts persisted slot rows, rejecting rows with an unknown day.
pub fn into_slots(rows: Vec<DbCalendarSlot>) -> TimeResult<Vec<CalendarSlot>> {
    rows.into_iter().map(CalendarSlot::try_from).collect()
}
