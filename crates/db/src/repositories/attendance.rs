use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::models::DbAttendanceMark;

/// Attendance recorded against any calendar of the period. Marks on blank
/// slots carry no assignment and are skipped.
pub async fn get_period_marks(
    pool: &Pool<Postgres>,
    period_id: Uuid,
) -> Result<Vec<DbAttendanceMark>> {
    let marks = sqlx::query_as::<_, DbAttendanceMark>(
        r#"
        SELECT sa.student_id, s.teacher_id, s.subject_id, a.session_date, sa.present
        FROM student_attendances sa
        JOIN attendances a ON a.id = sa.attendance_id
        JOIN calendar_slots s ON s.id = a.calendar_slot_id
        JOIN calendars c ON c.id = s.calendar_id
        WHERE c.period_id = $1
          AND s.teacher_id IS NOT NULL
          AND s.subject_id IS NOT NULL
        ORDER BY a.session_date ASC
        "#,
    )
    .bind(period_id)
    .fetch_all(pool)
    .await?;

    tracing::debug!("Loaded {} attendance marks for period {}", marks.len(), period_id);
    Ok(marks)
}
