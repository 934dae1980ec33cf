use std::collections::HashMap;

use eyre::Result;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::models::{DbAvailability, DbClass, DbEnrolledStudent, DbSubject};

pub async fn get_class_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<DbClass>> {
    let class = sqlx::query_as::<_, DbClass>(
        r#"
        SELECT id, school_id, name
        FROM classes
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    if class.is_none() {
        tracing::debug!("Class not found: id={}", id);
    }

    Ok(class)
}

pub async fn get_classes_by_ids(pool: &Pool<Postgres>, ids: &[Uuid]) -> Result<Vec<DbClass>> {
    let classes = sqlx::query_as::<_, DbClass>(
        r#"
        SELECT id, school_id, name
        FROM classes
        WHERE id = ANY($1)
        ORDER BY name ASC
        "#,
    )
    .bind(ids)
    .fetch_all(pool)
    .await?;

    Ok(classes)
}

/// Students enrolled in any of `class_ids`.
pub async fn get_enrolled_students(
    pool: &Pool<Postgres>,
    class_ids: &[Uuid],
) -> Result<Vec<DbEnrolledStudent>> {
    let students = sqlx::query_as::<_, DbEnrolledStudent>(
        r#"
        SELECT cs.class_id, st.id AS student_id, st.name
        FROM class_students cs
        JOIN students st ON st.id = cs.student_id
        WHERE cs.class_id = ANY($1)
        ORDER BY st.name ASC
        "#,
    )
    .bind(class_ids)
    .fetch_all(pool)
    .await?;

    Ok(students)
}

/// Every teacher with their windows; teachers without windows appear once
/// with empty window columns.
pub async fn get_availability(pool: &Pool<Postgres>) -> Result<Vec<DbAvailability>> {
    let rows = sqlx::query_as::<_, DbAvailability>(
        r#"
        SELECT t.id AS teacher_id, t.name AS teacher_name, a.day, a.start_time, a.end_time
        FROM teachers t
        LEFT JOIN teacher_availability a ON a.teacher_id = t.id
        ORDER BY t.id, a.day, a.start_time
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

pub async fn get_subject_names(pool: &Pool<Postgres>) -> Result<HashMap<Uuid, String>> {
    let subjects = sqlx::query_as::<_, DbSubject>(
        r#"
        SELECT id, name
        FROM subjects
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(subjects.into_iter().map(|s| (s.id, s.name)).collect())
}
