use eyre::Result;
use sqlx::{Pool, Postgres};
use tracing::info;

/// Statements run in order by [`initialize_database`]. Every statement is
/// idempotent so the migration can be re-run against a live database.
const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS classes (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        school_id UUID NOT NULL,
        name VARCHAR(255) NOT NULL,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS students (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name VARCHAR(255) NOT NULL,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS class_students (
        class_id UUID NOT NULL REFERENCES classes(id),
        student_id UUID NOT NULL REFERENCES students(id),
        PRIMARY KEY (class_id, student_id)
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS teachers (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name VARCHAR(255) NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS subjects (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        name VARCHAR(255) NOT NULL
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS teacher_availability (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        teacher_id UUID NOT NULL REFERENCES teachers(id),
        day VARCHAR(16) NOT NULL,
        start_time TIME NOT NULL,
        end_time TIME NOT NULL,
        CONSTRAINT valid_availability_range CHECK (end_time > start_time)
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS academic_periods (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        school_id UUID NOT NULL,
        start_date DATE NOT NULL,
        end_date DATE NOT NULL,
        active BOOLEAN NOT NULL DEFAULT TRUE,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW(),
        CONSTRAINT valid_period_range CHECK (end_date >= start_date)
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS period_holidays (
        period_id UUID NOT NULL REFERENCES academic_periods(id),
        holiday DATE NOT NULL,
        PRIMARY KEY (period_id, holiday)
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS period_weekend_sessions (
        period_id UUID NOT NULL REFERENCES academic_periods(id),
        session_date DATE NOT NULL,
        PRIMARY KEY (period_id, session_date)
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS calendars (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        class_id UUID NOT NULL REFERENCES classes(id),
        period_id UUID NOT NULL REFERENCES academic_periods(id),
        active BOOLEAN NOT NULL DEFAULT TRUE,
        version INTEGER NOT NULL DEFAULT 1,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS calendar_slots (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        calendar_id UUID NOT NULL REFERENCES calendars(id),
        day VARCHAR(16) NOT NULL,
        start_time TIME NOT NULL,
        end_time TIME NOT NULL,
        teacher_id UUID NULL REFERENCES teachers(id),
        subject_id UUID NULL REFERENCES subjects(id),
        retired BOOLEAN NOT NULL DEFAULT FALSE,
        CONSTRAINT valid_slot_range CHECK (end_time > start_time),
        CONSTRAINT complete_assignment CHECK ((teacher_id IS NULL) = (subject_id IS NULL))
    );
    "#,
    // retired slots stay behind only to keep their attendance history
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_calendar_slots_position
        ON calendar_slots(calendar_id, day, start_time) WHERE NOT retired;
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS attendances (
        id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
        calendar_slot_id UUID NOT NULL REFERENCES calendar_slots(id),
        session_date DATE NOT NULL,
        created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
    );
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS student_attendances (
        attendance_id UUID NOT NULL REFERENCES attendances(id),
        student_id UUID NOT NULL REFERENCES students(id),
        present BOOLEAN NOT NULL,
        PRIMARY KEY (attendance_id, student_id)
    );
    "#,
    // a class has at most one active calendar
    r#"
    CREATE UNIQUE INDEX IF NOT EXISTS idx_calendars_active_class
        ON calendars(class_id) WHERE active;
    "#,
    "CREATE INDEX IF NOT EXISTS idx_calendars_period_id ON calendars(period_id);",
    "CREATE INDEX IF NOT EXISTS idx_calendar_slots_calendar_id ON calendar_slots(calendar_id);",
    "CREATE INDEX IF NOT EXISTS idx_academic_periods_school_id ON academic_periods(school_id);",
    "CREATE INDEX IF NOT EXISTS idx_teacher_availability_teacher_id ON teacher_availability(teacher_id);",
    "CREATE INDEX IF NOT EXISTS idx_attendances_slot_id ON attendances(calendar_slot_id);",
    "CREATE INDEX IF NOT EXISTS idx_student_attendances_student_id ON student_attendances(student_id);",
];

pub async fn initialize_database(pool: &Pool<Postgres>) -> Result<()> {
    info!("Initializing database schema...");

    for statement in STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }

    info!(
        "Database schema initialized successfully ({} statements).",
        STATEMENTS.len()
    );
    Ok(())
}
