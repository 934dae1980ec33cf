use std::collections::BTreeSet;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use classcal_core::{
    errors::{TimeError, TimeResult},
    models::{
        availability::AvailabilityWindow,
        calendar::{Assignment, Calendar, CalendarSlot, SchoolDay},
        period::AcademicPeriod,
        roster::{AttendanceMark, ClassInfo, Student},
    },
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbClass {
    pub id: Uuid,
    pub school_id: Uuid,
    pub name: String,
}

impl From<DbClass> for ClassInfo {
    fn from(row: DbClass) -> Self {
        ClassInfo {
            id: row.id,
            school_id: row.school_id,
            name: row.name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbEnrolledStudent {
    pub class_id: Uuid,
    pub student_id: Uuid,
    pub name: String,
}

impl From<DbEnrolledStudent> for Student {
    fn from(row: DbEnrolledStudent) -> Self {
        Student {
            id: row.student_id,
            name: row.name,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAcademicPeriod {
    pub id: Uuid,
    pub school_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub active: bool,
}

impl DbAcademicPeriod {
    pub fn into_period(
        self,
        holidays: BTreeSet<NaiveDate>,
        weekend_sessions: BTreeSet<NaiveDate>,
    ) -> AcademicPeriod {
        AcademicPeriod {
            id: self.id,
            school_id: self.school_id,
            start_date: self.start_date,
            end_date: self.end_date,
            active: self.active,
            holidays,
            weekend_sessions,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbCalendar {
    pub id: Uuid,
    pub class_id: Uuid,
    pub period_id: Uuid,
    pub active: bool,
    pub version: i32,
    pub created_at: DateTime<Utc>,
}

impl From<DbCalendar> for Calendar {
    fn from(row: DbCalendar) -> Self {
        Calendar {
            id: row.id,
            class_id: row.class_id,
            period_id: row.period_id,
            active: row.active,
            version: row.version,
            created_at: row.created_at,
        }
    }
}

fn assignment(teacher_id: Option<Uuid>, subject_id: Option<Uuid>) -> Option<Assignment> {
    match (teacher_id, subject_id) {
        (Some(teacher_id), Some(subject_id)) => Some(Assignment {
            teacher_id,
            subject_id,
        }),
        _ => None,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbCalendarSlot {
    pub id: Uuid,
    pub calendar_id: Uuid,
    pub day: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub teacher_id: Option<Uuid>,
    pub subject_id: Option<Uuid>,
}

impl TryFrom<DbCalendarSlot> for CalendarSlot {
    type Error = TimeError;

    fn try_from(row: DbCalendarSlot) -> TimeResult<Self> {
        Ok(CalendarSlot {
            id: row.id,
            calendar_id: row.calendar_id,
            day: row.day.parse::<SchoolDay>()?,
            start_time: row.start_time,
            end_time: row.end_time,
            assignment: assignment(row.teacher_id, row.subject_id),
        })
    }
}

/// Availability window joined with its teacher's name.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAvailability {
    pub teacher_id: Uuid,
    pub teacher_name: String,
    pub day: Option<String>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
}

impl DbAvailability {
    /// `None` for a teacher without any window.
    pub fn window(&self) -> TimeResult<Option<AvailabilityWindow>> {
        match (&self.day, self.start_time, self.end_time) {
            (Some(day), Some(start), Some(end)) => Ok(Some(AvailabilityWindow {
                day: day.parse()?,
                start,
                end,
            })),
            _ => Ok(None),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbSubject {
    pub id: Uuid,
    pub name: String,
}

/// Student attendance joined through attendance and calendar slot.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbAttendanceMark {
    pub student_id: Uuid,
    pub teacher_id: Uuid,
    pub subject_id: Uuid,
    pub session_date: NaiveDate,
    pub present: bool,
}

impl From<DbAttendanceMark> for AttendanceMark {
    fn from(row: DbAttendanceMark) -> Self {
        AttendanceMark {
            student_id: row.student_id,
            assignment: Assignment {
                teacher_id: row.teacher_id,
                subject_id: row.subject_id,
            },
            date: row.session_date,
            present: row.present,
        }
    }
}

/// Calendar slot tagged with the class owning its calendar.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DbClassSlot {
    pub class_id: Uuid,
    #[sqlx(flatten)]
    pub slot: DbCalendarSlot,
}
