use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::calendar::{Assignment, CalendarSlot};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassInfo {
    pub id: Uuid,
    pub school_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Student {
    pub id: Uuid,
    pub name: String,
}

/// Everything the forecaster needs about one class in one period: who is
/// enrolled and which slots its calendars hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassRoster {
    pub class: ClassInfo,
    pub students: Vec<Student>,
    pub slots: Vec<CalendarSlot>,
}

/// One student's recorded presence at one session, joined through
/// attendance -> calendar slot so the assignment is known.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceMark {
    pub student_id: Uuid,
    pub assignment: Assignment,
    pub date: NaiveDate,
    pub present: bool,
}
