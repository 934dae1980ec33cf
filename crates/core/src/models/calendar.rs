use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::TimeError;

/// A teaching day. Regular timetable slots only exist Monday to Friday;
/// weekend teaching happens through a period's make-up sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchoolDay {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl SchoolDay {
    pub const ALL: [SchoolDay; 5] = [
        SchoolDay::Monday,
        SchoolDay::Tuesday,
        SchoolDay::Wednesday,
        SchoolDay::Thursday,
        SchoolDay::Friday,
    ];

    pub fn weekday(self) -> Weekday {
        match self {
            SchoolDay::Monday => Weekday::Mon,
            SchoolDay::Tuesday => Weekday::Tue,
            SchoolDay::Wednesday => Weekday::Wed,
            SchoolDay::Thursday => Weekday::Thu,
            SchoolDay::Friday => Weekday::Fri,
        }
    }

    pub fn from_weekday(weekday: Weekday) -> Option<Self> {
        match weekday {
            Weekday::Mon => Some(SchoolDay::Monday),
            Weekday::Tue => Some(SchoolDay::Tuesday),
            Weekday::Wed => Some(SchoolDay::Wednesday),
            Weekday::Thu => Some(SchoolDay::Thursday),
            Weekday::Fri => Some(SchoolDay::Friday),
            Weekday::Sat | Weekday::Sun => None,
        }
    }

    /// Offset from the Monday that opens the calendar week.
    pub fn days_from_monday(self) -> i64 {
        i64::from(self.weekday().num_days_from_monday())
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SchoolDay::Monday => "monday",
            SchoolDay::Tuesday => "tuesday",
            SchoolDay::Wednesday => "wednesday",
            SchoolDay::Thursday => "thursday",
            SchoolDay::Friday => "friday",
        }
    }
}

impl fmt::Display for SchoolDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SchoolDay {
    type Err = TimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monday" | "mon" => Ok(SchoolDay::Monday),
            "tuesday" | "tue" => Ok(SchoolDay::Tuesday),
            "wednesday" | "wed" => Ok(SchoolDay::Wednesday),
            "thursday" | "thu" => Ok(SchoolDay::Thursday),
            "friday" | "fri" => Ok(SchoolDay::Friday),
            other => Err(TimeError::Validation(format!("Unknown school day: {}", other))),
        }
    }
}

/// The teacher and subject taught in a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Assignment {
    pub teacher_id: Uuid,
    pub subject_id: Uuid,
}

/// Structural identity of a grid cell and whatever is assigned to it.
///
/// Two keys are equal when they name the same day, the same time range and
/// the same assignment; a blank cell has `assignment: None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotKey {
    pub day: SchoolDay,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub assignment: Option<Assignment>,
}

impl SlotKey {
    pub fn is_blank(&self) -> bool {
        self.assignment.is_none()
    }

    /// Same assignment, moved to another cell.
    pub fn relocated(&self, day: SchoolDay, start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            day,
            start,
            end,
            assignment: self.assignment,
        }
    }
}

impl fmt::Display for SlotKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}-{}",
            self.day,
            self.start.format("%H:%M"),
            self.end.format("%H:%M")
        )?;
        match self.assignment {
            Some(a) => write!(f, "_{}_{}", a.teacher_id, a.subject_id),
            None => f.write_str("_blank"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Calendar {
    pub id: Uuid,
    pub class_id: Uuid,
    pub period_id: Uuid,
    pub active: bool,
    pub version: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarSlot {
    pub id: Uuid,
    pub calendar_id: Uuid,
    pub day: SchoolDay,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub assignment: Option<Assignment>,
}

impl CalendarSlot {
    pub fn key(&self) -> SlotKey {
        SlotKey {
            day: self.day,
            start: self.start_time,
            end: self.end_time,
            assignment: self.assignment,
        }
    }
}

/// A slot that has not been written yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotDraft {
    pub day: SchoolDay,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub assignment: Option<Assignment>,
}
