#![allow(dead_code)]

use chrono::{NaiveDate, NaiveTime};
use classcal_core::{
    grid::{WeekConfig, WeekGrid},
    models::{
        availability::{AvailabilityIndex, AvailabilityWindow, TeacherAvailability},
        calendar::{Assignment, CalendarSlot, SchoolDay},
        period::AcademicPeriod,
    },
};
use uuid::Uuid;

pub fn t(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

pub fn d(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn assignment() -> Assignment {
    Assignment {
        teacher_id: Uuid::new_v4(),
        subject_id: Uuid::new_v4(),
    }
}

/// Teacher available all day on the given days.
pub fn all_day(teacher_id: Uuid, name: &str, days: &[SchoolDay]) -> TeacherAvailability {
    TeacherAvailability {
        teacher_id,
        teacher_name: name.to_string(),
        windows: days
            .iter()
            .map(|day| AvailabilityWindow {
                day: *day,
                start: t(7, 0),
                end: t(18, 0),
            })
            .collect(),
    }
}

pub fn index(teachers: Vec<TeacherAvailability>) -> AvailabilityIndex {
    AvailabilityIndex::new(teachers)
}

/// Five 60-minute slots from 08:00 on every school day.
pub fn week() -> WeekConfig {
    WeekConfig::uniform(t(8, 0), 5, 60)
}

pub fn blank_week() -> WeekGrid {
    WeekGrid::blank(&week()).unwrap()
}

/// Places `assignment` in the cell of `day` starting at `hour`.
pub fn place(grid: &mut WeekGrid, day: SchoolDay, hour: u32, assignment: Assignment) {
    let cell = grid
        .days
        .get_mut(&day)
        .unwrap()
        .iter_mut()
        .find(|cell| cell.start == t(hour, 0))
        .unwrap();
    cell.assignment = Some(assignment);
}

pub fn slot(day: SchoolDay, hour: u32, assignment: Option<Assignment>) -> CalendarSlot {
    CalendarSlot {
        id: Uuid::new_v4(),
        calendar_id: Uuid::nil(),
        day,
        start_time: t(hour, 0),
        end_time: t(hour + 1, 0),
        assignment,
    }
}

pub fn period(start: NaiveDate, end: NaiveDate) -> AcademicPeriod {
    AcademicPeriod {
        id: Uuid::new_v4(),
        school_id: Uuid::new_v4(),
        start_date: start,
        end_date: end,
        active: true,
        holidays: Default::default(),
        weekend_sessions: Default::default(),
    }
}
