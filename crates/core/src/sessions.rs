//! Expansion of weekly slots into concrete session dates.
//!
//! The pipeline is: generate one occurrence per calendar week for every slot
//! of the assignment, drop occurrences that land on a holiday, then append the
//! period's make-up weekend sessions. Everything here is a pure function of
//! the period and the slots, so results can be recomputed freely.

use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate, NaiveTime};

use crate::models::{
    calendar::{Assignment, CalendarSlot, SchoolDay},
    period::AcademicPeriod,
};

/// Distinct weekly positions taught for `assignment`. Several calendars of
/// the same period may repeat a position; it is still one session.
fn assignment_positions(
    slots: &[CalendarSlot],
    assignment: Assignment,
) -> BTreeSet<(SchoolDay, NaiveTime, NaiveTime)> {
    slots
        .iter()
        .filter(|slot| slot.assignment == Some(assignment))
        .map(|slot| (slot.day, slot.start_time, slot.end_time))
        .collect()
}

/// Every in-period date a weekly position falls on, holidays included.
fn weekly_occurrences(
    period: &AcademicPeriod,
    slots: &[CalendarSlot],
    assignment: Assignment,
) -> Vec<NaiveDate> {
    let positions = assignment_positions(slots, assignment);
    if positions.is_empty() || period.end_date < period.start_date {
        return Vec::new();
    }

    let first_monday = period.start_date
        - Duration::days(i64::from(period.start_date.weekday().num_days_from_monday()));

    let weeks = std::iter::successors(Some(first_monday), |week| {
        week.checked_add_signed(Duration::days(7))
    })
    .take_while(|week| *week <= period.end_date);

    weeks
        .flat_map(|week| {
            positions
                .iter()
                .map(move |(day, _, _)| week + Duration::days(day.days_from_monday()))
        })
        .filter(|date| period.contains(*date))
        .collect()
}

/// Sorted session dates of `assignment` across `period`.
///
/// `slots` may hold slots of any assignment; only matching ones are used.
/// Dates on recorded holidays are dropped and every weekend session of the
/// period is appended once.
pub fn enumerate_session_dates(
    period: &AcademicPeriod,
    slots: &[CalendarSlot],
    assignment: Assignment,
) -> Vec<NaiveDate> {
    let mut dates: Vec<NaiveDate> = weekly_occurrences(period, slots, assignment)
        .into_iter()
        .filter(|date| !period.is_holiday(*date))
        .chain(period.weekend_sessions.iter().copied())
        .collect();
    dates.sort();
    dates
}

/// Number of sessions [`enumerate_session_dates`] yields.
pub fn count_sessions(
    period: &AcademicPeriod,
    slots: &[CalendarSlot],
    assignment: Assignment,
) -> usize {
    enumerate_session_dates(period, slots, assignment).len()
}

/// Weekly occurrences of `assignment` cancelled by a holiday.
pub fn holiday_sessions(
    period: &AcademicPeriod,
    slots: &[CalendarSlot],
    assignment: Assignment,
) -> usize {
    weekly_occurrences(period, slots, assignment)
        .into_iter()
        .filter(|date| period.is_holiday(*date))
        .count()
}

/// Sessions from a sorted date list that happen on or before `today`.
pub fn sessions_to_date(dates: &[NaiveDate], today: NaiveDate) -> usize {
    dates.partition_point(|date| *date <= today)
}
