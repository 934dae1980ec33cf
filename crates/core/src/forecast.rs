//! End-of-period attendance projection.
//!
//! For every enrolled student and every assignment taught in their class the
//! forecaster extrapolates the attendance rate observed so far over the whole
//! period, penalises students who habitually miss school around holidays,
//! and reports the subjects whose projection falls under the passing
//! threshold. Nothing here writes anything back.

use std::collections::{BTreeSet, HashMap};

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    models::{
        calendar::{Assignment, CalendarSlot},
        period::AcademicPeriod,
        roster::{AttendanceMark, ClassRoster},
    },
    sessions::{enumerate_session_dates, holiday_sessions, sessions_to_date},
};

pub const DEFAULT_PASSING_THRESHOLD: f64 = 70.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectForecast {
    pub teacher_id: Uuid,
    pub subject_id: Uuid,
    pub subject_name: Option<String>,
    pub total_sessions_to_date: usize,
    pub attended_to_date: usize,
    pub percent_to_date: f64,
    pub total_sessions_for_period: usize,
    pub estimated_total_attendances: usize,
    pub holiday_skipper: bool,
    pub projected_percentage: f64,
    pub at_risk: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRisk {
    pub student_id: Uuid,
    pub student_name: String,
    pub class_id: Uuid,
    pub subjects: Vec<SubjectForecast>,
}

/// Dates inspected for absences around a holiday. Tuesday looks back to
/// Monday while Thursday looks ahead to Friday; Wednesday and weekend
/// holidays inspect nothing.
pub fn skip_check_dates(holiday: NaiveDate) -> Vec<NaiveDate> {
    match holiday.weekday() {
        Weekday::Mon | Weekday::Fri => vec![holiday],
        Weekday::Tue => vec![holiday - Duration::days(1), holiday],
        Weekday::Thu => vec![holiday + Duration::days(1)],
        Weekday::Wed | Weekday::Sat | Weekday::Sun => Vec::new(),
    }
}

/// A student is a holiday skipper when, for at least half of the period's
/// past holidays, they were absent on one of the dates picked by
/// [`skip_check_dates`]. A period with no past holiday has no skippers.
pub fn is_holiday_skipper(
    period: &AcademicPeriod,
    student_marks: &[AttendanceMark],
    today: NaiveDate,
) -> bool {
    let absences: BTreeSet<NaiveDate> = student_marks
        .iter()
        .filter(|mark| !mark.present)
        .map(|mark| mark.date)
        .collect();

    let past: Vec<NaiveDate> = period.past_holidays(today).collect();
    if past.is_empty() {
        return false;
    }

    let skipped = past
        .iter()
        .filter(|holiday| {
            skip_check_dates(**holiday)
                .iter()
                .any(|date| absences.contains(date))
        })
        .count();

    skipped * 2 >= past.len()
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

/// Projects one student's attendance in one assignment.
///
/// `student_marks` holds every mark of the student in the period; only the
/// ones of `assignment` count towards attendance, but all of them feed the
/// holiday-skipper check.
pub fn forecast_subject(
    period: &AcademicPeriod,
    slots: &[CalendarSlot],
    assignment: Assignment,
    student_marks: &[AttendanceMark],
    today: NaiveDate,
    threshold: f64,
) -> SubjectForecast {
    let dates = enumerate_session_dates(period, slots, assignment);
    let total_sessions_to_date = sessions_to_date(&dates, today);
    let attended_to_date = student_marks
        .iter()
        .filter(|mark| mark.assignment == assignment && mark.present && mark.date <= today)
        .count();
    let percent_to_date = percentage(attended_to_date, total_sessions_to_date);

    let total_sessions_for_period = dates.len();
    let mut estimated_total_attendances =
        (percent_to_date / 100.0 * total_sessions_for_period as f64).round() as usize;

    let holiday_skipper = is_holiday_skipper(period, student_marks, today);
    if holiday_skipper {
        estimated_total_attendances = estimated_total_attendances
            .saturating_sub(holiday_sessions(period, slots, assignment));
    }

    let projected_percentage = percentage(estimated_total_attendances, total_sessions_for_period);

    SubjectForecast {
        teacher_id: assignment.teacher_id,
        subject_id: assignment.subject_id,
        subject_name: None,
        total_sessions_to_date,
        attended_to_date,
        percent_to_date,
        total_sessions_for_period,
        estimated_total_attendances,
        holiday_skipper,
        projected_percentage,
        at_risk: projected_percentage < threshold,
    }
}

/// Distinct assignments taught in a roster's slots, in a stable order.
fn roster_assignments(slots: &[CalendarSlot]) -> BTreeSet<Assignment> {
    slots.iter().filter_map(|slot| slot.assignment).collect()
}

/// At-risk report for a whole period.
///
/// Students are only listed when at least one of their subjects is at risk.
pub fn forecast_period(
    period: &AcademicPeriod,
    rosters: &[ClassRoster],
    marks: &[AttendanceMark],
    subject_names: &HashMap<Uuid, String>,
    today: NaiveDate,
    threshold: f64,
) -> Vec<StudentRisk> {
    let mut marks_by_student: HashMap<Uuid, Vec<AttendanceMark>> = HashMap::new();
    for mark in marks {
        marks_by_student.entry(mark.student_id).or_default().push(*mark);
    }

    rosters
        .iter()
        .flat_map(|roster| {
            let assignments = roster_assignments(&roster.slots);
            let marks_by_student = &marks_by_student;
            roster.students.iter().filter_map(move |student| {
                let student_marks = marks_by_student
                    .get(&student.id)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]);

                let subjects: Vec<SubjectForecast> = assignments
                    .iter()
                    .map(|assignment| {
                        let mut forecast = forecast_subject(
                            period,
                            &roster.slots,
                            *assignment,
                            student_marks,
                            today,
                            threshold,
                        );
                        forecast.subject_name = subject_names.get(&assignment.subject_id).cloned();
                        forecast
                    })
                    .filter(|forecast| forecast.at_risk)
                    .collect();

                (!subjects.is_empty()).then(|| StudentRisk {
                    student_id: student.id,
                    student_name: student.name.clone(),
                    class_id: roster.class.id,
                    subjects,
                })
            })
        })
        .collect()
}
