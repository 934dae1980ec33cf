use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A school term. Holidays cancel regular sessions; weekend sessions are
/// extra make-up dates taught on top of the weekly timetable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcademicPeriod {
    pub id: Uuid,
    pub school_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub active: bool,
    #[serde(default)]
    pub holidays: BTreeSet<NaiveDate>,
    #[serde(default)]
    pub weekend_sessions: BTreeSet<NaiveDate>,
}

impl AcademicPeriod {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    /// True while `today` falls inside the period.
    pub fn is_current(&self, today: NaiveDate) -> bool {
        self.contains(today)
    }

    /// True while the period still has days left after `today`.
    pub fn is_ongoing(&self, today: NaiveDate) -> bool {
        self.end_date > today
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holidays.contains(&date)
    }

    /// Holidays strictly before `today`.
    pub fn past_holidays(&self, today: NaiveDate) -> impl Iterator<Item = NaiveDate> + '_ {
        self.holidays.range(..today).copied()
    }

    pub fn overlaps(&self, other: &AcademicPeriod) -> bool {
        self.start_date <= other.end_date && other.start_date <= self.end_date
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPeriod {
    pub school_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}
