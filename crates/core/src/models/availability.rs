use std::collections::HashMap;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::calendar::SchoolDay;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    pub day: SchoolDay,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl AvailabilityWindow {
    /// A window covers a range only when it contains it entirely.
    pub fn covers(&self, day: SchoolDay, start: NaiveTime, end: NaiveTime) -> bool {
        self.day == day && self.start <= start && end <= self.end
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeacherAvailability {
    pub teacher_id: Uuid,
    pub teacher_name: String,
    pub windows: Vec<AvailabilityWindow>,
}

/// Availability of every teacher the editor may place, keyed by teacher id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AvailabilityIndex {
    teachers: HashMap<Uuid, TeacherAvailability>,
}

impl AvailabilityIndex {
    pub fn new(teachers: impl IntoIterator<Item = TeacherAvailability>) -> Self {
        Self {
            teachers: teachers
                .into_iter()
                .map(|teacher| (teacher.teacher_id, teacher))
                .collect(),
        }
    }

    pub fn insert(&mut self, teacher: TeacherAvailability) {
        self.teachers.insert(teacher.teacher_id, teacher);
    }

    pub fn get(&self, teacher_id: Uuid) -> Option<&TeacherAvailability> {
        self.teachers.get(&teacher_id)
    }

    pub fn len(&self) -> usize {
        self.teachers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teachers.is_empty()
    }

    /// Display name for error messages; unknown teachers fall back to their id.
    pub fn teacher_name(&self, teacher_id: Uuid) -> String {
        self.teachers
            .get(&teacher_id)
            .map(|t| t.teacher_name.clone())
            .unwrap_or_else(|| teacher_id.to_string())
    }

    pub fn is_available(
        &self,
        teacher_id: Uuid,
        day: SchoolDay,
        start: NaiveTime,
        end: NaiveTime,
    ) -> bool {
        self.teachers
            .get(&teacher_id)
            .is_some_and(|t| t.windows.iter().any(|w| w.covers(day, start, end)))
    }
}
