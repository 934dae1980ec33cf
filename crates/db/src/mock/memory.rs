//! In-memory [`CalendarStore`].
//!
//! Holds the same entities as the Postgres schema in plain maps. Save plans
//! are applied to a copy of the state which replaces the original only when
//! every step succeeded, so a failing plan leaves nothing behind.

use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        Arc, PoisonError, RwLock,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use classcal_core::{
    errors::{TimeError, TimeResult},
    models::{
        availability::{AvailabilityIndex, TeacherAvailability},
        calendar::{Calendar, CalendarSlot, SlotDraft},
        period::AcademicPeriod,
        roster::{AttendanceMark, ClassInfo, ClassRoster, Student},
    },
    store::CalendarStore,
    versioning::{ActiveSchedule, PeriodChoice, SavePlan, SavedSchedule},
};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
struct MemoryData {
    classes: BTreeMap<Uuid, ClassInfo>,
    enrolments: HashMap<Uuid, Vec<Student>>,
    periods: HashMap<Uuid, AcademicPeriod>,
    calendars: BTreeMap<Uuid, Calendar>,
    slots: HashMap<Uuid, Vec<CalendarSlot>>,
    teachers: Vec<TeacherAvailability>,
    subjects: HashMap<Uuid, String>,
    marks: Vec<AttendanceMark>,
}

impl MemoryData {
    fn active_calendar(&self, class_id: Uuid) -> Option<&Calendar> {
        self.calendars
            .values()
            .find(|calendar| calendar.class_id == class_id && calendar.active)
    }

    fn period_calendars(&self, period_id: Uuid) -> impl Iterator<Item = &Calendar> {
        self.calendars
            .values()
            .filter(move |calendar| calendar.period_id == period_id)
    }

    fn write_slots(&mut self, calendar_id: Uuid, drafts: &[SlotDraft]) {
        let existing = self.slots.remove(&calendar_id).unwrap_or_default();
        let slots = drafts
            .iter()
            .map(|draft| {
                // an unchanged slot keeps its row so recorded attendance stays attached
                let id = existing
                    .iter()
                    .find(|slot| {
                        slot.day == draft.day
                            && slot.start_time == draft.start_time
                            && slot.end_time == draft.end_time
                            && slot.assignment == draft.assignment
                    })
                    .map(|slot| slot.id)
                    .unwrap_or_else(Uuid::new_v4);
                CalendarSlot {
                    id,
                    calendar_id,
                    day: draft.day,
                    start_time: draft.start_time,
                    end_time: draft.end_time,
                    assignment: draft.assignment,
                }
            })
            .collect();
        self.slots.insert(calendar_id, slots);
    }

    fn apply(&mut self, plan: &SavePlan) -> TimeResult<SavedSchedule> {
        match plan {
            SavePlan::ReplaceSlots {
                calendar_id,
                expected_version,
                slots,
            } => {
                let calendar = self
                    .calendars
                    .get_mut(calendar_id)
                    .filter(|calendar| calendar.active)
                    .ok_or_else(|| {
                        TimeError::NotFound(format!(
                            "Active calendar with ID {} not found",
                            calendar_id
                        ))
                    })?;
                if let Some(expected) = expected_version {
                    if calendar.version != *expected {
                        return Err(TimeError::Conflict(format!(
                            "Calendar {} is at version {}, expected {}",
                            calendar_id, calendar.version, expected
                        )));
                    }
                }
                calendar.version += 1;
                let calendar = calendar.clone();
                self.write_slots(*calendar_id, slots);

                let period = self.periods.get(&calendar.period_id).cloned().ok_or_else(|| {
                    TimeError::NotFound(format!("Period with ID {} not found", calendar.period_id))
                })?;
                Ok(SavedSchedule { calendar, period })
            }
            SavePlan::OpenPeriod {
                class_id,
                shorten,
                period,
                retire_calendar,
                slots,
            } => {
                if let Some(cut) = shorten {
                    let target = self.periods.get_mut(&cut.period_id).ok_or_else(|| {
                        TimeError::NotFound(format!("Period with ID {} not found", cut.period_id))
                    })?;
                    target.end_date = cut.end_date.max(target.start_date);
                }
                if let Some(calendar_id) = retire_calendar {
                    if let Some(calendar) = self.calendars.get_mut(calendar_id) {
                        calendar.active = false;
                    }
                }

                let period = match period {
                    PeriodChoice::Existing { period_id } => {
                        self.periods.get(period_id).cloned().ok_or_else(|| {
                            TimeError::NotFound(format!("Period with ID {} not found", period_id))
                        })?
                    }
                    PeriodChoice::Create { period: new_period } => {
                        let created = AcademicPeriod {
                            id: Uuid::new_v4(),
                            school_id: new_period.school_id,
                            start_date: new_period.start_date,
                            end_date: new_period.end_date,
                            active: true,
                            holidays: Default::default(),
                            weekend_sessions: Default::default(),
                        };
                        self.periods.insert(created.id, created.clone());
                        created
                    }
                };

                if self.active_calendar(*class_id).is_some() {
                    return Err(TimeError::Conflict(format!(
                        "Class {} already has an active calendar",
                        class_id
                    )));
                }
                let calendar = Calendar {
                    id: Uuid::new_v4(),
                    class_id: *class_id,
                    period_id: period.id,
                    active: true,
                    version: 1,
                    created_at: Utc::now(),
                };
                self.calendars.insert(calendar.id, calendar.clone());
                self.write_slots(calendar.id, slots);

                Ok(SavedSchedule { calendar, period })
            }
        }
    }
}

/// Store keeping every entity in memory, for tests and local runs.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    data: Arc<RwLock<MemoryData>>,
    fail_writes: Arc<AtomicBool>,
    writes: Arc<AtomicUsize>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&MemoryData) -> T) -> T {
        let data = self.data.read().unwrap_or_else(PoisonError::into_inner);
        f(&data)
    }

    fn write<T>(&self, f: impl FnOnce(&mut MemoryData) -> T) -> T {
        let mut data = self.data.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut data)
    }

    pub fn add_class(&self, class: ClassInfo, students: Vec<Student>) {
        self.write(|data| {
            data.enrolments.insert(class.id, students);
            data.classes.insert(class.id, class);
        });
    }

    pub fn add_period(&self, period: AcademicPeriod) {
        self.write(|data| {
            data.periods.insert(period.id, period);
        });
    }

    /// Adds a calendar; its slots are re-pointed at the calendar.
    pub fn add_calendar(&self, calendar: Calendar, slots: Vec<CalendarSlot>) {
        let slots = slots
            .into_iter()
            .map(|slot| CalendarSlot {
                calendar_id: calendar.id,
                ..slot
            })
            .collect();
        self.write(|data| {
            data.slots.insert(calendar.id, slots);
            data.calendars.insert(calendar.id, calendar);
        });
    }

    pub fn add_teacher(&self, teacher: TeacherAvailability) {
        self.write(|data| data.teachers.push(teacher));
    }

    pub fn add_subject(&self, subject_id: Uuid, name: impl Into<String>) {
        self.write(|data| {
            data.subjects.insert(subject_id, name.into());
        });
    }

    pub fn add_marks(&self, marks: impl IntoIterator<Item = AttendanceMark>) {
        self.write(|data| data.marks.extend(marks));
    }

    /// Makes every following save fail after its writes were staged.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of save plans committed so far.
    pub fn committed_writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Every calendar of a class, oldest first.
    pub fn calendars_of(&self, class_id: Uuid) -> Vec<Calendar> {
        self.read(|data| {
            let mut calendars: Vec<Calendar> = data
                .calendars
                .values()
                .filter(|calendar| calendar.class_id == class_id)
                .cloned()
                .collect();
            calendars.sort_by_key(|calendar| calendar.created_at);
            calendars
        })
    }

    pub fn slots_of(&self, calendar_id: Uuid) -> Vec<CalendarSlot> {
        self.read(|data| data.slots.get(&calendar_id).cloned().unwrap_or_default())
    }

    pub fn period(&self, period_id: Uuid) -> Option<AcademicPeriod> {
        self.read(|data| data.periods.get(&period_id).cloned())
    }

    pub fn periods(&self) -> Vec<AcademicPeriod> {
        self.read(|data| data.periods.values().cloned().collect())
    }
}

#[async_trait]
impl CalendarStore for InMemoryStore {
    async fn get_class(&self, class_id: Uuid) -> TimeResult<Option<ClassInfo>> {
        Ok(self.read(|data| data.classes.get(&class_id).cloned()))
    }

    async fn get_active_schedule(&self, class_id: Uuid) -> TimeResult<Option<ActiveSchedule>> {
        Ok(self.read(|data| {
            let calendar = data.active_calendar(class_id)?.clone();
            let period = data.periods.get(&calendar.period_id)?.clone();
            let slots = data.slots.get(&calendar.id).cloned().unwrap_or_default();
            Some(ActiveSchedule {
                calendar,
                period,
                slots,
            })
        }))
    }

    async fn get_current_period(
        &self,
        school_id: Uuid,
        today: NaiveDate,
    ) -> TimeResult<Option<AcademicPeriod>> {
        Ok(self.read(|data| {
            data.periods
                .values()
                .filter(|period| {
                    period.school_id == school_id && period.active && period.is_current(today)
                })
                .max_by_key(|period| period.start_date)
                .cloned()
        }))
    }

    async fn get_next_period(
        &self,
        school_id: Uuid,
        after: NaiveDate,
    ) -> TimeResult<Option<AcademicPeriod>> {
        Ok(self.read(|data| {
            data.periods
                .values()
                .filter(|period| {
                    period.school_id == school_id && period.active && period.start_date > after
                })
                .min_by_key(|period| period.start_date)
                .cloned()
        }))
    }

    async fn get_period(&self, period_id: Uuid) -> TimeResult<Option<AcademicPeriod>> {
        Ok(self.period(period_id))
    }

    async fn list_period_slots(
        &self,
        period_id: Uuid,
        class_id: Option<Uuid>,
    ) -> TimeResult<Vec<CalendarSlot>> {
        Ok(self.read(|data| {
            data.period_calendars(period_id)
                .filter(|calendar| class_id.is_none_or(|id| calendar.class_id == id))
                .flat_map(|calendar| data.slots.get(&calendar.id).cloned().unwrap_or_default())
                .collect()
        }))
    }

    async fn list_period_rosters(&self, period_id: Uuid) -> TimeResult<Vec<ClassRoster>> {
        Ok(self.read(|data| {
            let mut slots_by_class: BTreeMap<Uuid, Vec<CalendarSlot>> = BTreeMap::new();
            for calendar in data.period_calendars(period_id) {
                slots_by_class
                    .entry(calendar.class_id)
                    .or_default()
                    .extend(data.slots.get(&calendar.id).cloned().unwrap_or_default());
            }

            slots_by_class
                .into_iter()
                .filter_map(|(class_id, slots)| {
                    let class = data.classes.get(&class_id)?.clone();
                    Some(ClassRoster {
                        class,
                        students: data.enrolments.get(&class_id).cloned().unwrap_or_default(),
                        slots,
                    })
                })
                .collect()
        }))
    }

    async fn list_attendance_marks(&self, period_id: Uuid) -> TimeResult<Vec<AttendanceMark>> {
        Ok(self.read(|data| {
            let Some(period) = data.periods.get(&period_id) else {
                return Vec::new();
            };
            data.marks
                .iter()
                .filter(|mark| period.contains(mark.date) || period.weekend_sessions.contains(&mark.date))
                .copied()
                .collect()
        }))
    }

    async fn load_availability(&self) -> TimeResult<AvailabilityIndex> {
        Ok(self.read(|data| AvailabilityIndex::new(data.teachers.iter().cloned())))
    }

    async fn subject_names(&self) -> TimeResult<HashMap<Uuid, String>> {
        Ok(self.read(|data| data.subjects.clone()))
    }

    async fn apply_save_plan(&self, plan: SavePlan) -> TimeResult<SavedSchedule> {
        self.write(|data| {
            let mut staged = data.clone();
            let saved = staged.apply(&plan)?;

            if self.fail_writes.load(Ordering::SeqCst) {
                tracing::warn!("Discarding staged save: writes are set to fail");
                return Err(TimeError::Database(eyre::eyre!(
                    "write failed before commit"
                )));
            }

            *data = staged;
            self.writes.fetch_add(1, Ordering::SeqCst);
            Ok(saved)
        })
    }
}
