use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use chrono::NaiveDate;
use classcal_core::{
    errors::TimeResult,
    models::{
        availability::{AvailabilityIndex, TeacherAvailability},
        calendar::CalendarSlot,
        period::AcademicPeriod,
        roster::{AttendanceMark, ClassInfo, ClassRoster, Student},
    },
    store::CalendarStore,
    versioning::{ActiveSchedule, SavePlan, SavedSchedule},
};
use uuid::Uuid;

use crate::{
    DbPool,
    repositories::{attendance, calendar, directory, period},
};

/// [`CalendarStore`] backed by Postgres.
#[derive(Debug, Clone)]
pub struct PgCalendarStore {
    pool: DbPool,
}

impl PgCalendarStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

#[async_trait]
impl CalendarStore for PgCalendarStore {
    async fn get_class(&self, class_id: Uuid) -> TimeResult<Option<ClassInfo>> {
        Ok(directory::get_class_by_id(&self.pool, class_id)
            .await?
            .map(ClassInfo::from))
    }

    async fn get_active_schedule(&self, class_id: Uuid) -> TimeResult<Option<ActiveSchedule>> {
        let Some(db_calendar) = calendar::get_active_calendar(&self.pool, class_id).await? else {
            return Ok(None);
        };

        let Some(period) = period::get_period_by_id(&self.pool, db_calendar.period_id).await?
        else {
            tracing::warn!(
                "Calendar {} points at missing period {}",
                db_calendar.id,
                db_calendar.period_id
            );
            return Ok(None);
        };

        let rows = calendar::get_calendar_slots(&self.pool, db_calendar.id).await?;
        Ok(Some(ActiveSchedule {
            calendar: db_calendar.into(),
            period,
            slots: calendar::into_slots(rows)?,
        }))
    }

    async fn get_current_period(
        &self,
        school_id: Uuid,
        today: NaiveDate,
    ) -> TimeResult<Option<AcademicPeriod>> {
        Ok(period::get_current_period(&self.pool, school_id, today).await?)
    }

    async fn get_next_period(
        &self,
        school_id: Uuid,
        after: NaiveDate,
    ) -> TimeResult<Option<AcademicPeriod>> {
        Ok(period::get_next_period(&self.pool, school_id, after).await?)
    }

    async fn get_period(&self, period_id: Uuid) -> TimeResult<Option<AcademicPeriod>> {
        Ok(period::get_period_by_id(&self.pool, period_id).await?)
    }

    async fn list_period_slots(
        &self,
        period_id: Uuid,
        class_id: Option<Uuid>,
    ) -> TimeResult<Vec<CalendarSlot>> {
        let rows = calendar::get_period_slots(&self.pool, period_id, class_id).await?;
        calendar::into_slots(rows.into_iter().map(|row| row.slot).collect())
    }

    async fn list_period_rosters(&self, period_id: Uuid) -> TimeResult<Vec<ClassRoster>> {
        let rows = calendar::get_period_slots(&self.pool, period_id, None).await?;

        let mut slots_by_class: BTreeMap<Uuid, Vec<CalendarSlot>> = BTreeMap::new();
        for row in rows {
            slots_by_class
                .entry(row.class_id)
                .or_default()
                .push(CalendarSlot::try_from(row.slot)?);
        }

        let class_ids: Vec<Uuid> = slots_by_class.keys().copied().collect();
        let classes = directory::get_classes_by_ids(&self.pool, &class_ids).await?;

        let mut students_by_class: HashMap<Uuid, Vec<Student>> = HashMap::new();
        for row in directory::get_enrolled_students(&self.pool, &class_ids).await? {
            students_by_class
                .entry(row.class_id)
                .or_default()
                .push(row.into());
        }

        Ok(classes
            .into_iter()
            .map(|class| ClassRoster {
                students: students_by_class.remove(&class.id).unwrap_or_default(),
                slots: slots_by_class.remove(&class.id).unwrap_or_default(),
                class: class.into(),
            })
            .collect())
    }

    async fn list_attendance_marks(&self, period_id: Uuid) -> TimeResult<Vec<AttendanceMark>> {
        Ok(attendance::get_period_marks(&self.pool, period_id)
            .await?
            .into_iter()
            .map(AttendanceMark::from)
            .collect())
    }

    async fn load_availability(&self) -> TimeResult<AvailabilityIndex> {
        let mut teachers: HashMap<Uuid, TeacherAvailability> = HashMap::new();
        for row in directory::get_availability(&self.pool).await? {
            let window = row.window()?;
            let teacher = teachers
                .entry(row.teacher_id)
                .or_insert_with(|| TeacherAvailability {
                    teacher_id: row.teacher_id,
                    teacher_name: row.teacher_name.clone(),
                    windows: Vec::new(),
                });
            teacher.windows.extend(window);
        }
        Ok(AvailabilityIndex::new(teachers.into_values()))
    }

    async fn subject_names(&self) -> TimeResult<HashMap<Uuid, String>> {
        Ok(directory::get_subject_names(&self.pool).await?)
    }

    async fn apply_save_plan(&self, plan: SavePlan) -> TimeResult<SavedSchedule> {
        calendar::apply_save_plan(&self.pool, &plan).await
    }
}
