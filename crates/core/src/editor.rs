use chrono::NaiveDate;

use crate::{
    errors::TimeResult,
    grid::{WeekConfig, WeekGrid},
    models::{
        availability::AvailabilityIndex, calendar::SlotKey, period::AcademicPeriod,
        roster::ClassInfo,
    },
    solver::{DraftRequest, DraftSolver, SubjectDemand, verify_draft},
    swap::{FixedSet, SwapError, attempt_swap},
    versioning::{
        ActiveSchedule, Confirmation, EditMode, SaveContext, SaveDecision, plan_save,
    },
};

/// In-progress edit of one class's timetable.
///
/// The editor owns the grid, the pinned set and the current mode. Every
/// operation either succeeds and replaces that state or fails and leaves it
/// exactly as it was.
#[derive(Debug, Clone)]
pub struct ScheduleEditor {
    class: ClassInfo,
    mode: EditMode,
    grid: WeekGrid,
    fixed: FixedSet,
}

impl ScheduleEditor {
    pub fn new(class: ClassInfo, mode: EditMode, grid: WeekGrid, fixed: FixedSet) -> Self {
        Self {
            class,
            mode,
            grid,
            fixed,
        }
    }

    /// Editor over a class's existing calendar.
    pub fn open(class: ClassInfo, grid: WeekGrid) -> Self {
        Self::new(class, EditMode::EditingExisting, grid, FixedSet::new())
    }

    pub fn class(&self) -> &ClassInfo {
        &self.class
    }

    pub fn mode(&self) -> EditMode {
        self.mode
    }

    pub fn grid(&self) -> &WeekGrid {
        &self.grid
    }

    pub fn fixed(&self) -> &FixedSet {
        &self.fixed
    }

    pub fn into_parts(self) -> (WeekGrid, FixedSet, EditMode) {
        (self.grid, self.fixed, self.mode)
    }

    pub fn swap(
        &mut self,
        active: &SlotKey,
        target: &SlotKey,
        availability: &AvailabilityIndex,
    ) -> Result<(), SwapError> {
        let outcome = attempt_swap(&self.grid, &self.fixed, active, target, availability)?;
        self.grid = outcome.grid;
        self.fixed = outcome.fixed;
        Ok(())
    }

    pub fn toggle_fixed(&mut self, key: SlotKey) -> bool {
        self.fixed.toggle(key)
    }

    /// Regenerates the grid around the pinned assignments and switches to
    /// drafting mode. A draft that fails verification is discarded.
    pub async fn draft(
        &mut self,
        solver: &dyn DraftSolver,
        config: WeekConfig,
        demands: Vec<SubjectDemand>,
        availability: AvailabilityIndex,
    ) -> TimeResult<()> {
        let request = DraftRequest {
            class_id: self.class.id,
            config,
            fixed: self.fixed.clone(),
            demands,
            availability: availability.clone(),
        };
        let candidate = solver.generate(request).await?;
        verify_draft(&candidate, &self.fixed, &availability)?;

        tracing::info!(
            "Drafted timetable for class {} with {} assigned slots",
            self.class.id,
            candidate.assigned_count()
        );
        self.grid = candidate;
        self.mode = EditMode::DraftingNew;
        Ok(())
    }

    pub fn plan_save(
        &self,
        active: Option<&ActiveSchedule>,
        current_period: Option<&AcademicPeriod>,
        next_period: Option<&AcademicPeriod>,
        today: NaiveDate,
        confirmation: Confirmation,
        expected_version: Option<i32>,
    ) -> TimeResult<SaveDecision> {
        plan_save(
            self.mode,
            &self.grid,
            SaveContext {
                class: &self.class,
                active,
                current_period,
                next_period,
                today,
            },
            confirmation,
            expected_version,
        )
    }

    /// Leaves drafting mode and forgets the pinned set once a save landed.
    pub fn finish_save(&mut self) {
        self.mode = EditMode::EditingExisting;
        self.fixed.clear();
    }
}
