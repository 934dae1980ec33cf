//! Draft timetable generation.
//!
//! The engine treats the solver as a collaborator behind [`DraftSolver`]:
//! given the week shape, the pinned assignments and the subjects to place, it
//! returns a candidate grid. Whatever the solver does internally, its output
//! is checked by [`verify_draft`] before the editor accepts it.
//!
//! [`GreedySolver`] is the reference implementation: it seats every pinned
//! assignment first, then fills blank cells subject by subject, spreading each
//! subject over different days when it can.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    errors::{TimeError, TimeResult},
    grid::{WeekConfig, WeekGrid},
    models::{
        availability::AvailabilityIndex,
        calendar::{Assignment, SchoolDay},
    },
    swap::FixedSet,
};

/// How many weekly sessions a subject needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectDemand {
    pub teacher_id: Uuid,
    pub subject_id: Uuid,
    pub sessions_per_week: u32,
}

impl SubjectDemand {
    pub fn assignment(&self) -> Assignment {
        Assignment {
            teacher_id: self.teacher_id,
            subject_id: self.subject_id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftRequest {
    pub class_id: Uuid,
    pub config: WeekConfig,
    pub fixed: FixedSet,
    pub demands: Vec<SubjectDemand>,
    pub availability: AvailabilityIndex,
}

#[async_trait]
pub trait DraftSolver: Send + Sync {
    async fn generate(&self, request: DraftRequest) -> TimeResult<WeekGrid>;
}

/// Rejects a grid placing a teacher outside their availability windows.
pub fn verify_availability(grid: &WeekGrid, availability: &AvailabilityIndex) -> TimeResult<()> {
    for (day, cell) in grid.iter() {
        if let Some(assignment) = cell.assignment {
            if !availability.is_available(assignment.teacher_id, day, cell.start, cell.end) {
                return Err(TimeError::Validation(format!(
                    "Timetable places {} on {} from {} to {} outside their availability",
                    availability.teacher_name(assignment.teacher_id),
                    day,
                    cell.start.format("%H:%M"),
                    cell.end.format("%H:%M")
                )));
            }
        }
    }
    Ok(())
}

/// Rejects a candidate grid that breaks an availability window, overlaps
/// itself, or lost one of the pinned assignments.
pub fn verify_draft(
    candidate: &WeekGrid,
    fixed: &FixedSet,
    availability: &AvailabilityIndex,
) -> TimeResult<()> {
    candidate.validate()?;
    verify_availability(candidate, availability)?;

    let present: BTreeSet<_> = candidate.keys().into_iter().collect();
    if let Some(missing) = fixed.iter().find(|key| !present.contains(*key)) {
        return Err(TimeError::Validation(format!(
            "Draft moved pinned slot {}",
            missing
        )));
    }

    Ok(())
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GreedySolver;

impl GreedySolver {
    /// Synchronous core of [`DraftSolver::generate`].
    pub fn solve(&self, request: &DraftRequest) -> TimeResult<WeekGrid> {
        let mut grid = WeekGrid::blank(&request.config)?;
        let mut pinned_cells: BTreeSet<(SchoolDay, usize)> = BTreeSet::new();
        let mut placed: HashMap<Assignment, u32> = HashMap::new();

        for key in request.fixed.iter() {
            let (day, idx) = grid
                .position_of_range(key.day, key.start, key.end)
                .ok_or_else(|| {
                    TimeError::Validation(format!("Pinned slot {} does not fit the week", key))
                })?;
            if let Some(cell) = grid.cell_mut(day, idx) {
                cell.assignment = key.assignment;
            }
            pinned_cells.insert((day, idx));
            if let Some(assignment) = key.assignment {
                *placed.entry(assignment).or_default() += 1;
            }
        }

        for demand in &request.demands {
            let assignment = demand.assignment();
            let already = placed.get(&assignment).copied().unwrap_or(0);
            let mut remaining = demand.sessions_per_week.saturating_sub(already);

            // first pass keeps one session per day, second pass doubles up
            for spread in [true, false] {
                for day in SchoolDay::ALL {
                    if spread && teaches_on(&grid, day, assignment) {
                        continue;
                    }
                    while remaining > 0 {
                        let Some(idx) = free_cell(&grid, &pinned_cells, day, assignment, request)
                        else {
                            break;
                        };
                        if let Some(cell) = grid.cell_mut(day, idx) {
                            cell.assignment = Some(assignment);
                        }
                        remaining -= 1;
                        if spread {
                            break;
                        }
                    }
                }
            }

            if remaining > 0 {
                tracing::warn!(
                    "Could not place {} of {} weekly sessions for subject {} in class {}",
                    remaining,
                    demand.sessions_per_week,
                    demand.subject_id,
                    request.class_id
                );
            }
        }

        Ok(grid)
    }
}

/// First blank, unpinned cell of `day` the assignment's teacher can take.
fn free_cell(
    grid: &WeekGrid,
    pinned_cells: &BTreeSet<(SchoolDay, usize)>,
    day: SchoolDay,
    assignment: Assignment,
    request: &DraftRequest,
) -> Option<usize> {
    grid.slots(day).iter().enumerate().find_map(|(idx, cell)| {
        let open = !pinned_cells.contains(&(day, idx))
            && cell.assignment.is_none()
            && request.availability.is_available(
                assignment.teacher_id,
                day,
                cell.start,
                cell.end,
            );
        open.then_some(idx)
    })
}

fn teaches_on(grid: &WeekGrid, day: SchoolDay, assignment: Assignment) -> bool {
    grid.slots(day)
        .iter()
        .any(|cell| cell.assignment == Some(assignment))
}

#[async_trait]
impl DraftSolver for GreedySolver {
    async fn generate(&self, request: DraftRequest) -> TimeResult<WeekGrid> {
        self.solve(&request)
    }
}
