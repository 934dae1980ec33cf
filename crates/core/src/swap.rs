//! Slot exchange under teacher-availability constraints.
//!
//! A swap trades the assignments of two grid cells. Each non-blank side must
//! be taught by a teacher who is available for the cell it moves into; if
//! either check fails the grid is left untouched and the caller receives a
//! [`SwapError`] naming the teacher and the conflicting day and time.
//!
//! Pinned cells are tracked in a [`FixedSet`]. A pinned assignment that moves
//! through a swap stays pinned at its new position.

use std::collections::BTreeSet;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    grid::WeekGrid,
    models::{
        availability::AvailabilityIndex,
        calendar::{SchoolDay, SlotKey},
    },
};

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SwapError {
    #[error("{teacher_name} is not available on {day} from {} to {}", .start.format("%H:%M"), .end.format("%H:%M"))]
    TeacherUnavailable {
        teacher_name: String,
        day: SchoolDay,
        start: NaiveTime,
        end: NaiveTime,
    },

    #[error("Slot {0} is not part of the grid")]
    SlotNotFound(SlotKey),
}

impl SwapError {
    pub fn teacher_name(&self) -> Option<&str> {
        match self {
            SwapError::TeacherUnavailable { teacher_name, .. } => Some(teacher_name),
            SwapError::SlotNotFound(_) => None,
        }
    }

    pub fn reason(&self) -> String {
        self.to_string()
    }
}

/// Assignments the regeneration pass must leave where they are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FixedSet(BTreeSet<SlotKey>);

impl FixedSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &SlotKey) -> bool {
        self.0.contains(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SlotKey> {
        self.0.iter()
    }

    /// Pins `key` if it is free, unpins it otherwise. Returns whether the key
    /// is pinned afterwards.
    pub fn toggle(&mut self, key: SlotKey) -> bool {
        if self.0.remove(&key) {
            false
        } else {
            self.0.insert(key);
            true
        }
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Moves pinned keys to their post-swap positions. Keys that were not
    /// pinned are ignored.
    fn follow_swap(&mut self, moves: [(SlotKey, SlotKey); 2]) {
        let pinned: Vec<SlotKey> = moves
            .iter()
            .filter(|(old, _)| self.0.remove(old))
            .map(|(_, new)| *new)
            .collect();
        self.0.extend(pinned);
    }
}

impl FromIterator<SlotKey> for FixedSet {
    fn from_iter<I: IntoIterator<Item = SlotKey>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Result of a successful swap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapOutcome {
    pub grid: WeekGrid,
    pub fixed: FixedSet,
    /// Key of the formerly active assignment at its new position.
    pub active: SlotKey,
    /// Key of the formerly targeted assignment at its new position.
    pub target: SlotKey,
}

/// Exchanges the assignments held by `active` and `target`.
///
/// The active assignment must fit the target cell's availability and the
/// target assignment must fit the active cell's; blank cells always fit.
/// Neither `grid` nor `fixed` is modified; the new state is returned.
pub fn attempt_swap(
    grid: &WeekGrid,
    fixed: &FixedSet,
    active: &SlotKey,
    target: &SlotKey,
    availability: &AvailabilityIndex,
) -> Result<SwapOutcome, SwapError> {
    let (active_day, active_idx) = grid
        .position(active)
        .ok_or(SwapError::SlotNotFound(*active))?;
    let (target_day, target_idx) = grid
        .position(target)
        .ok_or(SwapError::SlotNotFound(*target))?;

    if active == target {
        return Ok(SwapOutcome {
            grid: grid.clone(),
            fixed: fixed.clone(),
            active: *active,
            target: *target,
        });
    }

    ensure_available(active, target, availability)?;
    ensure_available(target, active, availability)?;

    let mut next = grid.clone();
    if let Some(cell) = next.cell_mut(active_day, active_idx) {
        cell.assignment = target.assignment;
    }
    if let Some(cell) = next.cell_mut(target_day, target_idx) {
        cell.assignment = active.assignment;
    }

    let moved_active = active.relocated(target.day, target.start, target.end);
    let moved_target = target.relocated(active.day, active.start, active.end);

    let mut next_fixed = fixed.clone();
    next_fixed.follow_swap([(*active, moved_active), (*target, moved_target)]);

    tracing::debug!(
        "Swapped {} with {} ({} pinned)",
        active,
        target,
        next_fixed.len()
    );

    Ok(SwapOutcome {
        grid: next,
        fixed: next_fixed,
        active: moved_active,
        target: moved_target,
    })
}

/// Checks that the assignment in `moving` may be taught in `destination`'s cell.
fn ensure_available(
    moving: &SlotKey,
    destination: &SlotKey,
    availability: &AvailabilityIndex,
) -> Result<(), SwapError> {
    let Some(assignment) = moving.assignment else {
        return Ok(());
    };
    if availability.is_available(
        assignment.teacher_id,
        destination.day,
        destination.start,
        destination.end,
    ) {
        Ok(())
    } else {
        Err(SwapError::TeacherUnavailable {
            teacher_name: availability.teacher_name(assignment.teacher_id),
            day: destination.day,
            start: destination.start,
            end: destination.end,
        })
    }
}
