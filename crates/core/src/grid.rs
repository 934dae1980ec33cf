//! Weekly slot grid.
//!
//! A [`WeekGrid`] is the editable shape of a class timetable: for each school
//! day an ordered list of cells, each optionally holding an [`Assignment`].
//! It is a plain value; editing operations take a grid and hand back a new one.

use std::collections::BTreeMap;

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};

use crate::{
    errors::{TimeError, TimeResult},
    models::calendar::{Assignment, CalendarSlot, SchoolDay, SlotDraft, SlotKey},
};

const MINUTES_PER_DAY: u32 = 24 * 60;

/// Timing of one school day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayTiming {
    pub start_time: NaiveTime,
    pub slot_count: u32,
    pub slot_minutes: u32,
}

impl DayTiming {
    fn validate(&self, day: SchoolDay) -> TimeResult<()> {
        if self.slot_count == 0 {
            return Err(TimeError::Validation(format!(
                "{} must have at least one slot",
                day
            )));
        }
        if self.slot_minutes == 0 {
            return Err(TimeError::Validation(format!(
                "{} slot duration must be at least one minute",
                day
            )));
        }
        let start = self.start_time.num_seconds_from_midnight() / 60;
        let span = u64::from(self.slot_count) * u64::from(self.slot_minutes);
        if u64::from(start) + span >= u64::from(MINUTES_PER_DAY) {
            return Err(TimeError::Validation(format!(
                "{} slots starting at {} run past midnight",
                day,
                self.start_time.format("%H:%M")
            )));
        }
        Ok(())
    }
}

/// Per-weekday timing configuration. Days without an entry get no slots.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekConfig {
    pub days: BTreeMap<SchoolDay, DayTiming>,
}

impl WeekConfig {
    /// Same timing on every school day.
    pub fn uniform(start_time: NaiveTime, slot_count: u32, slot_minutes: u32) -> Self {
        Self {
            days: SchoolDay::ALL
                .into_iter()
                .map(|day| {
                    (
                        day,
                        DayTiming {
                            start_time,
                            slot_count,
                            slot_minutes,
                        },
                    )
                })
                .collect(),
        }
    }

    pub fn validate(&self) -> TimeResult<()> {
        self.days
            .iter()
            .try_for_each(|(day, timing)| timing.validate(*day))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSlot {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub assignment: Option<Assignment>,
}

impl GridSlot {
    pub fn key(&self, day: SchoolDay) -> SlotKey {
        SlotKey {
            day,
            start: self.start,
            end: self.end,
            assignment: self.assignment,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekGrid {
    pub days: BTreeMap<SchoolDay, Vec<GridSlot>>,
}

impl WeekGrid {
    /// Builds the blank grid described by `config`.
    ///
    /// Slot `i` of a day starts at `start_time + i * slot_minutes` and lasts
    /// `slot_minutes`, so consecutive slots are contiguous.
    pub fn blank(config: &WeekConfig) -> TimeResult<Self> {
        config.validate()?;

        let days = config
            .days
            .iter()
            .map(|(day, timing)| {
                let first = timing.start_time.num_seconds_from_midnight() / 60;
                let slots = (0..timing.slot_count)
                    .map(|i| {
                        let start = first + i * timing.slot_minutes;
                        GridSlot {
                            start: minutes_to_time(start),
                            end: minutes_to_time(start + timing.slot_minutes),
                            assignment: None,
                        }
                    })
                    .collect();
                (*day, slots)
            })
            .collect();

        Ok(Self { days })
    }

    /// Rebuilds a grid from persisted calendar slots.
    pub fn from_slots(slots: &[CalendarSlot]) -> TimeResult<Self> {
        let mut days: BTreeMap<SchoolDay, Vec<GridSlot>> = BTreeMap::new();
        for slot in slots {
            days.entry(slot.day).or_default().push(GridSlot {
                start: slot.start_time,
                end: slot.end_time,
                assignment: slot.assignment,
            });
        }
        for cells in days.values_mut() {
            cells.sort_by_key(|cell| (cell.start, cell.end));
        }

        let grid = Self { days };
        grid.validate()?;
        Ok(grid)
    }

    /// Loads a persisted calendar, falling back to the blank grid when the
    /// calendar has nothing assigned yet.
    pub fn load_or_blank(slots: &[CalendarSlot], config: &WeekConfig) -> TimeResult<Self> {
        if slots.iter().all(|slot| slot.assignment.is_none()) {
            return Self::blank(config);
        }
        Self::from_slots(slots)
    }

    /// Checks that every cell has a positive duration and that no two cells
    /// of the same day overlap.
    pub fn validate(&self) -> TimeResult<()> {
        for (day, cells) in &self.days {
            for cell in cells {
                if cell.start >= cell.end {
                    return Err(TimeError::Validation(format!(
                        "Slot on {} starting at {} ends before it starts",
                        day,
                        cell.start.format("%H:%M")
                    )));
                }
            }
            let mut sorted: Vec<&GridSlot> = cells.iter().collect();
            sorted.sort_by_key(|cell| cell.start);
            for pair in sorted.windows(2) {
                if pair[1].start < pair[0].end {
                    return Err(TimeError::Validation(format!(
                        "Slots on {} overlap: {}-{} and {}-{}",
                        day,
                        pair[0].start.format("%H:%M"),
                        pair[0].end.format("%H:%M"),
                        pair[1].start.format("%H:%M"),
                        pair[1].end.format("%H:%M")
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn slots(&self, day: SchoolDay) -> &[GridSlot] {
        self.days.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn iter(&self) -> impl Iterator<Item = (SchoolDay, &GridSlot)> {
        self.days
            .iter()
            .flat_map(|(day, cells)| cells.iter().map(move |cell| (*day, cell)))
    }

    pub fn keys(&self) -> Vec<SlotKey> {
        self.iter().map(|(day, cell)| cell.key(day)).collect()
    }

    pub fn len(&self) -> usize {
        self.days.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn assigned_count(&self) -> usize {
        self.iter()
            .filter(|(_, cell)| cell.assignment.is_some())
            .count()
    }

    /// Position of the cell matching `key` exactly, assignment included.
    pub fn position(&self, key: &SlotKey) -> Option<(SchoolDay, usize)> {
        self.days.get(&key.day).and_then(|cells| {
            cells
                .iter()
                .position(|cell| cell.key(key.day) == *key)
                .map(|idx| (key.day, idx))
        })
    }

    /// Position of the cell at `day`, `start`-`end`, whatever it holds.
    pub fn position_of_range(
        &self,
        day: SchoolDay,
        start: NaiveTime,
        end: NaiveTime,
    ) -> Option<(SchoolDay, usize)> {
        self.days.get(&day).and_then(|cells| {
            cells
                .iter()
                .position(|cell| cell.start == start && cell.end == end)
                .map(|idx| (day, idx))
        })
    }

    pub(crate) fn cell_mut(&mut self, day: SchoolDay, idx: usize) -> Option<&mut GridSlot> {
        self.days.get_mut(&day).and_then(|cells| cells.get_mut(idx))
    }

    /// Flattens the grid into rows ready to be written as calendar slots.
    pub fn to_drafts(&self) -> Vec<SlotDraft> {
        self.iter()
            .map(|(day, cell)| SlotDraft {
                day,
                start_time: cell.start,
                end_time: cell.end,
                assignment: cell.assignment,
            })
            .collect()
    }
}

fn minutes_to_time(minutes: u32) -> NaiveTime {
    // validated configs never reach midnight
    NaiveTime::from_num_seconds_from_midnight_opt(minutes * 60, 0).unwrap_or_default()
}
