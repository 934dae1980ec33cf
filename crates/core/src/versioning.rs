//! Save-time versioning policy.
//!
//! Saving a timetable either rewrites the class's active calendar in place or
//! retires it and opens a new academic period. The decision is made here as a
//! pure function producing a [`SavePlan`]; stores apply a plan as a single
//! atomic unit.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    errors::{TimeError, TimeResult},
    grid::WeekGrid,
    models::{
        calendar::{Calendar, CalendarSlot, SlotDraft},
        period::{AcademicPeriod, NewPeriod},
        roster::ClassInfo,
    },
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditMode {
    /// Changes go straight into the class's active calendar.
    #[default]
    EditingExisting,
    /// A regenerated timetable that will open a new period when saved.
    DraftingNew,
}

/// State of the confirmation gate guarding destructive saves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confirmation {
    #[default]
    NotAsked,
    Confirmed,
    Declined,
}

impl From<Option<bool>> for Confirmation {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => Confirmation::NotAsked,
            Some(true) => Confirmation::Confirmed,
            Some(false) => Confirmation::Declined,
        }
    }
}

/// The class's active calendar together with its period and slots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveSchedule {
    pub calendar: Calendar,
    pub period: AcademicPeriod,
    pub slots: Vec<CalendarSlot>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PeriodChoice {
    /// Attach the new calendar to a period that already exists.
    Existing { period_id: Uuid },
    /// Create a period and attach the new calendar to it.
    Create { period: NewPeriod },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodCut {
    pub period_id: Uuid,
    pub end_date: NaiveDate,
}

/// Writes a save performs. A store applies all of them or none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SavePlan {
    /// Rewrite the slots of the active calendar and bump its version.
    ReplaceSlots {
        calendar_id: Uuid,
        expected_version: Option<i32>,
        slots: Vec<SlotDraft>,
    },
    /// Retire the active calendar (if any) and start a new one.
    OpenPeriod {
        class_id: Uuid,
        shorten: Option<PeriodCut>,
        period: PeriodChoice,
        retire_calendar: Option<Uuid>,
        slots: Vec<SlotDraft>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveDecision {
    Apply(SavePlan),
    /// The save would retire a calendar and the user has not answered yet.
    ConfirmationRequired,
    /// The user refused the destructive save; nothing is written.
    Declined,
}

/// What the store hands back after applying a plan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedSchedule {
    pub calendar: Calendar,
    pub period: AcademicPeriod,
}

/// Everything [`plan_save`] looks at besides the grid.
#[derive(Debug, Clone, Copy)]
pub struct SaveContext<'a> {
    pub class: &'a ClassInfo,
    pub active: Option<&'a ActiveSchedule>,
    /// The school's period covering `today`, if there is one.
    pub current_period: Option<&'a AcademicPeriod>,
    /// The school's earliest period starting after `today`.
    pub next_period: Option<&'a AcademicPeriod>,
    pub today: NaiveDate,
}

fn one_year_after(date: NaiveDate) -> TimeResult<NaiveDate> {
    date.checked_add_months(Months::new(12))
        .ok_or_else(|| TimeError::Validation(format!("Cannot open a period starting {}", date)))
}

fn day_after(date: NaiveDate) -> TimeResult<NaiveDate> {
    date.succ_opt()
        .ok_or_else(|| TimeError::Validation(format!("No day follows {}", date)))
}

/// Period a new calendar starting on `start_date` belongs to.
///
/// A school period already starting by then is joined. Otherwise a year-long
/// period is created, cut short before the next school period begins.
fn following_period(ctx: &SaveContext<'_>, start_date: NaiveDate) -> TimeResult<PeriodChoice> {
    let mut end_date = one_year_after(start_date)?;
    if let Some(next) = ctx.next_period {
        if next.start_date <= start_date {
            return Ok(PeriodChoice::Existing { period_id: next.id });
        }
        if let Some(before_next) = next.start_date.pred_opt() {
            end_date = end_date.min(before_next);
        }
    }

    Ok(PeriodChoice::Create {
        period: NewPeriod {
            school_id: ctx.class.school_id,
            start_date,
            end_date,
        },
    })
}

/// Decides which writes saving `grid` in `mode` requires.
pub fn plan_save(
    mode: EditMode,
    grid: &WeekGrid,
    ctx: SaveContext<'_>,
    confirmation: Confirmation,
    expected_version: Option<i32>,
) -> TimeResult<SaveDecision> {
    grid.validate()?;
    let slots = grid.to_drafts();

    match (mode, ctx.active) {
        (EditMode::EditingExisting, Some(active)) => {
            if let Some(expected) = expected_version {
                if expected != active.calendar.version {
                    return Err(TimeError::Conflict(format!(
                        "Calendar {} is at version {}, expected {}",
                        active.calendar.id, active.calendar.version, expected
                    )));
                }
            }
            Ok(SaveDecision::Apply(SavePlan::ReplaceSlots {
                calendar_id: active.calendar.id,
                expected_version,
                slots,
            }))
        }
        (EditMode::EditingExisting, None) => Err(TimeError::Validation(format!(
            "Class {} has no active calendar to edit",
            ctx.class.name
        ))),
        (EditMode::DraftingNew, None) => {
            let current = ctx
                .current_period
                .filter(|current| current.is_current(ctx.today));
            let period = match current {
                Some(current) if current.is_ongoing(ctx.today) => PeriodChoice::Existing {
                    period_id: current.id,
                },
                // a period ending today has no sessions left to attach to
                Some(current) => following_period(&ctx, day_after(current.end_date)?)?,
                None => following_period(&ctx, ctx.today)?,
            };
            Ok(SaveDecision::Apply(SavePlan::OpenPeriod {
                class_id: ctx.class.id,
                shorten: None,
                period,
                retire_calendar: None,
                slots,
            }))
        }
        (EditMode::DraftingNew, Some(active)) => match confirmation {
            Confirmation::NotAsked => Ok(SaveDecision::ConfirmationRequired),
            Confirmation::Declined => Ok(SaveDecision::Declined),
            Confirmation::Confirmed => {
                let shorten = active.period.is_ongoing(ctx.today).then(|| PeriodCut {
                    period_id: active.period.id,
                    end_date: ctx.today,
                });
                let period = following_period(&ctx, day_after(ctx.today)?)?;
                Ok(SaveDecision::Apply(SavePlan::OpenPeriod {
                    class_id: ctx.class.id,
                    shorten,
                    period,
                    retire_calendar: Some(active.calendar.id),
                    slots,
                }))
            }
        },
    }
}
