use std::sync::Arc;

use axum::http::StatusCode;
use classcal_core::{
    errors::TimeError,
    grid::WeekGrid,
    models::{
        calendar::{SchoolDay, SlotKey},
        schedule::{
            DraftScheduleRequest, DraftScheduleResponse, GetScheduleResponse, SaveScheduleRequest,
            SwapRequest, SwapResponse, ToggleFixedRequest, ToggleFixedResponse,
        },
    },
    swap::FixedSet,
    versioning::EditMode,
};
use classcal_db::mock::MockSolver;
use pretty_assertions::assert_eq;
use serde_json::Value;
use uuid::Uuid;

use crate::test_utils::{TestContext, d, t, week};

fn key(grid: &WeekGrid, day: SchoolDay, index: usize) -> SlotKey {
    grid.slots(day)[index].key(day)
}

async fn loaded_grid(ctx: &TestContext) -> WeekGrid {
    let response = ctx
        .server()
        .get(&format!("/api/classes/{}/schedule", ctx.class.id))
        .await;
    response.assert_status_ok();
    response.json::<GetScheduleResponse>().grid
}

fn save_request(grid: WeekGrid, mode: EditMode, confirm: Option<bool>) -> SaveScheduleRequest {
    SaveScheduleRequest {
        mode,
        grid,
        fixed: FixedSet::new(),
        confirm,
        expected_version: None,
    }
}

#[tokio::test]
async fn test_get_schedule_returns_active_calendar() {
    let ctx = TestContext::new();

    let response = ctx
        .server()
        .get(&format!("/api/classes/{}/schedule", ctx.class.id))
        .await;

    response.assert_status_ok();
    let body: GetScheduleResponse = response.json();
    assert_eq!(body.class_name, "8A");
    assert_eq!(body.calendar_id, Some(ctx.calendar.id));
    assert_eq!(body.period_id, Some(ctx.period.id));
    assert_eq!(body.version, Some(1));
    assert_eq!(body.mode, EditMode::EditingExisting);
    assert_eq!(body.grid.len(), 20);
    assert_eq!(body.grid.slots(SchoolDay::Monday)[0].assignment, Some(ctx.math));
    assert_eq!(body.grid.slots(SchoolDay::Tuesday)[1].assignment, Some(ctx.art));
}

#[tokio::test]
async fn test_get_schedule_unknown_class() {
    let ctx = TestContext::new();

    let response = ctx
        .server()
        .get(&format!("/api/classes/{}/schedule", Uuid::new_v4()))
        .expect_failure()
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("not found"));
}

#[tokio::test]
async fn test_get_schedule_without_calendar_is_blank() {
    let ctx = TestContext::new();
    let mut class = ctx.class.clone();
    class.id = Uuid::new_v4();
    class.name = "8B".to_string();
    ctx.store.add_class(class.clone(), Vec::new());

    let response = ctx
        .server()
        .get(&format!("/api/classes/{}/schedule", class.id))
        .await;

    response.assert_status_ok();
    let body: GetScheduleResponse = response.json();
    assert_eq!(body.calendar_id, None);
    assert_eq!(body.version, None);
    assert_eq!(body.grid, WeekGrid::blank(&week()).unwrap());
}

#[tokio::test]
async fn test_swap_exchanges_assignments() {
    let ctx = TestContext::new();
    let grid = loaded_grid(&ctx).await;
    let active = key(&grid, SchoolDay::Monday, 0);
    let target = key(&grid, SchoolDay::Tuesday, 1);

    let response = ctx
        .server()
        .post("/api/schedule/swap")
        .json(&SwapRequest {
            grid,
            fixed: FixedSet::new(),
            active,
            target,
        })
        .await;

    response.assert_status_ok();
    let body: SwapResponse = response.json();
    assert_eq!(body.grid.slots(SchoolDay::Monday)[0].assignment, Some(ctx.art));
    assert_eq!(body.grid.slots(SchoolDay::Tuesday)[1].assignment, Some(ctx.math));
    assert!(body.fixed.is_empty());
}

#[tokio::test]
async fn test_swap_reports_unavailable_teacher() {
    let ctx = TestContext::new();
    let grid = loaded_grid(&ctx).await;
    let active = key(&grid, SchoolDay::Tuesday, 1);
    let target = key(&grid, SchoolDay::Wednesday, 2);

    let response = ctx
        .server()
        .post("/api/schedule/swap")
        .json(&SwapRequest {
            grid,
            fixed: FixedSet::new(),
            active,
            target,
        })
        .expect_failure()
        .await;

    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = response.json();
    assert_eq!(body["conflict"]["kind"], "teacher_unavailable");
    assert_eq!(body["conflict"]["teacher_name"], "Ms. Lindqvist");
    assert_eq!(body["conflict"]["day"], "wednesday");
    assert_eq!(
        body["error"],
        "Schedule conflict: Ms. Lindqvist is not available on wednesday from 10:00 to 11:00"
    );
}

#[tokio::test]
async fn test_swap_rejects_overlapping_grid() {
    let ctx = TestContext::new();
    let mut grid = loaded_grid(&ctx).await;
    grid.days.get_mut(&SchoolDay::Monday).unwrap()[1].start = t(8);
    let active = key(&grid, SchoolDay::Monday, 0);
    let target = key(&grid, SchoolDay::Friday, 0);

    let response = ctx
        .server()
        .post("/api/schedule/swap")
        .json(&SwapRequest {
            grid,
            fixed: FixedSet::new(),
            active,
            target,
        })
        .expect_failure()
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_toggle_fixed_round_trip() {
    let ctx = TestContext::new();
    let grid = loaded_grid(&ctx).await;
    let pinned = key(&grid, SchoolDay::Monday, 0);
    let server = ctx.server();

    let first: ToggleFixedResponse = server
        .post("/api/schedule/fixed/toggle")
        .json(&ToggleFixedRequest {
            fixed: FixedSet::new(),
            key: pinned,
        })
        .await
        .json();
    assert!(first.is_fixed);
    assert!(first.fixed.contains(&pinned));

    let second: ToggleFixedResponse = server
        .post("/api/schedule/fixed/toggle")
        .json(&ToggleFixedRequest {
            fixed: first.fixed,
            key: pinned,
        })
        .await
        .json();
    assert!(!second.is_fixed);
    assert!(second.fixed.is_empty());
}

#[tokio::test]
async fn test_draft_uses_solver_output() {
    let ctx = TestContext::new();
    let class_id = ctx.class.id;
    let math = ctx.math;

    let mut solver = MockSolver::new();
    solver
        .expect_generate()
        .withf(move |request| request.class_id == class_id && request.fixed.is_empty())
        .times(1)
        .returning(move |request| {
            let mut grid = WeekGrid::blank(&request.config)?;
            grid.days.get_mut(&SchoolDay::Wednesday).unwrap()[0].assignment = Some(math);
            Ok(grid)
        });

    let response = ctx
        .server_with(ctx.state_with(Arc::new(solver)))
        .post(&format!("/api/classes/{}/schedule/draft", class_id))
        .json(&DraftScheduleRequest {
            fixed: FixedSet::new(),
            config: None,
            demands: Vec::new(),
        })
        .await;

    response.assert_status_ok();
    let body: DraftScheduleResponse = response.json();
    assert_eq!(body.mode, EditMode::DraftingNew);
    assert_eq!(body.grid.assigned_count(), 1);
    assert_eq!(body.grid.slots(SchoolDay::Wednesday)[0].assignment, Some(math));
}

#[tokio::test]
async fn test_draft_rejects_unavailable_placement() {
    let ctx = TestContext::new();
    let art = ctx.art;

    let mut solver = MockSolver::new();
    solver.expect_generate().returning(move |request| {
        let mut grid = WeekGrid::blank(&request.config)?;
        grid.days.get_mut(&SchoolDay::Friday).unwrap()[0].assignment = Some(art);
        Ok(grid)
    });

    let response = ctx
        .server_with(ctx.state_with(Arc::new(solver)))
        .post(&format!("/api/classes/{}/schedule/draft", ctx.class.id))
        .json(&DraftScheduleRequest {
            fixed: FixedSet::new(),
            config: None,
            demands: Vec::new(),
        })
        .expect_failure()
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].as_str().unwrap().contains("Ms. Lindqvist"));
}

#[tokio::test]
async fn test_draft_surfaces_solver_failure() {
    let ctx = TestContext::new();

    let mut solver = MockSolver::new();
    solver
        .expect_generate()
        .returning(|_| Err(TimeError::Internal("solver crashed".into())));

    let response = ctx
        .server_with(ctx.state_with(Arc::new(solver)))
        .post(&format!("/api/classes/{}/schedule/draft", ctx.class.id))
        .json(&DraftScheduleRequest {
            fixed: FixedSet::new(),
            config: None,
            demands: Vec::new(),
        })
        .expect_failure()
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
}

#[test_log::test(tokio::test)]
async fn test_save_editing_bumps_version() {
    let ctx = TestContext::new();
    let mut grid = loaded_grid(&ctx).await;
    grid.days.get_mut(&SchoolDay::Friday).unwrap()[3].assignment = Some(ctx.math);

    let mut request = save_request(grid, EditMode::EditingExisting, None);
    request.expected_version = Some(1);

    let response = ctx
        .server()
        .post(&format!("/api/classes/{}/schedule/save", ctx.class.id))
        .json(&request)
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "saved");
    assert_eq!(body["mode"], "editing_existing");
    assert_eq!(body["calendar"]["id"], ctx.calendar.id.to_string());
    assert_eq!(body["calendar"]["version"], 2);

    let slots = ctx.store.slots_of(ctx.calendar.id);
    assert_eq!(slots.iter().filter(|s| s.assignment == Some(ctx.math)).count(), 2);
}

#[tokio::test]
async fn test_save_with_stale_version_conflicts() {
    let ctx = TestContext::new();
    let grid = loaded_grid(&ctx).await;

    let mut request = save_request(grid, EditMode::EditingExisting, None);
    request.expected_version = Some(4);

    let response = ctx
        .server()
        .post(&format!("/api/classes/{}/schedule/save", ctx.class.id))
        .json(&request)
        .expect_failure()
        .await;

    response.assert_status(StatusCode::CONFLICT);
    assert_eq!(ctx.store.committed_writes(), 0);
}

#[tokio::test]
async fn test_save_draft_asks_for_confirmation() {
    let ctx = TestContext::new();
    let grid = WeekGrid::blank(&week()).unwrap();

    let response = ctx
        .server()
        .post(&format!("/api/classes/{}/schedule/save", ctx.class.id))
        .json(&save_request(grid, EditMode::DraftingNew, None))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "confirmation_required");
    assert_eq!(body["mode"], "drafting_new");
    assert_eq!(ctx.store.committed_writes(), 0);
}

#[tokio::test]
async fn test_save_draft_declined_keeps_everything() {
    let ctx = TestContext::new();
    let grid = WeekGrid::blank(&week()).unwrap();

    let response = ctx
        .server()
        .post(&format!("/api/classes/{}/schedule/save", ctx.class.id))
        .json(&save_request(grid, EditMode::DraftingNew, Some(false)))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "declined");
    assert_eq!(body["mode"], "drafting_new");
    assert_eq!(ctx.store.committed_writes(), 0);
    assert_eq!(ctx.store.period(ctx.period.id), Some(ctx.period.clone()));
}

#[test_log::test(tokio::test)]
async fn test_save_draft_confirmed_opens_new_period() {
    let ctx = TestContext::new();
    let mut grid = WeekGrid::blank(&week()).unwrap();
    grid.days.get_mut(&SchoolDay::Thursday).unwrap()[0].assignment = Some(ctx.math);
    grid.days.get_mut(&SchoolDay::Monday).unwrap()[0].assignment = Some(ctx.art);

    let response = ctx
        .server()
        .post(&format!("/api/classes/{}/schedule/save", ctx.class.id))
        .json(&save_request(grid, EditMode::DraftingNew, Some(true)))
        .await;

    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["status"], "saved");
    assert_eq!(body["mode"], "editing_existing");
    assert_eq!(body["period"]["start_date"], "2025-03-21");
    assert_eq!(body["period"]["end_date"], "2026-03-21");

    let old = ctx.store.period(ctx.period.id).unwrap();
    assert_eq!(old.end_date, d(2025, 3, 20));

    let calendars = ctx.store.calendars_of(ctx.class.id);
    assert_eq!(calendars.len(), 2);
    assert!(!calendars[0].active);
    assert!(calendars[1].active);
    assert_ne!(calendars[1].period_id, ctx.period.id);
}

#[tokio::test]
async fn test_save_rejected_while_another_save_runs() {
    let ctx = TestContext::new();
    let grid = WeekGrid::blank(&week()).unwrap();
    let state = ctx.state_with(Arc::new(MockSolver::new()));
    let _ticket = state.saves.try_acquire(ctx.class.id).unwrap();

    let response = ctx
        .server_with(Arc::clone(&state))
        .post(&format!("/api/classes/{}/schedule/save", ctx.class.id))
        .json(&save_request(grid, EditMode::EditingExisting, None))
        .expect_failure()
        .await;

    response.assert_status(StatusCode::CONFLICT);
    assert!(state.saves.is_saving(ctx.class.id));
    assert_eq!(ctx.store.committed_writes(), 0);
}

#[tokio::test]
async fn test_save_releases_guard_after_failure() {
    let ctx = TestContext::new();
    let grid = WeekGrid::blank(&week()).unwrap();
    let state = ctx.state_with(Arc::new(MockSolver::new()));
    let server = ctx.server_with(Arc::clone(&state));
    let unknown = Uuid::new_v4();

    let response = server
        .post(&format!("/api/classes/{}/schedule/save", unknown))
        .json(&save_request(grid, EditMode::EditingExisting, None))
        .expect_failure()
        .await;

    response.assert_status(StatusCode::NOT_FOUND);
    assert!(!state.saves.is_saving(unknown));
}

#[tokio::test]
async fn test_save_rejects_teacher_outside_availability() {
    let ctx = TestContext::new();
    let mut grid = loaded_grid(&ctx).await;
    grid.days.get_mut(&SchoolDay::Friday).unwrap()[3].assignment = Some(ctx.art);
    let before = ctx.store.slots_of(ctx.calendar.id);

    let response = ctx
        .server()
        .post(&format!("/api/classes/{}/schedule/save", ctx.class.id))
        .json(&save_request(grid, EditMode::EditingExisting, None))
        .expect_failure()
        .await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    let message = body["error"].as_str().unwrap();
    assert!(message.contains("Ms. Lindqvist"));
    assert!(message.contains("friday from 11:00 to 12:00"));
    assert_eq!(ctx.store.committed_writes(), 0);
    assert_eq!(ctx.store.slots_of(ctx.calendar.id), before);
}
