use classcal_core::models::{
    calendar::Assignment,
    roster::AttendanceMark,
    schedule::{AtRiskResponse, SessionDatesResponse},
};
use pretty_assertions::assert_eq;
use uuid::Uuid;

use crate::test_utils::{TestContext, d};

fn mark(
    ctx: &TestContext,
    assignment: Assignment,
    month: u32,
    day: u32,
    present: bool,
) -> AttendanceMark {
    AttendanceMark {
        student_id: ctx.student.id,
        assignment,
        date: d(2025, month, day),
        present,
    }
}

#[tokio::test]
async fn test_session_dates_skip_holidays_and_add_weekend_sessions() {
    let ctx = TestContext::new();

    let response = ctx
        .server()
        .get(&format!("/api/periods/{}/sessions", ctx.period.id))
        .add_query_param("teacher_id", ctx.math.teacher_id)
        .add_query_param("subject_id", ctx.math.subject_id)
        .await;

    response.assert_status_ok();
    let body: SessionDatesResponse = response.json();
    assert_eq!(body.period_id, ctx.period.id);
    // ten Mondays, minus the Easter Monday holiday, plus one make-up Saturday
    assert_eq!(body.count, 10);
    assert_eq!(body.dates.len(), body.count);
    assert_eq!(body.dates.first(), Some(&d(2025, 3, 3)));
    assert_eq!(body.dates.last(), Some(&d(2025, 5, 5)));
    assert!(body.dates.contains(&d(2025, 4, 26)));
    assert!(!body.dates.contains(&d(2025, 4, 21)));
}

#[tokio::test]
async fn test_session_dates_narrowed_to_other_class() {
    let ctx = TestContext::new();

    let response = ctx
        .server()
        .get(&format!("/api/periods/{}/sessions", ctx.period.id))
        .add_query_param("teacher_id", ctx.math.teacher_id)
        .add_query_param("subject_id", ctx.math.subject_id)
        .add_query_param("class_id", Uuid::new_v4())
        .await;

    response.assert_status_ok();
    let body: SessionDatesResponse = response.json();
    assert_eq!(body.dates, vec![d(2025, 4, 26)]);
}

#[tokio::test]
async fn test_session_dates_unknown_period_is_empty() {
    let ctx = TestContext::new();
    let period_id = Uuid::new_v4();

    let response = ctx
        .server()
        .get(&format!("/api/periods/{}/sessions", period_id))
        .add_query_param("teacher_id", ctx.math.teacher_id)
        .add_query_param("subject_id", ctx.math.subject_id)
        .await;

    response.assert_status_ok();
    let body: SessionDatesResponse = response.json();
    assert_eq!(body.period_id, period_id);
    assert_eq!(body.count, 0);
    assert!(body.dates.is_empty());
}

#[tokio::test]
async fn test_session_dates_requires_assignment() {
    let ctx = TestContext::new();

    let response = ctx
        .server()
        .get(&format!("/api/periods/{}/sessions", ctx.period.id))
        .expect_failure()
        .await;

    assert!(response.status_code().is_client_error());
}

#[test_log::test(tokio::test)]
async fn test_at_risk_lists_failing_subjects_only() {
    let ctx = TestContext::new();
    ctx.store.add_marks([
        mark(&ctx, ctx.math, 3, 3, true),
        mark(&ctx, ctx.math, 3, 10, false),
        mark(&ctx, ctx.math, 3, 17, false),
        mark(&ctx, ctx.art, 3, 4, true),
        mark(&ctx, ctx.art, 3, 11, true),
        mark(&ctx, ctx.art, 3, 18, true),
    ]);

    let response = ctx
        .server()
        .get(&format!("/api/periods/{}/at-risk", ctx.period.id))
        .await;

    response.assert_status_ok();
    let body: AtRiskResponse = response.json();
    assert_eq!(body.today, ctx.today());
    assert_eq!(body.threshold, 70.0);
    assert_eq!(body.students.len(), 1);

    let student = &body.students[0];
    assert_eq!(student.student_id, ctx.student.id);
    assert_eq!(student.student_name, ctx.student.name);
    assert_eq!(student.class_id, ctx.class.id);
    assert_eq!(student.subjects.len(), 1);

    let math = &student.subjects[0];
    assert_eq!(math.subject_name.as_deref(), Some("Mathematics"));
    assert_eq!(math.total_sessions_to_date, 3);
    assert_eq!(math.attended_to_date, 1);
    assert_eq!(math.total_sessions_for_period, 10);
    assert!(!math.holiday_skipper);
    assert!(math.at_risk);
}

#[tokio::test]
async fn test_at_risk_unknown_period_is_empty() {
    let ctx = TestContext::new();

    let response = ctx
        .server()
        .get(&format!("/api/periods/{}/at-risk", Uuid::new_v4()))
        .await;

    response.assert_status_ok();
    let body: AtRiskResponse = response.json();
    assert!(body.students.is_empty());
}
