use pretty_assertions::assert_eq;
use serial_test::serial;
use uuid::Uuid;

use scheduling::AppError;
use scheduling::database::models::{
    AssignmentStatus, RequestQuery, RequestStatus, ReviewDecision, TimeOffApprovalPolicy,
    TimeOffRequestInput, TimeOffReviewInput,
};

mod common;
use common::{TestDb, assignment_input, date, manager, member, time};

fn leave(start_date: chrono::NaiveDate, end_date: chrono::NaiveDate) -> TimeOffRequestInput {
    TimeOffRequestInput {
        user_id: None,
        start_date,
        end_date,
        reason: Some("Vacation".to_string()),
    }
}

fn decide(status: ReviewDecision) -> TimeOffReviewInput {
    TimeOffReviewInput {
        status,
        reviewer_notes: None,
    }
}

#[actix_web::test]
#[serial]
async fn test_approval_rejected_over_confirmed_assignment() {
    let db = TestDb::new().await.unwrap();
    let state = db.state();
    let user = Uuid::new_v4();
    let shift = common::create_shift(&db.pool, date(2026, 2, 10), time(9, 0), time(17, 0)).await;

    let held = state
        .assignment_manager
        .create(&manager(), assignment_input(shift.id, user))
        .await
        .unwrap();
    state
        .assignment_manager
        .confirm(&member(user), held.id)
        .await
        .unwrap();

    let request = state
        .time_off_manager
        .create(&member(user), leave(date(2026, 2, 8), date(2026, 2, 12)))
        .await
        .unwrap();
    assert_eq!(request.status, RequestStatus::Pending);
    assert_eq!(request.user_id, user);

    let result = state
        .time_off_manager
        .review(&manager(), request.id, decide(ReviewDecision::Approved))
        .await;
    match result {
        Err(AppError::Conflict { assignment_ids, .. }) => {
            assert_eq!(assignment_ids, vec![held.id]);
        }
        other => panic!("expected conflict, got {:?}", other),
    }

    let pending = state
        .time_off_manager
        .get(&member(user), request.id)
        .await
        .unwrap();
    assert_eq!(pending.status, RequestStatus::Pending);
    assert_eq!(
        state.assignment_manager.get(held.id).await.unwrap().status,
        AssignmentStatus::Confirmed
    );
}

#[actix_web::test]
#[serial]
async fn test_approval_declines_assignments_under_decline_policy() {
    let db = TestDb::with_config(|config| {
        config.time_off_approval_policy = TimeOffApprovalPolicy::DeclineAssignments
    })
    .await
    .unwrap();
    let state = db.state();
    assert_eq!(
        state.time_off_manager.policy(),
        TimeOffApprovalPolicy::DeclineAssignments
    );
    let user = Uuid::new_v4();
    let inside = common::create_shift(&db.pool, date(2026, 2, 10), time(9, 0), time(17, 0)).await;
    let outside = common::create_shift(&db.pool, date(2026, 2, 14), time(9, 0), time(17, 0)).await;

    let covered = state
        .assignment_manager
        .create(&manager(), assignment_input(inside.id, user))
        .await
        .unwrap();
    let kept = state
        .assignment_manager
        .create(&manager(), assignment_input(outside.id, user))
        .await
        .unwrap();

    let request = state
        .time_off_manager
        .create(&member(user), leave(date(2026, 2, 8), date(2026, 2, 12)))
        .await
        .unwrap();
    let approved = state
        .time_off_manager
        .review(&manager(), request.id, decide(ReviewDecision::Approved))
        .await
        .unwrap();
    assert_eq!(approved.status, RequestStatus::Approved);
    assert!(approved.approved_by.is_some());
    assert!(approved.approved_at.is_some());

    let declined = state.assignment_manager.get(covered.id).await.unwrap();
    assert_eq!(declined.status, AssignmentStatus::Declined);
    assert_eq!(
        declined.notes,
        Some(format!(
            "Declined automatically: time-off request {} approved",
            request.id
        ))
    );
    assert_eq!(
        state.assignment_manager.get(kept.id).await.unwrap().status,
        AssignmentStatus::Assigned
    );

    let again = state
        .time_off_manager
        .review(&manager(), request.id, decide(ReviewDecision::Denied))
        .await;
    assert!(matches!(again, Err(AppError::State(_))));
}

#[actix_web::test]
#[serial]
async fn test_denial_has_no_side_effects() {
    let db = TestDb::new().await.unwrap();
    let state = db.state();
    let user = Uuid::new_v4();
    let shift = common::create_shift(&db.pool, date(2026, 2, 10), time(9, 0), time(17, 0)).await;
    let held = state
        .assignment_manager
        .create(&manager(), assignment_input(shift.id, user))
        .await
        .unwrap();
    let request = state
        .time_off_manager
        .create(&member(user), leave(date(2026, 2, 8), date(2026, 2, 12)))
        .await
        .unwrap();

    let denied = state
        .time_off_manager
        .review(&manager(), request.id, decide(ReviewDecision::Denied))
        .await
        .unwrap();
    assert_eq!(denied.status, RequestStatus::Denied);
    assert_eq!(
        state.assignment_manager.get(held.id).await.unwrap().status,
        AssignmentStatus::Assigned
    );

    let overturned = state
        .time_off_manager
        .review(&manager(), request.id, decide(ReviewDecision::Approved))
        .await;
    assert!(matches!(overturned, Err(AppError::State(_))));

    // Denied leave does not block scheduling.
    let later = common::create_shift(&db.pool, date(2026, 2, 11), time(9, 0), time(17, 0)).await;
    assert!(
        state
            .assignment_manager
            .create(&manager(), assignment_input(later.id, user))
            .await
            .is_ok()
    );
}

#[actix_web::test]
#[serial]
async fn test_invalid_dates_are_rejected() {
    let db = TestDb::new().await.unwrap();
    let state = db.state();
    let user = Uuid::new_v4();

    let result = state
        .time_off_manager
        .create(&member(user), leave(date(2026, 2, 12), date(2026, 2, 8)))
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    // A single day is fine.
    assert!(
        state
            .time_off_manager
            .create(&member(user), leave(date(2026, 2, 12), date(2026, 2, 12)))
            .await
            .is_ok()
    );
}

#[actix_web::test]
#[serial]
async fn test_overlapping_pending_requests_are_allowed() {
    let db = TestDb::new().await.unwrap();
    let state = db.state();
    let user = Uuid::new_v4();

    state
        .time_off_manager
        .create(&member(user), leave(date(2026, 2, 8), date(2026, 2, 12)))
        .await
        .unwrap();
    state
        .time_off_manager
        .create(&member(user), leave(date(2026, 2, 10), date(2026, 2, 14)))
        .await
        .unwrap();

    let mine = state
        .time_off_manager
        .list(
            &member(user),
            &RequestQuery {
                status: Some("pending".to_string()),
                user_id: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(mine.len(), 2);
}

#[actix_web::test]
#[serial]
async fn test_cancel_only_while_pending() {
    let db = TestDb::new().await.unwrap();
    let state = db.state();
    let user = Uuid::new_v4();

    let request = state
        .time_off_manager
        .create(&member(user), leave(date(2026, 2, 8), date(2026, 2, 12)))
        .await
        .unwrap();
    state
        .time_off_manager
        .review(&manager(), request.id, decide(ReviewDecision::Approved))
        .await
        .unwrap();

    let cancel = state.time_off_manager.cancel(&member(user), request.id).await;
    assert!(matches!(cancel, Err(AppError::State(_))));

    let second = state
        .time_off_manager
        .create(&member(user), leave(date(2026, 3, 1), date(2026, 3, 2)))
        .await
        .unwrap();
    let stranger = state
        .time_off_manager
        .cancel(&member(Uuid::new_v4()), second.id)
        .await;
    assert!(matches!(stranger, Err(AppError::Forbidden(_))));

    let cancelled = state
        .time_off_manager
        .cancel(&member(user), second.id)
        .await
        .unwrap();
    assert_eq!(cancelled.status, RequestStatus::Cancelled);
}

#[actix_web::test]
#[serial]
async fn test_review_and_filing_permissions() {
    let db = TestDb::new().await.unwrap();
    let state = db.state();
    let user = Uuid::new_v4();

    let for_other = state
        .time_off_manager
        .create(
            &member(Uuid::new_v4()),
            TimeOffRequestInput {
                user_id: Some(user),
                ..leave(date(2026, 2, 8), date(2026, 2, 9))
            },
        )
        .await;
    assert!(matches!(for_other, Err(AppError::Forbidden(_))));

    let on_behalf = state
        .time_off_manager
        .create(
            &manager(),
            TimeOffRequestInput {
                user_id: Some(user),
                ..leave(date(2026, 2, 8), date(2026, 2, 9))
            },
        )
        .await
        .unwrap();
    assert_eq!(on_behalf.user_id, user);

    let self_review = state
        .time_off_manager
        .review(&member(user), on_behalf.id, decide(ReviewDecision::Approved))
        .await;
    assert!(matches!(self_review, Err(AppError::Forbidden(_))));

    let missing = state
        .time_off_manager
        .review(&manager(), Uuid::new_v4(), decide(ReviewDecision::Approved))
        .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}
