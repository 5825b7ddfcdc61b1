use pretty_assertions::assert_eq;
use serial_test::serial;
use uuid::Uuid;

use scheduling::AppError;
use scheduling::database::models::{
    Action, AssignmentStatus, AssignmentUpdateInput, EntityType, Position, ReviewDecision,
    TimeOffRequestInput, TimeOffReviewInput,
};
use scheduling::database::repositories::activity;
use scheduling::services::ConflictDetector;
use scheduling::services::time_window::LocalSlot;

mod common;
use common::{TestAssertions, TestDb, assignment_input, date, manager, member, time};

#[actix_web::test]
#[serial]
async fn test_overlapping_assignment_is_rejected() {
    let db = TestDb::new().await.unwrap();
    let state = db.state();
    let user = Uuid::new_v4();

    let morning = common::create_shift(&db.pool, date(2026, 2, 10), time(8, 0), time(16, 0)).await;
    let midday = common::create_shift(&db.pool, date(2026, 2, 10), time(12, 0), time(20, 0)).await;

    let held = state
        .assignment_manager
        .create(&manager(), assignment_input(morning.id, user))
        .await
        .unwrap();
    assert_eq!(held.status, AssignmentStatus::Assigned);

    let result = state
        .assignment_manager
        .create(&manager(), assignment_input(midday.id, user))
        .await;
    match result {
        Err(AppError::Conflict { assignment_ids, .. }) => {
            assert_eq!(assignment_ids, vec![held.id]);
        }
        other => panic!("expected conflict, got {:?}", other),
    }
    TestAssertions::assert_record_count(&db.pool, "assignments", 1).await;
}

#[actix_web::test]
#[serial]
async fn test_overnight_shift_conflicts_with_next_morning() {
    let db = TestDb::new().await.unwrap();
    let state = db.state();
    let user = Uuid::new_v4();

    let night = common::create_shift(&db.pool, date(2026, 2, 10), time(22, 0), time(6, 0)).await;
    let early = common::create_shift(&db.pool, date(2026, 2, 11), time(5, 0), time(13, 0)).await;
    let day = common::create_shift(&db.pool, date(2026, 2, 11), time(6, 0), time(14, 0)).await;

    state
        .assignment_manager
        .create(&manager(), assignment_input(night.id, user))
        .await
        .unwrap();

    let overlapping = state
        .assignment_manager
        .create(&manager(), assignment_input(early.id, user))
        .await;
    assert!(matches!(overlapping, Err(AppError::Conflict { .. })));

    // Ends at 06:00, the next starts at 06:00: touching is fine.
    let touching = state
        .assignment_manager
        .create(&manager(), assignment_input(day.id, user))
        .await;
    assert!(touching.is_ok());
}

#[actix_web::test]
#[serial]
async fn test_same_shift_twice_is_a_conflict() {
    let db = TestDb::new().await.unwrap();
    let state = db.state();
    let user = Uuid::new_v4();
    let shift = common::create_shift(&db.pool, date(2026, 2, 10), time(8, 0), time(16, 0)).await;

    state
        .assignment_manager
        .create(&member(user), assignment_input(shift.id, user))
        .await
        .unwrap();
    let again = state
        .assignment_manager
        .create(&member(user), assignment_input(shift.id, user))
        .await;
    assert!(matches!(again, Err(AppError::Conflict { .. })));
}

#[actix_web::test]
#[serial]
async fn test_members_cannot_assign_others() {
    let db = TestDb::new().await.unwrap();
    let state = db.state();
    let shift = common::create_shift(&db.pool, date(2026, 2, 10), time(8, 0), time(16, 0)).await;

    let result = state
        .assignment_manager
        .create(
            &member(Uuid::new_v4()),
            assignment_input(shift.id, Uuid::new_v4()),
        )
        .await;
    assert!(matches!(result, Err(AppError::Forbidden(_))));

    let missing = state
        .assignment_manager
        .create(&manager(), assignment_input(Uuid::new_v4(), Uuid::new_v4()))
        .await;
    assert!(matches!(missing, Err(AppError::NotFound(_))));
}

#[actix_web::test]
#[serial]
async fn test_status_lifecycle() {
    let db = TestDb::new().await.unwrap();
    let state = db.state();
    let user = Uuid::new_v4();
    let shift = common::create_shift(&db.pool, date(2026, 2, 10), time(8, 0), time(16, 0)).await;
    let holder = member(user);

    let created = state
        .assignment_manager
        .create(&manager(), assignment_input(shift.id, user))
        .await
        .unwrap();

    let confirmed = state
        .assignment_manager
        .confirm(&holder, created.id)
        .await
        .unwrap();
    assert_eq!(confirmed.status, AssignmentStatus::Confirmed);
    assert!(confirmed.confirmed_at.is_some());

    // Confirming twice is not a legal move.
    let twice = state.assignment_manager.confirm(&holder, created.id).await;
    assert!(matches!(twice, Err(AppError::State(_))));

    // Only management records no-shows.
    let self_no_show = state.assignment_manager.mark_no_show(&holder, created.id).await;
    assert!(matches!(self_no_show, Err(AppError::Forbidden(_))));

    let no_show = state
        .assignment_manager
        .mark_no_show(&manager(), created.id)
        .await
        .unwrap();
    assert_eq!(no_show.status, AssignmentStatus::NoShow);

    // Terminal statuses are final.
    let after = state.assignment_manager.cancel(&manager(), created.id).await;
    assert!(matches!(after, Err(AppError::State(_))));
    let edit = state
        .assignment_manager
        .update(
            &manager(),
            created.id,
            AssignmentUpdateInput {
                position: None,
                notes: Some("late".to_string()),
            },
        )
        .await;
    assert!(matches!(edit, Err(AppError::State(_))));
}

#[actix_web::test]
#[serial]
async fn test_declined_assignment_frees_the_slot() {
    let db = TestDb::new().await.unwrap();
    let state = db.state();
    let user = Uuid::new_v4();
    let first = common::create_shift(&db.pool, date(2026, 2, 10), time(8, 0), time(16, 0)).await;
    let second = common::create_shift(&db.pool, date(2026, 2, 10), time(9, 0), time(17, 0)).await;

    let held = state
        .assignment_manager
        .create(&member(user), assignment_input(first.id, user))
        .await
        .unwrap();
    state
        .assignment_manager
        .decline(&member(user), held.id)
        .await
        .unwrap();

    let replacement = state
        .assignment_manager
        .create(&member(user), assignment_input(second.id, user))
        .await;
    assert!(replacement.is_ok());
}

#[actix_web::test]
#[serial]
async fn test_position_changes_need_a_manager() {
    let db = TestDb::new().await.unwrap();
    let state = db.state();
    let user = Uuid::new_v4();
    let shift = common::create_shift(&db.pool, date(2026, 2, 10), time(8, 0), time(16, 0)).await;
    let held = state
        .assignment_manager
        .create(&manager(), assignment_input(shift.id, user))
        .await
        .unwrap();

    let by_member = state
        .assignment_manager
        .update(
            &member(user),
            held.id,
            AssignmentUpdateInput {
                position: Some(Position::Captain),
                notes: None,
            },
        )
        .await;
    assert!(matches!(by_member, Err(AppError::Forbidden(_))));

    let notes_only = state
        .assignment_manager
        .update(
            &member(user),
            held.id,
            AssignmentUpdateInput {
                position: None,
                notes: Some("bringing spare gear".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(notes_only.notes.as_deref(), Some("bringing spare gear"));
    assert_eq!(notes_only.position, Position::Firefighter);

    let promoted = state
        .assignment_manager
        .update(
            &manager(),
            held.id,
            AssignmentUpdateInput {
                position: Some(Position::Captain),
                notes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(promoted.position, Position::Captain);
    assert_eq!(promoted.notes.as_deref(), Some("bringing spare gear"));
}

#[actix_web::test]
#[serial]
async fn test_removing_confirmed_assignment_needs_override() {
    let db = TestDb::new().await.unwrap();
    let state = db.state();
    let user = Uuid::new_v4();
    let shift = common::create_shift(&db.pool, date(2026, 2, 10), time(8, 0), time(16, 0)).await;
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

    let plain = state.assignment_manager.remove(&manager(), held.id, false).await;
    assert!(matches!(plain, Err(AppError::State(_))));

    let member_override = state
        .assignment_manager
        .remove(&member(user), held.id, true)
        .await;
    assert!(matches!(member_override, Err(AppError::Forbidden(_))));

    state
        .assignment_manager
        .remove(&manager(), held.id, true)
        .await
        .unwrap();
    TestAssertions::assert_record_count(&db.pool, "assignments", 0).await;

    let gone = state.assignment_manager.get(held.id).await;
    assert!(matches!(gone, Err(AppError::NotFound(_))));
}

#[actix_web::test]
#[serial]
async fn test_approved_time_off_blocks_assignment() {
    let db = TestDb::new().await.unwrap();
    let state = db.state();
    let user = Uuid::new_v4();

    let leave = state
        .time_off_manager
        .create(
            &member(user),
            TimeOffRequestInput {
                user_id: None,
                start_date: date(2026, 2, 8),
                end_date: date(2026, 2, 12),
                reason: Some("Vacation".to_string()),
            },
        )
        .await
        .unwrap();
    state
        .time_off_manager
        .review(
            &manager(),
            leave.id,
            TimeOffReviewInput {
                status: ReviewDecision::Approved,
                reviewer_notes: None,
            },
        )
        .await
        .unwrap();

    let shift = common::create_shift(&db.pool, date(2026, 2, 10), time(8, 0), time(16, 0)).await;
    let result = state
        .assignment_manager
        .create(&manager(), assignment_input(shift.id, user))
        .await;
    match result {
        Err(AppError::Conflict {
            message,
            assignment_ids,
        }) => {
            assert!(assignment_ids.is_empty());
            assert!(message.contains("approved time off"));
        }
        other => panic!("expected conflict, got {:?}", other),
    }

    // Outside the leave the member is free.
    let after = common::create_shift(&db.pool, date(2026, 2, 13), time(8, 0), time(16, 0)).await;
    assert!(
        state
            .assignment_manager
            .create(&manager(), assignment_input(after.id, user))
            .await
            .is_ok()
    );
}

#[actix_web::test]
#[serial]
async fn test_listing_flags_conflicted_assignments() {
    let db = TestDb::new().await.unwrap();
    let state = db.state();
    let user = Uuid::new_v4();
    let first = common::create_shift(&db.pool, date(2026, 2, 10), time(8, 0), time(16, 0)).await;
    let second = common::create_shift(&db.pool, date(2026, 2, 10), time(14, 0), time(22, 0)).await;
    let colleague = Uuid::new_v4();

    // Rows written behind the services' back, e.g. by an import.
    common::force_assignment(&db.pool, first.id, user).await;
    common::force_assignment(&db.pool, second.id, user).await;
    common::force_assignment(&db.pool, first.id, colleague).await;

    let details = state
        .assignment_manager
        .list(&manager(), first.id)
        .await
        .unwrap();
    assert_eq!(details.len(), 2);
    for detail in &details {
        let expected = detail.assignment.user_id == user;
        assert_eq!(detail.is_conflicted, expected);
    }
}

#[actix_web::test]
#[serial]
async fn test_members_see_only_their_own_schedule() {
    let db = TestDb::new().await.unwrap();
    let state = db.state();
    let user = Uuid::new_v4();
    let shift = common::create_shift(&db.pool, date(2026, 2, 10), time(8, 0), time(16, 0)).await;
    state
        .assignment_manager
        .create(&manager(), assignment_input(shift.id, user))
        .await
        .unwrap();

    let own = state
        .assignment_manager
        .list_for_user(&member(user), user)
        .await
        .unwrap();
    assert_eq!(own.len(), 1);

    let other = state
        .assignment_manager
        .list_for_user(&member(Uuid::new_v4()), user)
        .await;
    assert!(matches!(other, Err(AppError::Forbidden(_))));
}

#[actix_web::test]
#[serial]
async fn test_detector_checks_without_writing() {
    let db = TestDb::new().await.unwrap();
    let user = Uuid::new_v4();
    let night = common::create_shift(&db.pool, date(2026, 2, 10), time(22, 0), time(6, 0)).await;
    common::force_assignment(&db.pool, night.id, user).await;

    let detector = ConflictDetector::new(chrono_tz::Tz::UTC);
    let mut conn = db.pool.acquire().await.unwrap();

    let early = LocalSlot::new(date(2026, 2, 11), time(5, 0), time(7, 0));
    let later = LocalSlot::new(date(2026, 2, 11), time(6, 0), time(7, 0));
    assert!(detector.has_conflict(&mut *conn, user, early).await.unwrap());
    assert!(!detector.has_conflict(&mut *conn, user, later).await.unwrap());
    assert!(
        !detector
            .has_conflict(&mut *conn, Uuid::new_v4(), early)
            .await
            .unwrap()
    );
}

#[actix_web::test]
#[serial]
async fn test_transitions_are_recorded_in_activity_log() {
    let db = TestDb::new().await.unwrap();
    let state = db.state();
    let user = Uuid::new_v4();
    let shift = common::create_shift(&db.pool, date(2026, 2, 10), time(8, 0), time(16, 0)).await;

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

    let mut conn = db.pool.acquire().await.unwrap();
    let entries = activity::find_by_entity(&mut *conn, EntityType::ASSIGNMENT, held.id)
        .await
        .unwrap();
    let mut actions: Vec<_> = entries.iter().map(|e| e.action.as_str()).collect();
    actions.sort_unstable();
    assert_eq!(actions, vec![Action::CONFIRMED, Action::CREATED]);

    let confirmed_by = entries
        .iter()
        .find(|e| e.action == Action::CONFIRMED)
        .and_then(|e| e.actor_id);
    assert_eq!(confirmed_by, Some(user));
}
