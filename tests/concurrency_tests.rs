use pretty_assertions::assert_eq;
use serial_test::serial;
use std::time::{Duration, Instant};
use uuid::Uuid;

use scheduling::AppError;
use scheduling::database::models::{
    PatternSchedule, ReviewDecision, TimeOffRequestInput, TimeOffReviewInput,
};

mod common;
use common::{MockData, TestAssertions, TestDb, assignment_input, date, manager, member, time};

async fn pooled_db() -> TestDb {
    TestDb::with_config(|config| config.database_max_connections = 4)
        .await
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn test_parallel_bookings_of_one_member_never_overlap() {
    let db = pooled_db().await;
    let state = db.state();
    let user = Uuid::new_v4();

    let mut shift_ids = Vec::new();
    for hour in 8..14 {
        let shift = common::create_shift(&db.pool, date(2026, 4, 1), time(hour, 0), time(hour + 6, 0)).await;
        shift_ids.push(shift.id);
    }

    let handles: Vec<_> = shift_ids
        .into_iter()
        .map(|shift_id| {
            let manager_service = state.assignment_manager.clone();
            tokio::spawn(async move {
                manager_service
                    .create(&manager(), assignment_input(shift_id, user))
                    .await
            })
        })
        .collect();

    let mut created = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => created += 1,
            Err(AppError::Conflict { .. }) => {}
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    assert_eq!(created, 1);
    TestAssertions::assert_record_count(&db.pool, "assignments", 1).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn test_parallel_bookings_of_different_members_all_succeed() {
    let db = pooled_db().await;
    let state = db.state();
    let shift = common::create_shift(&db.pool, date(2026, 4, 2), time(8, 0), time(16, 0)).await;

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let manager_service = state.assignment_manager.clone();
            let shift_id = shift.id;
            tokio::spawn(async move {
                manager_service
                    .create(&manager(), assignment_input(shift_id, Uuid::new_v4()))
                    .await
            })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().expect("unrelated bookings never block each other");
    }

    TestAssertions::assert_record_count(&db.pool, "assignments", 8).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn test_parallel_generation_creates_each_date_once() {
    let db = pooled_db().await;
    let state = db.state();
    let pattern = common::create_pattern(
        &db.pool,
        &MockData::pattern(date(2026, 1, 1), PatternSchedule::Daily),
    )
    .await;

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let generator = state.shift_generator.clone();
            let pattern_id = pattern.id;
            tokio::spawn(async move {
                generator
                    .generate(&manager(), pattern_id, date(2026, 1, 1), date(2026, 1, 31))
                    .await
            })
        })
        .collect();

    let mut created = 0;
    let mut skipped = 0;
    for handle in handles {
        let result = handle.await.unwrap().expect("every generation run succeeds");
        created += result.shifts_created;
        skipped += result.shifts_skipped;
    }

    assert_eq!(created, 31);
    assert_eq!(skipped, 31 * 3);
    TestAssertions::assert_record_count(&db.pool, "shifts", 31).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn test_leave_approval_races_assignment() {
    let db = pooled_db().await;
    let state = db.state();
    let user = Uuid::new_v4();
    let shift = common::create_shift(&db.pool, date(2026, 2, 10), time(9, 0), time(17, 0)).await;

    let request = state
        .time_off_manager
        .create(
            &member(user),
            TimeOffRequestInput {
                user_id: None,
                start_date: date(2026, 2, 8),
                end_date: date(2026, 2, 12),
                reason: None,
            },
        )
        .await
        .unwrap();

    let time_off = state.time_off_manager.clone();
    let approval = tokio::spawn(async move {
        time_off
            .review(
                &manager(),
                request.id,
                TimeOffReviewInput {
                    status: ReviewDecision::Approved,
                    reviewer_notes: None,
                },
            )
            .await
    });
    let assignments = state.assignment_manager.clone();
    let booking = tokio::spawn(async move {
        assignments
            .create(&manager(), assignment_input(shift.id, user))
            .await
    });

    let approval = approval.await.unwrap();
    let booking = booking.await.unwrap();

    // Whichever runs second sees the first and backs off.
    assert!(
        approval.is_ok() != booking.is_ok(),
        "approval: {:?}, booking: {:?}",
        approval,
        booking
    );
    assert!(matches!(
        approval.err().or(booking.err()),
        Some(AppError::Conflict { .. })
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[serial]
async fn test_write_is_retried_past_a_held_lock() {
    let db = pooled_db().await;
    let state = db.state();
    let user = Uuid::new_v4();

    // Hold the write lock past one busy timeout but release it within the retry.
    let blocker = db.pool.begin_with("BEGIN IMMEDIATE").await.unwrap();
    let started = Instant::now();
    let time_off = state.time_off_manager.clone();
    let filing = tokio::spawn(async move {
        time_off
            .create(
                &member(user),
                TimeOffRequestInput {
                    user_id: None,
                    start_date: date(2026, 5, 4),
                    end_date: date(2026, 5, 8),
                    reason: None,
                },
            )
            .await
    });

    tokio::time::sleep(Duration::from_millis(2500)).await;
    blocker.rollback().await.unwrap();

    let request = filing.await.unwrap().expect("second attempt goes through");
    assert!(started.elapsed() >= Duration::from_secs(2));
    assert_eq!(request.user_id, user);
    TestAssertions::assert_record_count(&db.pool, "time_off_requests", 1).await;
}
