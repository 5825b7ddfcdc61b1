#![allow(dead_code)]

use anyhow::Result;
use chrono::{NaiveDate, NaiveTime};
use chrono_tz::Tz;
use serde::de::DeserializeOwned;
use sqlx::SqlitePool;
use tempfile::TempDir;
use uuid::Uuid;

use scheduling::config::Config;
use scheduling::database::init_database;
use scheduling::database::models::*;
use scheduling::database::repositories::assignment::{self, NewAssignment};
use scheduling::database::repositories::{pattern, shift, template};
use scheduling::handlers::shared::ApiResponse;
use scheduling::services::auth::issue_token;
use scheduling::services::{Actor, Role};
use scheduling::AppState;

// Test database on a temp file, migrated like production
pub struct TestDb {
    pub pool: SqlitePool,
    pub config: Config,
    _temp_dir: TempDir,
}

impl TestDb {
    pub async fn new() -> Result<Self> {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(adjust: impl FnOnce(&mut Config)) -> Result<Self> {
        let temp_dir = TempDir::new()?;
        let database_url = format!("sqlite:{}/test.db", temp_dir.path().display());

        let mut config = Config::test_config(&database_url);
        adjust(&mut config);
        let pool = init_database(&config).await?;

        Ok(TestDb {
            pool,
            config,
            _temp_dir: temp_dir,
        })
    }

    pub fn state(&self) -> AppState {
        AppState::new(self.pool.clone(), &self.config)
    }
}

pub fn manager() -> Actor {
    Actor::new(Uuid::new_v4(), Role::Manager, Tz::UTC)
}

pub fn member(user_id: Uuid) -> Actor {
    Actor::new(user_id, Role::Member, Tz::UTC)
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub struct MockData;

impl MockData {
    pub fn template(start: NaiveTime, end: NaiveTime) -> ShiftTemplateInput {
        ShiftTemplateInput {
            name: "Day shift".to_string(),
            start_time: start,
            end_time: end,
        }
    }

    pub fn pattern(start_date: NaiveDate, schedule: PatternSchedule) -> PatternInput {
        PatternInput {
            name: "A platoon".to_string(),
            description: None,
            template_id: None,
            start_date,
            end_date: None,
            start_time: Some(time(7, 0)),
            end_time: Some(time(7, 0)),
            schedule,
            assigned_members: vec![],
        }
    }
}

pub async fn create_template(pool: &SqlitePool, input: &ShiftTemplateInput) -> ShiftTemplate {
    let mut conn = pool.acquire().await.unwrap();
    template::create_template(&mut *conn, input).await.unwrap()
}

pub async fn create_pattern(pool: &SqlitePool, input: &PatternInput) -> Pattern {
    let mut conn = pool.acquire().await.unwrap();
    pattern::create_pattern(&mut *conn, input).await.unwrap()
}

pub async fn create_shift(
    pool: &SqlitePool,
    shift_date: NaiveDate,
    start_time: NaiveTime,
    end_time: NaiveTime,
) -> Shift {
    let mut conn = pool.acquire().await.unwrap();
    shift::create_manual(
        &mut *conn,
        &ShiftInput {
            shift_date,
            start_time,
            end_time,
            notes: None,
        },
    )
    .await
    .unwrap()
}

/// Insert an assignment without any conflict checks, to set up states the
/// services would refuse to produce.
pub async fn force_assignment(pool: &SqlitePool, shift_id: Uuid, user_id: Uuid) -> Assignment {
    let mut conn = pool.acquire().await.unwrap();
    assignment::insert(
        &mut *conn,
        NewAssignment {
            shift_id,
            user_id,
            position: Position::Firefighter,
            assigned_by: user_id,
            notes: None,
        },
    )
    .await
    .unwrap()
}

pub fn assignment_input(shift_id: Uuid, user_id: Uuid) -> AssignmentInput {
    AssignmentInput {
        shift_id,
        user_id,
        position: Position::Firefighter,
        notes: None,
    }
}

pub struct AuthHelper;

impl AuthHelper {
    pub fn token(config: &Config, user_id: Uuid, role: Role) -> String {
        issue_token(config, user_id, role, None).unwrap()
    }

    pub fn auth_header(token: &str) -> (&'static str, String) {
        ("Authorization", format!("Bearer {}", token))
    }
}

pub struct TestAssertions;

impl TestAssertions {
    pub fn assert_success_response<T: DeserializeOwned>(body: &[u8]) -> T {
        let response: ApiResponse<T> =
            serde_json::from_slice(body).expect("Failed to parse response");
        assert!(response.success, "Expected success response");
        response.data.expect("Expected data in success response")
    }

    pub fn assert_error_response(body: &[u8]) -> ApiResponse<serde_json::Value> {
        let response: ApiResponse<serde_json::Value> =
            serde_json::from_slice(body).expect("Failed to parse response");
        assert!(!response.success, "Expected error response");
        response
    }

    pub async fn assert_record_count(pool: &SqlitePool, table: &str, expected_count: i64) {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(pool)
            .await
            .expect("Failed to count records");
        assert_eq!(
            count, expected_count,
            "Expected {} records in {}, found {}",
            expected_count, table, count
        );
    }
}
