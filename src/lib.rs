pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod services;

use sqlx::SqlitePool;

pub use config::Config;
pub use error::AppError;

use services::{AssignmentManager, ShiftGenerator, SwapNegotiator, TimeOffManager, UserLocks};

/// Shared handles for the request handlers. All services share one set of
/// member locks, so every write path serializes on the same member.
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub shift_generator: ShiftGenerator,
    pub assignment_manager: AssignmentManager,
    pub swap_negotiator: SwapNegotiator,
    pub time_off_manager: TimeOffManager,
}

impl AppState {
    pub fn new(pool: SqlitePool, config: &Config) -> Self {
        let locks = UserLocks::new();

        Self {
            shift_generator: ShiftGenerator::new(
                pool.clone(),
                locks.clone(),
                config.generation_max_days,
            ),
            assignment_manager: AssignmentManager::new(pool.clone(), locks.clone()),
            swap_negotiator: SwapNegotiator::new(pool.clone(), locks.clone()),
            time_off_manager: TimeOffManager::new(
                pool.clone(),
                locks,
                config.time_off_approval_policy,
            ),
            pool,
        }
    }
}
