pub mod activity_logger;
pub mod assignment_manager;
pub mod auth;
pub mod conflict_detector;
pub mod recurrence;
pub mod shift_generator;
pub mod swap_negotiator;
pub mod time_off_manager;
pub mod time_window;
pub mod user_context;
pub mod user_locks;
pub mod workflow;

pub use activity_logger::ActivityLogger;
pub use assignment_manager::AssignmentManager;
pub use auth::{Claims, Role};
pub use conflict_detector::{Conflict, ConflictDetector};
pub use shift_generator::ShiftGenerator;
pub use swap_negotiator::SwapNegotiator;
pub use time_off_manager::TimeOffManager;
pub use user_context::Actor;
pub use user_locks::UserLocks;
