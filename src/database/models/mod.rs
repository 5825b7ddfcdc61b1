pub mod activity;
pub mod assignment;
pub(crate) mod macros;
pub mod pattern;
pub mod shift;
pub mod swap;
pub mod template;
pub mod time_off;
pub mod workflow;

// Re-export all models for easy importing
pub use activity::*;
pub use assignment::*;
pub use pattern::*;
pub use shift::*;
pub use swap::*;
pub use template::*;
pub use time_off::*;
pub use workflow::*;
