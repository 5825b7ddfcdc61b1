//! Storage access as free functions over a `SqliteConnection`.
//!
//! Callers pass either a pooled connection or `&mut *tx`, so a service can run
//! several repository calls and its activity entry inside one transaction.

pub mod activity;
pub mod assignment;
pub mod pattern;
pub mod shift;
pub mod swap;
pub mod template;
pub mod time_off;
