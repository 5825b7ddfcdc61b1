pub mod assignments;
pub mod patterns;
pub mod shared;
pub mod shifts;
pub mod swaps;
pub mod templates;
pub mod time_off;
