use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;

/// A named shift shape. Shifts copy these times when they are generated, so
/// editing a template only affects future generations.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ShiftTemplate {
    pub id: Uuid,
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub duration_hours: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftTemplateInput {
    pub name: String,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl ShiftTemplateInput {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("Template name is required".to_string()));
        }
        Ok(())
    }

    pub fn duration_hours(&self) -> f64 {
        wall_clock_hours(self.start_time, self.end_time)
    }
}

/// Nominal length of a shift window. An end at or before the start rolls over
/// to the next day, so 07:00-07:00 is a 24 hour shift.
pub fn wall_clock_hours(start: NaiveTime, end: NaiveTime) -> f64 {
    let minutes = (end - start).num_minutes();
    let minutes = if minutes <= 0 { minutes + 24 * 60 } else { minutes };
    minutes as f64 / 60.0
}
