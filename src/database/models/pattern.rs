use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;
use crate::error::AppError;

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "snake_case")]
    pub enum PatternType {
        Daily => "daily",
        Weekly => "weekly",
        Platoon => "platoon",
        Custom => "custom",
    }
}

/// Recurrence rule of a pattern. Weekday numbers run 0 (Sunday) to 6 (Saturday).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "pattern_type", rename_all = "snake_case")]
pub enum PatternSchedule {
    Daily,
    Weekly {
        weekdays: Vec<u8>,
    },
    Platoon {
        days_on: u32,
        days_off: u32,
        rotation_days: u32,
    },
    Custom {
        schedule_config: CustomRule,
    },
}

impl PatternSchedule {
    pub fn pattern_type(&self) -> PatternType {
        match self {
            PatternSchedule::Daily => PatternType::Daily,
            PatternSchedule::Weekly { .. } => PatternType::Weekly,
            PatternSchedule::Platoon { .. } => PatternType::Platoon,
            PatternSchedule::Custom { .. } => PatternType::Custom,
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        match self {
            PatternSchedule::Daily => Ok(()),
            PatternSchedule::Weekly { weekdays } => {
                if weekdays.is_empty() {
                    return Err(AppError::Validation(
                        "Weekly patterns need at least one weekday".to_string(),
                    ));
                }
                if let Some(day) = weekdays.iter().find(|d| **d > 6) {
                    return Err(AppError::Validation(format!(
                        "Weekday {} is out of range 0-6",
                        day
                    )));
                }
                Ok(())
            }
            PatternSchedule::Platoon {
                days_on,
                days_off,
                rotation_days,
            } => {
                if *rotation_days < 1 {
                    return Err(AppError::Validation(
                        "rotation_days must be at least 1".to_string(),
                    ));
                }
                if days_on
                    .checked_add(*days_off)
                    .is_none_or(|cycle| cycle > *rotation_days)
                {
                    return Err(AppError::Validation(format!(
                        "days_on ({}) + days_off ({}) exceeds rotation_days ({})",
                        days_on, days_off, rotation_days
                    )));
                }
                Ok(())
            }
            PatternSchedule::Custom { schedule_config } => schedule_config.validate(),
        }
    }
}

/// Well-defined rule kinds for custom patterns.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CustomRule {
    /// Exactly the listed dates.
    DateList { dates: Vec<NaiveDate> },
    /// The nth (1-5, or -1 for last) given weekday of every month.
    NthWeekdayOfMonth { nth: i8, weekday: u8 },
}

impl CustomRule {
    pub fn validate(&self) -> Result<(), AppError> {
        match self {
            CustomRule::DateList { dates } if dates.is_empty() => Err(AppError::Validation(
                "date_list rules need at least one date".to_string(),
            )),
            CustomRule::DateList { .. } => Ok(()),
            CustomRule::NthWeekdayOfMonth { nth, weekday } => {
                if !(*nth == -1 || (1..=5).contains(nth)) {
                    return Err(AppError::Validation(format!(
                        "nth must be 1-5 or -1, got {}",
                        nth
                    )));
                }
                if *weekday > 6 {
                    return Err(AppError::Validation(format!(
                        "Weekday {} is out of range 0-6",
                        weekday
                    )));
                }
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pattern {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub pattern_type: PatternType,
    pub template_id: Option<Uuid>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub schedule: PatternSchedule,
    pub assigned_members: Vec<Uuid>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Pattern {
    /// Clamp a requested range to the pattern's own bounds. `None` when the
    /// two do not intersect.
    pub fn clamp_range(
        &self,
        range_start: NaiveDate,
        range_end: NaiveDate,
    ) -> Option<(NaiveDate, NaiveDate)> {
        let start = range_start.max(self.start_date);
        let end = match self.end_date {
            Some(end_date) => range_end.min(end_date),
            None => range_end,
        };
        (start <= end).then_some((start, end))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternInput {
    pub name: String,
    pub description: Option<String>,
    pub template_id: Option<Uuid>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub schedule: PatternSchedule,
    #[serde(default)]
    pub assigned_members: Vec<Uuid>,
}

impl PatternInput {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("Pattern name is required".to_string()));
        }
        if let Some(end_date) = self.end_date {
            if end_date < self.start_date {
                return Err(AppError::Validation(
                    "end_date must not be before start_date".to_string(),
                ));
            }
        }
        if self.template_id.is_none() && (self.start_time.is_none() || self.end_time.is_none()) {
            return Err(AppError::Validation(
                "Patterns without a template need start_time and end_time".to_string(),
            ));
        }
        self.schedule.validate()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateShiftsInput {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenerationResult {
    pub shifts_created: u32,
    pub shifts_skipped: u32,
}
