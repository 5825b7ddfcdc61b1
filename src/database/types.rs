use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use uuid::Uuid;

use super::models::{CustomRule, Pattern, PatternSchedule, PatternType};
use crate::error::AppError;

// Database row type that matches the flattened patterns table
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PatternRow {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub pattern_type: PatternType,
    pub template_id: Option<Uuid>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub weekdays: Option<String>,
    pub days_on: Option<i64>,
    pub days_off: Option<i64>,
    pub rotation_days: Option<i64>,
    pub schedule_config: Option<String>,
    pub assigned_members: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Type-specific columns of a schedule, as bound on insert/update.
#[derive(Debug, Clone, Default)]
pub struct ScheduleColumns {
    pub weekdays: Option<String>,
    pub days_on: Option<i64>,
    pub days_off: Option<i64>,
    pub rotation_days: Option<i64>,
    pub schedule_config: Option<String>,
}

impl ScheduleColumns {
    pub fn from_schedule(schedule: &PatternSchedule) -> Result<Self, AppError> {
        let columns = match schedule {
            PatternSchedule::Daily => Self::default(),
            PatternSchedule::Weekly { weekdays } => {
                let mut days = weekdays.clone();
                days.sort_unstable();
                days.dedup();
                Self {
                    weekdays: Some(to_json(&days)?),
                    ..Self::default()
                }
            }
            PatternSchedule::Platoon {
                days_on,
                days_off,
                rotation_days,
            } => Self {
                days_on: Some(i64::from(*days_on)),
                days_off: Some(i64::from(*days_off)),
                rotation_days: Some(i64::from(*rotation_days)),
                ..Self::default()
            },
            PatternSchedule::Custom { schedule_config } => Self {
                schedule_config: Some(to_json(schedule_config)?),
                ..Self::default()
            },
        };
        Ok(columns)
    }
}

pub fn to_json<T: serde::Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string(value).map_err(|e| {
        AppError::internal_server_error_message(format!("Failed to encode column: {}", e))
    })
}

fn from_json<T: serde::de::DeserializeOwned>(column: &str, raw: &str) -> Result<T, AppError> {
    serde_json::from_str(raw).map_err(|e| {
        AppError::internal_server_error_message(format!("Corrupt {} column: {}", column, e))
    })
}

fn required<T>(column: &str, value: Option<T>) -> Result<T, AppError> {
    value.ok_or_else(|| {
        AppError::internal_server_error_message(format!("Missing {} column", column))
    })
}

fn non_negative(column: &str, value: Option<i64>) -> Result<u32, AppError> {
    let value = required(column, value)?;
    u32::try_from(value).map_err(|_| {
        AppError::internal_server_error_message(format!("Out of range {} column", column))
    })
}

// Conversion functions
impl TryFrom<PatternRow> for Pattern {
    type Error = AppError;

    fn try_from(row: PatternRow) -> Result<Self, Self::Error> {
        let schedule = match row.pattern_type {
            PatternType::Daily => PatternSchedule::Daily,
            PatternType::Weekly => PatternSchedule::Weekly {
                weekdays: from_json("weekdays", &required("weekdays", row.weekdays)?)?,
            },
            PatternType::Platoon => PatternSchedule::Platoon {
                days_on: non_negative("days_on", row.days_on)?,
                days_off: non_negative("days_off", row.days_off)?,
                rotation_days: non_negative("rotation_days", row.rotation_days)?,
            },
            PatternType::Custom => PatternSchedule::Custom {
                schedule_config: from_json::<CustomRule>(
                    "schedule_config",
                    &required("schedule_config", row.schedule_config)?,
                )?,
            },
        };

        Ok(Self {
            id: row.id,
            name: row.name,
            description: row.description,
            pattern_type: row.pattern_type,
            template_id: row.template_id,
            start_date: row.start_date,
            end_date: row.end_date,
            start_time: row.start_time,
            end_time: row.end_time,
            schedule,
            assigned_members: from_json("assigned_members", &row.assigned_members)?,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn row(pattern_type: PatternType) -> PatternRow {
        PatternRow {
            id: Uuid::new_v4(),
            name: "B shift".to_string(),
            description: None,
            pattern_type,
            template_id: None,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            end_date: None,
            start_time: NaiveTime::from_hms_opt(7, 0, 0),
            end_time: NaiveTime::from_hms_opt(7, 0, 0),
            weekdays: None,
            days_on: None,
            days_off: None,
            rotation_days: None,
            schedule_config: None,
            assigned_members: "[]".to_string(),
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn platoon_row_becomes_platoon_schedule() {
        let mut platoon = row(PatternType::Platoon);
        let columns = ScheduleColumns::from_schedule(&PatternSchedule::Platoon {
            days_on: 2,
            days_off: 2,
            rotation_days: 4,
        })
        .unwrap();
        platoon.days_on = columns.days_on;
        platoon.days_off = columns.days_off;
        platoon.rotation_days = columns.rotation_days;

        let pattern = Pattern::try_from(platoon).unwrap();
        assert_eq!(
            pattern.schedule,
            PatternSchedule::Platoon {
                days_on: 2,
                days_off: 2,
                rotation_days: 4
            }
        );
    }

    #[test]
    fn weekly_columns_are_sorted_and_deduplicated() {
        let columns = ScheduleColumns::from_schedule(&PatternSchedule::Weekly {
            weekdays: vec![5, 1, 3, 1],
        })
        .unwrap();
        assert_eq!(columns.weekdays.as_deref(), Some("[1,3,5]"));
    }

    #[test]
    fn missing_type_columns_are_reported() {
        let weekly = row(PatternType::Weekly);
        assert!(Pattern::try_from(weekly).is_err());
    }
}
