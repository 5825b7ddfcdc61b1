use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Shift {
    pub id: Uuid,
    pub pattern_id: Option<Uuid>,
    pub shift_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Manually created shift, not owned by any pattern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftInput {
    pub shift_date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub notes: Option<String>,
}

/// Shift as returned to clients, with the window resolved in the organization zone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftDetail {
    #[serde(flatten)]
    pub shift: Shift,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub duration_hours: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShiftQuery {
    pub pattern_id: Uuid,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}
