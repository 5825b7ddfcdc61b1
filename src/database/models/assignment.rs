use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "snake_case")]
    pub enum Position {
        Officer => "officer",
        Driver => "driver",
        Firefighter => "firefighter",
        Ems => "ems",
        Captain => "captain",
        Lieutenant => "lieutenant",
        Probationary => "probationary",
        Volunteer => "volunteer",
        Other => "other",
    }
}

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "snake_case")]
    pub enum AssignmentStatus {
        Assigned => "assigned",
        Confirmed => "confirmed",
        Declined => "declined",
        NoShow => "no_show",
        Cancelled => "cancelled",
    }
}

impl AssignmentStatus {
    pub const ACTIVE: [AssignmentStatus; 2] = [AssignmentStatus::Assigned, AssignmentStatus::Confirmed];

    /// Assigned and confirmed assignments hold the member's time.
    pub fn is_active(&self) -> bool {
        matches!(self, AssignmentStatus::Assigned | AssignmentStatus::Confirmed)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Legal moves of the assignment lifecycle.
    pub fn can_transition_to(&self, next: AssignmentStatus) -> bool {
        use AssignmentStatus::*;
        match (self, next) {
            (Assigned, Confirmed) => true,
            (Assigned | Confirmed, Declined | NoShow | Cancelled) => true,
            _ => false,
        }
    }
}

impl Default for AssignmentStatus {
    fn default() -> Self {
        AssignmentStatus::Assigned
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Assignment {
    pub id: Uuid,
    pub shift_id: Uuid,
    pub user_id: Uuid,
    pub position: Position,
    pub status: AssignmentStatus,
    pub assigned_by: Uuid,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentInput {
    pub shift_id: Uuid,
    pub user_id: Uuid,
    pub position: Position,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentUpdateInput {
    pub position: Option<Position>,
    pub notes: Option<String>,
}

/// Assignment listing entry; `is_conflicted` flags an active assignment that
/// currently overlaps another commitment of the same member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignmentDetail {
    #[serde(flatten)]
    pub assignment: Assignment,
    pub is_conflicted: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkAssignInput {
    pub start_date: chrono::NaiveDate,
    pub end_date: chrono::NaiveDate,
    pub position: Position,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct BulkAssignResult {
    pub assignments_created: u32,
    pub conflicts: Vec<BulkAssignConflict>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BulkAssignConflict {
    pub user_id: Uuid,
    pub shift_id: Uuid,
    pub reason: String,
}
