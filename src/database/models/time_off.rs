use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::macros::string_enum;
use super::workflow::{RequestStatus, ReviewDecision};
use crate::error::AppError;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TimeOffRequest {
    pub id: Uuid,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate, // inclusive
    pub status: RequestStatus,
    pub reason: Option<String>,
    pub reviewer_notes: Option<String>,
    pub approved_by: Option<Uuid>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeOffRequestInput {
    /// Defaults to the caller; managers may file on behalf of a member.
    pub user_id: Option<Uuid>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: Option<String>,
}

impl TimeOffRequestInput {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.end_date < self.start_date {
            return Err(AppError::Validation(
                "end_date must not be before start_date".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeOffReviewInput {
    pub status: ReviewDecision,
    pub reviewer_notes: Option<String>,
}

string_enum! {
    /// How approving leave treats assignments that fall inside it.
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "snake_case")]
    pub enum TimeOffApprovalPolicy {
        /// Refuse the approval and name the colliding assignments.
        Reject => "reject",
        /// Move colliding assignments to declined as part of the approval.
        DeclineAssignments => "decline_assignments",
    }
}

impl Default for TimeOffApprovalPolicy {
    fn default() -> Self {
        TimeOffApprovalPolicy::Reject
    }
}
