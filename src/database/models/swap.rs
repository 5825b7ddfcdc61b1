use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::workflow::{RequestStatus, ReviewDecision};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SwapRequest {
    pub id: Uuid,
    pub requesting_user_id: Uuid,
    pub offering_shift_id: Uuid,
    pub requesting_shift_id: Option<Uuid>, // None: open trade
    pub target_user_id: Option<Uuid>,      // None: open to any member
    pub status: RequestStatus,
    pub reason: Option<String>,
    pub reviewed_by: Option<Uuid>,
    pub reviewer_notes: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SwapRequest {
    pub fn involves(&self, user_id: Uuid) -> bool {
        self.requesting_user_id == user_id || self.target_user_id == Some(user_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapRequestInput {
    pub offering_shift_id: Uuid,
    pub requesting_shift_id: Option<Uuid>,
    pub target_user_id: Option<Uuid>,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapReviewInput {
    pub status: ReviewDecision,
    pub reviewer_notes: Option<String>,
    /// Member who takes an open trade; only read when the request has no target.
    pub assignee_user_id: Option<Uuid>,
}
