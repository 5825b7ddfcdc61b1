use serde::{Deserialize, Serialize};

use super::macros::string_enum;

string_enum! {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
    #[serde(rename_all = "snake_case")]
    pub enum RequestStatus {
        Pending => "pending",
        Approved => "approved",
        Denied => "denied",
        Cancelled => "cancelled",
    }
}

impl RequestStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

impl Default for RequestStatus {
    fn default() -> Self {
        RequestStatus::Pending
    }
}

/// Outcome a reviewer may pick for a pending request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approved,
    Denied,
}

impl From<ReviewDecision> for RequestStatus {
    fn from(decision: ReviewDecision) -> Self {
        match decision {
            ReviewDecision::Approved => RequestStatus::Approved,
            ReviewDecision::Denied => RequestStatus::Denied,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RequestQuery {
    pub status: Option<String>,
    pub user_id: Option<uuid::Uuid>,
}
