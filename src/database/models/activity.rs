use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ActivityEntry {
    pub id: Uuid,
    pub entity_type: String,
    pub entity_id: Uuid,
    pub action: String,
    pub actor_id: Option<Uuid>,
    pub description: String,
    pub metadata: Option<String>, // JSON as String in SQLite
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateActivityInput {
    pub entity_type: &'static str,
    pub entity_id: Uuid,
    pub action: &'static str,
    pub actor_id: Option<Uuid>,
    pub description: String,
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

// Common entity types
#[allow(non_snake_case)]
pub mod EntityType {
    pub const TEMPLATE: &str = "shift_template";
    pub const PATTERN: &str = "pattern";
    pub const SHIFT: &str = "shift";
    pub const ASSIGNMENT: &str = "assignment";
    pub const SWAP_REQUEST: &str = "swap_request";
    pub const TIME_OFF: &str = "time_off";
}

// Common actions
#[allow(non_snake_case)]
pub mod Action {
    pub const CREATED: &str = "created";
    pub const UPDATED: &str = "updated";
    pub const DELETED: &str = "deleted";
    pub const ACTIVATED: &str = "activated";
    pub const DEACTIVATED: &str = "deactivated";
    pub const GENERATED: &str = "generated";
    pub const CONFIRMED: &str = "confirmed";
    pub const DECLINED: &str = "declined";
    pub const CANCELLED: &str = "cancelled";
    pub const NO_SHOW: &str = "no_show";
    pub const REASSIGNED: &str = "reassigned";
    pub const APPROVED: &str = "approved";
    pub const DENIED: &str = "denied";
}
