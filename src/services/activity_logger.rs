use sqlx::SqliteConnection;
use std::collections::HashMap;
use uuid::Uuid;

use crate::database::models::{
    Action, Assignment, CreateActivityInput, EntityType, SwapRequest, TimeOffRequest,
};
use crate::database::repositories::activity;
use crate::error::AppError;

pub type Metadata = HashMap<String, serde_json::Value>;

/// Writes activity rows on the caller's connection. Every scheduling mutation
/// logs through here before it commits.
pub struct ActivityLogger;

impl ActivityLogger {
    pub async fn log(
        conn: &mut SqliteConnection,
        actor_id: Uuid,
        entity_type: &'static str,
        entity_id: Uuid,
        action: &'static str,
        description: String,
        metadata: Option<Metadata>,
    ) -> Result<(), AppError> {
        log::debug!("{} {} {}: {}", entity_type, entity_id, action, description);

        activity::log_activity(
            conn,
            CreateActivityInput {
                entity_type,
                entity_id,
                action,
                actor_id: Some(actor_id),
                description,
                metadata,
            },
        )
        .await?;
        Ok(())
    }

    pub async fn log_assignment_activity(
        conn: &mut SqliteConnection,
        actor_id: Uuid,
        assignment: &Assignment,
        action: &'static str,
        description: String,
    ) -> Result<(), AppError> {
        let metadata = metadata([
            ("shift_id", assignment.shift_id.to_string().into()),
            ("user_id", assignment.user_id.to_string().into()),
            ("status", assignment.status.as_str().into()),
        ]);
        Self::log(
            conn,
            actor_id,
            EntityType::ASSIGNMENT,
            assignment.id,
            action,
            description,
            Some(metadata),
        )
        .await
    }

    pub async fn log_swap_activity(
        conn: &mut SqliteConnection,
        actor_id: Uuid,
        request: &SwapRequest,
        action: &'static str,
        description: String,
    ) -> Result<(), AppError> {
        let mut metadata = metadata([
            ("offering_shift_id", request.offering_shift_id.to_string().into()),
            ("requesting_user_id", request.requesting_user_id.to_string().into()),
        ]);
        if let Some(shift_id) = request.requesting_shift_id {
            metadata.insert("requesting_shift_id".to_string(), shift_id.to_string().into());
        }
        if let Some(target) = request.target_user_id {
            metadata.insert("target_user_id".to_string(), target.to_string().into());
        }
        Self::log(
            conn,
            actor_id,
            EntityType::SWAP_REQUEST,
            request.id,
            action,
            description,
            Some(metadata),
        )
        .await
    }

    pub async fn log_time_off_activity(
        conn: &mut SqliteConnection,
        actor_id: Uuid,
        request: &TimeOffRequest,
        action: &'static str,
        description: String,
    ) -> Result<(), AppError> {
        let metadata = metadata([
            ("user_id", request.user_id.to_string().into()),
            ("start_date", request.start_date.to_string().into()),
            ("end_date", request.end_date.to_string().into()),
        ]);
        Self::log(
            conn,
            actor_id,
            EntityType::TIME_OFF,
            request.id,
            action,
            description,
            Some(metadata),
        )
        .await
    }

    /// Activity verb for a finished review.
    pub fn review_action(approved: bool) -> &'static str {
        if approved {
            Action::APPROVED
        } else {
            Action::DENIED
        }
    }
}

pub fn metadata<const N: usize>(pairs: [(&str, serde_json::Value); N]) -> Metadata {
    pairs
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}
