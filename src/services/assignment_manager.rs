use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::database::models::{
    Action, Assignment, AssignmentDetail, AssignmentInput, AssignmentStatus,
    AssignmentUpdateInput, Position, Shift,
};
use crate::database::repositories::assignment::{self, NewAssignment};
use crate::database::repositories::shift;
use crate::database::transaction::{begin, with_retry};
use crate::error::AppError;
use crate::services::activity_logger::ActivityLogger;
use crate::services::conflict_detector::{ConflictDetector, conflict_error};
use crate::services::time_window::LocalSlot;
use crate::services::user_context::Actor;
use crate::services::user_locks::UserLocks;

#[derive(Clone)]
pub struct AssignmentManager {
    pool: SqlitePool,
    locks: UserLocks,
}

impl AssignmentManager {
    pub fn new(pool: SqlitePool, locks: UserLocks) -> Self {
        Self { pool, locks }
    }

    pub async fn create(
        &self,
        actor: &Actor,
        input: AssignmentInput,
    ) -> Result<Assignment, AppError> {
        actor.require_self_or_manager(input.user_id, "create assignments")?;

        let _guard = self.locks.acquire(&[input.user_id]).await;
        let created = with_retry("create assignment", || self.try_create(actor, &input)).await?;

        log::info!(
            "Assigned user {} to shift {} as {}",
            created.user_id,
            created.shift_id,
            created.position
        );
        Ok(created)
    }

    async fn try_create(
        &self,
        actor: &Actor,
        input: &AssignmentInput,
    ) -> Result<Assignment, AppError> {
        let mut tx = begin(&self.pool).await?;

        let shift = shift::find_by_id(&mut *tx, input.shift_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Shift {} not found", input.shift_id)))?;

        let created = place(
            &mut *tx,
            ConflictDetector::new(actor.timezone),
            &shift,
            input.user_id,
            input.position,
            actor.user_id,
            input.notes.as_deref(),
        )
        .await?;

        tx.commit().await?;
        Ok(created)
    }

    pub async fn confirm(&self, actor: &Actor, id: Uuid) -> Result<Assignment, AppError> {
        self.transition(actor, id, AssignmentStatus::Confirmed, Action::CONFIRMED)
            .await
    }

    pub async fn decline(&self, actor: &Actor, id: Uuid) -> Result<Assignment, AppError> {
        self.transition(actor, id, AssignmentStatus::Declined, Action::DECLINED)
            .await
    }

    pub async fn cancel(&self, actor: &Actor, id: Uuid) -> Result<Assignment, AppError> {
        self.transition(actor, id, AssignmentStatus::Cancelled, Action::CANCELLED)
            .await
    }

    pub async fn mark_no_show(&self, actor: &Actor, id: Uuid) -> Result<Assignment, AppError> {
        self.transition(actor, id, AssignmentStatus::NoShow, Action::NO_SHOW)
            .await
    }

    async fn transition(
        &self,
        actor: &Actor,
        id: Uuid,
        next: AssignmentStatus,
        action: &'static str,
    ) -> Result<Assignment, AppError> {
        let updated = with_retry("assignment transition", || {
            self.try_transition(actor, id, next, action)
        })
        .await?;

        log::info!("Assignment {} is now {}", id, updated.status);
        Ok(updated)
    }

    async fn try_transition(
        &self,
        actor: &Actor,
        id: Uuid,
        next: AssignmentStatus,
        action: &'static str,
    ) -> Result<Assignment, AppError> {
        let mut tx = begin(&self.pool).await?;
        let current = find_assignment(&mut *tx, id).await?;

        if next == AssignmentStatus::NoShow {
            actor.require_manager("record no-shows")?;
        } else {
            actor.require_self_or_manager(current.user_id, "change assignments")?;
        }

        if !current.status.can_transition_to(next) {
            return Err(AppError::State(format!(
                "Assignment {} cannot move from {} to {}",
                id, current.status, next
            )));
        }

        let updated = assignment::set_status(&mut *tx, id, next, None).await?;
        ActivityLogger::log_assignment_activity(
            &mut *tx,
            actor.user_id,
            &updated,
            action,
            format!("Assignment {} moved from {} to {}", id, current.status, next),
        )
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    pub async fn update(
        &self,
        actor: &Actor,
        id: Uuid,
        input: AssignmentUpdateInput,
    ) -> Result<Assignment, AppError> {
        with_retry("update assignment", || self.try_update(actor, id, &input)).await
    }

    async fn try_update(
        &self,
        actor: &Actor,
        id: Uuid,
        input: &AssignmentUpdateInput,
    ) -> Result<Assignment, AppError> {
        let mut tx = begin(&self.pool).await?;
        let current = find_assignment(&mut *tx, id).await?;

        actor.require_self_or_manager(current.user_id, "change assignments")?;
        if input.position.is_some() {
            actor.require_manager("change positions")?;
        }
        if current.status.is_terminal() {
            return Err(AppError::State(format!(
                "Assignment {} is {} and can no longer be edited",
                id, current.status
            )));
        }

        let updated =
            assignment::update_details(&mut *tx, id, input.position, input.notes.as_deref())
                .await?;
        ActivityLogger::log_assignment_activity(
            &mut *tx,
            actor.user_id,
            &updated,
            Action::UPDATED,
            format!("Assignment {} updated", id),
        )
        .await?;

        tx.commit().await?;
        Ok(updated)
    }

    /// Hard delete. Confirmed assignments go only with `override_confirmed`,
    /// which is reserved for management.
    pub async fn remove(
        &self,
        actor: &Actor,
        id: Uuid,
        override_confirmed: bool,
    ) -> Result<(), AppError> {
        with_retry("remove assignment", || {
            self.try_remove(actor, id, override_confirmed)
        })
        .await?;

        log::info!("Assignment {} removed", id);
        Ok(())
    }

    async fn try_remove(
        &self,
        actor: &Actor,
        id: Uuid,
        override_confirmed: bool,
    ) -> Result<(), AppError> {
        let mut tx = begin(&self.pool).await?;
        let current = find_assignment(&mut *tx, id).await?;

        actor.require_self_or_manager(current.user_id, "remove assignments")?;
        if current.status == AssignmentStatus::Confirmed {
            if !override_confirmed {
                return Err(AppError::State(format!(
                    "Assignment {} is confirmed; removing it needs override",
                    id
                )));
            }
            actor.require_manager("remove a confirmed assignment")?;
        }

        assignment::delete(&mut *tx, id).await?;
        ActivityLogger::log_assignment_activity(
            &mut *tx,
            actor.user_id,
            &current,
            Action::DELETED,
            format!("Assignment {} ({}) removed", id, current.status),
        )
        .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Assignment, AppError> {
        let mut conn = self.pool.acquire().await?;
        find_assignment(&mut *conn, id).await
    }

    /// Assignments of a shift, each flagged when it collides with another
    /// commitment of its holder.
    pub async fn list(
        &self,
        actor: &Actor,
        shift_id: Uuid,
    ) -> Result<Vec<AssignmentDetail>, AppError> {
        let mut conn = self.pool.acquire().await?;
        let shift = shift::find_by_id(&mut *conn, shift_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Shift {} not found", shift_id)))?;

        let detector = ConflictDetector::new(actor.timezone);
        let slot = LocalSlot::from(&shift);

        let mut details = Vec::new();
        for held in assignment::list_by_shift(&mut *conn, shift_id).await? {
            let is_conflicted = held.status.is_active()
                && !detector
                    .find_conflicts(&mut *conn, held.user_id, slot, &[held.id])
                    .await?
                    .is_empty();
            details.push(AssignmentDetail {
                assignment: held,
                is_conflicted,
            });
        }
        Ok(details)
    }

    pub async fn list_for_user(
        &self,
        actor: &Actor,
        user_id: Uuid,
    ) -> Result<Vec<Assignment>, AppError> {
        actor.require_self_or_manager(user_id, "view assignments")?;
        let mut conn = self.pool.acquire().await?;
        assignment::list_by_user(&mut *conn, user_id).await
    }
}

async fn find_assignment(conn: &mut SqliteConnection, id: Uuid) -> Result<Assignment, AppError> {
    assignment::find_by_id(conn, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Assignment {} not found", id)))
}

/// Put a member on a shift if nothing collides, on the caller's transaction.
/// The member's lock must already be held.
pub(crate) async fn place(
    conn: &mut SqliteConnection,
    detector: ConflictDetector,
    shift: &Shift,
    user_id: Uuid,
    position: Position,
    assigned_by: Uuid,
    notes: Option<&str>,
) -> Result<Assignment, AppError> {
    let conflicts = detector
        .find_conflicts(conn, user_id, LocalSlot::from(shift), &[])
        .await?;
    if !conflicts.is_empty() {
        return Err(conflict_error(
            &format!("User {} cannot take shift {}", user_id, shift.id),
            &conflicts,
        ));
    }

    let created = assignment::insert(
        conn,
        NewAssignment {
            shift_id: shift.id,
            user_id,
            position,
            assigned_by,
            notes,
        },
    )
    .await?;

    ActivityLogger::log_assignment_activity(
        conn,
        assigned_by,
        &created,
        Action::CREATED,
        format!(
            "User {} assigned to shift on {} as {}",
            user_id, shift.shift_date, position
        ),
    )
    .await?;

    Ok(created)
}
