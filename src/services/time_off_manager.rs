use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::database::models::{
    Action, AssignmentStatus, RequestQuery, RequestStatus, ReviewDecision, TimeOffApprovalPolicy,
    TimeOffRequest, TimeOffRequestInput, TimeOffReviewInput,
};
use crate::database::repositories::{assignment, time_off};
use crate::database::transaction::{begin, with_retry};
use crate::error::AppError;
use crate::services::activity_logger::ActivityLogger;
use crate::services::swap_negotiator::parse_status;
use crate::services::user_context::Actor;
use crate::services::user_locks::UserLocks;
use crate::services::workflow::{Pending, decided_concurrently};

#[derive(Clone)]
pub struct TimeOffManager {
    pool: SqlitePool,
    locks: UserLocks,
    policy: TimeOffApprovalPolicy,
}

impl TimeOffManager {
    pub fn new(pool: SqlitePool, locks: UserLocks, policy: TimeOffApprovalPolicy) -> Self {
        Self {
            pool,
            locks,
            policy,
        }
    }

    pub fn policy(&self) -> TimeOffApprovalPolicy {
        self.policy
    }

    /// File a leave request. Overlapping pending requests are accepted; only
    /// approval looks at the schedule.
    pub async fn create(
        &self,
        actor: &Actor,
        input: TimeOffRequestInput,
    ) -> Result<TimeOffRequest, AppError> {
        input.validate()?;
        let user_id = input.user_id.unwrap_or(actor.user_id);
        actor.require_self_or_manager(user_id, "request time off")?;

        let request = with_retry("create time-off request", || {
            self.try_create(actor, user_id, &input)
        })
        .await?;
        log::info!("Time-off request {} created for {}", request.id, user_id);
        Ok(request)
    }

    async fn try_create(
        &self,
        actor: &Actor,
        user_id: Uuid,
        input: &TimeOffRequestInput,
    ) -> Result<TimeOffRequest, AppError> {
        let mut tx = begin(&self.pool).await?;
        let request = time_off::insert(
            &mut *tx,
            user_id,
            input.start_date,
            input.end_date,
            input.reason.as_deref(),
        )
        .await?;

        ActivityLogger::log_time_off_activity(
            &mut *tx,
            actor.user_id,
            &request,
            Action::CREATED,
            format!(
                "Time off requested from {} to {}",
                request.start_date, request.end_date
            ),
        )
        .await?;

        tx.commit().await?;
        Ok(request)
    }

    pub async fn cancel(&self, actor: &Actor, id: Uuid) -> Result<TimeOffRequest, AppError> {
        let cancelled =
            with_retry("cancel time-off request", || self.try_cancel(actor, id)).await?;
        log::info!("Time-off request {} cancelled", id);
        Ok(cancelled)
    }

    async fn try_cancel(&self, actor: &Actor, id: Uuid) -> Result<TimeOffRequest, AppError> {
        let mut tx = begin(&self.pool).await?;
        let request = find_request(&mut *tx, id).await?;

        Pending::from_record(request)?.cancel(actor.user_id)?;
        let cancelled = time_off::mark_cancelled(&mut *tx, id)
            .await?
            .ok_or_else(|| decided_concurrently::<TimeOffRequest>(id))?;

        ActivityLogger::log_time_off_activity(
            &mut *tx,
            actor.user_id,
            &cancelled,
            Action::CANCELLED,
            format!("Time-off request {} cancelled", id),
        )
        .await?;

        tx.commit().await?;
        Ok(cancelled)
    }

    pub async fn review(
        &self,
        actor: &Actor,
        id: Uuid,
        input: TimeOffReviewInput,
    ) -> Result<TimeOffRequest, AppError> {
        actor.require_manager("review time-off requests")?;

        let user_id = {
            let mut conn = self.pool.acquire().await?;
            find_request(&mut *conn, id).await?.user_id
        };

        let _guard = self.locks.acquire(&[user_id]).await;
        let reviewed = with_retry("review time-off request", || {
            self.try_review(actor, id, &input)
        })
        .await?;

        log::info!("Time-off request {} {}", id, reviewed.status);
        Ok(reviewed)
    }

    async fn try_review(
        &self,
        actor: &Actor,
        id: Uuid,
        input: &TimeOffReviewInput,
    ) -> Result<TimeOffRequest, AppError> {
        let mut tx = begin(&self.pool).await?;
        let pending = Pending::from_record(find_request(&mut *tx, id).await?)?;

        if input.status == ReviewDecision::Approved {
            self.clear_schedule(&mut *tx, actor, pending.request()).await?;
        }

        let decided = pending.decide(input.status);
        let reviewed = time_off::record_review(
            &mut *tx,
            id,
            decided.status,
            actor.user_id,
            input.reviewer_notes.as_deref(),
        )
        .await?
        .ok_or_else(|| decided_concurrently::<TimeOffRequest>(id))?;

        ActivityLogger::log_time_off_activity(
            &mut *tx,
            actor.user_id,
            &reviewed,
            ActivityLogger::review_action(reviewed.status == RequestStatus::Approved),
            format!("Time-off request {} {}", id, reviewed.status),
        )
        .await?;

        tx.commit().await?;
        Ok(reviewed)
    }

    /// Apply the approval policy to the member's active assignments inside
    /// the requested dates.
    async fn clear_schedule(
        &self,
        conn: &mut SqliteConnection,
        actor: &Actor,
        request: &TimeOffRequest,
    ) -> Result<(), AppError> {
        let colliding = assignment::active_for_user_between(
            conn,
            request.user_id,
            request.start_date,
            request.end_date,
        )
        .await?;
        if colliding.is_empty() {
            return Ok(());
        }

        match self.policy {
            TimeOffApprovalPolicy::Reject => Err(AppError::conflict(
                format!(
                    "Time-off request {} overlaps {} active assignment(s)",
                    request.id,
                    colliding.len()
                ),
                colliding.iter().map(|held| held.assignment_id).collect(),
            )),
            TimeOffApprovalPolicy::DeclineAssignments => {
                let note = format!(
                    "Declined automatically: time-off request {} approved",
                    request.id
                );
                for held in &colliding {
                    let declined = assignment::set_status(
                        conn,
                        held.assignment_id,
                        AssignmentStatus::Declined,
                        Some(&note),
                    )
                    .await?;
                    ActivityLogger::log_assignment_activity(
                        conn,
                        actor.user_id,
                        &declined,
                        Action::DECLINED,
                        note.clone(),
                    )
                    .await?;
                }
                log::info!(
                    "Declined {} assignment(s) for time-off request {}",
                    colliding.len(),
                    request.id
                );
                Ok(())
            }
        }
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<TimeOffRequest, AppError> {
        let mut conn = self.pool.acquire().await?;
        let request = find_request(&mut *conn, id).await?;
        actor.require_self_or_manager(request.user_id, "view time-off requests")?;
        Ok(request)
    }

    pub async fn list(
        &self,
        actor: &Actor,
        query: &RequestQuery,
    ) -> Result<Vec<TimeOffRequest>, AppError> {
        let status = parse_status(query.status.as_deref())?;
        let user_id = if actor.is_manager_or_admin() {
            query.user_id
        } else {
            Some(actor.user_id)
        };

        let mut conn = self.pool.acquire().await?;
        time_off::list(&mut *conn, status, user_id).await
    }
}

async fn find_request(conn: &mut SqliteConnection, id: Uuid) -> Result<TimeOffRequest, AppError> {
    time_off::find_by_id(conn, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Time-off request {} not found", id)))
}
