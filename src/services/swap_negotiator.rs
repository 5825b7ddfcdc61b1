use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::database::models::{
    Action, Assignment, RequestQuery, RequestStatus, ReviewDecision, Shift, SwapRequest,
    SwapRequestInput, SwapReviewInput,
};
use crate::database::repositories::assignment;
use crate::database::repositories::shift;
use crate::database::repositories::swap::{self, NewSwapRequest};
use crate::database::transaction::{begin, with_retry};
use crate::error::AppError;
use crate::services::activity_logger::ActivityLogger;
use crate::services::conflict_detector::{ConflictDetector, conflict_error};
use crate::services::time_window::LocalSlot;
use crate::services::user_context::Actor;
use crate::services::user_locks::UserLocks;
use crate::services::workflow::{Pending, decided_concurrently};

#[derive(Clone)]
pub struct SwapNegotiator {
    pool: SqlitePool,
    locks: UserLocks,
}

impl SwapNegotiator {
    pub fn new(pool: SqlitePool, locks: UserLocks) -> Self {
        Self { pool, locks }
    }

    /// Offer one of the caller's shifts, either to anyone (open trade), to a
    /// named member, or in exchange for another member's shift.
    pub async fn create(
        &self,
        actor: &Actor,
        input: SwapRequestInput,
    ) -> Result<SwapRequest, AppError> {
        let requester = actor.user_id;
        if input.target_user_id == Some(requester) {
            return Err(AppError::Validation(
                "You cannot swap with yourself".to_string(),
            ));
        }
        if input.requesting_shift_id == Some(input.offering_shift_id) {
            return Err(AppError::Validation(
                "requesting_shift_id must differ from offering_shift_id".to_string(),
            ));
        }

        let request = with_retry("create swap request", || self.try_create(requester, &input))
            .await?;
        log::info!("Swap request {} created by {}", request.id, requester);
        Ok(request)
    }

    async fn try_create(
        &self,
        requester: Uuid,
        input: &SwapRequestInput,
    ) -> Result<SwapRequest, AppError> {
        let mut tx = begin(&self.pool).await?;

        find_shift(&mut *tx, input.offering_shift_id).await?;
        if assignment::find_active(&mut *tx, requester, input.offering_shift_id)
            .await?
            .is_none()
        {
            return Err(AppError::Validation(format!(
                "You do not hold an active assignment on shift {}",
                input.offering_shift_id
            )));
        }

        let target_user_id = match input.requesting_shift_id {
            Some(requesting_shift_id) => Some(
                counter_party(&mut *tx, requester, requesting_shift_id, input.target_user_id)
                    .await?,
            ),
            None => input.target_user_id,
        };

        let request = swap::insert(
            &mut *tx,
            NewSwapRequest {
                requesting_user_id: requester,
                offering_shift_id: input.offering_shift_id,
                requesting_shift_id: input.requesting_shift_id,
                target_user_id,
                reason: input.reason.as_deref(),
            },
        )
        .await?;

        ActivityLogger::log_swap_activity(
            &mut *tx,
            requester,
            &request,
            Action::CREATED,
            format!("Swap request created for shift {}", request.offering_shift_id),
        )
        .await?;

        tx.commit().await?;
        Ok(request)
    }

    pub async fn cancel(&self, actor: &Actor, id: Uuid) -> Result<SwapRequest, AppError> {
        let cancelled = with_retry("cancel swap request", || self.try_cancel(actor, id)).await?;
        log::info!("Swap request {} cancelled", id);
        Ok(cancelled)
    }

    async fn try_cancel(&self, actor: &Actor, id: Uuid) -> Result<SwapRequest, AppError> {
        let mut tx = begin(&self.pool).await?;
        let request = find_request(&mut *tx, id).await?;

        Pending::from_record(request)?.cancel(actor.user_id)?;
        let cancelled = swap::mark_cancelled(&mut *tx, id)
            .await?
            .ok_or_else(|| decided_concurrently::<SwapRequest>(id))?;

        ActivityLogger::log_swap_activity(
            &mut *tx,
            actor.user_id,
            &cancelled,
            Action::CANCELLED,
            format!("Swap request {} cancelled", id),
        )
        .await?;

        tx.commit().await?;
        Ok(cancelled)
    }

    /// Approve or deny. Approval moves the assignments, re-checks both
    /// placements and writes the decision in one transaction; a collision
    /// leaves everything, the request included, as it was.
    pub async fn review(
        &self,
        actor: &Actor,
        id: Uuid,
        input: SwapReviewInput,
    ) -> Result<SwapRequest, AppError> {
        actor.require_manager("review swap requests")?;

        let parties = {
            let mut conn = self.pool.acquire().await?;
            let request = find_request(&mut *conn, id).await?;
            let mut parties = vec![request.requesting_user_id];
            parties.extend(request.target_user_id);
            parties.extend(input.assignee_user_id);
            parties
        };

        let _guard = self.locks.acquire(&parties).await;
        let reviewed = with_retry("review swap request", || self.try_review(actor, id, &input))
            .await?;

        log::info!("Swap request {} {}", id, reviewed.status);
        Ok(reviewed)
    }

    async fn try_review(
        &self,
        actor: &Actor,
        id: Uuid,
        input: &SwapReviewInput,
    ) -> Result<SwapRequest, AppError> {
        let mut tx = begin(&self.pool).await?;
        let pending = Pending::from_record(find_request(&mut *tx, id).await?)?;

        let new_holder = match input.status {
            ReviewDecision::Approved => {
                let detector = ConflictDetector::new(actor.timezone);
                Some(
                    apply_swap(
                        &mut *tx,
                        detector,
                        actor.user_id,
                        pending.request(),
                        input.assignee_user_id,
                    )
                    .await?,
                )
            }
            ReviewDecision::Denied => None,
        };

        let decided = pending.decide(input.status);
        let reviewed = swap::record_review(
            &mut *tx,
            id,
            decided.status,
            actor.user_id,
            input.reviewer_notes.as_deref(),
            new_holder,
        )
        .await?
        .ok_or_else(|| decided_concurrently::<SwapRequest>(id))?;

        ActivityLogger::log_swap_activity(
            &mut *tx,
            actor.user_id,
            &reviewed,
            ActivityLogger::review_action(reviewed.status == RequestStatus::Approved),
            format!("Swap request {} {}", id, reviewed.status),
        )
        .await?;

        tx.commit().await?;
        Ok(reviewed)
    }

    pub async fn get(&self, actor: &Actor, id: Uuid) -> Result<SwapRequest, AppError> {
        let mut conn = self.pool.acquire().await?;
        let request = find_request(&mut *conn, id).await?;
        if !actor.is_manager_or_admin() && !request.involves(actor.user_id) {
            return Err(AppError::Forbidden(
                "You can only view swap requests you are part of".to_string(),
            ));
        }
        Ok(request)
    }

    /// Managers see everything (optionally for one member); members see only
    /// requests they made or are named in.
    pub async fn list(
        &self,
        actor: &Actor,
        query: &RequestQuery,
    ) -> Result<Vec<SwapRequest>, AppError> {
        let status = parse_status(query.status.as_deref())?;
        let party = if actor.is_manager_or_admin() {
            query.user_id
        } else {
            Some(actor.user_id)
        };

        let mut conn = self.pool.acquire().await?;
        swap::list(&mut *conn, status, party).await
    }
}

pub(crate) fn parse_status(raw: Option<&str>) -> Result<Option<RequestStatus>, AppError> {
    raw.map(|s| s.parse::<RequestStatus>().map_err(AppError::Validation))
        .transpose()
}

async fn find_request(conn: &mut SqliteConnection, id: Uuid) -> Result<SwapRequest, AppError> {
    swap::find_by_id(conn, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Swap request {} not found", id)))
}

async fn find_shift(conn: &mut SqliteConnection, id: Uuid) -> Result<Shift, AppError> {
    shift::find_by_id(conn, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Shift {} not found", id)))
}

/// The member on the other side of a two-way swap. A named target must hold
/// the requested shift; without one, the shift must have exactly one holder
/// besides the requester.
async fn counter_party(
    conn: &mut SqliteConnection,
    requester: Uuid,
    requesting_shift_id: Uuid,
    target_user_id: Option<Uuid>,
) -> Result<Uuid, AppError> {
    find_shift(conn, requesting_shift_id).await?;
    let holders: Vec<Uuid> = assignment::active_holders(conn, requesting_shift_id)
        .await?
        .into_iter()
        .map(|a| a.user_id)
        .filter(|user_id| *user_id != requester)
        .collect();

    match target_user_id {
        Some(target) if holders.contains(&target) => Ok(target),
        Some(target) => Err(AppError::Validation(format!(
            "User {} does not hold an active assignment on shift {}",
            target, requesting_shift_id
        ))),
        None => match holders.as_slice() {
            [only] => Ok(*only),
            [] => Err(AppError::Validation(format!(
                "Nobody else holds an active assignment on shift {}",
                requesting_shift_id
            ))),
            _ => Err(AppError::Validation(format!(
                "Shift {} has {} other holders; name target_user_id",
                requesting_shift_id,
                holders.len()
            ))),
        },
    }
}

async fn held_assignment(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    shift_id: Uuid,
) -> Result<Assignment, AppError> {
    assignment::find_active(conn, user_id, shift_id)
        .await?
        .ok_or_else(|| {
            AppError::State(format!(
                "User {} no longer holds an active assignment on shift {}",
                user_id, shift_id
            ))
        })
}

/// Move the assignments an approval implies and return the member who now
/// holds the offered shift.
async fn apply_swap(
    conn: &mut SqliteConnection,
    detector: ConflictDetector,
    reviewer: Uuid,
    request: &SwapRequest,
    assignee_user_id: Option<Uuid>,
) -> Result<Uuid, AppError> {
    let requester = request.requesting_user_id;
    let offered = find_shift(conn, request.offering_shift_id).await?;
    let offering = held_assignment(conn, requester, offered.id).await?;

    let Some(requesting_shift_id) = request.requesting_shift_id else {
        // One-way: the offered assignment changes hands.
        let new_holder = request
            .target_user_id
            .or(assignee_user_id)
            .ok_or_else(|| {
                AppError::Validation(
                    "Open swap requests need assignee_user_id to be approved".to_string(),
                )
            })?;
        if new_holder == requester {
            return Err(AppError::Validation(
                "The requester cannot take their own offered shift".to_string(),
            ));
        }

        let conflicts = detector
            .find_conflicts(conn, new_holder, LocalSlot::from(&offered), &[offering.id])
            .await?;
        if !conflicts.is_empty() {
            return Err(conflict_error(
                &format!("User {} cannot take shift {}", new_holder, offered.id),
                &conflicts,
            ));
        }

        let moved = assignment::reassign(conn, offering.id, new_holder).await?;
        ActivityLogger::log_assignment_activity(
            conn,
            reviewer,
            &moved,
            Action::REASSIGNED,
            format!(
                "Shift {} handed from {} to {} by swap {}",
                offered.id, requester, new_holder, request.id
            ),
        )
        .await?;
        return Ok(new_holder);
    };

    // Two-way: each side takes the other's shift.
    let counterpart = request.target_user_id.ok_or_else(|| {
        AppError::State(format!("Swap request {} has no counter-party", request.id))
    })?;
    let requested = find_shift(conn, requesting_shift_id).await?;
    let countering = held_assignment(conn, counterpart, requested.id).await?;
    let moving = [offering.id, countering.id];

    let mut conflicts = detector
        .find_conflicts(conn, requester, LocalSlot::from(&requested), &moving)
        .await?;
    conflicts.extend(
        detector
            .find_conflicts(conn, counterpart, LocalSlot::from(&offered), &moving)
            .await?,
    );
    if !conflicts.is_empty() {
        return Err(conflict_error(
            &format!("Swap request {} would double book a member", request.id),
            &conflicts,
        ));
    }

    let first = assignment::move_to_shift(conn, offering.id, requested.id).await?;
    let second = assignment::move_to_shift(conn, countering.id, offered.id).await?;
    for moved in [&first, &second] {
        ActivityLogger::log_assignment_activity(
            conn,
            reviewer,
            moved,
            Action::REASSIGNED,
            format!("Assignment moved to shift {} by swap {}", moved.shift_id, request.id),
        )
        .await?;
    }

    Ok(counterpart)
}
