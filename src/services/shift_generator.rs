use chrono::{NaiveDate, NaiveTime};
use sqlx::{SqliteConnection, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

use crate::database::models::{
    Action, BulkAssignConflict, BulkAssignInput, BulkAssignResult, EntityType,
    GenerationResult, Pattern, Position, Shift,
};
use crate::database::repositories::{assignment, pattern, shift, template};
use crate::database::transaction::{begin, with_retry};
use crate::error::AppError;
use crate::services::activity_logger::{ActivityLogger, metadata};
use crate::services::assignment_manager::place;
use crate::services::conflict_detector::ConflictDetector;
use crate::services::recurrence::{RuleEvaluator, StandardRuleEvaluator, occurrences};
use crate::services::user_context::Actor;
use crate::services::user_locks::UserLocks;

/// Expands patterns into concrete shift rows. The only writer of
/// pattern-owned shifts.
#[derive(Clone)]
pub struct ShiftGenerator {
    pool: SqlitePool,
    locks: UserLocks,
    evaluator: Arc<dyn RuleEvaluator>,
    max_days: i64,
}

impl ShiftGenerator {
    pub fn new(pool: SqlitePool, locks: UserLocks, max_days: i64) -> Self {
        Self {
            pool,
            locks,
            evaluator: Arc::new(StandardRuleEvaluator),
            max_days,
        }
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn RuleEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Create the pattern's shifts for `[range_start, range_end]`. Dates that
    /// already have a shift for this pattern are counted as skipped, so
    /// repeated and overlapping runs are safe.
    pub async fn generate(
        &self,
        actor: &Actor,
        pattern_id: Uuid,
        range_start: NaiveDate,
        range_end: NaiveDate,
    ) -> Result<GenerationResult, AppError> {
        actor.require_manager("generate shifts")?;
        self.check_range(range_start, range_end)?;

        let result = with_retry("generate shifts", || {
            self.try_generate(actor, pattern_id, range_start, range_end)
        })
        .await?;

        log::info!(
            "Pattern {} generated {} shift(s), skipped {} for {}..{}",
            pattern_id,
            result.shifts_created,
            result.shifts_skipped,
            range_start,
            range_end
        );
        Ok(result)
    }

    async fn try_generate(
        &self,
        actor: &Actor,
        pattern_id: Uuid,
        range_start: NaiveDate,
        range_end: NaiveDate,
    ) -> Result<GenerationResult, AppError> {
        let mut tx = begin(&self.pool).await?;
        let pattern = active_pattern(&mut *tx, pattern_id).await?;
        let (start_time, end_time) = shift_times(&mut *tx, &pattern).await?;

        let Some((from, to)) = pattern.clamp_range(range_start, range_end) else {
            log::debug!(
                "Range {}..{} lies outside pattern {}",
                range_start,
                range_end,
                pattern_id
            );
            return Ok(GenerationResult::default());
        };

        let mut result = GenerationResult::default();
        for date in occurrences(&pattern, from, to, self.evaluator.as_ref()) {
            if shift::insert_generated(&mut *tx, pattern.id, date, start_time, end_time).await? {
                result.shifts_created += 1;
            } else {
                result.shifts_skipped += 1;
            }
        }

        ActivityLogger::log(
            &mut *tx,
            actor.user_id,
            EntityType::PATTERN,
            pattern.id,
            Action::GENERATED,
            format!(
                "Generated shifts for {} from {} to {}",
                pattern.name, from, to
            ),
            Some(metadata([
                ("shifts_created", result.shifts_created.into()),
                ("shifts_skipped", result.shifts_skipped.into()),
            ])),
        )
        .await?;

        tx.commit().await?;
        Ok(result)
    }

    /// Place every member named on the pattern onto each of its shifts in
    /// the range. Collisions are reported per member and shift, never forced.
    pub async fn bulk_assign(
        &self,
        actor: &Actor,
        pattern_id: Uuid,
        input: BulkAssignInput,
    ) -> Result<BulkAssignResult, AppError> {
        actor.require_manager("bulk-assign shifts")?;
        self.check_range(input.start_date, input.end_date)?;

        let (pattern, shifts) = {
            let mut conn = self.pool.acquire().await?;
            let pattern = active_pattern(&mut *conn, pattern_id).await?;
            let shifts =
                shift::list_by_pattern(&mut *conn, pattern_id, input.start_date, input.end_date)
                    .await?;
            (pattern, shifts)
        };

        let mut result = BulkAssignResult::default();
        for member in &pattern.assigned_members {
            let _guard = self.locks.acquire(&[*member]).await;
            let (created, conflicts) = with_retry("bulk assign", || {
                self.assign_member(actor, *member, &shifts, input.position)
            })
            .await?;
            result.assignments_created += created;
            result.conflicts.extend(conflicts);
        }

        log::info!(
            "Bulk-assigned pattern {}: {} created, {} conflict(s)",
            pattern_id,
            result.assignments_created,
            result.conflicts.len()
        );
        Ok(result)
    }

    async fn assign_member(
        &self,
        actor: &Actor,
        member: Uuid,
        shifts: &[Shift],
        position: Position,
    ) -> Result<(u32, Vec<BulkAssignConflict>), AppError> {
        let mut tx = begin(&self.pool).await?;
        let detector = ConflictDetector::new(actor.timezone);

        let mut created = 0;
        let mut conflicts = Vec::new();
        for shift in shifts {
            if assignment::find_active(&mut *tx, member, shift.id)
                .await?
                .is_some()
            {
                continue;
            }
            match place(&mut *tx, detector, shift, member, position, actor.user_id, None).await {
                Ok(_) => created += 1,
                Err(AppError::Conflict { message, .. }) => conflicts.push(BulkAssignConflict {
                    user_id: member,
                    shift_id: shift.id,
                    reason: message,
                }),
                Err(e) => return Err(e),
            }
        }

        tx.commit().await?;
        Ok((created, conflicts))
    }

    fn check_range(&self, start: NaiveDate, end: NaiveDate) -> Result<(), AppError> {
        if end < start {
            return Err(AppError::Validation(
                "end_date must not be before start_date".to_string(),
            ));
        }
        let days = (end - start).num_days() + 1;
        if days > self.max_days {
            return Err(AppError::Validation(format!(
                "Range covers {} days; at most {} can be processed per call",
                days, self.max_days
            )));
        }
        Ok(())
    }
}

async fn active_pattern(conn: &mut SqliteConnection, pattern_id: Uuid) -> Result<Pattern, AppError> {
    let pattern = pattern::find_by_id(conn, pattern_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Pattern {} not found", pattern_id)))?;

    if !pattern.is_active {
        return Err(AppError::State(format!(
            "Pattern {} is inactive; reactivate it first",
            pattern_id
        )));
    }
    Ok(pattern)
}

/// Times copied onto generated shifts: the linked template's, else the
/// pattern's own defaults.
async fn shift_times(
    conn: &mut SqliteConnection,
    pattern: &Pattern,
) -> Result<(NaiveTime, NaiveTime), AppError> {
    if let Some(template_id) = pattern.template_id {
        let template = template::find_by_id(conn, template_id).await?.ok_or_else(|| {
            AppError::NotFound(format!(
                "Template {} linked to pattern {} not found",
                template_id, pattern.id
            ))
        })?;
        return Ok((template.start_time, template.end_time));
    }

    match (pattern.start_time, pattern.end_time) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(AppError::Validation(format!(
            "Pattern {} has neither a template nor default times",
            pattern.id
        ))),
    }
}
