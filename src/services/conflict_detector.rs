use chrono::{Duration, NaiveDate};
use chrono_tz::Tz;
use serde::Serialize;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::database::repositories::{assignment, time_off};
use crate::error::AppError;
use crate::services::time_window::{LocalSlot, TimeWindow};

/// Something that keeps a member from taking a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Conflict {
    /// An active assignment whose window intersects the slot.
    Assignment {
        assignment_id: Uuid,
        shift_id: Uuid,
        shift_date: NaiveDate,
    },
    /// Approved leave covering the slot's date.
    TimeOff {
        request_id: Uuid,
        start_date: NaiveDate,
        end_date: NaiveDate,
    },
}

impl Conflict {
    pub fn assignment_id(&self) -> Option<Uuid> {
        match self {
            Conflict::Assignment { assignment_id, .. } => Some(*assignment_id),
            Conflict::TimeOff { .. } => None,
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Conflict::Assignment {
                assignment_id,
                shift_date,
                ..
            } => format!(
                "overlaps assignment {} on {}",
                assignment_id, shift_date
            ),
            Conflict::TimeOff {
                request_id,
                start_date,
                end_date,
            } => format!(
                "approved time off {} ({} to {})",
                request_id, start_date, end_date
            ),
        }
    }
}

/// Read-only overlap queries. Run them on the same transaction as the write
/// they guard.
#[derive(Debug, Clone, Copy)]
pub struct ConflictDetector {
    timezone: Tz,
}

impl ConflictDetector {
    pub fn new(timezone: Tz) -> Self {
        Self { timezone }
    }

    pub async fn has_conflict(
        &self,
        conn: &mut SqliteConnection,
        user_id: Uuid,
        slot: LocalSlot,
    ) -> Result<bool, AppError> {
        Ok(!self.find_conflicts(conn, user_id, slot, &[]).await?.is_empty())
    }

    /// Every active assignment of the member overlapping `slot`, plus approved
    /// leave covering its date. Assignments listed in `excluding` are ignored.
    pub async fn find_conflicts(
        &self,
        conn: &mut SqliteConnection,
        user_id: Uuid,
        slot: LocalSlot,
        excluding: &[Uuid],
    ) -> Result<Vec<Conflict>, AppError> {
        let window = TimeWindow::resolve(self.timezone, slot)?;

        // Overnight shifts from the day before can reach into this slot, and
        // this slot can reach into the day after.
        let from = slot.date - Duration::days(1);
        let to = slot.date + Duration::days(1);

        let mut conflicts = Vec::new();
        for held in assignment::active_for_user_between(conn, user_id, from, to).await? {
            if excluding.contains(&held.assignment_id) {
                continue;
            }
            let other = TimeWindow::resolve(
                self.timezone,
                LocalSlot::new(held.shift_date, held.start_time, held.end_time),
            )?;
            if window.overlaps(&other) {
                conflicts.push(Conflict::Assignment {
                    assignment_id: held.assignment_id,
                    shift_id: held.shift_id,
                    shift_date: held.shift_date,
                });
            }
        }

        for leave in time_off::approved_covering(conn, user_id, slot.date).await? {
            conflicts.push(Conflict::TimeOff {
                request_id: leave.id,
                start_date: leave.start_date,
                end_date: leave.end_date,
            });
        }

        Ok(conflicts)
    }
}

/// Turn a non-empty conflict list into the error a caller reports.
pub fn conflict_error(subject: &str, conflicts: &[Conflict]) -> AppError {
    let reasons: Vec<String> = conflicts.iter().map(Conflict::describe).collect();
    AppError::conflict(
        format!("{}: {}", subject, reasons.join("; ")),
        conflicts.iter().filter_map(Conflict::assignment_id).collect(),
    )
}
