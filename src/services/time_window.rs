use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;

use crate::database::models::Shift;
use crate::error::AppError;

/// A shift as written on the roster: a local calendar date and two local
/// times of day. `end_time <= start_time` means the shift ends the next day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalSlot {
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl LocalSlot {
    pub fn new(date: NaiveDate, start_time: NaiveTime, end_time: NaiveTime) -> Self {
        Self {
            date,
            start_time,
            end_time,
        }
    }

    pub fn crosses_midnight(&self) -> bool {
        self.end_time <= self.start_time
    }
}

impl From<&Shift> for LocalSlot {
    fn from(shift: &Shift) -> Self {
        Self::new(shift.shift_date, shift.start_time, shift.end_time)
    }
}

/// Half-open `[starts_at, ends_at)` interval of instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
}

impl TimeWindow {
    /// Resolve a roster slot to instants in the organization's zone.
    pub fn resolve(tz: Tz, slot: LocalSlot) -> Result<Self, AppError> {
        let end_date = if slot.crosses_midnight() {
            slot.date.succ_opt().ok_or_else(|| {
                AppError::Validation(format!("Shift date {} is out of range", slot.date))
            })?
        } else {
            slot.date
        };

        let starts_at = local_instant(tz, slot.date.and_time(slot.start_time))?;
        let ends_at = local_instant(tz, end_date.and_time(slot.end_time))?;

        Ok(Self { starts_at, ends_at })
    }

    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.starts_at < other.ends_at && other.starts_at < self.ends_at
    }

    /// Elapsed hours, so a night shift across a DST change is 7 or 9 hours.
    pub fn duration_hours(&self) -> f64 {
        (self.ends_at - self.starts_at).num_seconds() as f64 / 3600.0
    }
}

/// Map a wall-clock reading to an instant. Inside a fold the earlier instant
/// wins; a reading inside a gap is moved forward by the length of the gap.
pub fn local_instant(tz: Tz, local: NaiveDateTime) -> Result<DateTime<Utc>, AppError> {
    if let Some(resolved) = tz.from_local_datetime(&local).earliest() {
        return Ok(resolved.with_timezone(&Utc));
    }

    // Gap: apply the offset that was in force just before the transition.
    let before = tz
        .from_local_datetime(&(local - Duration::hours(6)))
        .earliest()
        .ok_or_else(|| {
            AppError::internal_server_error_message(format!(
                "Cannot resolve {} in {}",
                local,
                tz.name()
            ))
        })?;
    let offset_secs = before.offset().fix().local_minus_utc();

    Ok((local - Duration::seconds(i64::from(offset_secs))).and_utc())
}

pub fn parse_timezone(name: &str) -> Result<Tz, AppError> {
    name.parse::<Tz>()
        .map_err(|_| AppError::Validation(format!("Unknown timezone '{}'", name)))
}

/// The current calendar date in the organization's zone.
pub fn today_in(tz: Tz) -> NaiveDate {
    Utc::now().with_timezone(&tz).date_naive()
}
