use chrono::{Datelike, Duration, NaiveDate};

use crate::database::models::{CustomRule, Pattern, PatternSchedule};

/// Interprets custom pattern rules. Generation only sees this trait, so a
/// deployment can register rule kinds of its own.
pub trait RuleEvaluator: Send + Sync {
    fn matches(&self, rule: &CustomRule, date: NaiveDate) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRuleEvaluator;

impl RuleEvaluator for StandardRuleEvaluator {
    fn matches(&self, rule: &CustomRule, date: NaiveDate) -> bool {
        match rule {
            CustomRule::DateList { dates } => dates.contains(&date),
            CustomRule::NthWeekdayOfMonth { nth, weekday } => {
                if weekday_number(date) != *weekday {
                    return false;
                }
                match *nth {
                    -1 => (date + Duration::days(7)).month() != date.month(),
                    n if n > 0 => (date.day0() / 7 + 1) == u32::from(n.unsigned_abs()),
                    _ => false,
                }
            }
        }
    }
}

/// 0 = Sunday through 6 = Saturday.
pub fn weekday_number(date: NaiveDate) -> u8 {
    date.weekday().num_days_from_sunday() as u8
}

/// Whether the pattern's rule puts a shift on `date`. Bounds of the pattern
/// are the caller's concern; dates before `start_date` never match a platoon.
pub fn occurs_on(pattern: &Pattern, date: NaiveDate, evaluator: &dyn RuleEvaluator) -> bool {
    match &pattern.schedule {
        PatternSchedule::Daily => true,
        PatternSchedule::Weekly { weekdays } => weekdays.contains(&weekday_number(date)),
        PatternSchedule::Platoon {
            days_on,
            rotation_days,
            ..
        } => {
            let offset = (date - pattern.start_date).num_days();
            offset >= 0 && offset.rem_euclid(i64::from(*rotation_days)) < i64::from(*days_on)
        }
        PatternSchedule::Custom { schedule_config } => evaluator.matches(schedule_config, date),
    }
}

/// Every date in `[from, to]` on which the pattern produces a shift.
pub fn occurrences(
    pattern: &Pattern,
    from: NaiveDate,
    to: NaiveDate,
    evaluator: &dyn RuleEvaluator,
) -> Vec<NaiveDate> {
    from.iter_days()
        .take_while(|date| *date <= to)
        .filter(|date| occurs_on(pattern, *date, evaluator))
        .collect()
}
