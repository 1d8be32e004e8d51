//! Staple due-date computation.

use chrono::{Duration, NaiveDate};

use crate::models::{DueStatus, Staple, StapleFrequency, StapleWithDue};

/// Staples due within this many days count as due soon.
pub const DUE_SOON_DAYS: i64 = 2;

/// Days between two purchases of a staple.
pub fn interval_days(frequency: StapleFrequency, custom_days: Option<i64>) -> i64 {
    match frequency {
        StapleFrequency::Weekly => 7,
        StapleFrequency::Biweekly => 14,
        StapleFrequency::Monthly => 30,
        StapleFrequency::Custom => custom_days.unwrap_or(7).max(1),
    }
}

/// Next due date. A staple never purchased (or with an unreadable date) is due today.
pub fn due_date(staple: &Staple, today: NaiveDate) -> NaiveDate {
    staple
        .last_purchased_date
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .map(|last| last + Duration::days(interval_days(staple.frequency, staple.custom_days)))
        .unwrap_or(today)
}

pub fn due_status(days_until_due: i64) -> DueStatus {
    match days_until_due {
        d if d < 0 => DueStatus::Overdue,
        0 => DueStatus::DueToday,
        d if d <= DUE_SOON_DAYS => DueStatus::DueSoon,
        _ => DueStatus::Upcoming,
    }
}

/// Whether an import should pre-select a staple in this status.
pub fn should_preselect(status: DueStatus) -> bool {
    !matches!(status, DueStatus::Upcoming)
}

pub fn with_due(staple: Staple, today: NaiveDate) -> StapleWithDue {
    let due = due_date(&staple, today);
    let days_until_due = (due - today).num_days();
    StapleWithDue {
        staple,
        due_date: due.format("%Y-%m-%d").to_string(),
        days_until_due,
        due_status: due_status(days_until_due),
    }
}
