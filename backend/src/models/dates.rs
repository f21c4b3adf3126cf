//! Calendar-date helpers shared by the scheduler and the service layer.
//!
//! All scheduling happens on whole calendar days (`chrono::NaiveDate`); no
//! time-of-day or timezone arithmetic leaks into the engine.

use chrono::{Datelike, Duration, Months, NaiveDate, Utc};

/// Average month length in days, used to turn lead time into fractional months.
pub const AVERAGE_MONTH_DAYS: f64 = 30.437;

/// Current calendar date in UTC.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

/// Signed number of calendar days from `earlier` to `later`.
pub fn days_between(later: NaiveDate, earlier: NaiveDate) -> i64 {
    (later - earlier).num_days()
}

/// Shift a date by a signed number of days, saturating at the calendar bounds.
pub fn shift_days(date: NaiveDate, days: i64) -> NaiveDate {
    date.checked_add_signed(Duration::days(days))
        .unwrap_or(if days >= 0 { NaiveDate::MAX } else { NaiveDate::MIN })
}

/// Subtract whole months. Days past the end of the target month clamp to its
/// last day (e.g. 31 March minus one month is 28/29 February).
pub fn months_before(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDate::MIN)
}

/// Monday of the ISO week containing `date`.
pub fn start_of_week(date: NaiveDate) -> NaiveDate {
    let offset = date.weekday().num_days_from_monday() as i64;
    shift_days(date, -offset)
}
