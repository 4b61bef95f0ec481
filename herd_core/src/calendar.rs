//! Date policies used when deriving due dates.
//!
//! Work on the farm is planned Monday to Friday, and animals are sold at the
//! Tuesday market.

use chrono::{Datelike, Duration, IsoWeek, NaiveDate, Weekday};

/// Day of the week sales are scheduled on
pub const SALE_WEEKDAY: Weekday = Weekday::Tue;

/// Move a date off the weekend onto the following Monday.
///
/// Saturday moves forward two days, Sunday one; weekdays are unchanged.
pub fn weekend_shift(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date + Duration::days(2),
        Weekday::Sun => date + Duration::days(1),
        _ => date,
    }
}

/// First date on or after `date` that falls on `weekday`. Never moves backward.
pub fn next_weekday(date: NaiveDate, weekday: Weekday) -> NaiveDate {
    let from = date.weekday().num_days_from_monday() as i64;
    let to = weekday.num_days_from_monday() as i64;
    date + Duration::days((to - from).rem_euclid(7))
}

/// ISO calendar week (year and week number) of a date
pub fn iso_week(date: NaiveDate) -> IsoWeek {
    date.iso_week()
}

/// ISO week number of a date, as shown on the weekly job list
pub fn week_number(date: NaiveDate) -> u32 {
    date.iso_week().week()
}

#[cfg(test)]
pub(crate) fn is_workday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
