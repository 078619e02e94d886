//! Calendar and public-holiday resolver.
//!
//! A date is a holiday if it matches a fixed (month, day) rule, or if it is
//! one of the Easter-relative days of a year present in the Easter table.
//! Years missing from the table never match a movable holiday: there is no
//! computus here, the table is extended by configuration.
//!
//! Weekends (Saturday/Sunday) are independent of holiday status.

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Offsets from Easter Sunday for the movable holidays.
const EASTER_RELATIVE: [(i64, &str); 3] = [
    (1,  "Easter Monday"),
    (39, "Ascension"),
    (50, "Whit Monday"),
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FixedHoliday {
    pub month: u32,
    pub day:   u32,
    pub label: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EasterDate {
    pub year:  i32,
    pub month: u32,
    pub day:   u32,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DayKind {
    Workday,
    Weekend,
    Holiday,
}

#[derive(Debug, Clone)]
pub struct HolidayCalendar {
    fixed:  Vec<FixedHoliday>,
    easter: BTreeMap<i32, NaiveDate>,
}

impl HolidayCalendar {
    pub fn new(fixed: Vec<FixedHoliday>, easter: Vec<EasterDate>) -> Self {
        let easter = easter
            .into_iter()
            .filter_map(|e| match NaiveDate::from_ymd_opt(e.year, e.month, e.day) {
                Some(d) => Some((e.year, d)),
                None => {
                    log::warn!(
                        "Ignoring invalid Easter date {}-{:02}-{:02}",
                        e.year, e.month, e.day
                    );
                    None
                }
            })
            .collect();
        Self { fixed, easter }
    }

    /// Belgian public holidays with the 2024–2030 Easter table.
    pub fn belgian() -> Self {
        let fixed = [
            (1, 1,   "New Year's Day"),
            (5, 1,   "Labour Day"),
            (7, 21,  "National Day"),
            (8, 15,  "Assumption"),
            (11, 1,  "All Saints' Day"),
            (11, 11, "Armistice Day"),
            (12, 25, "Christmas Day"),
        ]
        .into_iter()
        .map(|(month, day, label)| FixedHoliday { month, day, label: label.to_string() })
        .collect();

        let easter = [
            (2024, 3, 31),
            (2025, 4, 20),
            (2026, 4, 5),
            (2027, 3, 28),
            (2028, 4, 16),
            (2029, 4, 1),
            (2030, 4, 21),
        ]
        .into_iter()
        .map(|(year, month, day)| EasterDate { year, month, day })
        .collect();

        Self::new(fixed, easter)
    }

    pub fn fixed_holidays(&self) -> &[FixedHoliday] {
        &self.fixed
    }

    /// Years covered by the Easter table, ascending.
    pub fn easter_years(&self) -> impl Iterator<Item = i32> + '_ {
        self.easter.keys().copied()
    }

    /// Name of the holiday falling on `date`, if any.
    pub fn holiday_name(&self, date: NaiveDate) -> Option<&str> {
        if let Some(h) = self
            .fixed
            .iter()
            .find(|h| h.month == date.month() && h.day == date.day())
        {
            return Some(h.label.as_str());
        }

        let easter = self.easter.get(&date.year())?;
        EASTER_RELATIVE
            .iter()
            .find(|(offset, _)| *easter + Duration::days(*offset) == date)
            .map(|(_, label)| *label)
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holiday_name(date).is_some()
    }

    pub fn weekday_name(date: NaiveDate) -> Weekday {
        date.weekday()
    }

    pub fn is_weekend(date: NaiveDate) -> bool {
        matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
    }

    /// Weekend wins over holiday, the way the planning grid shades days.
    pub fn day_kind(&self, date: NaiveDate) -> DayKind {
        if Self::is_weekend(date) {
            DayKind::Weekend
        } else if self.is_holiday(date) {
            DayKind::Holiday
        } else {
            DayKind::Workday
        }
    }
}

impl Default for HolidayCalendar {
    fn default() -> Self { Self::belgian() }
}

/// Monday of the ISO week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

/// Every date in `[start, end]`. Empty when `start > end`.
pub fn days_inclusive(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn fixed_holidays_match_every_year() {
        let cal = HolidayCalendar::belgian();
        assert!(cal.is_holiday(d(2025, 7, 21)));
        assert!(cal.is_holiday(d(2040, 12, 25)));
        assert_eq!(cal.holiday_name(d(2026, 11, 11)), Some("Armistice Day"));
        assert!(!cal.is_holiday(d(2025, 7, 22)));
    }

    #[test]
    fn easter_relative_days_for_tabled_years() {
        let cal = HolidayCalendar::belgian();
        // Easter 2025 is April 20.
        assert_eq!(cal.holiday_name(d(2025, 4, 21)), Some("Easter Monday"));
        assert_eq!(cal.holiday_name(d(2025, 5, 29)), Some("Ascension"));
        assert_eq!(cal.holiday_name(d(2025, 6, 9)),  Some("Whit Monday"));
        // Easter Sunday itself is not listed.
        assert!(!cal.is_holiday(d(2025, 4, 20)));
    }

    #[test]
    fn untabled_year_has_no_movable_holidays() {
        let cal = HolidayCalendar::belgian();
        // Easter 2031 is April 13; the table stops at 2030.
        assert!(!cal.is_holiday(d(2031, 4, 14)));
        assert!(cal.is_holiday(d(2031, 1, 1)));
    }

    #[test]
    fn weekend_is_independent_of_holiday() {
        let cal = HolidayCalendar::belgian();
        // 2027-05-01 is a Saturday and Labour Day.
        let day = d(2027, 5, 1);
        assert!(HolidayCalendar::is_weekend(day));
        assert!(cal.is_holiday(day));
        assert_eq!(cal.day_kind(day), DayKind::Weekend);
        assert_eq!(cal.day_kind(d(2025, 6, 9)), DayKind::Holiday);
        assert_eq!(cal.day_kind(d(2025, 6, 10)), DayKind::Workday);
    }

    #[test]
    fn invalid_easter_entries_are_dropped() {
        let cal = HolidayCalendar::new(
            vec![],
            vec![EasterDate { year: 2035, month: 2, day: 30 }],
        );
        assert_eq!(cal.easter_years().count(), 0);
    }

    #[test]
    fn week_start_is_iso_monday() {
        assert_eq!(week_start(d(2025, 6, 5)), d(2025, 6, 2));
        assert_eq!(week_start(d(2025, 6, 2)), d(2025, 6, 2));
        assert_eq!(week_start(d(2025, 6, 8)), d(2025, 6, 2));
        assert_eq!(HolidayCalendar::weekday_name(d(2025, 6, 3)), Weekday::Tue);
    }

    #[test]
    fn inverted_range_is_empty() {
        assert_eq!(days_inclusive(d(2025, 6, 5), d(2025, 6, 1)).count(), 0);
        assert_eq!(days_inclusive(d(2025, 6, 1), d(2025, 6, 7)).count(), 7);
    }
}
