//! Service validity patterns: which calendar dates a trip runs on.

use chrono::{Datelike, NaiveDate, TimeDelta};
use fixedbitset::FixedBitSet;

use crate::error::CalendarError;

/// Width of the validity window, in days. Covers a full (leap) year of
/// service starting at the anchor date.
pub const CALENDAR_DAYS: usize = 366;

/// Weekday mask bits follow `Weekday::num_days_from_monday`:
/// bit 0 = Monday .. bit 6 = Sunday.
pub const ALL_WEEKDAYS: u8 = 0b0111_1111;

/// A fixed-capacity validity pattern anchored at a beginning date.
///
/// Bit `d` set means the service runs on `beginning_date + d` days. All
/// mutators reject dates outside `[beginning_date, beginning_date + 365]`
/// with [`CalendarError::OutOfRange`]; `is_active` simply answers `false`
/// there. Dates are plain calendar dates, already localized by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCalendar {
    beginning_date: NaiveDate,
    days: FixedBitSet,
}

impl ServiceCalendar {
    pub fn new(beginning_date: NaiveDate) -> Self {
        Self {
            beginning_date,
            days: FixedBitSet::with_capacity(CALENDAR_DAYS),
        }
    }

    pub fn beginning_date(&self) -> NaiveDate {
        self.beginning_date
    }

    /// Duration-normalized validity test: the date's offset from the anchor,
    /// validated against the window.
    pub fn day_offset(&self, date: NaiveDate) -> Result<usize, CalendarError> {
        let offset = (date - self.beginning_date).num_days();
        if (0..CALENDAR_DAYS as i64).contains(&offset) {
            Ok(offset as usize)
        } else {
            Err(CalendarError::OutOfRange(date))
        }
    }

    pub fn add_date(&mut self, date: NaiveDate) -> Result<(), CalendarError> {
        let offset = self.day_offset(date)?;
        self.days.insert(offset);
        Ok(())
    }

    pub fn remove_date(&mut self, date: NaiveDate) -> Result<(), CalendarError> {
        let offset = self.day_offset(date)?;
        self.days.set(offset, false);
        Ok(())
    }

    pub fn add_day_offset(&mut self, offset: usize) -> Result<(), CalendarError> {
        self.check_offset(offset)?;
        self.days.insert(offset);
        Ok(())
    }

    pub fn remove_day_offset(&mut self, offset: usize) -> Result<(), CalendarError> {
        self.check_offset(offset)?;
        self.days.set(offset, false);
        Ok(())
    }

    /// Sets every date of `[start, end]` whose weekday bit is in `mask`.
    ///
    /// Both bounds must lie inside the window; the pattern is untouched when
    /// the range is rejected.
    pub fn add_range(
        &mut self,
        start: NaiveDate,
        end: NaiveDate,
        weekday_mask: u8,
    ) -> Result<(), CalendarError> {
        let start_offset = self.day_offset(start)?;
        let end_offset = self.day_offset(end)?;
        for offset in start_offset..=end_offset {
            let date = self.beginning_date + TimeDelta::days(offset as i64);
            if weekday_mask & (1 << date.weekday().num_days_from_monday()) != 0 {
                self.days.insert(offset);
            }
        }
        Ok(())
    }

    pub fn is_active(&self, date: NaiveDate) -> bool {
        self.day_offset(date)
            .is_ok_and(|offset| self.days.contains(offset))
    }

    /// Number of active days in the window.
    pub fn count_active(&self) -> usize {
        self.days.count_ones(..)
    }

    fn check_offset(&self, offset: usize) -> Result<(), CalendarError> {
        if offset < CALENDAR_DAYS {
            Ok(())
        } else {
            Err(CalendarError::OutOfRange(
                self.beginning_date + TimeDelta::days(offset as i64),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn add_then_remove_round_trips() {
        let anchor = date(2024, 1, 1);
        let mut cal = ServiceCalendar::new(anchor);
        let day = date(2024, 3, 15);

        assert!(!cal.is_active(day));
        cal.add_date(day).unwrap();
        assert!(cal.is_active(day));
        cal.remove_date(day).unwrap();
        assert!(!cal.is_active(day));
    }

    #[test]
    fn unrelated_mutations_commute() {
        let anchor = date(2024, 1, 1);
        let a = date(2024, 2, 1);
        let b = date(2024, 2, 2);

        let mut first = ServiceCalendar::new(anchor);
        first.add_date(a).unwrap();
        first.add_date(b).unwrap();
        first.remove_date(a).unwrap();

        let mut second = ServiceCalendar::new(anchor);
        second.add_date(b).unwrap();
        second.add_date(a).unwrap();
        second.remove_date(a).unwrap();

        assert_eq!(first, second);
        assert!(first.is_active(b));
        assert!(!first.is_active(a));
    }

    #[test]
    fn rejects_dates_outside_window() {
        let anchor = date(2024, 1, 1);
        let mut cal = ServiceCalendar::new(anchor);

        let before = date(2023, 12, 31);
        let after = anchor + TimeDelta::days(CALENDAR_DAYS as i64);

        assert_eq!(cal.add_date(before), Err(CalendarError::OutOfRange(before)));
        assert_eq!(cal.add_date(after), Err(CalendarError::OutOfRange(after)));
        assert_eq!(
            cal.remove_date(before),
            Err(CalendarError::OutOfRange(before))
        );
        assert!(cal.add_day_offset(CALENDAR_DAYS).is_err());
        assert!(!cal.is_active(before));
        assert!(!cal.is_active(after));
        assert_eq!(cal.count_active(), 0);
    }

    #[test]
    fn day_offsets_mirror_dates() {
        let anchor = date(2024, 1, 1);
        let mut cal = ServiceCalendar::new(anchor);
        cal.add_day_offset(31).unwrap();
        assert!(cal.is_active(date(2024, 2, 1)));
        assert_eq!(cal.day_offset(date(2024, 2, 1)).unwrap(), 31);
        cal.remove_day_offset(31).unwrap();
        assert!(!cal.is_active(date(2024, 2, 1)));
    }

    #[test]
    fn range_with_weekday_mask_hand_enumerated() {
        // 2024-04-01 is a Monday. Two weeks, Mon/Wed/Fri.
        let anchor = date(2024, 1, 1);
        let mut cal = ServiceCalendar::new(anchor);
        let mask = 0b0010101; // Mon, Wed, Fri
        cal.add_range(date(2024, 4, 1), date(2024, 4, 14), mask)
            .unwrap();

        let expected = [1, 3, 5, 8, 10, 12]; // April days
        for day in 1..=14 {
            let d = date(2024, 4, day);
            assert_eq!(
                cal.is_active(d),
                expected.contains(&day),
                "2024-04-{day:02}"
            );
        }
        assert_eq!(cal.count_active(), expected.len());
        // Nothing outside the range.
        assert!(!cal.is_active(date(2024, 3, 31)));
        assert!(!cal.is_active(date(2024, 4, 15)));
    }

    #[test]
    fn range_outside_window_mutates_nothing() {
        let anchor = date(2024, 1, 1);
        let mut cal = ServiceCalendar::new(anchor);
        let result = cal.add_range(date(2024, 12, 1), date(2025, 6, 1), ALL_WEEKDAYS);
        assert!(result.is_err());
        assert_eq!(cal.count_active(), 0);
    }
}
