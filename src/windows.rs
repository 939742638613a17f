// src/windows.rs
//! Anniversary week windows, walking back one calendar year at a time.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeZone, Utc};

/// Days before the reference day covered by a window.
pub const WINDOW_DAYS: u64 = 7;

/// Inclusive UTC range; `end` is the last microsecond of the reference day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateWindow {
    /// Window covering the `WINDOW_DAYS` days before `day` plus `day` itself.
    pub fn ending_on(day: NaiveDate) -> Self {
        Self::between(week_before(day), day)
    }

    /// `first_day` 00:00 through `last_day` 23:59:59.999999.
    pub fn between(first_day: NaiveDate, last_day: NaiveDate) -> Self {
        Self {
            start: Utc.from_utc_datetime(&first_day.and_time(NaiveTime::MIN)),
            end: Utc.from_utc_datetime(&last_day.and_time(end_of_day())),
        }
    }

    /// Year the window belongs to when grouping search results.
    pub fn year(&self) -> i32 {
        self.end.year()
    }
}

fn week_before(day: NaiveDate) -> NaiveDate {
    day.checked_sub_days(Days::new(WINDOW_DAYS)).unwrap_or(day)
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999).unwrap_or(NaiveTime::MIN)
}

/// Lazy iterator over anniversary windows.
///
/// The first window ends on `today`. For each following one, the start day
/// and the end day are each moved back one year on their own, keeping
/// month/day, so a window spanning 29 February is one day longer. Iteration
/// stops at the first window whose end lies before `until`, which is never
/// yielded. The iterator is a plain value: cloning it restarts nothing and
/// shares nothing.
#[derive(Debug, Clone)]
pub struct AnniversaryWindows {
    today: NaiveDate,
    until: DateTime<Utc>,
    years_back: u32,
    done: bool,
}

impl AnniversaryWindows {
    pub fn new(today: NaiveDate, until: DateTime<Utc>) -> Self {
        Self {
            today,
            until,
            years_back: 0,
            done: false,
        }
    }

    /// Boundary at 00:00 UTC of the anchor date.
    pub fn since(today: NaiveDate, anchor: NaiveDate) -> Self {
        Self::new(today, Utc.from_utc_datetime(&anchor.and_time(NaiveTime::MIN)))
    }
}

impl Iterator for AnniversaryWindows {
    type Item = DateWindow;

    fn next(&mut self) -> Option<DateWindow> {
        if self.done {
            return None;
        }
        let first = shift_years_back(week_before(self.today), self.years_back);
        let last = shift_years_back(self.today, self.years_back);
        let (Some(first), Some(last)) = (first, last) else {
            self.done = true;
            return None;
        };
        let window = DateWindow::between(first, last);
        if window.end < self.until {
            self.done = true;
            return None;
        }
        self.years_back += 1;
        Some(window)
    }
}

/// Same month/day `years` earlier. A 29 February that does not exist in the
/// target year becomes the 28th for that year only.
fn shift_years_back(day: NaiveDate, years: u32) -> Option<NaiveDate> {
    let year = day.year().checked_sub(i32::try_from(years).ok()?)?;
    day.with_year(year)
        .or_else(|| NaiveDate::from_ymd_opt(year, day.month(), day.day() - 1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn first_window_spans_week_ending_today() {
        let w = DateWindow::ending_on(d(2025, 6, 20));
        assert_eq!(w.start, Utc.with_ymd_and_hms(2025, 6, 13, 0, 0, 0).unwrap());
        assert_eq!(w.end.date_naive(), d(2025, 6, 20));
        assert_eq!(
            (w.end.hour(), w.end.minute(), w.end.second()),
            (23, 59, 59)
        );
        assert_eq!(w.end.nanosecond(), 999_999_000);
    }

    #[test]
    fn anchor_example_yields_two_windows() {
        let windows: Vec<_> = AnniversaryWindows::since(d(2025, 6, 20), d(2024, 6, 15)).collect();
        assert_eq!(windows.len(), 2);
        assert_eq!(windows[0].start.date_naive(), d(2025, 6, 13));
        assert_eq!(windows[1].start.date_naive(), d(2024, 6, 13));
        assert_eq!(windows[1].end.date_naive(), d(2024, 6, 20));
    }

    #[test]
    fn boundary_equal_to_end_day_is_still_included() {
        // Window ending 2020-06-20 23:59:59 is not before 2020-06-20 00:00.
        let n = AnniversaryWindows::since(d(2025, 6, 20), d(2020, 6, 20)).count();
        assert_eq!(n, 6);
        let n = AnniversaryWindows::since(d(2025, 6, 20), d(2020, 6, 21)).count();
        assert_eq!(n, 5);
    }

    #[test]
    fn anchor_after_today_yields_nothing() {
        let mut it = AnniversaryWindows::since(d(2025, 6, 20), d(2025, 7, 1));
        assert_eq!(it.next(), None);
        assert_eq!(it.next(), None);
    }

    #[test]
    fn leap_day_is_clamped_per_year() {
        let windows: Vec<_> = AnniversaryWindows::since(d(2024, 2, 29), d(2019, 1, 1)).collect();
        let ends: Vec<_> = windows.iter().map(|w| w.end.date_naive()).collect();
        assert_eq!(
            ends,
            vec![
                d(2024, 2, 29),
                d(2023, 2, 28),
                d(2022, 2, 28),
                d(2021, 2, 28),
                d(2020, 2, 29),
                d(2019, 2, 28),
            ]
        );
    }

    #[test]
    fn starts_keep_month_and_day_across_leap_years() {
        let windows: Vec<_> = AnniversaryWindows::since(d(2025, 3, 3), d(2023, 1, 1)).collect();
        let starts: Vec<_> = windows.iter().map(|w| w.start.date_naive()).collect();
        assert_eq!(starts, vec![d(2025, 2, 24), d(2024, 2, 24), d(2023, 2, 24)]);
        // 2024 window spans Feb 29, so it is one day longer.
        assert_eq!(windows[1].end.date_naive(), d(2024, 3, 3));
    }

    #[test]
    fn leap_day_start_is_clamped_per_year() {
        let windows: Vec<_> = AnniversaryWindows::since(d(2024, 3, 7), d(2022, 1, 1)).collect();
        let starts: Vec<_> = windows.iter().map(|w| w.start.date_naive()).collect();
        assert_eq!(starts, vec![d(2024, 2, 29), d(2023, 2, 28), d(2022, 2, 28)]);
    }

    #[test]
    fn clones_replay_the_same_sequence() {
        let it = AnniversaryWindows::since(d(2025, 1, 3), d(2015, 1, 1));
        let a: Vec<_> = it.clone().collect();
        let b: Vec<_> = it.collect();
        assert_eq!(a, b);
        assert_eq!(a.len(), 11);
        // Window crossing New Year is grouped under the end year.
        assert_eq!(a[0].start.year(), 2024);
        assert_eq!(a[0].year(), 2025);
    }
}
