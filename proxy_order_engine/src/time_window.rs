//! Half-open time intervals.
//!
//! Order cycles open at `orders_open_at` (inclusive) and close at `orders_close_at` (exclusive). Subscriptions are
//! valid from `begins_at` (inclusive) until `ends_at` (exclusive), but either bound may be missing, in which case the
//! window is unbounded on that side. [`TimeWindow`] covers both cases.
use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A half-open interval `[start, end)`. A `None` bound is unbounded on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

impl TimeWindow {
    pub fn from_bounds(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    pub fn bounded(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start: Some(start), end: Some(end) }
    }

    /// A window that contains every instant.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn start(&self) -> Option<DateTime<Utc>> {
        self.start
    }

    pub fn end(&self) -> Option<DateTime<Utc>> {
        self.end
    }

    /// True if no instant can fall inside the window, i.e. both bounds are present and `start >= end`.
    pub fn is_empty(&self) -> bool {
        matches!((self.start, self.end), (Some(start), Some(end)) if start >= end)
    }

    /// `start <= instant < end`, with missing bounds always satisfied.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        let after_start = self.start.map_or(true, |start| start <= instant);
        let before_end = self.end.map_or(true, |end| instant < end);
        after_start && before_end
    }

    /// True if the two half-open intervals share at least one instant.
    ///
    /// Touching windows do not overlap: `[a, b)` and `[b, c)` are disjoint.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        starts_before_end(self.start, other.end) && starts_before_end(other.start, self.end)
    }
}

fn starts_before_end(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> bool {
    match (start, end) {
        (Some(start), Some(end)) => start < end,
        _ => true,
    }
}

impl Display for TimeWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.start {
            Some(start) => write!(f, "[{start}, ")?,
            None => write!(f, "(-∞, ")?,
        }
        match self.end {
            Some(end) => write!(f, "{end})"),
            None => write!(f, "∞)"),
        }
    }
}

#[cfg(test)]
mod test {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    #[test]
    fn contains_is_half_open() {
        let w = TimeWindow::bounded(day(1), day(3));
        assert!(!w.contains(day(0)));
        assert!(w.contains(day(1)));
        assert!(w.contains(day(2)));
        assert!(!w.contains(day(3)));
    }

    #[test]
    fn missing_bounds_are_unbounded() {
        let w = TimeWindow::from_bounds(None, Some(day(5)));
        assert!(w.contains(day(-1000)));
        assert!(!w.contains(day(5)));
        let w = TimeWindow::from_bounds(Some(day(5)), None);
        assert!(!w.contains(day(4)));
        assert!(w.contains(day(5000)));
        assert!(TimeWindow::unbounded().contains(day(0)));
    }

    #[test]
    fn adjacent_windows_do_not_overlap() {
        let a = TimeWindow::bounded(day(0), day(1));
        let b = TimeWindow::bounded(day(1), day(2));
        assert!(!a.overlaps(&b));
        assert!(!b.overlaps(&a));
        let c = TimeWindow::bounded(day(0), day(1) + Duration::seconds(1));
        assert!(c.overlaps(&b));
    }

    #[test]
    fn overlap_with_open_ended_windows() {
        let cycle = TimeWindow::bounded(day(10), day(11));
        assert!(TimeWindow::unbounded().overlaps(&cycle));
        assert!(TimeWindow::from_bounds(None, Some(day(11))).overlaps(&cycle));
        assert!(!TimeWindow::from_bounds(None, Some(day(10))).overlaps(&cycle));
        assert!(TimeWindow::from_bounds(Some(day(10)), None).overlaps(&cycle));
        assert!(!TimeWindow::from_bounds(Some(day(11)), None).overlaps(&cycle));
    }

    #[test]
    fn empty_windows_overlap_nothing() {
        let empty = TimeWindow::bounded(day(3), day(3));
        assert!(empty.is_empty());
        assert!(!empty.overlaps(&TimeWindow::unbounded()));
        assert!(!TimeWindow::unbounded().overlaps(&empty));
        assert!(!TimeWindow::bounded(day(4), day(2)).contains(day(3)));
    }
}
