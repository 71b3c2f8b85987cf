//! Minute-of-day arithmetic and per-day occupancy.

use std::collections::BTreeMap;

use jiff::civil::{Date, DateTime, Time};

use crate::models::{BusyWindow, Constraints, ScheduledBlock};

/// Sentinel for "end of day" when clipping windows that run past midnight.
pub(crate) const END_OF_DAY: i32 = 24 * 60;

pub(crate) fn minute_of_day(time: Time) -> i32 {
    i32::from(time.hour()) * 60 + i32::from(time.minute())
}

/// Time at `minute` past midnight, clamped to the last minute of the day.
pub(crate) fn time_at(minute: i32) -> Time {
    let minute = minute.clamp(0, END_OF_DAY - 1);
    Time::new((minute / 60) as i8, (minute % 60) as i8, 0, 0).unwrap_or(Time::MIN)
}

/// Signed whole minutes from `from` to `to`.
pub(crate) fn minutes_between(from: DateTime, to: DateTime) -> i64 {
    let days = from
        .date()
        .until(to.date())
        .map(|span| i64::from(span.get_days()))
        .unwrap_or(0);
    days * i64::from(END_OF_DAY)
        + i64::from(minute_of_day(to.time()) - minute_of_day(from.time()))
}

/// Portion of `window` that falls on `day`, as minutes.
pub(crate) fn clip_to_day(window: &BusyWindow, day: Date) -> Option<(i32, i32)> {
    if window.end.date() < day || window.start.date() > day || window.start >= window.end {
        return None;
    }
    let start = if window.start.date() < day {
        0
    } else {
        minute_of_day(window.start.time())
    };
    let end = if window.end.date() > day {
        END_OF_DAY
    } else {
        minute_of_day(window.end.time())
    };
    (start < end).then_some((start, end))
}

fn overlaps(a: (i32, i32), b: (i32, i32)) -> bool {
    a.0 < b.1 && b.0 < a.1
}

/// Half-open minute intervals already taken on each day.
#[derive(Debug, Clone, Default)]
pub(crate) struct Occupancy {
    days: BTreeMap<Date, Vec<(i32, i32)>>,
}

impl Occupancy {
    /// Seeds occupancy with fixed events (unless overlap is allowed) and
    /// existing blocks.
    pub(crate) fn new<'a>(
        fixed_events: &[BusyWindow],
        blocks: impl IntoIterator<Item = &'a ScheduledBlock>,
        constraints: &Constraints,
    ) -> Self {
        let mut occupancy = Self::default();
        if !constraints.allow_overlap {
            for event in fixed_events {
                occupancy.add_window(event);
            }
        }
        for block in blocks {
            occupancy.occupy(
                block.day,
                minute_of_day(block.start),
                minute_of_day(block.end),
            );
        }
        occupancy
    }

    fn add_window(&mut self, window: &BusyWindow) {
        let mut day = window.start.date();
        while day <= window.end.date() {
            if let Some((start, end)) = clip_to_day(window, day) {
                self.occupy(day, start, end);
            }
            match day.tomorrow() {
                Ok(next) => day = next,
                Err(_) => break,
            }
        }
    }

    pub(crate) fn occupy(&mut self, day: Date, start: i32, end: i32) {
        if start < end {
            self.days.entry(day).or_default().push((start, end));
        }
    }

    pub(crate) fn is_free(&self, day: Date, start: i32, end: i32) -> bool {
        self.days
            .get(&day)
            .map_or(true, |taken| !taken.iter().any(|t| overlaps(*t, (start, end))))
    }
}

/// Whether `[start, end)` on any day sits inside the day window and clear of
/// every blackout.
pub(crate) fn within_constraints(constraints: &Constraints, start: i32, end: i32) -> bool {
    let day_start = minute_of_day(constraints.day_start);
    let day_end = minute_of_day(constraints.day_end);
    if start < day_start || end > day_end || start >= end {
        return false;
    }
    !constraints.blackouts.iter().any(|b| {
        overlaps(
            (minute_of_day(b.start), minute_of_day(b.end)),
            (start, end),
        )
    })
}

#[cfg(test)]
mod tests {
    use jiff::civil::{date, time};

    use super::*;

    #[test]
    fn test_minutes_between_spans_days() {
        let from = date(2026, 2, 27).at(22, 30, 0, 0);
        let to = date(2026, 3, 1).at(1, 0, 0, 0);
        assert_eq!(minutes_between(from, to), 24 * 60 + 150);
        assert_eq!(minutes_between(to, from), -(24 * 60 + 150));
    }

    #[test]
    fn test_time_at_round_trips() {
        assert_eq!(time_at(9 * 60 + 45), time(9, 45, 0, 0));
        assert_eq!(minute_of_day(time_at(754)), 754);
        assert_eq!(time_at(END_OF_DAY), time(23, 59, 0, 0));
    }

    #[test]
    fn test_clip_overnight_window() {
        let window = BusyWindow::new(
            "Night shift",
            date(2026, 1, 1).at(22, 0, 0, 0),
            date(2026, 1, 2).at(6, 0, 0, 0),
        );
        assert_eq!(clip_to_day(&window, date(2026, 1, 1)), Some((22 * 60, END_OF_DAY)));
        assert_eq!(clip_to_day(&window, date(2026, 1, 2)), Some((0, 6 * 60)));
        assert_eq!(clip_to_day(&window, date(2026, 1, 3)), None);
    }

    #[test]
    fn test_occupancy_respects_overlap_opt_in() {
        let event = BusyWindow::new(
            "Lecture",
            date(2026, 1, 1).at(10, 0, 0, 0),
            date(2026, 1, 1).at(11, 0, 0, 0),
        );
        let strict = Occupancy::new(&[event.clone()], [], &Constraints::default());
        assert!(!strict.is_free(date(2026, 1, 1), 600, 630));
        assert!(strict.is_free(date(2026, 1, 1), 660, 690));

        let relaxed = Occupancy::new(
            &[event],
            [],
            &Constraints {
                allow_overlap: true,
                ..Constraints::default()
            },
        );
        assert!(relaxed.is_free(date(2026, 1, 1), 600, 630));
    }
}
