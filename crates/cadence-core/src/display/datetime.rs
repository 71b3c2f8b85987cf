//! Date and time formatting utilities.

use std::fmt;

use jiff::civil::{Date, DateTime, Time};

/// Formats a time of day as `HH:MM`.
pub struct ClockTime<'a>(pub &'a Time);

impl fmt::Display for ClockTime<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.strftime("%H:%M"))
    }
}

/// Formats a day as a heading, e.g. `Mon 2026-03-02`.
pub struct DayHeading<'a>(pub &'a Date);

impl fmt::Display for DayHeading<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.strftime("%a %Y-%m-%d"))
    }
}

/// Formats a local date and time as `YYYY-MM-DD HH:MM`.
pub struct LocalDateTime<'a>(pub &'a DateTime);

impl fmt::Display for LocalDateTime<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.strftime("%Y-%m-%d %H:%M"))
    }
}

/// Formats a duration in minutes as `1h 30m`, `45m` or `2h`.
pub struct Minutes(pub u32);

impl fmt::Display for Minutes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.0 / 60, self.0 % 60) {
            (0, m) => write!(f, "{m}m"),
            (h, 0) => write!(f, "{h}h"),
            (h, m) => write!(f, "{h}h {m}m"),
        }
    }
}

#[cfg(test)]
mod tests {
    use jiff::civil::{date, time};

    use super::*;

    #[test]
    fn test_formats() {
        assert_eq!(ClockTime(&time(9, 5, 0, 0)).to_string(), "09:05");
        assert_eq!(DayHeading(&date(2026, 3, 2)).to_string(), "Mon 2026-03-02");
        assert_eq!(
            LocalDateTime(&date(2026, 3, 6).at(17, 0, 0, 0)).to_string(),
            "2026-03-06 17:00"
        );
        assert_eq!(Minutes(45).to_string(), "45m");
        assert_eq!(Minutes(120).to_string(), "2h");
        assert_eq!(Minutes(90).to_string(), "1h 30m");
    }
}
