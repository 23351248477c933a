//! A month-at-a-time view over attendance history.

use crate::aggregate::StatusCounts;
use crate::error::{Error, Result};
use crate::models::{AttendanceStatus, SessionRecord};
use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::str::FromStr;

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CalendarMonth {
    year: i32,
    month: u32,
}

impl CalendarMonth {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if !(1..=12).contains(&month) || NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(Error::Validation(format!("Invalid month {year}-{month:02}")));
        }
        Ok(Self { year, month })
    }

    /// The month containing `date`.
    pub fn containing(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn prev(&self) -> Self {
        match self.month {
            1 => Self {
                year: self.year - 1,
                month: 12,
            },
            m => Self {
                year: self.year,
                month: m - 1,
            },
        }
    }

    pub fn next(&self) -> Self {
        match self.month {
            12 => Self {
                year: self.year + 1,
                month: 1,
            },
            m => Self {
                year: self.year,
                month: m + 1,
            },
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }

    /// The month's display name, e.g. "October 2026".
    pub fn label(&self) -> String {
        match NaiveDate::from_ymd_opt(self.year, self.month, 1) {
            Some(first) => first.format("%B %Y").to_string(),
            None => self.to_string(),
        }
    }
}

impl fmt::Display for CalendarMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for CalendarMonth {
    type Err = Error;

    /// Parses `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::Validation(format!("Invalid month '{s}', expected YYYY-MM"));

        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;

        Self::new(year, month)
    }
}

/// The absences and status totals for one month.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarView {
    pub month: CalendarMonth,
    pub absences: Vec<SessionRecord>,
    pub counts: StatusCounts,
}

impl CalendarView {
    /// Picks out the sessions dated within `month`. Absences keep the order of `sessions`.
    pub fn build(month: CalendarMonth, sessions: &[SessionRecord]) -> Self {
        let in_month: Vec<&SessionRecord> = sessions
            .iter()
            .filter(|record| month.contains(record.session.date))
            .collect();

        let counts = StatusCounts::tally(in_month.iter().map(|record| &record.session.status));

        let absences = in_month
            .into_iter()
            .filter(|record| record.session.status == AttendanceStatus::Absent)
            .cloned()
            .collect();

        Self {
            month,
            absences,
            counts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Session;

    fn record(date: &str, status: AttendanceStatus) -> SessionRecord {
        let date: NaiveDate = date.parse().unwrap();
        let at = date.and_hms_opt(9, 0, 0).unwrap();
        SessionRecord {
            session: Session {
                id: date.to_string(),
                course_id: "course-1".into(),
                date,
                status,
                created_at: at,
                updated_at: at,
            },
            course_title: "Compilers".into(),
        }
    }

    #[test]
    fn navigation_wraps_around_the_year() {
        let january = CalendarMonth::new(2026, 1).unwrap();
        assert_eq!(january.prev(), CalendarMonth::new(2025, 12).unwrap());
        assert_eq!(january.prev().next(), january);

        let december = CalendarMonth::new(2026, 12).unwrap();
        assert_eq!(december.next(), CalendarMonth::new(2027, 1).unwrap());
    }

    #[test]
    fn parses_and_labels_months() {
        let month: CalendarMonth = "2026-10".parse().unwrap();
        assert_eq!(month.label(), "October 2026");
        assert_eq!(month.to_string(), "2026-10");

        assert!("2026-13".parse::<CalendarMonth>().is_err());
        assert!("2026".parse::<CalendarMonth>().is_err());
        assert!("October".parse::<CalendarMonth>().is_err());
    }

    #[test]
    fn view_only_covers_the_chosen_month() {
        let sessions = vec![
            record("2026-11-02", AttendanceStatus::Absent),
            record("2026-10-30", AttendanceStatus::Absent),
            record("2026-10-15", AttendanceStatus::Present),
            record("2026-10-14", AttendanceStatus::Late),
            record("2026-10-01", AttendanceStatus::Absent),
            record("2026-09-30", AttendanceStatus::Excused),
        ];

        let view = CalendarView::build("2026-10".parse().unwrap(), &sessions);

        let absent_dates: Vec<String> = view
            .absences
            .iter()
            .map(|record| record.session.date.to_string())
            .collect();
        assert_eq!(absent_dates, ["2026-10-30", "2026-10-01"]);

        assert_eq!(view.counts.present, 1);
        assert_eq!(view.counts.late, 1);
        assert_eq!(view.counts.absent, 2);
        assert_eq!(view.counts.excused, 0);
    }
}
