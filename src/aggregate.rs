//! Attendance percentages.
//!
//! A course's percentage weighs each session by its status: present counts fully, late counts
//! half, absent counts nothing, and excused sessions are left out of the denominator entirely.
//! The overall figure is the plain mean of the per-course percentages. All rounding is
//! round-half-up and done in integer arithmetic.

use crate::models::{AttendanceStatus, Course, SessionRecord};
use serde::Serialize;

/// How many sessions carry each status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub present: usize,
    pub late: usize,
    pub absent: usize,
    pub excused: usize,
}

impl StatusCounts {
    pub fn tally<'a>(statuses: impl IntoIterator<Item = &'a AttendanceStatus>) -> Self {
        let mut counts = Self::default();
        for status in statuses {
            counts.add(*status);
        }
        counts
    }

    pub fn add(&mut self, status: AttendanceStatus) {
        match status {
            AttendanceStatus::Present => self.present += 1,
            AttendanceStatus::Late => self.late += 1,
            AttendanceStatus::Absent => self.absent += 1,
            AttendanceStatus::Excused => self.excused += 1,
        }
    }

    pub fn get(&self, status: AttendanceStatus) -> usize {
        match status {
            AttendanceStatus::Present => self.present,
            AttendanceStatus::Late => self.late,
            AttendanceStatus::Absent => self.absent,
            AttendanceStatus::Excused => self.excused,
        }
    }

    pub fn total(&self) -> usize {
        self.present + self.late + self.absent + self.excused
    }

    /// The sessions that count towards the percentage, i.e. everything but excused ones.
    pub fn counted(&self) -> usize {
        self.present + self.late + self.absent
    }

    /// The weighted attendance percentage, from 0 to 100. Zero when nothing counts.
    pub fn percentage(&self) -> u8 {
        let counted = self.counted();
        if counted == 0 {
            return 0;
        }

        // Work in half-sessions so that a late mark is a whole unit.
        let halves = 2 * self.present + self.late;
        let out_of = 2 * counted;

        round_ratio(100 * halves, out_of) as u8
    }
}

/// `numerator / denominator` rounded half-up. `denominator` must be non-zero.
fn round_ratio(numerator: usize, denominator: usize) -> usize {
    (2 * numerator + denominator) / (2 * denominator)
}

/// The weighted attendance percentage of a set of sessions.
pub fn attendance_percentage<'a>(statuses: impl IntoIterator<Item = &'a AttendanceStatus>) -> u8 {
    StatusCounts::tally(statuses).percentage()
}

/// The unweighted mean of per-course percentages. Zero when there are no courses.
pub fn overall_percentage(course_percentages: &[u8]) -> u8 {
    if course_percentages.is_empty() {
        return 0;
    }

    let sum: usize = course_percentages.iter().map(|&p| usize::from(p)).sum();
    round_ratio(sum, course_percentages.len()) as u8
}

/// One course with the attendance figures derived from its sessions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CourseAttendance {
    pub course: Course,
    pub counts: StatusCounts,
    pub percentage: u8,
}

/// The figures shown on the landing screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub courses: Vec<CourseAttendance>,
    pub total_sessions: usize,
    pub overall: u8,
}

impl Dashboard {
    /// Builds the dashboard from the user's courses and all of their sessions. Sessions whose
    /// course is not in `courses` only count towards the total.
    pub fn build(courses: Vec<Course>, sessions: &[SessionRecord]) -> Self {
        let courses: Vec<CourseAttendance> = courses
            .into_iter()
            .map(|course| {
                let counts = StatusCounts::tally(
                    sessions
                        .iter()
                        .filter(|record| record.session.course_id == course.id)
                        .map(|record| &record.session.status),
                );

                CourseAttendance {
                    percentage: counts.percentage(),
                    counts,
                    course,
                }
            })
            .collect();

        let percentages: Vec<u8> = courses.iter().map(|course| course.percentage).collect();

        Self {
            overall: overall_percentage(&percentages),
            total_sessions: sessions.len(),
            courses,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Session;
    use crate::models::AttendanceStatus::*;
    use chrono::NaiveDate;

    #[test]
    fn empty_and_single_status_percentages() {
        assert_eq!(attendance_percentage(&Vec::new()), 0);
        assert_eq!(attendance_percentage(&[Absent]), 0);
        assert_eq!(attendance_percentage(&[Excused]), 0);
        assert_eq!(attendance_percentage(&[Present]), 100);
        assert_eq!(attendance_percentage(&[Late]), 50);
    }

    #[test]
    fn late_counts_half() {
        assert_eq!(attendance_percentage(&[Present, Late]), 75);
    }

    #[test]
    fn excused_sessions_leave_the_denominator() {
        assert_eq!(attendance_percentage(&[Present, Excused, Excused]), 100);
        assert_eq!(attendance_percentage(&[Present, Absent, Excused]), 50);
        assert_eq!(attendance_percentage(&[Excused, Excused]), 0);
    }

    #[test]
    fn rounding_is_half_up() {
        // 1 of 3 is 33.33...
        assert_eq!(attendance_percentage(&[Present, Absent, Absent]), 33);
        // 2 of 3 is 66.66...
        assert_eq!(attendance_percentage(&[Present, Present, Absent]), 67);
        // 0.5 of 8 is 6.25, 1.5 of 8 is 18.75
        let mut statuses = vec![Late];
        statuses.extend([Absent; 7]);
        assert_eq!(attendance_percentage(&statuses), 6);
        let mut statuses = vec![Present, Late];
        statuses.extend([Absent; 6]);
        assert_eq!(attendance_percentage(&statuses), 19);
        // 1 of 8 is exactly 12.5
        let mut statuses = vec![Present];
        statuses.extend([Absent; 7]);
        assert_eq!(attendance_percentage(&statuses), 13);
    }

    #[test]
    fn percentage_stays_within_bounds() {
        let mut statuses = Vec::new();
        for status in AttendanceStatus::ALL.iter().cycle().take(97) {
            statuses.push(*status);
            let percentage = attendance_percentage(&statuses);
            assert!(percentage <= 100, "{percentage} out of range");
        }
    }

    #[test]
    fn overall_is_the_rounded_mean_of_courses() {
        assert_eq!(overall_percentage(&[]), 0);
        assert_eq!(overall_percentage(&[100, 50]), 75);
        assert_eq!(overall_percentage(&[100, 0, 0]), 33);
        assert_eq!(overall_percentage(&[100, 100, 0]), 67);
        assert_eq!(overall_percentage(&[50, 51]), 51);
    }

    fn course(id: &str) -> Course {
        let at = NaiveDate::from_ymd_opt(2026, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Course {
            id: id.into(),
            owner: "user-1".into(),
            title: id.to_uppercase(),
            created_at: at,
            updated_at: at,
        }
    }

    fn record(course_id: &str, day: u32, status: AttendanceStatus) -> SessionRecord {
        let at = NaiveDate::from_ymd_opt(2026, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        SessionRecord {
            session: Session {
                id: format!("{course_id}-{day}"),
                course_id: course_id.into(),
                date: NaiveDate::from_ymd_opt(2026, 1, day).unwrap(),
                status,
                created_at: at,
                updated_at: at,
            },
            course_title: course_id.to_uppercase(),
        }
    }

    #[test]
    fn dashboard_averages_courses_without_weighting_by_session_count() {
        let sessions = vec![
            record("math", 1, Present),
            record("math", 2, Present),
            record("math", 3, Present),
            record("physics", 1, Absent),
            record("physics", 2, Present),
        ];

        let dashboard = Dashboard::build(vec![course("math"), course("physics")], &sessions);

        assert_eq!(dashboard.total_sessions, 5);
        assert_eq!(dashboard.courses[0].percentage, 100);
        assert_eq!(dashboard.courses[1].percentage, 50);
        assert_eq!(dashboard.courses[1].counts.absent, 1);
        assert_eq!(dashboard.overall, 75);
    }

    #[test]
    fn dashboard_counts_courses_without_sessions_as_zero() {
        let sessions = vec![record("math", 1, Present)];
        let dashboard = Dashboard::build(vec![course("math"), course("art")], &sessions);

        assert_eq!(dashboard.courses[1].percentage, 0);
        assert_eq!(dashboard.overall, 50);
    }
}
