use crate::error::Result;
use crate::models::{AttendanceStatus, SessionRecord};
use chrono::NaiveDate;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct SessionCsvRow<'a> {
    course: &'a str,
    date: NaiveDate,
    status: AttendanceStatus,
}

/// Writes sessions as `course,date,status` CSV rows, with a header.
pub fn write_sessions_csv<W: Write>(records: &[SessionRecord], writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);

    for record in records {
        csv.serialize(SessionCsvRow {
            course: &record.course_title,
            date: record.session.date,
            status: record.session.status,
        })?;
    }

    csv.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Session;

    #[test]
    fn writes_a_header_and_one_row_per_session() {
        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let at = date.and_hms_opt(8, 30, 0).unwrap();
        let records = vec![SessionRecord {
            session: Session {
                id: "session-1".into(),
                course_id: "course-1".into(),
                date,
                status: AttendanceStatus::Late,
                created_at: at,
                updated_at: at,
            },
            course_title: "Operating Systems, Part II".into(),
        }];

        let mut out = Vec::new();
        write_sessions_csv(&records, &mut out).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "course,date,status\n\"Operating Systems, Part II\",2026-10-16,late\n"
        );
    }

    #[test]
    fn empty_history_writes_nothing() {
        let mut out = Vec::new();
        write_sessions_csv(&[], &mut out).unwrap();
        assert!(out.is_empty());
    }
}
