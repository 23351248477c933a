use crate::schema::{courses, duty_leave, profiles, sessions, users};
use chrono::{NaiveDate, NaiveDateTime};
use diesel::backend::Backend;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::Sqlite;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The attendance mark recorded for one course on one date.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsExpression, FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
    Excused,
}

impl AttendanceStatus {
    pub const ALL: [AttendanceStatus; 4] = [
        AttendanceStatus::Present,
        AttendanceStatus::Late,
        AttendanceStatus::Absent,
        AttendanceStatus::Excused,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Late => "late",
            Self::Absent => "absent",
            Self::Excused => "excused",
        }
    }
}

/// Where a duty-leave request stands in its approval workflow.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    AsExpression,
    FromSqlRow,
)]
#[diesel(sql_type = Text)]
#[serde(rename_all = "lowercase")]
pub enum LeaveStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl LeaveStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

/// Returned when a string is not one of the values of a closed status set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} status '{value}', expected one of: {expected}")]
pub struct ParseStatusError {
    kind: &'static str,
    value: String,
    expected: &'static str,
}

impl FromStr for AttendanceStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "present" => Ok(Self::Present),
            "late" => Ok(Self::Late),
            "absent" => Ok(Self::Absent),
            "excused" => Ok(Self::Excused),
            other => Err(ParseStatusError {
                kind: "attendance",
                value: other.to_string(),
                expected: "present, late, absent, excused",
            }),
        }
    }
}

impl FromStr for LeaveStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            other => Err(ParseStatusError {
                kind: "leave",
                value: other.to_string(),
                expected: "pending, approved, rejected",
            }),
        }
    }
}

/// Stores a closed status enum as its lowercase name in a `TEXT` column.
macro_rules! text_status_sql {
    ($status:ty) => {
        impl fmt::Display for $status {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ToSql<Text, Sqlite> for $status {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
                out.set_value(self.as_str());
                Ok(IsNull::No)
            }
        }

        impl FromSql<Text, Sqlite> for $status {
            fn from_sql(bytes: <Sqlite as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
                let value = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;
                Ok(value.parse()?)
            }
        }
    };
}

text_status_sql!(AttendanceStatus);
text_status_sql!(LeaveStatus);

/// An account known to the identity provider. The password hash never leaves the `auth` module.
#[derive(Debug, Clone, PartialEq, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    pub id: String,
    pub email: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUser<'a> {
    pub id: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(table_name = profiles)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Profile {
    pub id: String,
    pub full_name: Option<String>,
    pub roll_no: Option<String>,
    pub timezone: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = profiles)]
pub(crate) struct NewProfile<'a> {
    pub id: &'a str,
    pub full_name: Option<&'a str>,
    pub roll_no: Option<&'a str>,
    pub timezone: &'a str,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A partial profile update. `None` leaves a field untouched, `Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileChanges {
    pub full_name: Option<Option<String>>,
    pub roll_no: Option<Option<String>>,
    pub timezone: Option<String>,
}

#[derive(AsChangeset)]
#[diesel(table_name = profiles)]
pub(crate) struct ProfileChangeset<'a> {
    pub full_name: Option<Option<&'a str>>,
    pub roll_no: Option<Option<&'a str>>,
    pub timezone: Option<&'a str>,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(table_name = courses)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Course {
    pub id: String,
    pub owner: String,
    pub title: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = courses)]
pub(crate) struct NewCourse<'a> {
    pub id: &'a str,
    pub owner: &'a str,
    pub title: &'a str,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CourseChanges {
    pub title: Option<String>,
}

#[derive(AsChangeset)]
#[diesel(table_name = courses)]
pub(crate) struct CourseChangeset<'a> {
    pub title: Option<&'a str>,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(table_name = sessions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Session {
    pub id: String,
    pub course_id: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A validated attendance mark, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSession {
    pub course_id: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
}

#[derive(Insertable)]
#[diesel(table_name = sessions)]
pub(crate) struct SessionRow<'a> {
    pub id: &'a str,
    pub course_id: &'a str,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionChanges {
    pub date: Option<NaiveDate>,
    pub status: Option<AttendanceStatus>,
}

#[derive(AsChangeset)]
#[diesel(table_name = sessions)]
pub(crate) struct SessionChangeset {
    pub date: Option<NaiveDate>,
    pub status: Option<AttendanceStatus>,
    pub updated_at: NaiveDateTime,
}

/// A session together with the title of the course it belongs to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionRecord {
    #[serde(flatten)]
    pub session: Session,
    pub course_title: String,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Serialize)]
#[diesel(table_name = duty_leave)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DutyLeave {
    pub id: String,
    pub user_id: String,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub reason: Option<String>,
    pub file_path: Option<String>,
    pub status: LeaveStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A validated duty-leave request, without its attachment.
#[derive(Debug, Clone, PartialEq)]
pub struct DutyLeaveRequest {
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub reason: String,
}

#[derive(Insertable)]
#[diesel(table_name = duty_leave)]
pub(crate) struct DutyLeaveRow<'a> {
    pub id: &'a str,
    pub user_id: &'a str,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub reason: Option<&'a str>,
    pub file_path: Option<&'a str>,
    pub status: LeaveStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DutyLeaveChanges {
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub reason: Option<Option<String>>,
    pub status: Option<LeaveStatus>,
}

#[derive(AsChangeset)]
#[diesel(table_name = duty_leave)]
pub(crate) struct DutyLeaveChangeset<'a> {
    pub from_date: Option<NaiveDate>,
    pub to_date: Option<NaiveDate>,
    pub reason: Option<Option<&'a str>>,
    pub status: Option<LeaveStatus>,
    pub updated_at: NaiveDateTime,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attendance_status_parses_only_the_closed_set() {
        for status in AttendanceStatus::ALL {
            assert_eq!(status.as_str().parse::<AttendanceStatus>(), Ok(status));
        }

        assert!("tardy".parse::<AttendanceStatus>().is_err());
        assert!("Present".parse::<AttendanceStatus>().is_err());
        assert!("".parse::<AttendanceStatus>().is_err());
    }

    #[test]
    fn leave_status_defaults_to_pending() {
        assert_eq!(LeaveStatus::default(), LeaveStatus::Pending);
        assert!("cancelled".parse::<LeaveStatus>().is_err());
        assert_eq!("approved".parse::<LeaveStatus>(), Ok(LeaveStatus::Approved));
    }

    #[test]
    fn statuses_serialize_lowercase() {
        let json = serde_json::to_string(&AttendanceStatus::Excused).unwrap();
        assert_eq!(json, "\"excused\"");
        assert_eq!(LeaveStatus::Rejected.to_string(), "rejected");
    }
}
