//! Edit buffers for forms.
//!
//! A draft holds raw input exactly as it was typed. Committing a draft validates it and consumes
//! it; cancelling is simply dropping it. Nothing reaches the store until a draft commits.

use crate::error::{Error, Result};
use crate::models::{
    AttendanceStatus, CourseChanges, DutyLeaveRequest, NewSession, ParseStatusError, Profile,
    ProfileChanges,
};
use crate::storage::Attachment;
use crate::store::DEFAULT_TIMEZONE;
use chrono::NaiveDate;
use std::path::PathBuf;

/// The timezones a profile may choose from.
pub const TIMEZONES: [&str; 8] = [
    "Asia/Kolkata",
    "Asia/Dubai",
    "Asia/Singapore",
    "Asia/Tokyo",
    "Europe/London",
    "Europe/Paris",
    "America/New_York",
    "America/Los_Angeles",
];

/// Parses a `YYYY-MM-DD` date typed into the field called `field`.
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::Validation(format!("{field} is required")));
    }
    value
        .parse()
        .map_err(|_| Error::Validation(format!("{field} '{value}' is not a date (YYYY-MM-DD)")))
}

/// Blank input means "not set".
fn non_blank(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CourseDraft {
    pub title: String,
}

impl CourseDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
        }
    }

    /// Validates the title for a new course.
    pub fn commit(self) -> Result<String> {
        non_blank(&self.title).ok_or_else(|| Error::Validation("Course title is required".into()))
    }

    /// Validates the title as an edit to an existing course.
    pub fn commit_changes(self) -> Result<CourseChanges> {
        Ok(CourseChanges {
            title: Some(self.commit()?),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionDraft {
    pub course_id: String,
    pub date: String,
    pub status: String,
}

impl SessionDraft {
    /// Validates the attendance mark. The status must be one of present, late, absent or excused.
    pub fn commit(self) -> Result<NewSession> {
        let course_id = non_blank(&self.course_id)
            .ok_or_else(|| Error::Validation("Course is required".into()))?;
        let date = parse_date("Date", &self.date)?;
        let status = parse_status(&self.status)?;

        Ok(NewSession {
            course_id,
            date,
            status,
        })
    }
}

/// Parses an attendance status typed by the user.
pub fn parse_status(value: &str) -> Result<AttendanceStatus> {
    value
        .trim()
        .to_lowercase()
        .parse()
        .map_err(|e: ParseStatusError| Error::Validation(e.to_string()))
}

/// The profile form. Starts from the saved profile, or from defaults when there is none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileDraft {
    pub full_name: String,
    pub roll_no: String,
    pub timezone: String,
}

impl Default for ProfileDraft {
    fn default() -> Self {
        Self {
            full_name: String::new(),
            roll_no: String::new(),
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }
}

impl ProfileDraft {
    pub fn from_profile(profile: Option<&Profile>) -> Self {
        match profile {
            Some(profile) => Self {
                full_name: profile.full_name.clone().unwrap_or_default(),
                roll_no: profile.roll_no.clone().unwrap_or_default(),
                timezone: profile.timezone.clone(),
            },
            None => Self::default(),
        }
    }

    /// Validates the form into a full profile update. Blank fields are cleared.
    pub fn commit(self) -> Result<ProfileChanges> {
        let timezone = self.timezone.trim();
        if !TIMEZONES.contains(&timezone) {
            return Err(Error::Validation(format!(
                "Unsupported timezone '{timezone}', expected one of: {}",
                TIMEZONES.join(", ")
            )));
        }

        Ok(ProfileChanges {
            full_name: Some(non_blank(&self.full_name)),
            roll_no: Some(non_blank(&self.roll_no)),
            timezone: Some(timezone.to_string()),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DutyLeaveDraft {
    pub from_date: String,
    pub to_date: String,
    pub reason: String,
    pub document: Option<PathBuf>,
}

impl DutyLeaveDraft {
    /// Validates the request and reads its supporting document, if one was chosen.
    pub fn submit(self) -> Result<(DutyLeaveRequest, Option<Attachment>)> {
        let from_date = parse_date("From date", &self.from_date)?;
        let to_date = parse_date("To date", &self.to_date)?;
        if to_date < from_date {
            return Err(Error::Validation(
                "To date must not be before from date".into(),
            ));
        }

        let reason =
            non_blank(&self.reason).ok_or_else(|| Error::Validation("Reason is required".into()))?;

        let attachment = self
            .document
            .as_deref()
            .map(Attachment::read)
            .transpose()?;

        Ok((
            DutyLeaveRequest {
                from_date,
                to_date,
                reason,
            },
            attachment,
        ))
    }
}
