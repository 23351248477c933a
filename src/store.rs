use crate::auth::AuthSession;
use crate::error::{Error, Result};
use crate::models::{
    Course, CourseChanges, CourseChangeset, DutyLeave, DutyLeaveChanges, DutyLeaveChangeset,
    DutyLeaveRequest, DutyLeaveRow, LeaveStatus, NewCourse, NewProfile, NewSession, Profile,
    ProfileChanges, ProfileChangeset, Session, SessionChanges, SessionChangeset, SessionRecord,
    SessionRow,
};
use crate::schema::{courses, duty_leave, profiles, sessions};
use crate::storage::{Attachment, DUTY_LEAVE_BUCKET, ObjectStorage};
use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use uuid::Uuid;

/// The schema migrations compiled into the binary.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// The timezone given to profiles that have not chosen one.
pub const DEFAULT_TIMEZONE: &str = "Asia/Kolkata";

pub(crate) fn now() -> NaiveDateTime {
    Utc::now().naive_utc()
}

pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// The relational store holding users, profiles, courses, sessions and duty-leave requests.
///
/// Entity rows are only reachable through [`Store::scoped`], which ties every query to the
/// signed-in user.
pub struct Store {
    db: SqliteConnection,
}

impl Store {
    /// Connects to the `sqlite3` database at `database_url`, enables foreign key enforcement and
    /// applies any pending migrations.
    pub fn connect(database_url: &str) -> Result<Self> {
        let mut db = SqliteConnection::establish(database_url).map_err(|source| {
            Error::Connection {
                url: database_url.to_string(),
                source,
            }
        })?;

        diesel::sql_query("PRAGMA foreign_keys = ON").execute(&mut db)?;

        let mut store = Self { db };
        store.migrate()?;

        tracing::debug!(database_url, "connected to store");
        Ok(store)
    }

    /// Applies pending migrations and returns the versions that were applied.
    pub fn migrate(&mut self) -> Result<Vec<String>> {
        let applied = self
            .db
            .run_pending_migrations(MIGRATIONS)
            .map_err(|e| Error::Migration(e.to_string()))?;

        let versions: Vec<String> = applied.iter().map(ToString::to_string).collect();
        if !versions.is_empty() {
            tracing::info!(?versions, "applied migrations");
        }

        Ok(versions)
    }

    /// Returns a view of the store restricted to the rows owned by `user`.
    pub fn scoped<'a>(&'a mut self, user: &'a AuthSession) -> UserStore<'a> {
        UserStore {
            db: &mut self.db,
            owner: &user.user_id,
        }
    }

    pub(crate) fn connection(&mut self) -> &mut SqliteConnection {
        &mut self.db
    }
}

/// The store as seen by a single user.
///
/// Every query filters on the owner, so rows belonging to other users behave exactly as if they
/// did not exist.
pub struct UserStore<'a> {
    db: &'a mut SqliteConnection,
    owner: &'a str,
}

impl UserStore<'_> {
    /// Retrieves the user's profile. A missing profile is not an error.
    pub fn profile(&mut self) -> Result<Option<Profile>> {
        Ok(profiles::table
            .find(self.owner)
            .select(Profile::as_select())
            .first(self.db)
            .optional()?)
    }

    /// Creates the user's profile or updates the fields present in `changes`.
    pub fn upsert_profile(&mut self, changes: &ProfileChanges) -> Result<Profile> {
        let timestamp = now();

        let fresh = NewProfile {
            id: self.owner,
            full_name: changes.full_name.as_ref().and_then(|name| name.as_deref()),
            roll_no: changes.roll_no.as_ref().and_then(|roll| roll.as_deref()),
            timezone: changes.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE),
            created_at: timestamp,
            updated_at: timestamp,
        };

        let changeset = ProfileChangeset {
            full_name: changes.full_name.as_ref().map(|name| name.as_deref()),
            roll_no: changes.roll_no.as_ref().map(|roll| roll.as_deref()),
            timezone: changes.timezone.as_deref(),
            updated_at: timestamp,
        };

        diesel::insert_into(profiles::table)
            .values(&fresh)
            .on_conflict(profiles::id)
            .do_update()
            .set(&changeset)
            .execute(self.db)?;

        tracing::info!(owner = self.owner, "profile saved");

        self.profile()?.ok_or(Error::NotFound("profile"))
    }

    /// Retrieves all of the user's courses, newest first.
    pub fn courses(&mut self) -> Result<Vec<Course>> {
        Ok(courses::table
            .filter(courses::owner.eq(self.owner))
            .order(courses::created_at.desc())
            .select(Course::as_select())
            .load(self.db)?)
    }

    /// Retrieves one of the user's courses.
    pub fn course(&mut self, course_id: &str) -> Result<Course> {
        courses::table
            .filter(courses::id.eq(course_id))
            .filter(courses::owner.eq(self.owner))
            .select(Course::as_select())
            .first(self.db)
            .optional()?
            .ok_or(Error::NotFound("course"))
    }

    /// Creates a course owned by the user.
    pub fn create_course(&mut self, title: &str) -> Result<Course> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::Validation("Course title is required".into()));
        }

        let timestamp = now();
        let id = new_id();

        let course = diesel::insert_into(courses::table)
            .values(NewCourse {
                id: &id,
                owner: self.owner,
                title,
                created_at: timestamp,
                updated_at: timestamp,
            })
            .returning(Course::as_returning())
            .get_result(self.db)?;

        tracing::info!(owner = self.owner, course = %course.id, "created course");
        Ok(course)
    }

    /// Applies a partial update to one of the user's courses.
    pub fn update_course(&mut self, course_id: &str, changes: &CourseChanges) -> Result<Course> {
        let title = changes.title.as_deref().map(str::trim);
        if title.is_some_and(str::is_empty) {
            return Err(Error::Validation("Course title is required".into()));
        }

        let target = courses::table
            .filter(courses::id.eq(course_id))
            .filter(courses::owner.eq(self.owner));

        diesel::update(target)
            .set(&CourseChangeset {
                title,
                updated_at: now(),
            })
            .returning(Course::as_returning())
            .get_result(self.db)
            .optional()?
            .ok_or(Error::NotFound("course"))
    }

    /// Deletes one of the user's courses along with every session recorded for it.
    ///
    /// Returns the number of sessions that were removed.
    pub fn delete_course(&mut self, course_id: &str) -> Result<usize> {
        let owner = self.owner;

        let removed = self.db.transaction::<_, Error, _>(|conn| {
            let course = courses::table
                .filter(courses::id.eq(course_id))
                .filter(courses::owner.eq(owner))
                .select(Course::as_select())
                .first(conn)
                .optional()?
                .ok_or(Error::NotFound("course"))?;

            let removed = diesel::delete(sessions::table.filter(sessions::course_id.eq(&course.id)))
                .execute(conn)?;

            diesel::delete(courses::table.find(&course.id)).execute(conn)?;

            Ok(removed)
        })?;

        tracing::info!(owner, course = course_id, removed, "deleted course");
        Ok(removed)
    }

    /// Retrieves every session across all of the user's courses, most recent date first.
    pub fn sessions(&mut self) -> Result<Vec<SessionRecord>> {
        let rows = sessions::table
            .inner_join(courses::table)
            .filter(courses::owner.eq(self.owner))
            .order((sessions::date.desc(), sessions::created_at.desc()))
            .select((Session::as_select(), courses::title))
            .load::<(Session, String)>(self.db)?;

        Ok(rows
            .into_iter()
            .map(|(session, course_title)| SessionRecord {
                session,
                course_title,
            })
            .collect())
    }

    /// Retrieves the sessions of one of the user's courses, most recent date first.
    pub fn course_sessions(&mut self, course_id: &str) -> Result<Vec<Session>> {
        // Resolve the course first so that a foreign course is reported as missing rather than
        // silently returning nothing.
        let course = self.course(course_id)?;

        Ok(sessions::table
            .filter(sessions::course_id.eq(&course.id))
            .order(sessions::date.desc())
            .select(Session::as_select())
            .load(self.db)?)
    }

    /// Records the attendance mark for a course on a date. If that date has already been marked
    /// for the course, its status is replaced.
    pub fn mark_session(&mut self, new_session: &NewSession) -> Result<Session> {
        let course = self.course(&new_session.course_id)?;
        let timestamp = now();
        let id = new_id();

        diesel::insert_into(sessions::table)
            .values(SessionRow {
                id: &id,
                course_id: &course.id,
                date: new_session.date,
                status: new_session.status,
                created_at: timestamp,
                updated_at: timestamp,
            })
            .on_conflict((sessions::course_id, sessions::date))
            .do_update()
            .set((
                sessions::status.eq(new_session.status),
                sessions::updated_at.eq(timestamp),
            ))
            .execute(self.db)?;

        let session = sessions::table
            .filter(sessions::course_id.eq(&course.id))
            .filter(sessions::date.eq(new_session.date))
            .select(Session::as_select())
            .first(self.db)?;

        tracing::info!(
            owner = self.owner,
            course = %course.id,
            date = %session.date,
            status = %session.status,
            "marked session"
        );
        Ok(session)
    }

    /// Applies a partial update to one of the user's sessions.
    pub fn update_session(&mut self, session_id: &str, changes: &SessionChanges) -> Result<Session> {
        let owned_courses = courses::table
            .filter(courses::owner.eq(self.owner))
            .select(courses::id);

        let target = sessions::table
            .filter(sessions::id.eq(session_id))
            .filter(sessions::course_id.eq_any(owned_courses));

        diesel::update(target)
            .set(&SessionChangeset {
                date: changes.date,
                status: changes.status,
                updated_at: now(),
            })
            .returning(Session::as_returning())
            .get_result(self.db)
            .optional()?
            .ok_or(Error::NotFound("session"))
    }

    /// Deletes one of the user's sessions.
    pub fn delete_session(&mut self, session_id: &str) -> Result<()> {
        let owned_courses = courses::table
            .filter(courses::owner.eq(self.owner))
            .select(courses::id);

        let deleted = diesel::delete(
            sessions::table
                .filter(sessions::id.eq(session_id))
                .filter(sessions::course_id.eq_any(owned_courses)),
        )
        .execute(self.db)?;

        if deleted == 0 {
            return Err(Error::NotFound("session"));
        }

        tracing::info!(owner = self.owner, session = session_id, "deleted session");
        Ok(())
    }

    /// Retrieves the user's duty-leave requests, newest first.
    pub fn duty_leaves(&mut self) -> Result<Vec<DutyLeave>> {
        Ok(duty_leave::table
            .filter(duty_leave::user_id.eq(self.owner))
            .order(duty_leave::created_at.desc())
            .select(DutyLeave::as_select())
            .load(self.db)?)
    }

    /// Retrieves one of the user's duty-leave requests.
    pub fn duty_leave(&mut self, leave_id: &str) -> Result<DutyLeave> {
        duty_leave::table
            .filter(duty_leave::id.eq(leave_id))
            .filter(duty_leave::user_id.eq(self.owner))
            .select(DutyLeave::as_select())
            .first(self.db)
            .optional()?
            .ok_or(Error::NotFound("duty leave"))
    }

    /// Files a duty-leave request.
    ///
    /// The reason and date range are checked before anything is uploaded. If an attachment is
    /// given it is uploaded to the user's folder in the duty-leave bucket first, and the request
    /// is only written once the upload has succeeded. A failed upload leaves no request behind.
    pub fn request_duty_leave(
        &mut self,
        storage: &dyn ObjectStorage,
        request: &DutyLeaveRequest,
        attachment: Option<&Attachment>,
    ) -> Result<DutyLeave> {
        let reason = request.reason.trim();
        if reason.is_empty() {
            return Err(Error::Validation("Reason is required".into()));
        }
        if request.to_date < request.from_date {
            return Err(Error::Validation(
                "To date must not be before from date".into(),
            ));
        }

        let file_path = match attachment {
            Some(attachment) => {
                let path = attachment.object_path(self.owner, Utc::now());
                storage.upload(DUTY_LEAVE_BUCKET, &path, attachment.contents())?;
                Some(path)
            }
            None => None,
        };

        let timestamp = now();
        let id = new_id();

        let leave = diesel::insert_into(duty_leave::table)
            .values(DutyLeaveRow {
                id: &id,
                user_id: self.owner,
                from_date: request.from_date,
                to_date: request.to_date,
                reason: Some(reason),
                file_path: file_path.as_deref(),
                status: LeaveStatus::Pending,
                created_at: timestamp,
                updated_at: timestamp,
            })
            .returning(DutyLeave::as_returning())
            .get_result(self.db)?;

        tracing::info!(
            owner = self.owner,
            leave = %leave.id,
            attachment = leave.file_path.is_some(),
            "requested duty leave"
        );
        Ok(leave)
    }

    /// Applies a partial update to one of the user's duty-leave requests.
    pub fn update_duty_leave(
        &mut self,
        leave_id: &str,
        changes: &DutyLeaveChanges,
    ) -> Result<DutyLeave> {
        let target = duty_leave::table
            .filter(duty_leave::id.eq(leave_id))
            .filter(duty_leave::user_id.eq(self.owner));

        diesel::update(target)
            .set(&DutyLeaveChangeset {
                from_date: changes.from_date,
                to_date: changes.to_date,
                reason: changes.reason.as_ref().map(|reason| reason.as_deref()),
                status: changes.status,
                updated_at: now(),
            })
            .returning(DutyLeave::as_returning())
            .get_result(self.db)
            .optional()?
            .ok_or(Error::NotFound("duty leave"))
    }

    /// Deletes one of the user's duty-leave requests. Its attachment, if any, stays in storage.
    pub fn delete_duty_leave(&mut self, leave_id: &str) -> Result<()> {
        let deleted = diesel::delete(
            duty_leave::table
                .filter(duty_leave::id.eq(leave_id))
                .filter(duty_leave::user_id.eq(self.owner)),
        )
        .execute(self.db)?;

        if deleted == 0 {
            return Err(Error::NotFound("duty leave"));
        }

        tracing::info!(owner = self.owner, leave = leave_id, "deleted duty leave");
        Ok(())
    }
}
