use crate::aggregate::Dashboard;
use crate::auth::AuthSession;
use crate::cache::{Entity, QueryCache};
use crate::calendar::{CalendarMonth, CalendarView};
use crate::error::Result;
use crate::models::{
    Course, CourseChanges, DutyLeave, DutyLeaveChanges, DutyLeaveRequest, NewSession, Profile,
    ProfileChanges, Session, SessionChanges, SessionRecord,
};
use crate::storage::{Attachment, DUTY_LEAVE_BUCKET, ObjectStorage};
use crate::store::Store;

/// The application client: the store and object storage, with a read-through cache in front of
/// the list queries.
///
/// Reads go through the cache keyed by entity and owner. Every successful mutation invalidates
/// the entries it could have changed, so the next read goes back to the store.
pub struct Bunkr<S> {
    store: Store,
    storage: S,
    profiles: QueryCache<Option<Profile>>,
    courses: QueryCache<Vec<Course>>,
    sessions: QueryCache<Vec<SessionRecord>>,
    duty_leaves: QueryCache<Vec<DutyLeave>>,
}

impl<S: ObjectStorage> Bunkr<S> {
    pub fn new(store: Store, storage: S) -> Self {
        Self {
            store,
            storage,
            profiles: QueryCache::new(Entity::Profile),
            courses: QueryCache::new(Entity::Courses),
            sessions: QueryCache::new(Entity::Sessions),
            duty_leaves: QueryCache::new(Entity::DutyLeave),
        }
    }

    fn invalidate(&mut self, owner: &str, entities: &[Entity]) {
        for entity in entities {
            match entity {
                Entity::Profile => self.profiles.invalidate(owner),
                Entity::Courses => self.courses.invalidate(owner),
                Entity::Sessions => self.sessions.invalidate(owner),
                Entity::DutyLeave => self.duty_leaves.invalidate(owner),
            }
        }
    }

    /// Whether a read of `entity` for `user` would currently be served from cache.
    pub fn is_cached(&self, user: &AuthSession, entity: Entity) -> bool {
        let owner = user.user_id.as_str();
        match entity {
            Entity::Profile => self.profiles.contains(owner),
            Entity::Courses => self.courses.contains(owner),
            Entity::Sessions => self.sessions.contains(owner),
            Entity::DutyLeave => self.duty_leaves.contains(owner),
        }
    }

    pub fn sign_up(&mut self, email: &str, password: &str) -> Result<AuthSession> {
        self.store.sign_up(email, password)
    }

    pub fn sign_in(&mut self, email: &str, password: &str) -> Result<AuthSession> {
        self.store.sign_in(email, password)
    }

    /// Drops everything cached for the user.
    pub fn sign_out(&mut self, user: &AuthSession) {
        self.invalidate(
            &user.user_id,
            &[
                Entity::Profile,
                Entity::Courses,
                Entity::Sessions,
                Entity::DutyLeave,
            ],
        );
        tracing::info!(user = %user.user_id, "signed out");
    }

    pub fn current_user(&mut self, saved: &AuthSession) -> Result<Option<AuthSession>> {
        self.store.current_user(saved)
    }

    pub fn profile(&mut self, user: &AuthSession) -> Result<Option<Profile>> {
        let store = &mut self.store;
        self.profiles
            .get_or_fetch(&user.user_id, || store.scoped(user).profile())
    }

    pub fn save_profile(&mut self, user: &AuthSession, changes: &ProfileChanges) -> Result<Profile> {
        let profile = self.store.scoped(user).upsert_profile(changes)?;
        self.invalidate(&user.user_id, &[Entity::Profile]);
        Ok(profile)
    }

    pub fn courses(&mut self, user: &AuthSession) -> Result<Vec<Course>> {
        let store = &mut self.store;
        self.courses
            .get_or_fetch(&user.user_id, || store.scoped(user).courses())
    }

    pub fn course(&mut self, user: &AuthSession, course_id: &str) -> Result<Course> {
        self.store.scoped(user).course(course_id)
    }

    pub fn create_course(&mut self, user: &AuthSession, title: &str) -> Result<Course> {
        let course = self.store.scoped(user).create_course(title)?;
        self.invalidate(&user.user_id, &[Entity::Courses]);
        Ok(course)
    }

    pub fn update_course(
        &mut self,
        user: &AuthSession,
        course_id: &str,
        changes: &CourseChanges,
    ) -> Result<Course> {
        let course = self.store.scoped(user).update_course(course_id, changes)?;
        // Session listings carry the course title.
        self.invalidate(&user.user_id, &[Entity::Courses, Entity::Sessions]);
        Ok(course)
    }

    /// Deletes a course and its sessions, returning how many sessions went with it.
    pub fn delete_course(&mut self, user: &AuthSession, course_id: &str) -> Result<usize> {
        let removed = self.store.scoped(user).delete_course(course_id)?;
        self.invalidate(&user.user_id, &[Entity::Courses, Entity::Sessions]);
        Ok(removed)
    }

    pub fn sessions(&mut self, user: &AuthSession) -> Result<Vec<SessionRecord>> {
        let store = &mut self.store;
        self.sessions
            .get_or_fetch(&user.user_id, || store.scoped(user).sessions())
    }

    pub fn course_sessions(&mut self, user: &AuthSession, course_id: &str) -> Result<Vec<Session>> {
        self.store.scoped(user).course_sessions(course_id)
    }

    pub fn mark_session(&mut self, user: &AuthSession, new_session: &NewSession) -> Result<Session> {
        let session = self.store.scoped(user).mark_session(new_session)?;
        self.invalidate(&user.user_id, &[Entity::Sessions]);
        Ok(session)
    }

    pub fn update_session(
        &mut self,
        user: &AuthSession,
        session_id: &str,
        changes: &SessionChanges,
    ) -> Result<Session> {
        let session = self.store.scoped(user).update_session(session_id, changes)?;
        self.invalidate(&user.user_id, &[Entity::Sessions]);
        Ok(session)
    }

    pub fn delete_session(&mut self, user: &AuthSession, session_id: &str) -> Result<()> {
        self.store.scoped(user).delete_session(session_id)?;
        self.invalidate(&user.user_id, &[Entity::Sessions]);
        Ok(())
    }

    pub fn duty_leaves(&mut self, user: &AuthSession) -> Result<Vec<DutyLeave>> {
        let store = &mut self.store;
        self.duty_leaves
            .get_or_fetch(&user.user_id, || store.scoped(user).duty_leaves())
    }

    pub fn request_duty_leave(
        &mut self,
        user: &AuthSession,
        request: &DutyLeaveRequest,
        attachment: Option<&Attachment>,
    ) -> Result<DutyLeave> {
        let leave = self
            .store
            .scoped(user)
            .request_duty_leave(&self.storage, request, attachment)?;
        self.invalidate(&user.user_id, &[Entity::DutyLeave]);
        Ok(leave)
    }

    pub fn update_duty_leave(
        &mut self,
        user: &AuthSession,
        leave_id: &str,
        changes: &DutyLeaveChanges,
    ) -> Result<DutyLeave> {
        let leave = self.store.scoped(user).update_duty_leave(leave_id, changes)?;
        self.invalidate(&user.user_id, &[Entity::DutyLeave]);
        Ok(leave)
    }

    pub fn delete_duty_leave(&mut self, user: &AuthSession, leave_id: &str) -> Result<()> {
        self.store.scoped(user).delete_duty_leave(leave_id)?;
        self.invalidate(&user.user_id, &[Entity::DutyLeave]);
        Ok(())
    }

    /// The public link to a duty-leave request's supporting document, if it has one.
    pub fn document_url(&self, leave: &DutyLeave) -> Option<String> {
        leave
            .file_path
            .as_deref()
            .map(|path| self.storage.public_url(DUTY_LEAVE_BUCKET, path))
    }

    pub fn dashboard(&mut self, user: &AuthSession) -> Result<Dashboard> {
        let courses = self.courses(user)?;
        let sessions = self.sessions(user)?;
        Ok(Dashboard::build(courses, &sessions))
    }

    pub fn calendar(&mut self, user: &AuthSession, month: CalendarMonth) -> Result<CalendarView> {
        let sessions = self.sessions(user)?;
        Ok(CalendarView::build(month, &sessions))
    }
}
