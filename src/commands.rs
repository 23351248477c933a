//! Carries out the commands parsed by [`crate::cli`].

use crate::auth::{AuthSession, SessionFile};
use crate::calendar::CalendarMonth;
use crate::cli::{
    Command, CourseCommand, Credentials, LeaveCommand, ProfileCommand, SessionCommand,
    ThemeCommand,
};
use crate::client::Bunkr;
use crate::display;
use crate::drafts::{
    CourseDraft, DutyLeaveDraft, ProfileDraft, SessionDraft, parse_date, parse_status,
};
use crate::error::{Error, Result};
use crate::export::write_sessions_csv;
use crate::models::{DutyLeaveChanges, LeaveStatus, SessionChanges};
use crate::settings::Settings;
use crate::storage::ObjectStorage;
use crate::theme::{Theme, ThemePreference};
use chrono::{Local, NaiveDate};
use std::fs::File;
use std::io::{self, Write};

/// Everything a command needs, built once at startup.
pub struct Context<S> {
    pub bunkr: Bunkr<S>,
    pub settings: Settings,
    pub session_file: SessionFile,
    pub theme: ThemePreference,
}

impl<S: ObjectStorage> Context<S> {
    /// The saved session, if any. A session file that cannot be read back is discarded.
    fn saved_session(&self) -> Result<Option<AuthSession>> {
        match self.session_file.load() {
            Err(Error::Json(e)) => {
                tracing::warn!(
                    path = %self.session_file.path().display(),
                    error = %e,
                    "discarding unreadable session file"
                );
                self.session_file.clear()?;
                Ok(None)
            }
            loaded => loaded,
        }
    }

    /// The signed-in user. A saved session whose account no longer exists is discarded.
    fn require_user(&mut self) -> Result<AuthSession> {
        let saved = self.saved_session()?.ok_or(Error::SignedOut)?;

        match self.bunkr.current_user(&saved)? {
            Some(user) => Ok(user),
            None => {
                tracing::warn!(user = %saved.user_id, "saved session refers to a missing account");
                self.session_file.clear()?;
                Err(Error::SignedOut)
            }
        }
    }
}

/// Asks a yes/no question on the terminal. Anything but `y` means no.
fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} y/[N]: ");
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

/// The month to show: `month` (or the one containing `today`), stepped back `prev` times and
/// forward `next` times.
fn pick_month(
    month: Option<&str>,
    prev: u32,
    next: u32,
    today: NaiveDate,
) -> Result<CalendarMonth> {
    let mut month = match month {
        Some(month) => month.parse::<CalendarMonth>()?,
        None => CalendarMonth::containing(today),
    };
    for _ in 0..prev {
        month = month.prev();
    }
    for _ in 0..next {
        month = month.next();
    }
    Ok(month)
}

pub fn run<S: ObjectStorage>(command: Command, ctx: &mut Context<S>) -> Result<()> {
    match command {
        Command::Signup(Credentials { email, password }) => {
            let user = ctx.bunkr.sign_up(&email, &password)?;
            ctx.session_file.save(&user)?;
            println!("Welcome to Bunkr, {}!", user.email);
        }
        Command::Signin(Credentials { email, password }) => {
            let user = ctx.bunkr.sign_in(&email, &password)?;
            ctx.session_file.save(&user)?;
            println!("Signed in as {}.", user.email);
        }
        Command::Signout => {
            if let Some(saved) = ctx.saved_session()? {
                ctx.bunkr.sign_out(&saved);
            }
            if ctx.session_file.clear()? {
                println!("Signed out.");
            } else {
                println!("Not signed in.");
            }
        }
        Command::Whoami => {
            let user = ctx.require_user()?;
            println!("{} (member since {})", user.email, user.created_at.date());
        }
        Command::Dashboard => {
            let user = ctx.require_user()?;
            let dashboard = ctx.bunkr.dashboard(&user)?;
            display::show_dashboard(&dashboard, ctx.theme.load());
        }
        Command::Course(command) => run_course(command, ctx)?,
        Command::Session(command) => run_session(command, ctx)?,
        Command::Calendar { month, prev, next } => {
            let user = ctx.require_user()?;
            let month = pick_month(month.as_deref(), prev, next, Local::now().date_naive())?;
            let view = ctx.bunkr.calendar(&user, month)?;
            display::show_calendar(&view, ctx.theme.load());
        }
        Command::Leave(command) => run_leave(command, ctx)?,
        Command::Profile(command) => run_profile(command, ctx)?,
        Command::Theme(command) => run_theme(command, &ctx.theme)?,
        Command::Export { out } => {
            let user = ctx.require_user()?;
            let sessions = ctx.bunkr.sessions(&user)?;
            match out {
                Some(path) => {
                    write_sessions_csv(&sessions, File::create(&path)?)?;
                    println!("Wrote {} sessions to {}.", sessions.len(), path.display());
                }
                None => write_sessions_csv(&sessions, io::stdout().lock())?,
            }
        }
        Command::Config => {
            let settings = &ctx.settings;
            println!("store.url = {}", settings.store.url);
            println!("store.anon_key = {}", settings.masked_anon_key());
            println!("storage.root = {}", settings.storage.root.display());
            println!("storage.public_url = {}", settings.storage.public_url);
            println!("client.data_dir = {}", settings.client.data_dir.display());
        }
    }

    Ok(())
}

fn run_course<S: ObjectStorage>(command: CourseCommand, ctx: &mut Context<S>) -> Result<()> {
    let user = ctx.require_user()?;

    match command {
        CourseCommand::List => {
            let courses = ctx.bunkr.courses(&user)?;
            display::show_courses(&courses, ctx.theme.load());
        }
        CourseCommand::Add { title } => {
            let title = CourseDraft::new(title).commit()?;
            let course = ctx.bunkr.create_course(&user, &title)?;
            println!("Created course '{}' ({}).", course.title, course.id);
        }
        CourseCommand::Rename { id, title } => {
            let changes = CourseDraft::new(title).commit_changes()?;
            let course = ctx.bunkr.update_course(&user, &id, &changes)?;
            println!("Renamed course to '{}'.", course.title);
        }
        CourseCommand::Delete { id, yes } => {
            let course = ctx.bunkr.course(&user, &id)?;
            let prompt = format!(
                "Delete '{}'? This will also delete all associated sessions.",
                course.title
            );
            if !yes && !confirm(&prompt)? {
                println!("Deletion canceled!");
                return Ok(());
            }

            let removed = ctx.bunkr.delete_course(&user, &id)?;
            println!("Deleted '{}' and {removed} sessions.", course.title);
        }
    }

    Ok(())
}

fn run_session<S: ObjectStorage>(command: SessionCommand, ctx: &mut Context<S>) -> Result<()> {
    let user = ctx.require_user()?;

    match command {
        SessionCommand::List { course: None } => {
            let sessions = ctx.bunkr.sessions(&user)?;
            display::show_sessions(&sessions, ctx.theme.load());
        }
        SessionCommand::List {
            course: Some(course_id),
        } => {
            let course = ctx.bunkr.course(&user, &course_id)?;
            let sessions = ctx.bunkr.course_sessions(&user, &course_id)?;
            display::show_course_sessions(&course, &sessions, ctx.theme.load());
        }
        SessionCommand::Mark {
            course,
            date,
            status,
        } => {
            let new_session = SessionDraft {
                course_id: course,
                date,
                status,
            }
            .commit()?;
            let session = ctx.bunkr.mark_session(&user, &new_session)?;
            println!("Marked {} as {}.", session.date, session.status);
        }
        SessionCommand::Update { id, date, status } => {
            let changes = SessionChanges {
                date: date.map(|date| parse_date("Date", &date)).transpose()?,
                status: status.map(|status| parse_status(&status)).transpose()?,
            };
            let session = ctx.bunkr.update_session(&user, &id, &changes)?;
            println!("Session on {} is now {}.", session.date, session.status);
        }
        SessionCommand::Delete { id } => {
            ctx.bunkr.delete_session(&user, &id)?;
            println!("Deleted session.");
        }
    }

    Ok(())
}

fn run_leave<S: ObjectStorage>(command: LeaveCommand, ctx: &mut Context<S>) -> Result<()> {
    let user = ctx.require_user()?;

    match command {
        LeaveCommand::List => {
            let leaves = ctx.bunkr.duty_leaves(&user)?;
            let theme = ctx.theme.load();
            let bunkr = &ctx.bunkr;
            display::show_duty_leaves(&leaves, |leave| bunkr.document_url(leave), theme);
        }
        LeaveCommand::Request {
            from,
            to,
            reason,
            file,
        } => {
            let (request, attachment) = DutyLeaveDraft {
                from_date: from,
                to_date: to,
                reason,
                document: file,
            }
            .submit()?;

            let leave = ctx
                .bunkr
                .request_duty_leave(&user, &request, attachment.as_ref())?;
            println!("Requested duty leave ({}), now {}.", leave.id, leave.status);
            if let Some(url) = ctx.bunkr.document_url(&leave) {
                println!("Document: {url}");
            }
        }
        LeaveCommand::Update {
            id,
            from,
            to,
            reason,
            status,
        } => {
            let status = status
                .map(|status| {
                    status
                        .trim()
                        .to_lowercase()
                        .parse::<LeaveStatus>()
                        .map_err(|e| Error::Validation(e.to_string()))
                })
                .transpose()?;

            let changes = DutyLeaveChanges {
                from_date: from.map(|from| parse_date("From date", &from)).transpose()?,
                to_date: to.map(|to| parse_date("To date", &to)).transpose()?,
                reason: reason.map(|reason| {
                    let reason = reason.trim();
                    (!reason.is_empty()).then(|| reason.to_string())
                }),
                status,
            };
            let leave = ctx.bunkr.update_duty_leave(&user, &id, &changes)?;
            println!("Duty leave {} is {}.", leave.id, leave.status);
        }
        LeaveCommand::Delete { id } => {
            ctx.bunkr.delete_duty_leave(&user, &id)?;
            println!("Deleted duty leave request.");
        }
    }

    Ok(())
}

fn run_profile<S: ObjectStorage>(command: ProfileCommand, ctx: &mut Context<S>) -> Result<()> {
    let user = ctx.require_user()?;

    match command {
        ProfileCommand::Show => {
            let profile = ctx.bunkr.profile(&user)?;
            display::show_profile(&user, profile.as_ref());
        }
        ProfileCommand::Set {
            full_name,
            roll_no,
            timezone,
        } => {
            let current = ctx.bunkr.profile(&user)?;
            let mut draft = ProfileDraft::from_profile(current.as_ref());
            if let Some(full_name) = full_name {
                draft.full_name = full_name;
            }
            if let Some(roll_no) = roll_no {
                draft.roll_no = roll_no;
            }
            if let Some(timezone) = timezone {
                draft.timezone = timezone;
            }

            let profile = ctx.bunkr.save_profile(&user, &draft.commit()?)?;
            println!("Profile saved.");
            display::show_profile(&user, Some(&profile));
        }
    }

    Ok(())
}

fn run_theme(command: ThemeCommand, preference: &ThemePreference) -> Result<()> {
    match command {
        ThemeCommand::Show => {
            let theme = preference.load();
            println!("{} ({theme})", theme.name());
        }
        ThemeCommand::Set { theme } => {
            let theme: Theme = theme.parse()?;
            preference.save(theme)?;
            println!("Switched to {} ({theme}).", theme.name());
        }
        ThemeCommand::Toggle => {
            let theme = preference.toggle()?;
            println!("Switched to {} ({theme}).", theme.name());
        }
        ThemeCommand::Css => print!("{}", preference.load().css()),
    }

    Ok(())
}
