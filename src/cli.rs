//! This module contains the command-line interface [`Cli`] parser for tracking course attendance
//! and duty leave.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// The command line configuration struct, where the command-line interface parser is automatically
/// derived by [`clap::Parser`].
#[derive(Parser, Debug)]
#[command(name = "bunkr", version, about = "Track course attendance and duty leave")]
pub struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create an account and sign in.
    Signup(Credentials),

    /// Sign in to an existing account.
    Signin(Credentials),

    /// Sign out and forget the saved session.
    Signout,

    /// Show the signed-in account.
    Whoami,

    /// Show attendance across all courses.
    Dashboard,

    /// Manage courses.
    #[command(subcommand)]
    Course(CourseCommand),

    /// Record and review attendance sessions.
    #[command(subcommand)]
    Session(SessionCommand),

    /// Show the absences and totals for a month.
    Calendar {
        /// The month to start from, as YYYY-MM. Defaults to the current month.
        #[arg(long)]
        month: Option<String>,

        /// Step back this many months.
        #[arg(long, value_name = "N", default_value_t = 0, conflicts_with = "next")]
        prev: u32,

        /// Step forward this many months.
        #[arg(long, value_name = "N", default_value_t = 0)]
        next: u32,
    },

    /// Manage duty leave requests.
    #[command(subcommand)]
    Leave(LeaveCommand),

    /// View or edit the profile.
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// View or change the colour theme.
    #[command(subcommand)]
    Theme(ThemeCommand),

    /// Write all sessions as CSV.
    Export {
        /// The file to write. Defaults to standard output.
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Show the effective configuration.
    Config,
}

#[derive(Args, Debug)]
pub struct Credentials {
    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub password: String,
}

#[derive(Subcommand, Debug)]
pub enum CourseCommand {
    /// List courses, newest first.
    List,

    /// Add a course.
    Add { title: String },

    /// Rename a course.
    Rename { id: String, title: String },

    /// Delete a course together with all of its sessions.
    Delete {
        id: String,

        /// Do not ask for confirmation.
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// List sessions, most recent first.
    List {
        /// Only show the sessions of this course.
        #[arg(long)]
        course: Option<String>,
    },

    /// Mark attendance for a course on a date (present, late, absent or excused).
    Mark {
        course: String,
        date: String,
        status: String,
    },

    /// Change the date or status of a session.
    Update {
        id: String,

        #[arg(long)]
        date: Option<String>,

        #[arg(long)]
        status: Option<String>,
    },

    /// Delete a session.
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum LeaveCommand {
    /// List duty leave requests, newest first.
    List,

    /// Request duty leave, optionally attaching a supporting document.
    Request {
        #[arg(long)]
        from: String,

        #[arg(long)]
        to: String,

        #[arg(long)]
        reason: String,

        /// A supporting document (.pdf, .doc, .docx, .jpg, .jpeg or .png).
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Change a duty leave request.
    Update {
        id: String,

        #[arg(long)]
        from: Option<String>,

        #[arg(long)]
        to: Option<String>,

        #[arg(long)]
        reason: Option<String>,

        /// pending, approved or rejected.
        #[arg(long)]
        status: Option<String>,
    },

    /// Delete a duty leave request.
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum ProfileCommand {
    /// Show the profile.
    Show,

    /// Edit the profile. Fields that are not given keep their current value; pass an empty
    /// string to clear one.
    Set {
        #[arg(long)]
        full_name: Option<String>,

        #[arg(long)]
        roll_no: Option<String>,

        #[arg(long)]
        timezone: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum ThemeCommand {
    /// Show the current theme.
    Show,

    /// Choose a theme (dark or light).
    Set { theme: String },

    /// Switch between dark and light.
    Toggle,

    /// Print the current theme's CSS variables.
    Css,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_nested_subcommands() {
        let cli = Cli::try_parse_from([
            "bunkr", "-vv", "session", "mark", "course-1", "2026-10-16", "late",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Command::Session(SessionCommand::Mark {
                course,
                date,
                status,
            }) => {
                assert_eq!(course, "course-1");
                assert_eq!(date, "2026-10-16");
                assert_eq!(status, "late");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn calendar_steps_one_way_at_a_time() {
        let cli = Cli::try_parse_from(["bunkr", "calendar", "--month", "2026-01", "--prev", "2"])
            .unwrap();
        match cli.command {
            Command::Calendar { month, prev, next } => {
                assert_eq!(month.as_deref(), Some("2026-01"));
                assert_eq!((prev, next), (2, 0));
            }
            other => panic!("unexpected command {other:?}"),
        }

        assert!(Cli::try_parse_from(["bunkr", "calendar", "--prev", "1", "--next", "1"]).is_err());
    }

    #[test]
    fn course_delete_defaults_to_asking() {
        let cli = Cli::try_parse_from(["bunkr", "course", "delete", "course-1"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Course(CourseCommand::Delete { yes: false, .. })
        ));
    }
}
