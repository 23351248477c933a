use crate::aggregate::Dashboard;
use crate::auth::AuthSession;
use crate::calendar::CalendarView;
use crate::models::{AttendanceStatus, Course, DutyLeave, Profile, Session, SessionRecord};
use crate::theme::Theme;
use chrono::NaiveDateTime;
use tabled::{Table, Tabled};

fn day(timestamp: &NaiveDateTime) -> String {
    timestamp.date().to_string()
}

fn or_not_set(value: Option<&str>) -> String {
    value.unwrap_or("Not set").to_string()
}

fn themed<T: Tabled>(rows: Vec<T>, theme: Theme) -> Table {
    let mut table = Table::new(rows);
    theme.style_table(&mut table);
    table
}

/// Pretty prints the dashboard: totals, then one line per course.
pub fn show_dashboard(dashboard: &Dashboard, theme: Theme) {
    println!("Total courses: {}", dashboard.courses.len());
    println!("Total sessions: {}", dashboard.total_sessions);
    println!("Overall attendance: {}%", dashboard.overall);

    if dashboard.courses.is_empty() {
        println!("\nNo courses yet. Add one with `bunkr course add <title>`.");
        return;
    }

    #[derive(Tabled)]
    struct CourseRow {
        id: String,
        title: String,
        attendance: String,
        present: usize,
        late: usize,
        absent: usize,
        excused: usize,
        created: String,
    }

    let rows: Vec<CourseRow> = dashboard
        .courses
        .iter()
        .map(|entry| CourseRow {
            id: entry.course.id.clone(),
            title: entry.course.title.clone(),
            attendance: format!("{}%", entry.percentage),
            present: entry.counts.present,
            late: entry.counts.late,
            absent: entry.counts.absent,
            excused: entry.counts.excused,
            created: day(&entry.course.created_at),
        })
        .collect();

    println!("\nYour courses:\n{}", themed(rows, theme));
}

/// Pretty prints a list of courses.
pub fn show_courses(courses: &[Course], theme: Theme) {
    if courses.is_empty() {
        println!("No courses yet.");
        return;
    }

    #[derive(Tabled)]
    struct CourseRow {
        id: String,
        title: String,
        created: String,
        updated: String,
    }

    let rows: Vec<CourseRow> = courses
        .iter()
        .map(|course| CourseRow {
            id: course.id.clone(),
            title: course.title.clone(),
            created: day(&course.created_at),
            updated: day(&course.updated_at),
        })
        .collect();

    println!("Courses:\n{}", themed(rows, theme));
}

#[derive(Tabled)]
struct SessionRow {
    id: String,
    course: String,
    date: String,
    status: AttendanceStatus,
}

/// Pretty prints sessions across all courses.
pub fn show_sessions(records: &[SessionRecord], theme: Theme) {
    if records.is_empty() {
        println!("No sessions recorded.");
        return;
    }

    let rows: Vec<SessionRow> = records
        .iter()
        .map(|record| SessionRow {
            id: record.session.id.clone(),
            course: record.course_title.clone(),
            date: record.session.date.to_string(),
            status: record.session.status,
        })
        .collect();

    println!("Sessions:\n{}", themed(rows, theme));
}

/// Pretty prints the sessions of a single course.
pub fn show_course_sessions(course: &Course, sessions: &[Session], theme: Theme) {
    if sessions.is_empty() {
        println!("No sessions recorded for {}.", course.title);
        return;
    }

    let rows: Vec<SessionRow> = sessions
        .iter()
        .map(|session| SessionRow {
            id: session.id.clone(),
            course: course.title.clone(),
            date: session.date.to_string(),
            status: session.status,
        })
        .collect();

    println!("{} sessions:\n{}", course.title, themed(rows, theme));
}

/// Pretty prints a month of attendance: absences first, then totals.
pub fn show_calendar(view: &CalendarView, theme: Theme) {
    println!("{}", view.month.label());

    if view.absences.is_empty() {
        println!("No absences this month.");
    } else {
        #[derive(Tabled)]
        struct AbsenceRow {
            date: String,
            course: String,
        }

        let rows: Vec<AbsenceRow> = view
            .absences
            .iter()
            .map(|record| AbsenceRow {
                date: record.session.date.to_string(),
                course: record.course_title.clone(),
            })
            .collect();

        println!("Absences:\n{}", themed(rows, theme));
    }

    #[derive(Tabled)]
    struct TotalRow {
        status: AttendanceStatus,
        sessions: usize,
    }

    let rows: Vec<TotalRow> = AttendanceStatus::ALL
        .into_iter()
        .map(|status| TotalRow {
            status,
            sessions: view.counts.get(status),
        })
        .collect();

    println!("Totals:\n{}", themed(rows, theme));
}

/// Pretty prints duty-leave requests. `document_url` resolves each attachment to a link.
pub fn show_duty_leaves(
    leaves: &[DutyLeave],
    document_url: impl Fn(&DutyLeave) -> Option<String>,
    theme: Theme,
) {
    if leaves.is_empty() {
        println!("No duty leave requests.");
        return;
    }

    #[derive(Tabled)]
    struct LeaveRow {
        id: String,
        from: String,
        to: String,
        reason: String,
        status: String,
        submitted: String,
        document: String,
    }

    let rows: Vec<LeaveRow> = leaves
        .iter()
        .map(|leave| LeaveRow {
            id: leave.id.clone(),
            from: leave.from_date.to_string(),
            to: leave.to_date.to_string(),
            reason: leave.reason.clone().unwrap_or_default(),
            status: leave.status.to_string(),
            submitted: day(&leave.created_at),
            document: document_url(leave).unwrap_or_else(|| "-".to_string()),
        })
        .collect();

    println!("Duty leave:\n{}", themed(rows, theme));
}

/// Prints the profile along with account details.
pub fn show_profile(user: &AuthSession, profile: Option<&Profile>) {
    println!("Email: {}", user.email);
    println!(
        "Full name: {}",
        or_not_set(profile.and_then(|p| p.full_name.as_deref()))
    );
    println!(
        "Roll number: {}",
        or_not_set(profile.and_then(|p| p.roll_no.as_deref()))
    );
    println!(
        "Timezone: {}",
        profile.map_or(crate::store::DEFAULT_TIMEZONE, |p| p.timezone.as_str())
    );
    println!("Member since: {}", day(&user.created_at));
}
