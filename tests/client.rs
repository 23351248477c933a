use bunkr::auth::AuthSession;
use bunkr::cache::Entity;
use bunkr::calendar::CalendarMonth;
use bunkr::client::Bunkr;
use bunkr::drafts::DutyLeaveDraft;
use bunkr::models::{AttendanceStatus, CourseChanges, NewSession, ProfileChanges};
use bunkr::storage::{Attachment, LocalStorage};
use bunkr::store::Store;
use chrono::NaiveDate;
use tempfile::TempDir;

struct Harness {
    bunkr: Bunkr<LocalStorage>,
    user: AuthSession,
    _storage_dir: TempDir,
}

fn harness() -> Harness {
    let storage_dir = tempfile::tempdir().unwrap();
    let storage = LocalStorage::new(storage_dir.path(), "http://localhost:54321/");
    let mut bunkr = Bunkr::new(Store::connect(":memory:").unwrap(), storage);
    let user = bunkr.sign_up("ferris@example.com", "correct horse").unwrap();

    Harness {
        bunkr,
        user,
        _storage_dir: storage_dir,
    }
}

fn mark(
    bunkr: &mut Bunkr<LocalStorage>,
    user: &AuthSession,
    course_id: &str,
    day: &str,
    status: AttendanceStatus,
) {
    bunkr
        .mark_session(
            user,
            &NewSession {
                course_id: course_id.to_string(),
                date: day.parse::<NaiveDate>().unwrap(),
                status,
            },
        )
        .unwrap();
}

#[test]
fn reads_are_cached_until_a_mutation() {
    let Harness {
        mut bunkr,
        user,
        _storage_dir,
    } = harness();

    assert!(!bunkr.is_cached(&user, Entity::Courses));
    assert!(bunkr.courses(&user).unwrap().is_empty());
    assert!(bunkr.is_cached(&user, Entity::Courses));

    let course = bunkr.create_course(&user, "Compilers").unwrap();
    assert!(!bunkr.is_cached(&user, Entity::Courses));
    assert_eq!(bunkr.courses(&user).unwrap(), vec![course.clone()]);

    mark(&mut bunkr, &user, &course.id, "2026-10-16", AttendanceStatus::Present);
    bunkr.sessions(&user).unwrap();
    assert!(bunkr.is_cached(&user, Entity::Sessions));

    // Renaming a course changes the titles carried by session listings.
    bunkr
        .update_course(
            &user,
            &course.id,
            &CourseChanges {
                title: Some("Compiler Design".into()),
            },
        )
        .unwrap();
    assert!(!bunkr.is_cached(&user, Entity::Courses));
    assert!(!bunkr.is_cached(&user, Entity::Sessions));
    assert_eq!(bunkr.sessions(&user).unwrap()[0].course_title, "Compiler Design");
}

#[test]
fn deleting_a_course_refreshes_sessions_too() {
    let Harness {
        mut bunkr,
        user,
        _storage_dir,
    } = harness();

    let course = bunkr.create_course(&user, "Compilers").unwrap();
    mark(&mut bunkr, &user, &course.id, "2026-10-15", AttendanceStatus::Absent);
    mark(&mut bunkr, &user, &course.id, "2026-10-16", AttendanceStatus::Late);
    assert_eq!(bunkr.sessions(&user).unwrap().len(), 2);

    assert_eq!(bunkr.delete_course(&user, &course.id).unwrap(), 2);
    assert!(bunkr.courses(&user).unwrap().is_empty());
    assert!(bunkr.sessions(&user).unwrap().is_empty());
}

#[test]
fn sign_out_forgets_cached_reads() {
    let Harness {
        mut bunkr,
        user,
        _storage_dir,
    } = harness();

    bunkr.profile(&user).unwrap();
    bunkr.courses(&user).unwrap();
    bunkr.sessions(&user).unwrap();
    bunkr.duty_leaves(&user).unwrap();

    bunkr.sign_out(&user);

    for entity in [
        Entity::Profile,
        Entity::Courses,
        Entity::Sessions,
        Entity::DutyLeave,
    ] {
        assert!(!bunkr.is_cached(&user, entity), "{entity} still cached");
    }
}

#[test]
fn caches_are_kept_per_user() {
    let Harness {
        mut bunkr,
        user,
        _storage_dir,
    } = harness();
    let other = bunkr.sign_up("crab@example.com", "correct horse").unwrap();

    bunkr.create_course(&user, "Compilers").unwrap();
    assert_eq!(bunkr.courses(&user).unwrap().len(), 1);
    assert!(bunkr.courses(&other).unwrap().is_empty());

    bunkr.create_course(&other, "Networks").unwrap();
    assert!(bunkr.is_cached(&user, Entity::Courses));
    assert!(!bunkr.is_cached(&other, Entity::Courses));
}

#[test]
fn saving_the_profile_is_visible_on_the_next_read() {
    let Harness {
        mut bunkr,
        user,
        _storage_dir,
    } = harness();

    let before = bunkr.profile(&user).unwrap().unwrap();
    assert_eq!(before.full_name, None);

    bunkr
        .save_profile(
            &user,
            &ProfileChanges {
                full_name: Some(Some("Ferris Crab".into())),
                ..ProfileChanges::default()
            },
        )
        .unwrap();

    let after = bunkr.profile(&user).unwrap().unwrap();
    assert_eq!(after.full_name.as_deref(), Some("Ferris Crab"));
}

#[test]
fn dashboard_summarizes_every_course() {
    let Harness {
        mut bunkr,
        user,
        _storage_dir,
    } = harness();

    let compilers = bunkr.create_course(&user, "Compilers").unwrap();
    let networks = bunkr.create_course(&user, "Networks").unwrap();
    mark(&mut bunkr, &user, &compilers.id, "2026-10-14", AttendanceStatus::Present);
    mark(&mut bunkr, &user, &compilers.id, "2026-10-15", AttendanceStatus::Absent);
    mark(&mut bunkr, &user, &networks.id, "2026-10-15", AttendanceStatus::Present);

    let dashboard = bunkr.dashboard(&user).unwrap();
    assert_eq!(dashboard.courses.len(), 2);
    assert_eq!(dashboard.total_sessions, 3);
    assert_eq!(dashboard.overall, 75);

    let compilers = dashboard
        .courses
        .iter()
        .find(|entry| entry.course.id == compilers.id)
        .unwrap();
    assert_eq!(compilers.percentage, 50);
}

#[test]
fn calendar_only_shows_the_requested_month() {
    let Harness {
        mut bunkr,
        user,
        _storage_dir,
    } = harness();

    let course = bunkr.create_course(&user, "Compilers").unwrap();
    mark(&mut bunkr, &user, &course.id, "2026-09-30", AttendanceStatus::Absent);
    mark(&mut bunkr, &user, &course.id, "2026-10-01", AttendanceStatus::Absent);
    mark(&mut bunkr, &user, &course.id, "2026-10-02", AttendanceStatus::Present);

    let view = bunkr
        .calendar(&user, CalendarMonth::new(2026, 10).unwrap())
        .unwrap();
    assert_eq!(view.absences.len(), 1);
    assert_eq!(view.absences[0].session.date.to_string(), "2026-10-01");
    assert_eq!(view.counts.total(), 2);
}

#[test]
fn duty_leave_documents_resolve_to_public_urls() {
    let Harness {
        mut bunkr,
        user,
        _storage_dir,
    } = harness();

    let (request, _) = DutyLeaveDraft {
        from_date: "2026-10-20".into(),
        to_date: "2026-10-21".into(),
        reason: "Sports meet".into(),
        document: None,
    }
    .submit()
    .unwrap();

    let plain = bunkr.request_duty_leave(&user, &request, None).unwrap();
    assert_eq!(bunkr.document_url(&plain), None);

    let attachment = Attachment::new("certificate.png", vec![0x89, b'P', b'N', b'G']).unwrap();
    let attached = bunkr
        .request_duty_leave(&user, &request, Some(&attachment))
        .unwrap();

    let url = bunkr.document_url(&attached).unwrap();
    let path = attached.file_path.as_deref().unwrap();
    assert_eq!(
        url,
        format!("http://localhost:54321/storage/v1/object/public/duty-leave/{path}")
    );
    assert_eq!(bunkr.duty_leaves(&user).unwrap().len(), 2);
}
