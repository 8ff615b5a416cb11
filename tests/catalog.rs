mod common;

use attendance_tracker::catalog::SubjectForm;
use attendance_tracker::marking::Submission;
use attendance_tracker::{Error, ErrorKind};
use common::{Campus, account, date};
use std::collections::HashSet;

fn mark_s1_present(campus: &mut Campus, day: &str) {
    let t1 = campus.t1.clone();
    let submission = Submission {
        subject_id: campus.cs101.id,
        date: date(day),
        student_ids: vec![campus.s1.id(), campus.s2.id()],
        present: HashSet::from([campus.s1.id()]),
    };
    campus.manager.mark_attendance(Some(&t1), &submission).unwrap();
}

#[test]
fn department_listing_counts_subjects_and_students() {
    let mut campus = Campus::new();
    let admin = campus.admin.clone();
    campus
        .manager
        .create_department(Some(&admin), "Mathematics", "MA")
        .unwrap();

    let departments = campus.manager.list_departments(Some(&admin)).unwrap();
    let counts: Vec<(&str, i64, i64)> = departments
        .iter()
        .map(|d| (d.department.code.as_str(), d.subject_count, d.student_count))
        .collect();

    assert_eq!(counts, vec![("CS", 1, 2), ("MA", 0, 0)]);
}

#[test]
fn duplicate_codes_are_validation_errors() {
    let mut campus = Campus::new();
    let admin = campus.admin.clone();

    let err = campus
        .manager
        .create_department(Some(&admin), "Computing", "CS")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = campus
        .manager
        .create_subject(
            Some(&admin),
            &SubjectForm {
                name: "Another".to_string(),
                code: "CS101".to_string(),
                department_id: campus.cs.id,
                teacher_id: None,
                semester: 1,
            },
        )
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid input: subject code already exists");

    let err = campus.try_add_student("s3", "S1").unwrap_err();
    assert_eq!(err.to_string(), "Invalid input: roll number already exists");
}

#[test]
fn failed_student_creation_leaves_no_orphan_identity() {
    let mut campus = Campus::new();
    campus.try_add_student("orphan", "S1").unwrap_err();

    assert_eq!(campus.manager.resolve_identity("orphan").unwrap(), None);
}

#[test]
fn blank_fields_and_bad_semesters_are_rejected() {
    let mut campus = Campus::new();
    let admin = campus.admin.clone();

    let err = campus
        .manager
        .create_department(Some(&admin), "  ", "XX")
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));

    let err = campus
        .manager
        .create_subject(
            Some(&admin),
            &SubjectForm {
                name: "Zero".to_string(),
                code: "CS000".to_string(),
                department_id: campus.cs.id,
                teacher_id: None,
                semester: 0,
            },
        )
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
}

#[test]
fn subjects_need_an_existing_department_and_a_real_teacher() {
    let mut campus = Campus::new();
    let admin = campus.admin.clone();

    let form = |department_id, teacher_id| SubjectForm {
        name: "Networks".to_string(),
        code: "CS300".to_string(),
        department_id,
        teacher_id,
        semester: 5,
    };

    let err = campus
        .manager
        .create_subject(Some(&admin), &form(4242, None))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    // A student is not a teacher.
    let err = campus
        .manager
        .create_subject(Some(&admin), &form(campus.cs.id, Some(campus.s1.user.id)))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn deleting_a_department_cascades_to_subjects_and_students() {
    let mut campus = Campus::new();
    let admin = campus.admin.clone();
    mark_s1_present(&mut campus, "2025-01-10");

    campus
        .manager
        .delete_department(Some(&admin), campus.cs.id)
        .unwrap();

    assert!(campus.manager.list_subjects(Some(&admin)).unwrap().is_empty());
    assert!(campus.manager.list_students(Some(&admin)).unwrap().is_empty());
    assert_eq!(
        campus.manager.get_subject(campus.cs101.id).unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert!(
        campus
            .manager
            .find_session(campus.cs101.id, date("2025-01-10"))
            .unwrap()
            .is_none()
    );
}

#[test]
fn deleting_a_subject_removes_its_sessions_and_records() {
    let mut campus = Campus::new();
    let admin = campus.admin.clone();
    mark_s1_present(&mut campus, "2025-01-10");
    assert_eq!(campus.manager.tally(campus.s1.id(), None).unwrap().total, 1);

    let deleted = campus
        .manager
        .delete_subject(Some(&admin), campus.cs101.id)
        .unwrap();
    assert_eq!(deleted.code, "CS101");

    assert!(
        campus
            .manager
            .find_session(campus.cs101.id, date("2025-01-10"))
            .unwrap()
            .is_none()
    );
    assert_eq!(campus.manager.tally(campus.s1.id(), None).unwrap().total, 0);

    let err = campus
        .manager
        .delete_subject(Some(&admin), campus.cs101.id)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn deleting_a_student_removes_identity_and_records() {
    let mut campus = Campus::new();
    let admin = campus.admin.clone();
    mark_s1_present(&mut campus, "2025-01-10");

    campus
        .manager
        .delete_student(Some(&admin), campus.s1.id())
        .unwrap();

    assert_eq!(campus.manager.resolve_identity("s1").unwrap(), None);
    assert_eq!(campus.manager.tally(campus.s1.id(), None).unwrap().total, 0);

    let t1 = campus.t1.clone();
    let report = campus.manager.teacher_report(Some(&t1), campus.cs101.id).unwrap();
    let rolls: Vec<&str> = report.sessions[0]
        .entries
        .iter()
        .map(|entry| entry.roll_number.as_str())
        .collect();
    assert_eq!(rolls, vec!["S2"]);
}

#[test]
fn deleting_a_teacher_unassigns_subjects_and_sessions() {
    let mut campus = Campus::new();
    let admin = campus.admin.clone();
    mark_s1_present(&mut campus, "2025-01-10");

    campus
        .manager
        .delete_teacher(Some(&admin), campus.t1.id)
        .unwrap();

    let subject = campus.manager.get_subject(campus.cs101.id).unwrap();
    assert_eq!(subject.teacher_id, None);

    let session = campus
        .manager
        .find_session(campus.cs101.id, date("2025-01-10"))
        .unwrap()
        .expect("session survives its teacher");
    assert_eq!(session.teacher_id, None);

    let listing = campus.manager.list_subjects(Some(&admin)).unwrap();
    assert_eq!(listing[0].teacher_name, None);
}

#[test]
fn only_teachers_can_be_deleted_as_teachers() {
    let mut campus = Campus::new();
    let admin = campus.admin.clone();

    let err = campus
        .manager
        .delete_teacher(Some(&admin), campus.s1.user.id)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(campus.manager.resolve_identity("s1").unwrap().is_some());
}

#[test]
fn management_requires_the_admin_role() {
    let mut campus = Campus::new();
    let t1 = campus.t1.clone();

    assert!(matches!(
        campus.manager.list_departments(Some(&t1)),
        Err(Error::AccessDenied)
    ));
    assert!(matches!(
        campus.manager.create_teacher(None, &account("t9")),
        Err(Error::AccessDenied)
    ));
    assert!(matches!(
        campus.manager.delete_department(Some(&t1), campus.cs.id),
        Err(Error::AccessDenied)
    ));
    assert!(matches!(
        campus.manager.admin_overview(Some(&t1)),
        Err(Error::AccessDenied)
    ));
}

#[test]
fn importing_a_roster_skips_known_roll_numbers() {
    let mut campus = Campus::new();
    let admin = campus.admin.clone();
    let csv = "\
username,first_name,last_name,email,roll_number,department_code,semester,joining_year
s1again,Sam,One,s1again@college.edu,S1,CS,3,2024
s3,Sue,Three,s3@college.edu,S3,CS,3,2024
s4,Sid,Four,s4@college.edu,S4,CS,1,2025
";

    let summary = campus
        .manager
        .import_students(Some(&admin), csv.as_bytes())
        .unwrap();

    assert_eq!(summary.added, vec!["S3", "S4"]);
    assert_eq!(summary.skipped, vec!["S1"]);
    assert_eq!(campus.manager.list_students(Some(&admin)).unwrap().len(), 4);
}

#[test]
fn a_bad_import_row_rolls_back_the_whole_import() {
    let mut campus = Campus::new();
    let admin = campus.admin.clone();
    let csv = "\
username,first_name,last_name,email,roll_number,department_code,semester,joining_year
s3,Sue,Three,s3@college.edu,S3,CS,3,2024
s4,Sid,Four,s4@college.edu,S4,NOPE,1,2025
";

    let err = campus
        .manager
        .import_students(Some(&admin), csv.as_bytes())
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(campus.manager.resolve_identity("s3").unwrap(), None);
}

#[test]
fn admin_overview_counts_everything() {
    let mut campus = Campus::new();
    let admin = campus.admin.clone();
    mark_s1_present(&mut campus, "2025-01-10");
    mark_s1_present(&mut campus, "2025-01-12");

    let overview = campus.manager.admin_overview(Some(&admin)).unwrap();
    assert_eq!(overview.total_students, 2);
    assert_eq!(overview.total_teachers, 1);
    assert_eq!(overview.total_subjects, 1);
    assert_eq!(overview.total_departments, 1);

    let dates: Vec<_> = overview
        .recent_sessions
        .iter()
        .map(|summary| summary.session.date)
        .collect();
    assert_eq!(dates, vec![date("2025-01-12"), date("2025-01-10")]);
    assert_eq!(overview.recent_sessions[0].subject_code, "CS101");
    assert_eq!(
        overview.recent_sessions[0].teacher_name.as_deref(),
        Some("T1 Test")
    );
}

#[test]
fn teacher_overview_lists_only_their_subjects() {
    let mut campus = Campus::new();
    let admin = campus.admin.clone();
    let t2 = campus
        .manager
        .create_teacher(Some(&admin), &account("t2"))
        .unwrap();
    campus
        .manager
        .create_subject(
            Some(&admin),
            &SubjectForm {
                name: "Databases".to_string(),
                code: "CS202".to_string(),
                department_id: campus.cs.id,
                teacher_id: Some(t2.id),
                semester: 3,
            },
        )
        .unwrap();
    mark_s1_present(&mut campus, "2025-01-10");

    let t1 = campus.t1.clone();
    let overview = campus.manager.teacher_overview(Some(&t1)).unwrap();
    let codes: Vec<&str> = overview
        .subjects
        .iter()
        .map(|listing| listing.subject.code.as_str())
        .collect();
    assert_eq!(codes, vec!["CS101"]);
    assert_eq!(overview.recent_sessions.len(), 1);

    let overview = campus.manager.teacher_overview(Some(&t2)).unwrap();
    assert!(overview.recent_sessions.is_empty());
}
