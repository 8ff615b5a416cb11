#![allow(dead_code)]
use attendance_tracker::catalog::SubjectForm;
use attendance_tracker::models::{Department, StudentProfile, Subject, User};
use attendance_tracker::roster::StudentForm;
use attendance_tracker::{AttendanceManager, NewAccount};
use chrono::NaiveDate;

pub fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date")
}

pub fn account(username: &str) -> NewAccount {
    NewAccount {
        username: username.to_string(),
        email: format!("{username}@college.edu"),
        first_name: username.to_uppercase(),
        last_name: "Test".to_string(),
        phone: None,
    }
}

/// The CS101 scenario: department CS, subject CS101 in semester 3 taught by T1, and students
/// S1 and S2 both in (CS, 3).
pub struct Campus {
    pub manager: AttendanceManager,
    pub admin: User,
    pub cs: Department,
    pub t1: User,
    pub cs101: Subject,
    pub s1: StudentProfile,
    pub s2: StudentProfile,
}

impl Campus {
    pub fn new() -> Self {
        Self::with_manager(AttendanceManager::in_memory().expect("in-memory database"))
    }

    /// Builds the scenario on an already initialized database.
    pub fn with_manager(mut manager: AttendanceManager) -> Self {
        let admin = manager.create_admin(&account("admin")).expect("admin");

        let cs = manager
            .create_department(Some(&admin), "Computer Science", "CS")
            .expect("department");
        let t1 = manager
            .create_teacher(Some(&admin), &account("t1"))
            .expect("teacher");
        let cs101 = manager
            .create_subject(
                Some(&admin),
                &SubjectForm {
                    name: "Programming".to_string(),
                    code: "CS101".to_string(),
                    department_id: cs.id,
                    teacher_id: Some(t1.id),
                    semester: 3,
                },
            )
            .expect("subject");

        let s1 = add_student(&mut manager, &admin, "s1", "S1", cs.id, 3);
        let s2 = add_student(&mut manager, &admin, "s2", "S2", cs.id, 3);

        Self {
            manager,
            admin,
            cs,
            t1,
            cs101,
            s1,
            s2,
        }
    }

    /// Adds a student in (CS, 3) without asserting that it works.
    pub fn try_add_student(
        &mut self,
        username: &str,
        roll: &str,
    ) -> attendance_tracker::Result<StudentProfile> {
        self.manager.create_student(
            Some(&self.admin),
            &StudentForm {
                account: account(username),
                roll_number: roll.to_string(),
                department_id: self.cs.id,
                semester: 3,
                joining_year: 2024,
            },
        )
    }

    pub fn add_student(&mut self, username: &str, roll: &str, semester: i32) -> StudentProfile {
        add_student(
            &mut self.manager,
            &self.admin,
            username,
            roll,
            self.cs.id,
            semester,
        )
    }
}

pub fn add_student(
    manager: &mut AttendanceManager,
    admin: &User,
    username: &str,
    roll: &str,
    department_id: i32,
    semester: i32,
) -> StudentProfile {
    manager
        .create_student(
            Some(admin),
            &StudentForm {
                account: account(username),
                roll_number: roll.to_string(),
                department_id,
                semester,
                joining_year: 2024,
            },
        )
        .expect("student")
}
