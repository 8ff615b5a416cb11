//! Teachers and the student roster.

use crate::auth::authorize;
use crate::error::{Error, Result};
use crate::manager::{AttendanceManager, NewAccount, insert_user, require, require_semester};
use crate::models::{NewStudent, Role, Student, StudentProfile, Subject, User};
use crate::schema::{departments, students, users};
use diesel::prelude::*;
use serde::Deserialize;
use std::collections::HashSet;
use std::io;

/// Input for [`AttendanceManager::create_student`].
#[derive(Debug, Clone)]
pub struct StudentForm {
    pub account: NewAccount,
    pub roll_number: String,
    pub department_id: i32,
    pub semester: i32,
    pub joining_year: i32,
}

/// A student as it appears in listings.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentListing {
    pub profile: StudentProfile,
    pub department_code: String,
}

/// One line of a roster CSV.
#[derive(Debug, Deserialize)]
struct RosterRow {
    username: String,
    first_name: String,
    last_name: String,
    email: String,
    roll_number: String,
    department_code: String,
    semester: i32,
    joining_year: i32,
}

/// The outcome of [`AttendanceManager::import_students`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ImportSummary {
    /// Roll numbers of students created by the import.
    pub added: Vec<String>,
    /// Roll numbers that were already on the roster.
    pub skipped: Vec<String>,
}

impl AttendanceManager {
    /// Adds a teacher account.
    pub fn create_teacher(&mut self, actor: Option<&User>, account: &NewAccount) -> Result<User> {
        authorize(actor, Role::Admin)?;

        let teacher = insert_user(&mut self.db, account, Role::Teacher)?;
        tracing::info!(username = %teacher.username, "created teacher");
        Ok(teacher)
    }

    /// Lists every teacher, ordered by last then first name.
    pub fn list_teachers(&mut self, actor: Option<&User>) -> Result<Vec<User>> {
        authorize(actor, Role::Admin)?;

        Ok(users::table
            .filter(users::role.eq(Role::Teacher))
            .order((users::last_name.asc(), users::first_name.asc()))
            .select(User::as_select())
            .load(&mut self.db)?)
    }

    /// Removes a teacher account. Their subjects and the sessions they recorded stay, unassigned.
    pub fn delete_teacher(&mut self, actor: Option<&User>, teacher_id: i32) -> Result<User> {
        authorize(actor, Role::Admin)?;

        let teacher = diesel::delete(
            users::table
                .filter(users::id.eq(teacher_id))
                .filter(users::role.eq(Role::Teacher)),
        )
        .returning(User::as_returning())
        .get_result(&mut self.db)
        .optional()?
        .ok_or_else(|| Error::not_found(format!("Teacher {teacher_id}")))?;

        tracing::info!(username = %teacher.username, "deleted teacher");
        Ok(teacher)
    }

    /// Retrieves a user who must have the teacher role.
    pub fn get_teacher(&mut self, teacher_id: i32) -> Result<User> {
        users::table
            .filter(users::id.eq(teacher_id))
            .filter(users::role.eq(Role::Teacher))
            .select(User::as_select())
            .first(&mut self.db)
            .optional()?
            .ok_or_else(|| Error::not_found(format!("Teacher {teacher_id}")))
    }

    /// Adds a student: the identity and the student profile are created together or not at all.
    pub fn create_student(&mut self, actor: Option<&User>, form: &StudentForm) -> Result<StudentProfile> {
        authorize(actor, Role::Admin)?;
        require("roll number", &form.roll_number)?;
        require_semester(form.semester)?;
        self.get_department(form.department_id)?;

        let profile = self
            .db
            .transaction::<_, Error, _>(|conn| insert_student(conn, form))?;

        tracing::info!(roll_number = %profile.student.roll_number, "created student");
        Ok(profile)
    }

    /// Lists every student with their department code, ordered by roll number.
    pub fn list_students(&mut self, actor: Option<&User>) -> Result<Vec<StudentListing>> {
        authorize(actor, Role::Admin)?;

        let rows = students::table
            .inner_join(users::table.on(students::user_id.eq(users::id)))
            .inner_join(departments::table.on(students::department_id.eq(departments::id)))
            .order(students::roll_number.asc())
            .select((Student::as_select(), User::as_select(), departments::code))
            .load::<(Student, User, String)>(&mut self.db)?;

        Ok(rows
            .into_iter()
            .map(|(student, user, department_code)| StudentListing {
                profile: StudentProfile { student, user },
                department_code,
            })
            .collect())
    }

    /// Removes a student by deleting their identity. The profile and every attendance record go
    /// with it.
    pub fn delete_student(&mut self, actor: Option<&User>, student_id: i32) -> Result<StudentProfile> {
        authorize(actor, Role::Admin)?;

        let profile = self.get_student_profile(student_id)?;
        diesel::delete(users::table.find(profile.user.id)).execute(&mut self.db)?;

        tracing::info!(roll_number = %profile.student.roll_number, "deleted student");
        Ok(profile)
    }

    /// Creates students from a CSV roster with the header
    /// `username,first_name,last_name,email,roll_number,department_code,semester,joining_year`.
    ///
    /// Rows whose roll number is already on the roster are skipped. The whole import runs in one
    /// transaction, so a bad row leaves the roster unchanged.
    pub fn import_students<R: io::Read>(&mut self, actor: Option<&User>, reader: R) -> Result<ImportSummary> {
        authorize(actor, Role::Admin)?;

        let mut roster = csv::Reader::from_reader(reader);
        let rows = roster
            .deserialize::<RosterRow>()
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let summary = self.db.transaction::<_, Error, _>(|conn| {
            let mut known: HashSet<String> = students::table
                .select(students::roll_number)
                .load::<String>(conn)?
                .into_iter()
                .collect();

            let mut summary = ImportSummary::default();
            for row in rows {
                let roll_number = row.roll_number.trim().to_string();
                if known.contains(&roll_number) {
                    tracing::warn!(%roll_number, "student already on roster, skipping");
                    summary.skipped.push(roll_number);
                    continue;
                }

                let department_id = departments::table
                    .filter(departments::code.eq(row.department_code.trim()))
                    .select(departments::id)
                    .first::<i32>(conn)
                    .optional()?
                    .ok_or_else(|| {
                        Error::not_found(format!("Department '{}'", row.department_code.trim()))
                    })?;

                let form = StudentForm {
                    account: NewAccount {
                        username: row.username,
                        email: row.email,
                        first_name: row.first_name,
                        last_name: row.last_name,
                        phone: None,
                    },
                    roll_number: roll_number.clone(),
                    department_id,
                    semester: row.semester,
                    joining_year: row.joining_year,
                };
                require("roll number", &form.roll_number)?;
                require_semester(form.semester)?;
                insert_student(conn, &form)?;

                known.insert(roll_number.clone());
                summary.added.push(roll_number);
            }
            Ok(summary)
        })?;

        tracing::info!(
            added = summary.added.len(),
            skipped = summary.skipped.len(),
            "imported roster"
        );
        Ok(summary)
    }

    /// Retrieves a student and their identity by the student's primary key.
    pub fn get_student_profile(&mut self, student_id: i32) -> Result<StudentProfile> {
        students::table
            .inner_join(users::table)
            .filter(students::id.eq(student_id))
            .select((Student::as_select(), User::as_select()))
            .first::<(Student, User)>(&mut self.db)
            .optional()?
            .map(|(student, user)| StudentProfile { student, user })
            .ok_or_else(|| Error::not_found(format!("Student {student_id}")))
    }

    /// Retrieves the student profile attached to a user account.
    pub fn student_profile_for_user(&mut self, user: &User) -> Result<StudentProfile> {
        let student = Student::belonging_to(user)
            .select(Student::as_select())
            .first(&mut self.db)
            .optional()?
            .ok_or_else(|| Error::not_found("Student profile"))?;

        Ok(StudentProfile {
            student,
            user: user.clone(),
        })
    }

    /// The students expected in `subject`'s sessions: everyone whose department and semester
    /// equal the subject's, ordered by roll number.
    ///
    /// There is no enrollment table, so a student who changes semester moves between rosters.
    pub fn roster_for_subject(&mut self, subject: &Subject) -> Result<Vec<StudentProfile>> {
        let rows = students::table
            .inner_join(users::table)
            .filter(students::department_id.eq(subject.department_id))
            .filter(students::semester.eq(subject.semester))
            .order(students::roll_number.asc())
            .select((Student::as_select(), User::as_select()))
            .load::<(Student, User)>(&mut self.db)?;

        tracing::debug!(subject = %subject.code, size = rows.len(), "resolved roster");

        Ok(rows
            .into_iter()
            .map(|(student, user)| StudentProfile { student, user })
            .collect())
    }
}

fn insert_student(conn: &mut SqliteConnection, form: &StudentForm) -> Result<StudentProfile> {
    let user = insert_user(conn, &form.account, Role::Student)?;

    let student = diesel::insert_into(students::table)
        .values(&NewStudent {
            user_id: user.id,
            roll_number: form.roll_number.trim(),
            department_id: form.department_id,
            semester: form.semester,
            joining_year: form.joining_year,
        })
        .returning(Student::as_returning())
        .get_result(conn)
        .map_err(Error::on_duplicate("roll number"))?;

    Ok(StudentProfile { student, user })
}
