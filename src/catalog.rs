//! Departments and subjects.

use crate::auth::authorize;
use crate::error::{Error, Result};
use crate::manager::{AttendanceManager, require, require_semester};
use crate::models::{Department, NewDepartment, NewSubject, Role, Subject, User};
use crate::schema::{departments, students, subjects, users};
use diesel::dsl::count_star;
use diesel::prelude::*;
use std::collections::HashMap;

/// A department with the number of subjects and students it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct DepartmentSummary {
    pub department: Department,
    pub subject_count: i64,
    pub student_count: i64,
}

/// Input for [`AttendanceManager::create_subject`].
#[derive(Debug, Clone)]
pub struct SubjectForm {
    pub name: String,
    pub code: String,
    pub department_id: i32,
    pub teacher_id: Option<i32>,
    pub semester: i32,
}

/// A subject as it appears in listings.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectListing {
    pub subject: Subject,
    pub department_code: String,
    pub teacher_name: Option<String>,
}

impl AttendanceManager {
    /// Adds a department. Both the name and the code must be unique.
    pub fn create_department(
        &mut self,
        actor: Option<&User>,
        name: &str,
        code: &str,
    ) -> Result<Department> {
        authorize(actor, Role::Admin)?;
        require("department name", name)?;
        require("department code", code)?;

        let department = diesel::insert_into(departments::table)
            .values(&NewDepartment {
                name: name.trim(),
                code: code.trim(),
            })
            .returning(Department::as_returning())
            .get_result(&mut self.db)
            .map_err(Error::on_duplicate("department name or code"))?;

        tracing::info!(code = %department.code, "created department");
        Ok(department)
    }

    /// Lists every department with its subject and student counts, ordered by name.
    pub fn list_departments(&mut self, actor: Option<&User>) -> Result<Vec<DepartmentSummary>> {
        authorize(actor, Role::Admin)?;

        let all = departments::table
            .order(departments::name.asc())
            .select(Department::as_select())
            .load(&mut self.db)?;

        let subject_counts: HashMap<i32, i64> = subjects::table
            .group_by(subjects::department_id)
            .select((subjects::department_id, count_star()))
            .load::<(i32, i64)>(&mut self.db)?
            .into_iter()
            .collect();

        let student_counts: HashMap<i32, i64> = students::table
            .group_by(students::department_id)
            .select((students::department_id, count_star()))
            .load::<(i32, i64)>(&mut self.db)?
            .into_iter()
            .collect();

        Ok(all
            .into_iter()
            .map(|department| DepartmentSummary {
                subject_count: subject_counts.get(&department.id).copied().unwrap_or(0),
                student_count: student_counts.get(&department.id).copied().unwrap_or(0),
                department,
            })
            .collect())
    }

    /// Removes a department along with all of its subjects and students.
    pub fn delete_department(&mut self, actor: Option<&User>, department_id: i32) -> Result<Department> {
        authorize(actor, Role::Admin)?;

        let department = diesel::delete(departments::table.find(department_id))
            .returning(Department::as_returning())
            .get_result(&mut self.db)
            .optional()?
            .ok_or_else(|| Error::not_found(format!("Department {department_id}")))?;

        tracing::info!(code = %department.code, "deleted department");
        Ok(department)
    }

    /// Retrieves a department by primary key.
    pub fn get_department(&mut self, department_id: i32) -> Result<Department> {
        departments::table
            .find(department_id)
            .select(Department::as_select())
            .first(&mut self.db)
            .optional()?
            .ok_or_else(|| Error::not_found(format!("Department {department_id}")))
    }

    /// Retrieves a department by its code.
    pub fn get_department_by_code(&mut self, department_code: &str) -> Result<Department> {
        departments::table
            .filter(departments::code.eq(department_code))
            .select(Department::as_select())
            .first(&mut self.db)
            .optional()?
            .ok_or_else(|| Error::not_found(format!("Department '{department_code}'")))
    }

    /// Adds a subject. If a teacher is given it must be a user with the teacher role.
    pub fn create_subject(&mut self, actor: Option<&User>, form: &SubjectForm) -> Result<Subject> {
        authorize(actor, Role::Admin)?;
        require("subject name", &form.name)?;
        require("subject code", &form.code)?;
        require_semester(form.semester)?;

        self.get_department(form.department_id)?;
        if let Some(teacher_id) = form.teacher_id {
            self.get_teacher(teacher_id)?;
        }

        let subject = diesel::insert_into(subjects::table)
            .values(&NewSubject {
                name: form.name.trim(),
                code: form.code.trim(),
                department_id: form.department_id,
                teacher_id: form.teacher_id,
                semester: form.semester,
            })
            .returning(Subject::as_returning())
            .get_result(&mut self.db)
            .map_err(Error::on_duplicate("subject code"))?;

        tracing::info!(code = %subject.code, "created subject");
        Ok(subject)
    }

    /// Lists every subject with its department code and assigned teacher, ordered by code.
    pub fn list_subjects(&mut self, actor: Option<&User>) -> Result<Vec<SubjectListing>> {
        authorize(actor, Role::Admin)?;
        self.subject_listings(None)
    }

    /// Subject listings, optionally restricted to the subjects assigned to one teacher.
    pub(crate) fn subject_listings(&mut self, teacher: Option<i32>) -> Result<Vec<SubjectListing>> {
        let mut query = subjects::table
            .inner_join(departments::table.on(subjects::department_id.eq(departments::id)))
            .left_join(users::table.on(subjects::teacher_id.eq(users::id.nullable())))
            .select((
                Subject::as_select(),
                departments::code,
                users::first_name.nullable(),
                users::last_name.nullable(),
            ))
            .order(subjects::code.asc())
            .into_boxed();

        if let Some(teacher) = teacher {
            query = query.filter(subjects::teacher_id.eq(teacher));
        }

        let rows = query.load::<(Subject, String, Option<String>, Option<String>)>(&mut self.db)?;

        Ok(rows
            .into_iter()
            .map(|(subject, department_code, first, last)| SubjectListing {
                subject,
                department_code,
                teacher_name: first.map(|first| {
                    format!("{first} {}", last.unwrap_or_default())
                        .trim()
                        .to_string()
                }),
            })
            .collect())
    }

    /// Removes a subject along with all of its sessions and their records.
    pub fn delete_subject(&mut self, actor: Option<&User>, subject_id: i32) -> Result<Subject> {
        authorize(actor, Role::Admin)?;

        let subject = diesel::delete(subjects::table.find(subject_id))
            .returning(Subject::as_returning())
            .get_result(&mut self.db)
            .optional()?
            .ok_or_else(|| Error::not_found(format!("Subject {subject_id}")))?;

        tracing::info!(code = %subject.code, "deleted subject");
        Ok(subject)
    }

    /// Retrieves a subject by primary key.
    pub fn get_subject(&mut self, subject_id: i32) -> Result<Subject> {
        subjects::table
            .find(subject_id)
            .select(Subject::as_select())
            .first(&mut self.db)
            .optional()?
            .ok_or_else(|| Error::not_found(format!("Subject {subject_id}")))
    }
}
