//! Landing pages for admins and teachers.

use crate::auth::authorize;
use crate::catalog::SubjectListing;
use crate::error::Result;
use crate::manager::AttendanceManager;
use crate::models::{AttendanceSession, Role, User};
use crate::schema::{attendance_sessions, departments, students, subjects, users};
use diesel::prelude::*;

/// A session as shown in "recent sessions" lists.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub session: AttendanceSession,
    pub subject_code: String,
    pub subject_name: String,
    pub teacher_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdminOverview {
    pub total_students: i64,
    pub total_teachers: i64,
    pub total_subjects: i64,
    pub total_departments: i64,
    pub recent_sessions: Vec<SessionSummary>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeacherOverview {
    pub subjects: Vec<SubjectListing>,
    pub recent_sessions: Vec<SessionSummary>,
}

impl AttendanceManager {
    /// Headline counts and the most recent sessions across the institution.
    pub fn admin_overview(&mut self, actor: Option<&User>) -> Result<AdminOverview> {
        authorize(actor, Role::Admin)?;

        let total_students = students::table.count().get_result::<i64>(&mut self.db)?;
        let total_teachers = users::table
            .filter(users::role.eq(Role::Teacher))
            .count()
            .get_result::<i64>(&mut self.db)?;
        let total_subjects = subjects::table.count().get_result::<i64>(&mut self.db)?;
        let total_departments = departments::table.count().get_result::<i64>(&mut self.db)?;

        Ok(AdminOverview {
            total_students,
            total_teachers,
            total_subjects,
            total_departments,
            recent_sessions: self.recent_sessions(None)?,
        })
    }

    /// The teacher's subjects and the sessions they recorded most recently.
    pub fn teacher_overview(&mut self, actor: Option<&User>) -> Result<TeacherOverview> {
        let teacher = authorize(actor, Role::Teacher)?;

        Ok(TeacherOverview {
            subjects: self.subject_listings(Some(teacher.id))?,
            recent_sessions: self.recent_sessions(Some(teacher.id))?,
        })
    }

    /// Newest sessions first, optionally only those recorded by one teacher.
    fn recent_sessions(&mut self, recorded_by: Option<i32>) -> Result<Vec<SessionSummary>> {
        let mut query = attendance_sessions::table
            .inner_join(subjects::table.on(attendance_sessions::subject_id.eq(subjects::id)))
            .left_join(users::table.on(attendance_sessions::teacher_id.eq(users::id.nullable())))
            .select((
                AttendanceSession::as_select(),
                subjects::code,
                subjects::name,
                users::first_name.nullable(),
                users::last_name.nullable(),
            ))
            .order((attendance_sessions::date.desc(), attendance_sessions::id.desc()))
            .limit(self.recent_limit)
            .into_boxed();

        if let Some(teacher_id) = recorded_by {
            query = query.filter(attendance_sessions::teacher_id.eq(teacher_id));
        }

        let rows = query.load::<(
            AttendanceSession,
            String,
            String,
            Option<String>,
            Option<String>,
        )>(&mut self.db)?;

        Ok(rows
            .into_iter()
            .map(|(session, subject_code, subject_name, first, last)| SessionSummary {
                session,
                subject_code,
                subject_name,
                teacher_name: first.map(|first| {
                    format!("{first} {}", last.unwrap_or_default())
                        .trim()
                        .to_string()
                }),
            })
            .collect())
    }
}
