//! Attendance aggregation.
//!
//! Nothing here is cached: every figure is recomputed from the attendance records on each call.

use crate::auth::authorize;
use crate::error::Result;
use crate::manager::AttendanceManager;
use crate::models::{AttendanceSession, Role, Status, Subject, User};
use crate::schema::{attendance_records, attendance_sessions, students, subjects, users};
use chrono::NaiveDate;
use diesel::prelude::*;
use serde::Serialize;
use std::io;

/// Digits kept by [`AttendanceManager::attendance_percentage`].
pub const PROFILE_DIGITS: u32 = 2;

/// Digits kept on the student dashboard and detail pages.
pub const DASHBOARD_DIGITS: u32 = 1;

/// Rounds `value` to `digits` decimal places, with exact halves going to the even neighbour.
pub fn round_to(value: f64, digits: u32) -> f64 {
    let factor = 10f64.powi(digits as i32);
    (value * factor).round_ties_even() / factor
}

/// Present and total counts over some set of records.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct AttendanceTally {
    pub total: usize,
    pub present: usize,
}

impl AttendanceTally {
    pub fn from_statuses<'a>(statuses: impl IntoIterator<Item = &'a Status>) -> Self {
        statuses
            .into_iter()
            .fold(Self::default(), |mut tally, status| {
                tally.total += 1;
                if *status == Status::Present {
                    tally.present += 1;
                }
                tally
            })
    }

    pub fn absent(&self) -> usize {
        self.total - self.present
    }

    /// Percentage of records marked present, rounded to `digits`. Zero when there are no records.
    pub fn percentage(&self, digits: u32) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        round_to(self.present as f64 * 100.0 / self.total as f64, digits)
    }

    fn add(&mut self, other: AttendanceTally) {
        self.total += other.total;
        self.present += other.present;
    }
}

/// One subject's line on the student dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectAttendance {
    pub subject: Subject,
    pub tally: AttendanceTally,
    pub percentage: f64,
}

/// Everything a student sees on their dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentDashboard {
    pub roll_number: String,
    pub subjects: Vec<SubjectAttendance>,
    pub overall: AttendanceTally,
    pub overall_percentage: f64,
}

/// A student's records for one subject, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectDetail {
    pub subject: Subject,
    pub records: Vec<(NaiveDate, Status)>,
    pub tally: AttendanceTally,
    pub percentage: f64,
}

/// One student's line within a session of the teacher report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportEntry {
    pub roll_number: String,
    pub name: String,
    pub status: Status,
}

/// A session of the teacher report with every record taken in it.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub session: AttendanceSession,
    pub entries: Vec<ReportEntry>,
}

impl SessionReport {
    pub fn tally(&self) -> AttendanceTally {
        AttendanceTally::from_statuses(self.entries.iter().map(|entry| &entry.status))
    }
}

/// All sessions of one subject, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct TeacherReport {
    pub subject: Subject,
    pub sessions: Vec<SessionReport>,
}

#[derive(Serialize)]
struct CsvRow<'a> {
    date: NaiveDate,
    roll_number: &'a str,
    name: &'a str,
    status: Status,
}

impl TeacherReport {
    /// Writes one CSV row per record: `date,roll_number,name,status`.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut out = csv::Writer::from_writer(writer);
        for session in &self.sessions {
            for entry in &session.entries {
                out.serialize(CsvRow {
                    date: session.session.date,
                    roll_number: &entry.roll_number,
                    name: &entry.name,
                    status: entry.status,
                })?;
            }
        }
        out.flush()?;
        Ok(())
    }
}

impl AttendanceManager {
    /// Present/total counts for a student, over one subject or over everything.
    pub fn tally(&mut self, student_id: i32, subject_id: Option<i32>) -> Result<AttendanceTally> {
        let mut query = attendance_records::table
            .inner_join(attendance_sessions::table)
            .filter(attendance_records::student_id.eq(student_id))
            .select(attendance_records::status)
            .into_boxed();

        if let Some(subject_id) = subject_id {
            query = query.filter(attendance_sessions::subject_id.eq(subject_id));
        }

        let statuses: Vec<Status> = query.load(&mut self.db)?;
        Ok(AttendanceTally::from_statuses(&statuses))
    }

    /// A student's attendance percentage to two decimals, optionally limited to one subject.
    /// A student with no records is at 0.
    pub fn attendance_percentage(&mut self, student_id: i32, subject_id: Option<i32>) -> Result<f64> {
        Ok(self.tally(student_id, subject_id)?.percentage(PROFILE_DIGITS))
    }

    /// The signed-in student's attendance in every subject of their department and semester.
    pub fn student_dashboard(&mut self, actor: Option<&User>) -> Result<StudentDashboard> {
        let user = authorize(actor, Role::Student)?;
        let profile = self.student_profile_for_user(user)?;

        let offered = subjects::table
            .filter(subjects::department_id.eq(profile.student.department_id))
            .filter(subjects::semester.eq(profile.student.semester))
            .order(subjects::code.asc())
            .select(Subject::as_select())
            .load(&mut self.db)?;

        let mut overall = AttendanceTally::default();
        let mut lines = Vec::with_capacity(offered.len());
        for subject in offered {
            let tally = self.tally(profile.id(), Some(subject.id))?;
            overall.add(tally);
            lines.push(SubjectAttendance {
                percentage: tally.percentage(DASHBOARD_DIGITS),
                subject,
                tally,
            });
        }

        Ok(StudentDashboard {
            roll_number: profile.student.roll_number,
            subjects: lines,
            overall_percentage: overall.percentage(DASHBOARD_DIGITS),
            overall,
        })
    }

    /// The signed-in student's records for one subject.
    pub fn student_subject_detail(&mut self, actor: Option<&User>, subject_id: i32) -> Result<SubjectDetail> {
        let user = authorize(actor, Role::Student)?;
        let profile = self.student_profile_for_user(user)?;
        let subject = self.get_subject(subject_id)?;

        let records: Vec<(NaiveDate, Status)> = attendance_records::table
            .inner_join(attendance_sessions::table)
            .filter(attendance_records::student_id.eq(profile.id()))
            .filter(attendance_sessions::subject_id.eq(subject.id))
            .order(attendance_sessions::date.desc())
            .select((attendance_sessions::date, attendance_records::status))
            .load(&mut self.db)?;

        let tally = AttendanceTally::from_statuses(records.iter().map(|(_, status)| status));

        Ok(SubjectDetail {
            subject,
            records,
            percentage: tally.percentage(DASHBOARD_DIGITS),
            tally,
        })
    }

    /// Every session of one of the teacher's subjects with the records taken in it.
    pub fn teacher_report(&mut self, actor: Option<&User>, subject_id: i32) -> Result<TeacherReport> {
        let teacher = authorize(actor, Role::Teacher)?;
        let subject = self.teacher_subject(teacher, subject_id)?;

        let sessions = AttendanceSession::belonging_to(&subject)
            .order(attendance_sessions::date.desc())
            .select(AttendanceSession::as_select())
            .load(&mut self.db)?;

        let session_ids: Vec<i32> = sessions.iter().map(|session| session.id).collect();
        let rows = attendance_records::table
            .inner_join(students::table.on(attendance_records::student_id.eq(students::id)))
            .inner_join(users::table.on(students::user_id.eq(users::id)))
            .filter(attendance_records::session_id.eq_any(&session_ids))
            .order(students::roll_number.asc())
            .select((
                attendance_records::session_id,
                students::roll_number,
                users::first_name,
                users::last_name,
                attendance_records::status,
            ))
            .load::<(i32, String, String, String, Status)>(&mut self.db)?;

        let sessions = sessions
            .into_iter()
            .map(|session| {
                let entries = rows
                    .iter()
                    .filter(|(session_id, ..)| *session_id == session.id)
                    .map(|(_, roll_number, first, last, status)| ReportEntry {
                        roll_number: roll_number.clone(),
                        name: format!("{first} {last}").trim().to_string(),
                        status: *status,
                    })
                    .collect();
                SessionReport { session, entries }
            })
            .collect();

        Ok(TeacherReport { subject, sessions })
    }
}
