//! Taking attendance: resolving the roster for a (subject, date) and recording who was there.

use crate::auth::authorize;
use crate::error::{Error, Result};
use crate::manager::AttendanceManager;
use crate::models::{
    AttendanceRecord, AttendanceSession, NewAttendanceSession, Role, Status, StudentProfile,
    Subject, User,
};
use crate::schema::{attendance_records, attendance_sessions, students, subjects};
use chrono::NaiveDate;
use diesel::prelude::*;
use std::collections::{HashMap, HashSet};

/// One attendance submission from a teacher.
///
/// Every student in `student_ids` gets a record: [`Status::Present`] if they are also in
/// `present`, [`Status::Absent`] otherwise. Students not listed keep whatever record they had.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    pub subject_id: i32,
    pub date: NaiveDate,
    pub student_ids: Vec<i32>,
    pub present: HashSet<i32>,
}

impl Submission {
    /// A submission covering the whole roster, which is what the marking sheet sends back.
    pub fn full_roster(
        subject_id: i32,
        date: NaiveDate,
        roster: &[StudentProfile],
        present: impl IntoIterator<Item = i32>,
    ) -> Self {
        Self {
            subject_id,
            date,
            student_ids: roster.iter().map(StudentProfile::id).collect(),
            present: present.into_iter().collect(),
        }
    }
}

/// What a teacher sees before submitting: the roster and any statuses already recorded.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkingSheet {
    pub subject: Subject,
    pub date: NaiveDate,
    pub already_marked: bool,
    pub entries: Vec<(StudentProfile, Option<Status>)>,
}

impl MarkingSheet {
    /// Builds a submission from roll numbers as a teacher would type them.
    ///
    /// With `only` empty the submission covers the whole roster; otherwise just the listed
    /// students. Roll numbers that are not on this sheet are rejected.
    pub fn submission<S: AsRef<str>>(&self, present: &[S], only: &[S]) -> Result<Submission> {
        let lookup = |roll_number: &str| {
            self.entries
                .iter()
                .map(|(profile, _)| profile)
                .find(|profile| profile.roll_number() == roll_number)
                .map(StudentProfile::id)
                .ok_or_else(|| {
                    Error::validation(format!(
                        "{roll_number} is not on the roster for {}",
                        self.subject.code
                    ))
                })
        };

        let student_ids = if only.is_empty() {
            self.entries.iter().map(|(profile, _)| profile.id()).collect()
        } else {
            only.iter()
                .map(|roll_number| lookup(roll_number.as_ref()))
                .collect::<Result<Vec<_>>>()?
        };

        let present = present
            .iter()
            .map(|roll_number| lookup(roll_number.as_ref()))
            .collect::<Result<HashSet<_>>>()?;

        Ok(Submission {
            subject_id: self.subject.id,
            date: self.date,
            student_ids,
            present,
        })
    }
}

/// The result of [`AttendanceManager::mark_attendance`].
#[derive(Debug, Clone, PartialEq)]
pub struct MarkingOutcome {
    pub session: AttendanceSession,
    pub session_created: bool,
    pub present: usize,
    pub absent: usize,
}

impl AttendanceManager {
    /// Resolves the roster for `subject_id` on `date` so the teacher can fill in the sheet.
    ///
    /// Fails with not-found if the subject does not exist or is not assigned to the teacher.
    pub fn prepare_marking(
        &mut self,
        actor: Option<&User>,
        subject_id: i32,
        date: NaiveDate,
    ) -> Result<MarkingSheet> {
        let teacher = authorize(actor, Role::Teacher)?;
        let subject = self.teacher_subject(teacher, subject_id)?;
        let roster = self.roster_for_subject(&subject)?;

        let session = self.find_session(subject.id, date)?;
        let recorded: HashMap<i32, Status> = match &session {
            Some(session) => AttendanceRecord::belonging_to(session)
                .select(AttendanceRecord::as_select())
                .load(&mut self.db)?
                .into_iter()
                .map(|record| (record.student_id, record.status))
                .collect(),
            None => HashMap::new(),
        };

        let entries = roster
            .into_iter()
            .map(|profile| {
                let status = recorded.get(&profile.id()).copied();
                (profile, status)
            })
            .collect();

        Ok(MarkingSheet {
            subject,
            date,
            already_marked: session.is_some(),
            entries,
        })
    }

    /// Records a submission.
    ///
    /// The session for (subject, date) is created on first use and reused afterwards. Each listed
    /// student's record is created or overwritten; nothing else is touched. The whole submission
    /// is applied in one transaction, which takes the write lock up front so a concurrent
    /// submission for the same (subject, date) waits instead of failing.
    pub fn mark_attendance(
        &mut self,
        actor: Option<&User>,
        submission: &Submission,
    ) -> Result<MarkingOutcome> {
        let teacher = authorize(actor, Role::Teacher)?;
        let subject = self.teacher_subject(teacher, submission.subject_id)?;

        let listed: HashSet<i32> = submission.student_ids.iter().copied().collect();
        if let Some(stray) = submission.present.iter().find(|id| !listed.contains(id)) {
            return Err(Error::validation(format!(
                "student {stray} is marked present but is not part of the submission"
            )));
        }

        let teacher_id = teacher.id;
        let outcome = self.db.immediate_transaction::<_, Error, _>(|conn| {
            check_roster_membership(conn, &subject, &listed)?;

            let (session, session_created) =
                get_or_create_session(conn, subject.id, submission.date, teacher_id)?;

            // Sorted so repeated submissions write rows in the same order.
            let mut ids: Vec<i32> = listed.iter().copied().collect();
            ids.sort_unstable();

            let records: Vec<AttendanceRecord> = ids
                .iter()
                .map(|&student_id| AttendanceRecord {
                    session_id: session.id,
                    student_id,
                    status: if submission.present.contains(&student_id) {
                        Status::Present
                    } else {
                        Status::Absent
                    },
                })
                .collect();

            // The (session, student) key makes this an upsert.
            if !records.is_empty() {
                diesel::replace_into(attendance_records::table)
                    .values(&records)
                    .execute(conn)?;
            }

            let present = records
                .iter()
                .filter(|record| record.status == Status::Present)
                .count();

            Ok(MarkingOutcome {
                session,
                session_created,
                present,
                absent: records.len() - present,
            })
        })?;

        tracing::info!(
            subject = %subject.code,
            date = %submission.date,
            session = outcome.session.id,
            created = outcome.session_created,
            present = outcome.present,
            absent = outcome.absent,
            "marked attendance"
        );
        Ok(outcome)
    }

    /// Finds the session for (subject, date), if attendance was ever taken.
    pub fn find_session(&mut self, subject_id: i32, date: NaiveDate) -> Result<Option<AttendanceSession>> {
        Ok(attendance_sessions::table
            .filter(attendance_sessions::subject_id.eq(subject_id))
            .filter(attendance_sessions::date.eq(date))
            .select(AttendanceSession::as_select())
            .first(&mut self.db)
            .optional()?)
    }

    /// Retrieves a subject only if it is assigned to `teacher`. Someone else's subject is reported
    /// as missing.
    pub(crate) fn teacher_subject(&mut self, teacher: &User, subject_id: i32) -> Result<Subject> {
        subjects::table
            .filter(subjects::id.eq(subject_id))
            .filter(subjects::teacher_id.eq(teacher.id))
            .select(Subject::as_select())
            .first(&mut self.db)
            .optional()?
            .ok_or_else(|| Error::not_found(format!("Subject {subject_id}")))
    }
}

/// Every listed student must exist and be on the subject's roster.
fn check_roster_membership(
    conn: &mut SqliteConnection,
    subject: &Subject,
    listed: &HashSet<i32>,
) -> Result<()> {
    let ids: Vec<i32> = listed.iter().copied().collect();
    let found: Vec<(i32, i32, i32)> = students::table
        .filter(students::id.eq_any(&ids))
        .select((students::id, students::department_id, students::semester))
        .load(conn)?;

    let found_ids: HashSet<i32> = found.iter().map(|(id, _, _)| *id).collect();
    let mut missing: Vec<i32> = listed.difference(&found_ids).copied().collect();
    missing.sort_unstable();
    if let Some(id) = missing.first() {
        return Err(Error::not_found(format!("Student {id}")));
    }

    if let Some((id, _, _)) = found.iter().find(|(_, department, semester)| {
        *department != subject.department_id || *semester != subject.semester
    }) {
        return Err(Error::validation(format!(
            "student {id} is not on the roster for {}",
            subject.code
        )));
    }

    Ok(())
}

/// Returns the session for (subject, date), creating it if needed, and whether it was created.
///
/// The insert is `INSERT OR IGNORE` against the unique (subject, date) constraint, so two
/// concurrent submissions both end up with the same session. Only the creator is recorded as
/// the session's teacher.
fn get_or_create_session(
    conn: &mut SqliteConnection,
    subject_id: i32,
    date: NaiveDate,
    teacher_id: i32,
) -> Result<(AttendanceSession, bool)> {
    let inserted = diesel::insert_or_ignore_into(attendance_sessions::table)
        .values(&NewAttendanceSession {
            subject_id,
            date,
            teacher_id: Some(teacher_id),
        })
        .execute(conn)?;

    let session = attendance_sessions::table
        .filter(attendance_sessions::subject_id.eq(subject_id))
        .filter(attendance_sessions::date.eq(date))
        .select(AttendanceSession::as_select())
        .first(conn)?;

    Ok((session, inserted == 1))
}
