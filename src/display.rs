//! Pretty printing of everything the manager returns.

use crate::catalog::{DepartmentSummary, SubjectListing};
use crate::marking::{MarkingOutcome, MarkingSheet};
use crate::models::User;
use crate::overview::{AdminOverview, SessionSummary, TeacherOverview};
use crate::report::{StudentDashboard, SubjectDetail, TeacherReport};
use crate::roster::{ImportSummary, StudentListing};
use tabled::{Table, Tabled, settings::Style};

fn print_table<T: Tabled>(title: &str, rows: Vec<T>) {
    if rows.is_empty() {
        println!("{title}: none");
        return;
    }

    let mut table = Table::new(rows);
    table.with(Style::modern());
    println!("{title}:\n{table}");
}

fn or_dash(value: Option<String>) -> String {
    value.unwrap_or_else(|| "-".to_string())
}

#[derive(Tabled)]
struct SessionRow {
    date: String,
    subject: String,
    teacher: String,
}

fn session_rows(sessions: &[SessionSummary]) -> Vec<SessionRow> {
    sessions
        .iter()
        .map(|summary| SessionRow {
            date: summary.session.date.to_string(),
            subject: format!("{} - {}", summary.subject_code, summary.subject_name),
            teacher: or_dash(summary.teacher_name.clone()),
        })
        .collect()
}

#[derive(Tabled)]
struct SubjectRow {
    id: i32,
    code: String,
    name: String,
    department: String,
    semester: i32,
    teacher: String,
}

fn subject_rows(subjects: &[SubjectListing]) -> Vec<SubjectRow> {
    subjects
        .iter()
        .map(|listing| SubjectRow {
            id: listing.subject.id,
            code: listing.subject.code.clone(),
            name: listing.subject.name.clone(),
            department: listing.department_code.clone(),
            semester: listing.subject.semester,
            teacher: or_dash(listing.teacher_name.clone()),
        })
        .collect()
}

pub fn show_admin_overview(overview: &AdminOverview) {
    println!(
        "Students: {}  Teachers: {}  Subjects: {}  Departments: {}",
        overview.total_students,
        overview.total_teachers,
        overview.total_subjects,
        overview.total_departments
    );
    print_table("Recent sessions", session_rows(&overview.recent_sessions));
}

pub fn show_teacher_overview(overview: &TeacherOverview) {
    print_table("Your subjects", subject_rows(&overview.subjects));
    print_table("Recent sessions", session_rows(&overview.recent_sessions));
}

pub fn show_departments(departments: &[DepartmentSummary]) {
    #[derive(Tabled)]
    struct DepartmentRow {
        id: i32,
        code: String,
        name: String,
        subjects: i64,
        students: i64,
    }

    let rows = departments
        .iter()
        .map(|summary| DepartmentRow {
            id: summary.department.id,
            code: summary.department.code.clone(),
            name: summary.department.name.clone(),
            subjects: summary.subject_count,
            students: summary.student_count,
        })
        .collect();

    print_table("Departments", rows);
}

pub fn show_subjects(subjects: &[SubjectListing]) {
    print_table("Subjects", subject_rows(subjects));
}

pub fn show_teachers(teachers: &[User]) {
    #[derive(Tabled)]
    struct TeacherRow {
        id: i32,
        username: String,
        name: String,
        email: String,
        phone: String,
    }

    let rows = teachers
        .iter()
        .map(|teacher| TeacherRow {
            id: teacher.id,
            username: teacher.username.clone(),
            name: teacher.full_name(),
            email: teacher.email.clone(),
            phone: or_dash(teacher.phone.clone()),
        })
        .collect();

    print_table("Teachers", rows);
}

pub fn show_students(students: &[StudentListing]) {
    #[derive(Tabled)]
    struct StudentRow {
        id: i32,
        roll_number: String,
        name: String,
        department: String,
        semester: i32,
        joined: i32,
    }

    let rows = students
        .iter()
        .map(|listing| StudentRow {
            id: listing.profile.student.id,
            roll_number: listing.profile.student.roll_number.clone(),
            name: listing.profile.user.full_name(),
            department: listing.department_code.clone(),
            semester: listing.profile.student.semester,
            joined: listing.profile.student.joining_year,
        })
        .collect();

    print_table("Students", rows);
}

pub fn show_import(summary: &ImportSummary) {
    println!(
        "Added {} student(s), skipped {} already on the roster.",
        summary.added.len(),
        summary.skipped.len()
    );
    if !summary.skipped.is_empty() {
        println!("Skipped: {}", summary.skipped.join(", "));
    }
}

pub fn show_marking_sheet(sheet: &MarkingSheet) {
    #[derive(Tabled)]
    struct SheetRow {
        id: i32,
        roll_number: String,
        name: String,
        status: String,
    }

    let rows = sheet
        .entries
        .iter()
        .map(|(profile, status)| SheetRow {
            id: profile.id(),
            roll_number: profile.roll_number().to_string(),
            name: profile.user.full_name(),
            status: or_dash(status.map(|status| status.to_string())),
        })
        .collect();

    if sheet.already_marked {
        println!(
            "Attendance for {} on {} was already taken; submitting again overwrites it.",
            sheet.subject.code, sheet.date
        );
    }
    print_table(
        &format!("Roster for {} on {}", sheet.subject.code, sheet.date),
        rows,
    );
}

pub fn show_marking_outcome(subject_name: &str, outcome: &MarkingOutcome) {
    println!(
        "Attendance marked for {subject_name} on {}: {} present, {} absent.",
        outcome.session.date, outcome.present, outcome.absent
    );
}

pub fn show_teacher_report(report: &TeacherReport) {
    #[derive(Tabled)]
    struct RecordRow {
        roll_number: String,
        name: String,
        status: String,
    }

    if report.sessions.is_empty() {
        println!("No attendance taken yet for {}.", report.subject.code);
        return;
    }

    for session in &report.sessions {
        let tally = session.tally();
        let rows = session
            .entries
            .iter()
            .map(|entry| RecordRow {
                roll_number: entry.roll_number.clone(),
                name: entry.name.clone(),
                status: entry.status.to_string(),
            })
            .collect();

        print_table(
            &format!(
                "{} | {} ({}/{} present)",
                report.subject.code, session.session.date, tally.present, tally.total
            ),
            rows,
        );
    }
}

pub fn show_student_dashboard(dashboard: &StudentDashboard) {
    #[derive(Tabled)]
    struct SubjectAttendanceRow {
        id: i32,
        subject: String,
        total: usize,
        present: usize,
        absent: usize,
        percentage: String,
    }

    let rows = dashboard
        .subjects
        .iter()
        .map(|line| SubjectAttendanceRow {
            id: line.subject.id,
            subject: format!("{} - {}", line.subject.code, line.subject.name),
            total: line.tally.total,
            present: line.tally.present,
            absent: line.tally.absent(),
            percentage: format!("{:.1}%", line.percentage),
        })
        .collect();

    print_table(&format!("Attendance for {}", dashboard.roll_number), rows);
    println!(
        "Overall: {} present, {} absent of {} ({:.1}%)",
        dashboard.overall.present,
        dashboard.overall.absent(),
        dashboard.overall.total,
        dashboard.overall_percentage
    );
}

pub fn show_subject_detail(detail: &SubjectDetail) {
    #[derive(Tabled)]
    struct DetailRow {
        date: String,
        status: String,
    }

    let rows = detail
        .records
        .iter()
        .map(|(date, status)| DetailRow {
            date: date.to_string(),
            status: status.to_string(),
        })
        .collect();

    print_table(
        &format!("{} - {}", detail.subject.code, detail.subject.name),
        rows,
    );
    println!(
        "{} present, {} absent of {} ({:.1}%)",
        detail.tally.present,
        detail.tally.absent(),
        detail.tally.total,
        detail.percentage
    );
}
