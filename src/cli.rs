//! This module contains the command-line interface [`Cli`] parser for managing departments,
//! subjects, people, and attendance records.

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// The command line configuration struct, where the command-line interface parser is automatically
/// derived by [`clap::Parser`].
#[derive(Parser, Debug)]
#[command(name = "attendance-tracker", version, about)]
pub struct Cli {
    /// Database to use instead of the configured one.
    #[arg(long, global = true)]
    pub database: Option<String>,

    /// The signed-in user. Authentication happens before this tool is invoked.
    #[arg(long, short, global = true, env = "ATTENDANCE_USER")]
    pub user: Option<String>,

    /// The different commands available, grouped by role.
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create any missing tables in the database.
    Init,

    /// Show the signed-in user's landing page.
    Dashboard,

    /// Administrator commands.
    #[command(subcommand)]
    Admin(AdminCommand),

    /// Teacher commands.
    #[command(subcommand)]
    Teacher(TeacherCommand),

    /// Student commands.
    #[command(subcommand)]
    Student(StudentCommand),
}

#[derive(Subcommand, Debug)]
pub enum AdminCommand {
    /// Show headline counts and recent sessions.
    Overview,

    /// Manage departments.
    #[command(subcommand)]
    Department(DepartmentCommand),

    /// Manage subjects.
    #[command(subcommand)]
    Subject(SubjectCommand),

    /// Manage teachers.
    #[command(subcommand)]
    Teacher(TeacherAccountCommand),

    /// Manage students.
    #[command(subcommand)]
    Student(StudentAccountCommand),
}

#[derive(Subcommand, Debug)]
pub enum DepartmentCommand {
    /// Add a department.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        code: String,
    },
    /// List departments.
    List,
    /// Delete a department with all of its subjects and students.
    Delete { id: i32 },
}

#[derive(Subcommand, Debug)]
pub enum SubjectCommand {
    /// Add a subject.
    Add {
        #[arg(long)]
        name: String,
        #[arg(long)]
        code: String,
        /// Department id.
        #[arg(long)]
        department: i32,
        /// Teacher id.
        #[arg(long)]
        teacher: Option<i32>,
        #[arg(long, default_value_t = 1)]
        semester: i32,
    },
    /// List subjects.
    List,
    /// Delete a subject with all of its sessions.
    Delete { id: i32 },
}

/// Identity fields shared by teacher and student accounts.
#[derive(Args, Debug)]
pub struct AccountArgs {
    #[arg(long)]
    pub username: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub first_name: String,
    #[arg(long)]
    pub last_name: String,
}

#[derive(Subcommand, Debug)]
pub enum TeacherAccountCommand {
    /// Add a teacher.
    Add {
        #[command(flatten)]
        account: AccountArgs,
        #[arg(long)]
        phone: Option<String>,
    },
    /// List teachers.
    List,
    /// Delete a teacher. Their subjects become unassigned.
    Delete { id: i32 },
}

#[derive(Subcommand, Debug)]
pub enum StudentAccountCommand {
    /// Add a student.
    Add {
        #[command(flatten)]
        account: AccountArgs,
        #[arg(long)]
        roll_number: String,
        /// Department id.
        #[arg(long)]
        department: i32,
        #[arg(long, default_value_t = 1)]
        semester: i32,
        #[arg(long, default_value_t = 2024)]
        joining_year: i32,
    },
    /// List students.
    List,
    /// Delete a student and all of their attendance records.
    Delete { id: i32 },
    /// Add students from a CSV roster.
    Import { file_path: PathBuf },
}

#[derive(Subcommand, Debug)]
pub enum TeacherCommand {
    /// Show your subjects and recent sessions.
    Overview,

    /// Show the roster for a subject on a date.
    Roster {
        #[arg(long)]
        subject: i32,
        #[arg(long)]
        date: NaiveDate,
    },

    /// Take attendance. Everyone on the roster not listed as present is marked absent.
    Mark {
        #[arg(long)]
        subject: i32,
        #[arg(long)]
        date: NaiveDate,
        /// Roll numbers of students who were present.
        #[arg(long, num_args = 0.., value_delimiter = ',')]
        present: Vec<String>,
        /// Only mark these roll numbers, leaving everyone else's record as it is.
        #[arg(long, num_args = 0.., value_delimiter = ',')]
        only: Vec<String>,
    },

    /// Show every session of a subject.
    Report {
        #[arg(long)]
        subject: i32,
        /// Also write the report to this CSV file.
        #[arg(long)]
        csv: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
pub enum StudentCommand {
    /// Show your attendance in every subject.
    Dashboard,

    /// Show your records for one subject.
    Detail {
        #[arg(long)]
        subject: i32,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_a_marking_command() {
        let cli = Cli::try_parse_from([
            "attendance-tracker",
            "--user",
            "t1",
            "teacher",
            "mark",
            "--subject",
            "3",
            "--date",
            "2025-01-10",
            "--present",
            "S1,S2",
        ])
        .unwrap();

        assert_eq!(cli.user.as_deref(), Some("t1"));
        match cli.command {
            Command::Teacher(TeacherCommand::Mark {
                subject,
                date,
                present,
                only,
            }) => {
                assert_eq!(subject, 3);
                assert_eq!(date, NaiveDate::from_ymd_opt(2025, 1, 10).unwrap());
                assert_eq!(present, vec!["S1", "S2"]);
                assert!(only.is_empty());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_malformed_dates() {
        let result = Cli::try_parse_from([
            "attendance-tracker",
            "teacher",
            "roster",
            "--subject",
            "1",
            "--date",
            "10/01/2025",
        ]);
        assert!(result.is_err());
    }
}
