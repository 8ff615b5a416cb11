use crate::error::Error;
use crate::schema::{
    attendance_records, attendance_sessions, departments, students, subjects, users,
};
use chrono::{NaiveDate, NaiveDateTime};
use diesel::backend::Backend;
use diesel::deserialize::{self, FromSql, FromSqlRow};
use diesel::expression::AsExpression;
use diesel::prelude::*;
use diesel::serialize::{self, IsNull, Output, ToSql};
use diesel::sql_types::Text;
use diesel::sqlite::Sqlite;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// The role tag carried by every identity. It decides which operations the identity may perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AsExpression, FromSqlRow, Serialize)]
#[diesel(sql_type = Text)]
pub enum Role {
    Admin,
    Teacher,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Teacher => "TEACHER",
            Role::Student => "STUDENT",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Role::Admin => "Admin",
            Role::Teacher => "Teacher",
            Role::Student => "Student",
        };
        f.write_str(label)
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "TEACHER" => Ok(Role::Teacher),
            "STUDENT" => Ok(Role::Student),
            other => Err(Error::validation(format!("unknown role '{other}'"))),
        }
    }
}

/// Whether a student attended a session. Records default to [`Status::Absent`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, AsExpression, FromSqlRow, Serialize)]
#[diesel(sql_type = Text)]
pub enum Status {
    Present,
    #[default]
    Absent,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Present => "PRESENT",
            Status::Absent => "ABSENT",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Present => "Present",
            Status::Absent => "Absent",
        })
    }
}

impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PRESENT" => Ok(Status::Present),
            "ABSENT" => Ok(Status::Absent),
            other => Err(Error::validation(format!("unknown status '{other}'"))),
        }
    }
}

// Both enums are stored as their upper-case text tag.
macro_rules! text_enum_sql {
    ($ty:ty) => {
        impl ToSql<Text, Sqlite> for $ty {
            fn to_sql<'b>(&'b self, out: &mut Output<'b, '_, Sqlite>) -> serialize::Result {
                out.set_value(self.as_str());
                Ok(IsNull::No)
            }
        }

        impl FromSql<Text, Sqlite> for $ty {
            fn from_sql(bytes: <Sqlite as Backend>::RawValue<'_>) -> deserialize::Result<Self> {
                let tag = <String as FromSql<Text, Sqlite>>::from_sql(bytes)?;
                Ok(tag.parse::<$ty>()?)
            }
        }
    };
}

text_enum_sql!(Role);
text_enum_sql!(Status);

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    pub phone: Option<String>,
    pub created_at: NaiveDateTime,
}

impl User {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

#[derive(Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub role: Role,
    pub phone: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable)]
#[diesel(table_name = departments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Department {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = departments)]
pub struct NewDepartment<'a> {
    pub name: &'a str,
    pub code: &'a str,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Associations)]
#[diesel(belongs_to(Department))]
#[diesel(table_name = subjects)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Subject {
    pub id: i32,
    pub name: String,
    pub code: String,
    pub department_id: i32,
    pub teacher_id: Option<i32>,
    pub semester: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = subjects)]
pub struct NewSubject<'a> {
    pub name: &'a str,
    pub code: &'a str,
    pub department_id: i32,
    pub teacher_id: Option<i32>,
    pub semester: i32,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Associations)]
#[diesel(belongs_to(User))]
#[diesel(belongs_to(Department))]
#[diesel(table_name = students)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Student {
    pub id: i32,
    pub user_id: i32,
    pub roll_number: String,
    pub department_id: i32,
    pub semester: i32,
    pub joining_year: i32,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = students)]
pub struct NewStudent<'a> {
    pub user_id: i32,
    pub roll_number: &'a str,
    pub department_id: i32,
    pub semester: i32,
    pub joining_year: i32,
}

/// A student row together with the identity it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentProfile {
    pub student: Student,
    pub user: User,
}

impl StudentProfile {
    pub fn id(&self) -> i32 {
        self.student.id
    }

    pub fn roll_number(&self) -> &str {
        &self.student.roll_number
    }
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Identifiable, Associations)]
#[diesel(belongs_to(Subject))]
#[diesel(table_name = attendance_sessions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AttendanceSession {
    pub id: i32,
    pub subject_id: i32,
    pub date: NaiveDate,
    pub teacher_id: Option<i32>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = attendance_sessions)]
pub struct NewAttendanceSession {
    pub subject_id: i32,
    pub date: NaiveDate,
    pub teacher_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Queryable, Selectable, Insertable, Identifiable, Associations)]
#[diesel(primary_key(session_id, student_id))]
#[diesel(belongs_to(AttendanceSession, foreign_key = session_id))]
#[diesel(belongs_to(Student))]
#[diesel(table_name = attendance_records)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AttendanceRecord {
    pub session_id: i32,
    pub student_id: i32,
    pub status: Status,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_parse_case_insensitively() {
        assert_eq!("teacher".parse::<Role>().unwrap(), Role::Teacher);
        assert_eq!("PRESENT".parse::<Status>().unwrap(), Status::Present);
        assert!("LATE".parse::<Status>().is_err());
    }

    #[test]
    fn records_default_to_absent() {
        assert_eq!(Status::default(), Status::Absent);
    }
}
