use crate::error::{Error, Result};
use crate::models::{NewUser, Role, User};
use crate::schema;
use crate::settings::{DEFAULT_RECENT_SESSIONS, Settings};
use diesel::connection::SimpleConnection;
use diesel::prelude::*;

/// Table definitions. Every statement is idempotent so [`AttendanceManager::initialize`] can run
/// against an existing database.
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id          INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    username    TEXT NOT NULL UNIQUE,
    email       TEXT NOT NULL,
    first_name  TEXT NOT NULL,
    last_name   TEXT NOT NULL,
    role        TEXT NOT NULL DEFAULT 'STUDENT' CHECK (role IN ('ADMIN', 'TEACHER', 'STUDENT')),
    phone       TEXT,
    created_at  TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS departments (
    id          INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    name        TEXT NOT NULL UNIQUE,
    code        TEXT NOT NULL UNIQUE,
    created_at  TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS subjects (
    id            INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    name          TEXT NOT NULL,
    code          TEXT NOT NULL UNIQUE,
    department_id INTEGER NOT NULL REFERENCES departments (id) ON DELETE CASCADE,
    teacher_id    INTEGER REFERENCES users (id) ON DELETE SET NULL,
    semester      INTEGER NOT NULL DEFAULT 1,
    created_at    TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS students (
    id            INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    user_id       INTEGER NOT NULL UNIQUE REFERENCES users (id) ON DELETE CASCADE,
    roll_number   TEXT NOT NULL UNIQUE,
    department_id INTEGER NOT NULL REFERENCES departments (id) ON DELETE CASCADE,
    semester      INTEGER NOT NULL DEFAULT 1,
    joining_year  INTEGER NOT NULL DEFAULT 2024,
    created_at    TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

CREATE TABLE IF NOT EXISTS attendance_sessions (
    id          INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
    subject_id  INTEGER NOT NULL REFERENCES subjects (id) ON DELETE CASCADE,
    date        DATE NOT NULL,
    teacher_id  INTEGER REFERENCES users (id) ON DELETE SET NULL,
    created_at  TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    UNIQUE (subject_id, date)
);

CREATE TABLE IF NOT EXISTS attendance_records (
    session_id  INTEGER NOT NULL REFERENCES attendance_sessions (id) ON DELETE CASCADE,
    student_id  INTEGER NOT NULL REFERENCES students (id) ON DELETE CASCADE,
    status      TEXT NOT NULL DEFAULT 'ABSENT' CHECK (status IN ('PRESENT', 'ABSENT')),
    PRIMARY KEY (session_id, student_id)
);

CREATE INDEX IF NOT EXISTS idx_students_roster ON students (department_id, semester);
CREATE INDEX IF NOT EXISTS idx_records_student ON attendance_records (student_id);
"#;

/// The manager for recording, modifying, and retrieving attendance data.
///
/// Operations are split by concern across the crate (`catalog`, `roster`, `marking`, `report`),
/// each adding methods to this type. All of them share the one connection held here.
pub struct AttendanceManager {
    pub(crate) db: SqliteConnection,
    pub(crate) recent_limit: i64,
}

impl AttendanceManager {
    /// Connects to the `sqlite3` database at `database_url`, creating the file if needed.
    ///
    /// Foreign keys are switched on for the connection so that cascading deletes happen in the
    /// store rather than in application code.
    pub fn connect(database_url: &str) -> Result<Self> {
        let mut db = SqliteConnection::establish(database_url)?;
        db.batch_execute("PRAGMA foreign_keys = ON; PRAGMA busy_timeout = 5000;")?;

        tracing::debug!(database_url, "connected to database");

        Ok(Self {
            db,
            recent_limit: DEFAULT_RECENT_SESSIONS,
        })
    }

    /// Connects using the database and limits from `settings`.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let mut manager = Self::connect(&settings.database_url)?;
        manager.recent_limit = settings.recent_sessions;
        Ok(manager)
    }

    /// Opens a fresh, fully initialized in-memory database.
    pub fn in_memory() -> Result<Self> {
        let mut manager = Self::connect(":memory:")?;
        manager.initialize()?;
        Ok(manager)
    }

    /// Creates any missing tables and indexes.
    pub fn initialize(&mut self) -> Result<()> {
        self.db.batch_execute(SCHEMA_SQL)?;
        tracing::info!("database schema initialized");
        Ok(())
    }

    /// Looks up the identity an external authenticator vouched for.
    ///
    /// Returns `None` for unknown usernames; callers treat that as an unauthenticated request.
    pub fn resolve_identity(&mut self, name: &str) -> Result<Option<User>> {
        use schema::users::dsl::*;

        Ok(users
            .filter(username.eq(name))
            .select(User::as_select())
            .first(&mut self.db)
            .optional()?)
    }

    /// Retrieves a user by primary key.
    pub fn get_user(&mut self, user_id: i32) -> Result<User> {
        use schema::users::dsl::*;

        users
            .find(user_id)
            .select(User::as_select())
            .first(&mut self.db)
            .optional()?
            .ok_or_else(|| Error::not_found(format!("User {user_id}")))
    }

    /// Creates an administrator. Used to bootstrap a new installation.
    pub fn create_admin(&mut self, account: &NewAccount) -> Result<User> {
        let admin = insert_user(&mut self.db, account, Role::Admin)?;
        tracing::info!(username = %admin.username, "created admin");
        Ok(admin)
    }
}

/// The identity fields every kind of account is created with.
#[derive(Debug, Clone, Default)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

impl NewAccount {
    pub(crate) fn validate(&self) -> Result<()> {
        require("username", &self.username)?;
        require("first name", &self.first_name)?;
        require("last name", &self.last_name)?;
        require("email", &self.email)?;
        if !self.email.contains('@') {
            return Err(Error::validation(format!(
                "'{}' is not a valid email address",
                self.email
            )));
        }
        Ok(())
    }
}

/// Inserts a new user with `role`. Runs on a bare connection so it can take part in a caller's
/// transaction.
pub(crate) fn insert_user(
    conn: &mut SqliteConnection,
    account: &NewAccount,
    role: Role,
) -> Result<User> {
    account.validate()?;

    let phone = account
        .phone
        .as_deref()
        .map(str::trim)
        .filter(|phone| !phone.is_empty());

    let new_user = NewUser {
        username: account.username.trim(),
        email: account.email.trim(),
        first_name: account.first_name.trim(),
        last_name: account.last_name.trim(),
        role,
        phone,
    };

    diesel::insert_into(schema::users::table)
        .values(&new_user)
        .returning(User::as_returning())
        .get_result(conn)
        .map_err(Error::on_duplicate("username"))
}

/// Fails with a validation error when `value` is blank.
pub(crate) fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(Error::validation(format!("{field} is required")))
    } else {
        Ok(())
    }
}

/// Fails with a validation error unless `semester` is at least 1.
pub(crate) fn require_semester(semester: i32) -> Result<()> {
    if semester < 1 {
        Err(Error::validation(format!(
            "semester must be a positive number, got {semester}"
        )))
    } else {
        Ok(())
    }
}
