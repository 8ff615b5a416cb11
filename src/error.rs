//! Crate-wide error type.
//!
//! Every fallible operation returns [`Error`]. Callers that only care about how to react
//! (re-prompt, report a missing resource, deny access) look at [`Error::kind`].

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    // ---------------------------
    // Request errors
    // ---------------------------
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Access denied.")]
    AccessDenied,

    // ---------------------------
    // Storage
    // ---------------------------
    #[error("Database error: {0}")]
    Database(#[from] DieselError),

    #[error("Could not connect to the database: {0}")]
    Connection(#[from] diesel::ConnectionError),

    // ---------------------------
    // Configuration and files
    // ---------------------------
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// How a failed request should be surfaced to the person who made it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input. Nothing was written; the submitter can fix it and retry.
    Validation,
    /// The referenced entity does not exist (or is not visible to the caller).
    NotFound,
    /// Unauthenticated or wrong role.
    Permission,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Csv(err) if err.is_io_error() => ErrorKind::Internal,
            Error::Validation(_) | Error::Csv(_) => ErrorKind::Validation,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::AccessDenied => ErrorKind::Permission,
            Error::Database(_) | Error::Connection(_) | Error::Config(_) | Error::Io(_) => {
                ErrorKind::Internal
            }
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound(what.into())
    }

    /// Turns a unique-constraint violation into a validation error naming the duplicated field.
    /// Any other database error is passed through untouched.
    pub(crate) fn on_duplicate(field: &str) -> impl FnOnce(DieselError) -> Error + '_ {
        move |err| match err {
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                Error::Validation(format!("{field} already exists"))
            }
            other => Error::Database(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
