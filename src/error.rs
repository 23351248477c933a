//! The error type shared by every part of the library.
//!
//! Errors fall into two groups. Validation, store, authentication, not-found and storage errors
//! carry a message meant for the person at the keyboard and are shown verbatim. Everything else
//! (I/O, configuration, serialization) is unexpected: it is logged in full and reported with a
//! generic message.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

/// Message shown for failures that are not the user's to fix.
pub const UNEXPECTED_MESSAGE: &str = "An unexpected error occurred";

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A required field is missing or a value is outside its allowed set. Raised before anything
    /// is written.
    #[error("{0}")]
    Validation(String),

    /// The relational store rejected a query or mutation.
    #[error("{message}")]
    Store { code: &'static str, message: String },

    /// The requested row does not exist, or belongs to somebody else.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Sign-up or sign-in was refused.
    #[error("{0}")]
    Auth(String),

    /// An operation that needs a signed-in user was attempted without one.
    #[error("You must sign in first")]
    SignedOut,

    /// The object storage refused an upload.
    #[error("{0}")]
    Storage(String),

    #[error("failed to connect to {url}: {source}")]
    Connection {
        url: String,
        #[source]
        source: diesel::ConnectionError,
    },

    #[error("failed to apply migrations: {0}")]
    Migration(String),

    #[error("failed to hash password: {0}")]
    PasswordHash(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Returns `true` if this error's message is meant to be shown to the user as-is.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::Store { .. }
                | Self::NotFound(_)
                | Self::Auth(_)
                | Self::SignedOut
                | Self::Storage(_)
        )
    }

    /// The message to show the user for this error.
    pub fn user_message(&self) -> String {
        if self.is_user_facing() {
            self.to_string()
        } else {
            UNEXPECTED_MESSAGE.to_string()
        }
    }
}

impl From<DieselError> for Error {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => Self::NotFound("record"),
            DieselError::DatabaseError(kind, info) => Self::Store {
                code: database_error_code(&kind),
                message: info.message().to_string(),
            },
            other => Self::Store {
                code: "database_error",
                message: other.to_string(),
            },
        }
    }
}

fn database_error_code(kind: &DatabaseErrorKind) -> &'static str {
    match kind {
        DatabaseErrorKind::UniqueViolation => "unique_violation",
        DatabaseErrorKind::ForeignKeyViolation => "foreign_key_violation",
        DatabaseErrorKind::CheckViolation => "check_violation",
        DatabaseErrorKind::NotNullViolation => "not_null_violation",
        _ => "database_error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diesel_not_found_maps_to_not_found() {
        let err: Error = DieselError::NotFound.into();
        assert!(matches!(err, Error::NotFound(_)));
        assert_eq!(err.user_message(), "record not found");
    }

    #[test]
    fn unexpected_errors_use_the_generic_message() {
        let err: Error = std::io::Error::other("disk on fire").into();
        assert!(!err.is_user_facing());
        assert_eq!(err.user_message(), UNEXPECTED_MESSAGE);
    }

    #[test]
    fn validation_messages_are_shown_verbatim() {
        let err = Error::Validation("Course title is required".into());
        assert_eq!(err.user_message(), "Course title is required");
    }
}
