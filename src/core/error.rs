//! Error types for review records

use miette::Diagnostic;
use thiserror::Error;

/// A field value was rejected by its setter; the field keeps its old value
#[derive(Debug, Error, Diagnostic, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("year must be an integer >= 2000, got {year}")]
    #[diagnostic(code(reviews::validation::year))]
    YearOutOfRange { year: i64 },

    #[error("summary must be a non-empty string")]
    #[diagnostic(
        code(reviews::validation::summary),
        help("a summary made only of whitespace counts as empty")
    )]
    EmptySummary,

    #[error("no employee with id {id}")]
    #[diagnostic(
        code(reviews::validation::employee),
        help("employee_id must reference an existing row in the employees table")
    )]
    UnknownEmployee { id: i64 },
}

/// Errors returned by review operations
#[derive(Debug, Error, Diagnostic)]
pub enum ReviewError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Validation(#[from] ValidationError),

    /// `update` or `delete` on a review that has no id
    #[error("can't {action} a review that hasn't been saved")]
    #[diagnostic(
        code(reviews::not_persisted),
        help("save the review first so it has an id")
    )]
    NotPersisted { action: &'static str },

    /// The shared review is borrowed by the caller while the store needs it
    #[error("review is in use and can't be {action} right now")]
    #[diagnostic(
        code(reviews::busy),
        help("drop any outstanding borrow of the review before calling the store")
    )]
    Busy { action: &'static str },

    /// Failure reported by SQLite, passed through untouched
    #[error(transparent)]
    #[diagnostic(code(reviews::storage))]
    Storage(#[from] rusqlite::Error),
}

pub type Result<T, E = ReviewError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_messages() {
        assert_eq!(
            ValidationError::YearOutOfRange { year: 1999 }.to_string(),
            "year must be an integer >= 2000, got 1999"
        );
        assert_eq!(
            ValidationError::EmptySummary.to_string(),
            "summary must be a non-empty string"
        );
    }

    #[test]
    fn test_validation_converts_transparently() {
        let err: ReviewError = ValidationError::UnknownEmployee { id: 3 }.into();
        assert!(matches!(
            err,
            ReviewError::Validation(ValidationError::UnknownEmployee { id: 3 })
        ));
        assert!(err.to_string().contains("no employee with id 3"));
    }

    #[test]
    fn test_not_persisted_message() {
        let err = ReviewError::NotPersisted { action: "delete" };
        assert_eq!(err.to_string(), "can't delete a review that hasn't been saved");
    }

    #[test]
    fn test_busy_message() {
        let err = ReviewError::Busy { action: "reloaded" };
        assert_eq!(err.to_string(), "review is in use and can't be reloaded right now");
    }
}
