use thiserror::Error;

/// A field value rejected before it reaches the log.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Identifier or timestamp outside its allowed character set or shape.
    #[error("{field} '{value}' has an invalid format")]
    PatternMismatch {
        /// Rejected field.
        field: &'static str,
        /// Value as supplied.
        value: String,
    },
    /// Scale value or probability outside its range.
    #[error("{field} = {value} is out of range")]
    OutOfBounds {
        /// Rejected field.
        field: &'static str,
        /// Value as supplied.
        value: String,
    },
    #[error("{field} must not be empty")]
    #[allow(missing_docs)]
    Empty { field: &'static str },
}
