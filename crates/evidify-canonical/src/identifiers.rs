use crate::validation::ValidationError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! newtype {
    ($name:ident, $doc:expr, $pattern:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new instance without validation; callers are responsible for conformity.
            pub fn new(value: String) -> Self {
                Self(value)
            }

            /// Parses a validated identifier from a string.
            pub fn parse(value: impl Into<String>) -> Result<Self, ValidationError> {
                let s = value.into();
                if !Regex::new($pattern).expect("invalid regex").is_match(&s) {
                    return Err(ValidationError::PatternMismatch {
                        field: stringify!($name),
                        value: s,
                    });
                }
                Ok(Self(s))
            }

            /// String view.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

newtype!(
    SessionId,
    "Identifier of one recording session (`[A-Za-z0-9_.:-]{1,128}`).",
    r"^[A-Za-z0-9_.:-]{1,128}$"
);
newtype!(
    CaseId,
    "Identifier of a case presented to the reader.",
    r"^[A-Za-z0-9_.:-]{1,128}$"
);
newtype!(
    ReaderId,
    "Pseudonymous reader identifier.",
    r"^[A-Za-z0-9_.:-]{1,128}$"
);
newtype!(
    EventId,
    "Opaque unique event identifier; the log issues hyphenated UUIDs.",
    r"^[A-Za-z0-9_.:-]{1,128}$"
);
newtype!(
    Timestamp,
    "UTC RFC3339 timestamp with `Z` suffix.",
    r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d{1,9})?Z$"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamp_requires_utc_suffix() {
        assert!(Timestamp::parse("2026-01-02T03:04:05.678Z").is_ok());
        assert!(Timestamp::parse("2026-01-02T03:04:05Z").is_ok());
        assert!(Timestamp::parse("2026-01-02T03:04:05+01:00").is_err());
        assert!(Timestamp::parse("yesterday").is_err());
    }

    #[test]
    fn ids_reject_separator_and_whitespace() {
        assert!(SessionId::parse("S1").is_ok());
        assert!(SessionId::parse("").is_err());
        assert!(CaseId::parse("case 1").is_err());
        assert!(EventId::parse("a|b").is_err());
    }
}
