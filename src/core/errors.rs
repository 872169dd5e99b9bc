//! EVS-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, SuiteError>;

/// Top-level error type for the vision test suite.
#[derive(Debug, Error)]
pub enum SuiteError {
    #[error("[EVS-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[EVS-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[EVS-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[EVS-2001] unknown {kind}: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("[EVS-2002] {operation} is not valid while {state}")]
    InvalidState {
        operation: &'static str,
        state: String,
    },

    #[error("[EVS-2003] answer {answer:?} not accepted by {test_id}: {details}")]
    InvalidResponse {
        test_id: String,
        answer: String,
        details: String,
    },

    #[error("[EVS-3001] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[EVS-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl SuiteError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "EVS-1001",
            Self::MissingConfig { .. } => "EVS-1002",
            Self::ConfigParse { .. } => "EVS-1003",
            Self::NotFound { .. } => "EVS-2001",
            Self::InvalidState { .. } => "EVS-2002",
            Self::InvalidResponse { .. } => "EVS-2003",
            Self::Serialization { .. } => "EVS-3001",
            Self::Io { .. } => "EVS-3002",
        }
    }

    /// Whether the failure tore down the active test session.
    ///
    /// Only controller desynchronization is fatal; a rejected answer leaves
    /// the session waiting for another one.
    #[must_use]
    pub const fn is_session_fatal(&self) -> bool {
        matches!(self, Self::InvalidState { .. })
    }

    /// Convenience constructor for an unknown test id.
    #[must_use]
    pub fn unknown_test(id: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "test id",
            id: id.into(),
        }
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

impl From<serde_json::Error> for SuiteError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for SuiteError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_variants() -> Vec<SuiteError> {
        vec![
            SuiteError::InvalidConfig {
                details: String::new(),
            },
            SuiteError::MissingConfig {
                path: PathBuf::new(),
            },
            SuiteError::ConfigParse {
                context: "",
                details: String::new(),
            },
            SuiteError::unknown_test(""),
            SuiteError::InvalidState {
                operation: "",
                state: String::new(),
            },
            SuiteError::InvalidResponse {
                test_id: String::new(),
                answer: String::new(),
                details: String::new(),
            },
            SuiteError::Serialization {
                context: "",
                details: String::new(),
            },
            SuiteError::Io {
                path: PathBuf::new(),
                source: std::io::Error::other("test"),
            },
        ]
    }

    #[test]
    fn error_codes_are_unique() {
        let errors = all_variants();
        let codes: Vec<&str> = errors.iter().map(SuiteError::code).collect();
        let unique: std::collections::HashSet<&&str> = codes.iter().collect();
        assert_eq!(
            codes.len(),
            unique.len(),
            "error codes must be unique: {codes:?}"
        );
    }

    #[test]
    fn display_carries_code_prefix() {
        for err in all_variants() {
            let text = err.to_string();
            assert!(
                text.starts_with(&format!("[{}]", err.code())),
                "display {text:?} missing code prefix"
            );
        }
    }

    #[test]
    fn only_invalid_state_is_session_fatal() {
        for err in all_variants() {
            assert_eq!(
                err.is_session_fatal(),
                matches!(err, SuiteError::InvalidState { .. }),
                "{}",
                err.code()
            );
        }
    }

    #[test]
    fn unknown_test_names_the_id() {
        let err = SuiteError::unknown_test("x-ray");
        assert_eq!(err.code(), "EVS-2001");
        assert!(err.to_string().contains("x-ray"));
    }

    #[test]
    fn serde_json_errors_convert() {
        let parse_err = serde_json::from_str::<u32>("nope").unwrap_err();
        let err: SuiteError = parse_err.into();
        assert_eq!(err.code(), "EVS-3001");
    }
}
