//! Error types for spec resolution, bundling and validation.

use thiserror::Error;

use crate::vfs::FsError;

/// Errors raised while loading, resolving or bundling a specification.
#[derive(Debug, Error)]
pub enum SpecError {
    // IO errors (exit code 3)
    #[error("file not found: {path}")]
    NotFound { path: String },

    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    // Parse errors (exit code 2)
    #[error("invalid YAML in {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid document {path}: {message}")]
    InvalidDocument { path: String, message: String },

    #[error("path file {path} is missing required x-path extension")]
    MissingXPath { path: String },

    #[error("reference path is empty")]
    EmptyPath,

    #[error("unresolved reference: {name}")]
    UnresolvedReference { name: String },

    // Configuration errors (exit code 2)
    #[error("unknown include package: {name}")]
    UnknownInclude { name: String },

    #[error("unsupported render format: {format}")]
    UnsupportedFormat { format: String },

    #[error("failed to render output: {message}")]
    Render { message: String },
}

impl SpecError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            SpecError::NotFound { .. } | SpecError::Io { .. } => 3,
            _ => 2,
        }
    }

    /// Returns true when the error means "nothing at that path".
    pub fn is_not_found(&self) -> bool {
        matches!(self, SpecError::NotFound { .. })
    }
}

impl From<FsError> for SpecError {
    fn from(err: FsError) -> Self {
        match err {
            FsError::NotFound { path } => SpecError::NotFound { path },
            FsError::Io { path, source } => SpecError::Io { path, source },
        }
    }
}

/// Errors during payload validation.
#[derive(Debug, Error)]
pub enum ValidateError {
    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error("validation failed with {} error(s)", errors.len())]
    Invalid { errors: Vec<SchemaError> },
}

/// Single validation error with path context.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SchemaError {
    /// JSON Pointer (RFC 6901) to the invalid field.
    pub path: String,
    /// Human-readable error message.
    pub message: String,
}

impl std::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl ValidateError {
    /// Returns the exit code for this error type.
    pub fn exit_code(&self) -> i32 {
        match self {
            ValidateError::Spec(e) => e.exit_code(),
            ValidateError::Invalid { .. } => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spec_error_exit_codes() {
        let err = SpecError::NotFound {
            path: "components/schemas/User.yaml".into(),
        };
        assert_eq!(err.exit_code(), 3);

        let err = SpecError::MissingXPath {
            path: "paths/users.yaml".into(),
        };
        assert_eq!(err.exit_code(), 2);

        let err = SpecError::UnknownInclude {
            name: "billing".into(),
        };
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn fs_not_found_stays_distinguishable() {
        let err: SpecError = FsError::NotFound {
            path: "paths".into(),
        }
        .into();
        assert!(err.is_not_found());

        let err: SpecError = FsError::Io {
            path: "paths".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        }
        .into();
        assert!(!err.is_not_found());
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn validate_error_exit_codes() {
        let err = ValidateError::Invalid {
            errors: vec![SchemaError {
                path: "/email".into(),
                message: "missing required field".into(),
            }],
        };
        assert_eq!(err.exit_code(), 1);

        let err = ValidateError::Spec(SpecError::EmptyPath);
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn schema_error_display() {
        let err = SchemaError {
            path: "/user/email".into(),
            message: "expected string, got number".into(),
        };
        assert_eq!(err.to_string(), "/user/email: expected string, got number");
    }
}
