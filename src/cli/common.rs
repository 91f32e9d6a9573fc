//! Shared error and exit-code types for CLI commands.

use thiserror::Error;

use crate::services::layouts::is_import_error;

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Command completed
    Success = 0,
    /// Malformed input or invalid arguments/configuration
    ValidationError = 1,
    /// File could not be read or written
    IoError = 2,
}

impl ExitCode {
    /// Numeric code passed to the OS.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }
}

/// Category of a CLI failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorKind {
    /// File system failure
    Io,
    /// Bad input data, arguments or configuration
    Validation,
}

/// Error returned by command handlers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CliError {
    /// Failure category, decides the exit code
    pub kind: CliErrorKind,
    /// Message shown to the user
    pub message: String,
}

impl CliError {
    /// Creates an I/O error.
    pub fn io(message: impl Into<String>) -> Self {
        Self {
            kind: CliErrorKind::Io,
            message: message.into(),
        }
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: CliErrorKind::Validation,
            message: message.into(),
        }
    }

    /// Classifies a layout loading failure: malformed input is a validation
    /// error, anything else an I/O error.
    pub fn from_layout_error(err: anyhow::Error) -> Self {
        let message = format!("{err:#}");
        if is_import_error(&err) {
            Self::validation(message)
        } else {
            Self::io(message)
        }
    }

    /// Exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self.kind {
            CliErrorKind::Io => ExitCode::IoError,
            CliErrorKind::Validation => ExitCode::ValidationError,
        }
    }
}

/// Result type of command handlers.
pub type CliResult<T> = Result<T, CliError>;
