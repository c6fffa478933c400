//! Error types for the mediaflow engine.
//!
//! Commands never return errors to the executor. They record a
//! [`CommandError`] against their own name in the run's context and stop.
//! The remaining types cover pipeline assembly and configuration loading.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Boxed error used for causes coming from external collaborators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The crate-level error type.
#[derive(Debug, Error)]
pub enum MediaflowError {
    /// A pipeline could not be assembled.
    #[error("{0}")]
    Validation(#[from] PipelineValidationError),

    /// Configuration could not be loaded.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// A command failure surfaced outside of a pipeline run.
    #[error("{0}")]
    Command(#[from] CommandError),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Which step of a remote long-running operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemotePhase {
    /// Creating the client or submitting the job.
    Submit,
    /// Waiting on the operation handle.
    Wait,
}

impl fmt::Display for RemotePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Submit => write!(f, "submit"),
            Self::Wait => write!(f, "wait"),
        }
    }
}

/// A failure recorded by a command into the context's error accumulator.
#[derive(Debug, Error)]
pub enum CommandError {
    /// A context key was read before its producer ran, or after it failed.
    #[error("missing context key '{key}'")]
    MissingKey {
        /// The key that was read.
        key: String,
    },

    /// A context value was present but of another type than the reader expects.
    #[error("context key '{key}' holds {found}, expected {expected}")]
    TypeMismatch {
        /// The key that was read.
        key: String,
        /// The type the reader asked for.
        expected: &'static str,
        /// The type actually stored.
        found: &'static str,
    },

    /// A local binary could not be launched or exited unsuccessfully.
    #[error("external tool '{program}' failed: {reason}")]
    ExternalToolFailure {
        /// The program that was invoked.
        program: String,
        /// What went wrong.
        reason: String,
        /// The launch error, if the process never ran.
        #[source]
        source: Option<std::io::Error>,
    },

    /// A remote call failed at submission or transport level.
    #[error("remote call failed during {phase}: {source}")]
    RemoteCallFailure {
        /// The phase that failed.
        phase: RemotePhase,
        /// The underlying client error.
        #[source]
        source: BoxError,
    },

    /// The remote job completed but reported an error for the requested item.
    #[error("remote operation failed for '{item}': {reason}")]
    RemoteOperationFailure {
        /// The item the operation was asked to process.
        item: String,
        /// The reported failure.
        reason: String,
    },

    /// Existence-wait attempts were exhausted.
    #[error("'{}' not found after {attempts} attempts", path.display())]
    ConsistencyTimeout {
        /// The path that never appeared.
        path: PathBuf,
        /// Number of checks performed.
        attempts: u32,
        /// The last observed error.
        #[source]
        source: std::io::Error,
    },

    /// The run's scope was cancelled or its deadline passed.
    #[error("cancelled: {reason}")]
    Cancelled {
        /// Why the scope was cancelled.
        reason: String,
    },

    /// An input value was present and well typed but unusable.
    #[error("invalid value for '{key}': {reason}")]
    InvalidInput {
        /// The key the value was read from.
        key: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl CommandError {
    /// Creates a missing key error.
    #[must_use]
    pub fn missing_key(key: impl Into<String>) -> Self {
        Self::MissingKey { key: key.into() }
    }

    /// Creates an external tool failure without a launch error.
    #[must_use]
    pub fn external_tool(program: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ExternalToolFailure {
            program: program.into(),
            reason: reason.into(),
            source: None,
        }
    }

    /// Creates an external tool failure for a process that could not be launched.
    #[must_use]
    pub fn tool_launch(program: impl Into<String>, source: std::io::Error) -> Self {
        Self::ExternalToolFailure {
            program: program.into(),
            reason: "could not launch process".to_string(),
            source: Some(source),
        }
    }

    /// Creates a remote call failure.
    #[must_use]
    pub fn remote_call(phase: RemotePhase, source: impl Into<BoxError>) -> Self {
        Self::RemoteCallFailure {
            phase,
            source: source.into(),
        }
    }

    /// Creates a remote operation failure.
    #[must_use]
    pub fn remote_operation(item: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::RemoteOperationFailure {
            item: item.into(),
            reason: reason.into(),
        }
    }

    /// Creates a cancellation error.
    #[must_use]
    pub fn cancelled(reason: impl Into<String>) -> Self {
        Self::Cancelled {
            reason: reason.into(),
        }
    }

    /// Creates an invalid input error.
    #[must_use]
    pub fn invalid_input(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Returns the taxonomy name of this error.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingKey { .. } => "MissingKey",
            Self::TypeMismatch { .. } => "TypeMismatch",
            Self::ExternalToolFailure { .. } => "ExternalToolFailure",
            Self::RemoteCallFailure { .. } => "RemoteCallFailure",
            Self::RemoteOperationFailure { .. } => "RemoteOperationFailure",
            Self::ConsistencyTimeout { .. } => "ConsistencyTimeout",
            Self::Cancelled { .. } => "Cancelled",
            Self::InvalidInput { .. } => "InvalidInput",
        }
    }

    /// Renders the error followed by its `source()` chain.
    #[must_use]
    pub fn chain(&self) -> String {
        let mut rendered = self.to_string();
        let mut cause = std::error::Error::source(self);
        while let Some(err) = cause {
            let text = err.to_string();
            if !rendered.ends_with(&text) {
                rendered.push_str(": ");
                rendered.push_str(&text);
            }
            cause = err.source();
        }
        rendered
    }
}

/// Error raised when a pipeline cannot be assembled.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct PipelineValidationError {
    /// The error message.
    pub message: String,
    /// The commands involved in the error.
    pub commands: Vec<String>,
    /// Stable error code.
    pub code: &'static str,
    /// Hint for fixing the error.
    pub fix_hint: Option<String>,
}

impl PipelineValidationError {
    /// Creates a new pipeline validation error.
    #[must_use]
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            commands: Vec::new(),
            code,
            fix_hint: None,
        }
    }

    /// Sets the commands involved.
    #[must_use]
    pub fn with_commands(mut self, commands: Vec<String>) -> Self {
        self.commands = commands;
        self
    }

    /// Sets the fix hint.
    #[must_use]
    pub fn with_fix_hint(mut self, hint: impl Into<String>) -> Self {
        self.fix_hint = Some(hint.into());
        self
    }
}

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config '{}': {source}", path.display())]
    Read {
        /// The file that was read.
        path: PathBuf,
        /// The IO error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration could not be parsed.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A field holds an unusable value.
    #[error("invalid config field '{field}': {reason}")]
    Invalid {
        /// The offending field.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}

impl ConfigError {
    /// Creates an invalid field error.
    #[must_use]
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}
