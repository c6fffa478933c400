//! The mutable context shared by the commands of one pipeline run.

use super::value::{keys, ContextValue, FromContextValue, TypedKey};
use super::{ErrorAccumulator, RunIdentity};
use crate::cancellation::Scope;
use crate::errors::CommandError;
use std::collections::HashMap;
use tracing::debug;

/// Parameters, accumulated errors and cancellation scope of one run.
///
/// The context enforces no schema: the command writing a key and the command
/// reading it agree on the stored type by convention. Reads are checked and
/// fail with `MissingKey` or `TypeMismatch` instead of casting.
#[derive(Debug, Default)]
pub struct Context {
    identity: RunIdentity,
    params: HashMap<String, ContextValue>,
    errors: ErrorAccumulator,
    scope: Scope,
}

impl Context {
    /// Creates an empty context with a fresh run identity and a live scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the cancellation scope.
    #[must_use]
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Sets the run identity.
    #[must_use]
    pub fn with_identity(mut self, identity: RunIdentity) -> Self {
        self.identity = identity;
        self
    }

    /// Seeds a value before the run starts.
    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<ContextValue>) -> Self {
        self.set(key, value);
        self
    }

    /// Returns the run identity.
    #[must_use]
    pub fn run_identity(&self) -> &RunIdentity {
        &self.identity
    }

    /// Returns the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `MissingKey` if nothing was written under `key`.
    pub fn get(&self, key: &str) -> Result<&ContextValue, CommandError> {
        self.params
            .get(key)
            .ok_or_else(|| CommandError::missing_key(key))
    }

    /// Returns the value under `key` converted to `T`.
    ///
    /// # Errors
    ///
    /// Returns `MissingKey` if absent and `TypeMismatch` if another type is stored.
    pub fn get_as<T: FromContextValue>(&self, key: &str) -> Result<T, CommandError> {
        let value = self.get(key)?;
        T::from_context_value(value).ok_or_else(|| CommandError::TypeMismatch {
            key: key.to_string(),
            expected: T::TYPE_NAME,
            found: value.type_name(),
        })
    }

    /// Returns the value under a well-known typed key.
    ///
    /// # Errors
    ///
    /// Same as [`Context::get_as`].
    pub fn get_typed<T: FromContextValue>(&self, key: &TypedKey<T>) -> Result<T, CommandError> {
        self.get_as(key.name())
    }

    /// Inserts or overwrites `key`.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<ContextValue>) {
        let key = key.into();
        debug!(key = %key, "Context value set");
        self.params.insert(key, value.into());
    }

    /// Writes a value under a well-known typed key.
    pub fn set_typed<T: Into<ContextValue>>(&mut self, key: &TypedKey<T>, value: T) {
        self.set(key.name(), value);
    }

    /// Returns true if `key` holds a value.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.params.contains_key(key)
    }

    /// Returns all keys, sorted.
    #[must_use]
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.params.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// Returns the pipeline's primary output, if a command produced one.
    #[must_use]
    pub fn output(&self) -> Option<&str> {
        self.params
            .get(keys::CTX_OUT.name())
            .and_then(ContextValue::as_text)
    }

    /// Appends `err` to the errors recorded for `command`.
    pub fn add_error(&mut self, command: impl Into<String>, err: CommandError) {
        self.errors.push(command, err);
    }

    /// Returns the error accumulator.
    #[must_use]
    pub fn errors(&self) -> &ErrorAccumulator {
        &self.errors
    }

    /// Returns the errors recorded for `command`.
    #[must_use]
    pub fn errors_for(&self, command: &str) -> Vec<&CommandError> {
        self.errors.for_command(command)
    }

    /// Returns true if any command recorded an error.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns the total number of recorded errors.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.errors.len()
    }

    /// Returns the cancellation scope for I/O performed by commands.
    #[must_use]
    pub fn scope(&self) -> &Scope {
        &self.scope
    }
}
