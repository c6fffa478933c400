//! Test assertions for run contexts and counters.

use crate::context::Context;
use crate::metrics::MetricsRecorder;

/// Asserts that no command recorded an error.
pub fn assert_no_errors(ctx: &Context) {
    assert!(
        !ctx.has_errors(),
        "Expected no errors, got:\n{}",
        ctx.errors().report()
    );
}

/// Asserts that `command` recorded at least one error of `kind`.
pub fn assert_error_kind(ctx: &Context, command: &str, kind: &str) {
    let kinds: Vec<&str> = ctx.errors_for(command).iter().map(|e| e.kind()).collect();
    assert!(
        kinds.contains(&kind),
        "Expected '{command}' to record {kind}, got {kinds:?}"
    );
}

/// Asserts the number of errors recorded for `command`.
pub fn assert_error_count(ctx: &Context, command: &str, expected: usize) {
    let actual = ctx.errors_for(command).len();
    assert_eq!(
        actual, expected,
        "Expected {expected} errors for '{command}', got {actual}"
    );
}

/// Asserts the text stored under `key`.
pub fn assert_text(ctx: &Context, key: &str, expected: &str) {
    let actual = ctx.get_as::<String>(key);
    assert!(
        matches!(actual, Ok(ref v) if v == expected),
        "Expected '{key}' to hold {expected:?}, got {actual:?}"
    );
}

/// Asserts the success and error counts of `command`.
pub fn assert_counters(metrics: &MetricsRecorder, command: &str, success: u64, error: u64) {
    let counters = metrics.command_counters(command);
    assert_eq!(
        (counters.success.value(), counters.error.value()),
        (success, error),
        "Unexpected (success, error) counts for '{command}'"
    );
}
