//! Always-on precondition and postcondition checks.
//!
//! A failed check is a contract violation: a bug in the SDK or in the code
//! calling it, never a runtime condition. Violations panic and are therefore
//! unreachable through the listener failure path, which is reserved for
//! expected failures such as network errors.

/// Panics if `condition` is false.
///
/// Use at public entry points to validate arguments.
#[track_caller]
pub fn require(condition: bool, message: &str) {
    if !condition {
        violation(message);
    }
}

/// Panics if `value` is empty.
#[track_caller]
pub fn require_non_empty(value: &str, message: &str) {
    require(!value.is_empty(), message);
}

/// Unwraps `value`, panicking if it is `None`.
///
/// Use where the SDK promised a value to itself and its absence signals a
/// bug rather than a condition the caller can handle.
#[track_caller]
pub fn required<T>(value: Option<T>, message: &str) -> T {
    match value {
        Some(value) => value,
        None => violation(message),
    }
}

/// Panics if `condition` is false.
///
/// Postcondition flavor of [`require`]: state it after producing a result
/// the rest of the SDK depends on.
#[track_caller]
pub fn ensure(condition: bool, message: &str) {
    if !condition {
        violation(message);
    }
}

/// Panics if `value` is empty, postcondition flavor.
#[track_caller]
pub fn ensure_non_empty(value: &str, message: &str) {
    ensure(!value.is_empty(), message);
}

/// Unconditional contract violation.
#[track_caller]
pub fn violation(message: &str) -> ! {
    panic!("contract violation: {message}");
}
