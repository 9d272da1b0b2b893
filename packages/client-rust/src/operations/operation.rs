//! Operation and listener traits.

use ferry_core::models::FailureMessage;

// ---------------------------------------------------------------------------
// OperationListener
// ---------------------------------------------------------------------------

/// Outcome receiver for one operation execution.
///
/// Methods take the listener by value: across one execution exactly one of
/// them is invoked, at most once. The type system enforces what would
/// otherwise be a convention.
pub trait OperationListener<T>: Send + 'static {
    /// Called with the decoded result when the execution succeeds.
    fn on_success(self: Box<Self>, result: T);

    /// Called with the classified failure when the execution fails.
    fn on_failure(self: Box<Self>, failure: FailureMessage);
}

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// A cancellable unit of work with a typed result.
pub trait Operation<T> {
    /// Starts the operation, eventually reporting through `listener`.
    ///
    /// Calling `execute` while a previous execution is still running is
    /// ignored.
    fn execute(&self, listener: Box<dyn OperationListener<T>>);

    /// Cancels the running execution.
    ///
    /// Returns true only when there was an execution to cancel; idle,
    /// settled, and already-cancelled operations return false. A cancelled
    /// execution never reaches its listener.
    fn cancel(&self) -> bool;
}

/// Result sentinel for operations whose success carries no payload.
///
/// The response body is still parsed as JSON; `NoResult` only skips
/// decoding it into a model type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoResult;

// ---------------------------------------------------------------------------
// FnListener
// ---------------------------------------------------------------------------

/// Adapts a pair of closures into an [`OperationListener`].
pub struct FnListener<S, F> {
    on_success: S,
    on_failure: F,
}

impl<S, F> FnListener<S, F> {
    #[must_use]
    pub fn new(on_success: S, on_failure: F) -> Self {
        Self {
            on_success,
            on_failure,
        }
    }

    /// Boxed constructor, shaped for handing straight to
    /// [`Operation::execute`].
    #[must_use]
    pub fn boxed(on_success: S, on_failure: F) -> Box<Self> {
        Box::new(Self::new(on_success, on_failure))
    }
}

impl<T, S, F> OperationListener<T> for FnListener<S, F>
where
    S: FnOnce(T) + Send + 'static,
    F: FnOnce(FailureMessage) + Send + 'static,
{
    fn on_success(self: Box<Self>, result: T) {
        (self.on_success)(result);
    }

    fn on_failure(self: Box<Self>, failure: FailureMessage) {
        (self.on_failure)(failure);
    }
}
