//! Operation lifecycle: typed, cancellable service calls.

pub mod operation;
pub mod service;

pub use operation::{FnListener, NoResult, Operation, OperationListener};
pub use service::{ServiceCall, ServiceOperation};
