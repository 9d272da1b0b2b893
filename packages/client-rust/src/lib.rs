//! Ferry client SDK — service operations, configuration, and the bundled
//! HTTP transport.
//!
//! The client sits on top of [`ferry_core`]: [`Core`] wires a configuration
//! and a transport into a transceiver, and [`ServiceOperation`] turns a
//! [`ServiceCall`] into a cancellable, exactly-once operation against it.

pub mod config;
pub mod context;
pub mod http;
pub mod operations;

pub use config::CoreConfig;
pub use context::Core;
pub use http::{HttpTransport, HttpTransportConfig};
pub use operations::{
    FnListener, NoResult, Operation, OperationListener, ServiceCall, ServiceOperation,
};
