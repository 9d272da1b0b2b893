//! Request, transaction, and failure types shared across the SDK.

pub mod failure;
pub mod method;
pub mod request;
pub mod transaction;

pub use failure::{ErrorCode, FailureMessage, TransceiveError};
pub use method::RequestMethod;
pub use request::DataRequest;
pub use transaction::{DataResponse, DataTransaction};
