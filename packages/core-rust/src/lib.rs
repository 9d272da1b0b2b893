//! Ferry Core — request/transaction model, submission pipeline, transport
//! boundary, and small on-disk persistence for the Ferry client SDK.

pub mod contract;
pub mod models;
pub mod storage;
pub mod transceiver;
pub mod transport;

pub use models::{
    DataRequest, DataResponse, DataTransaction, ErrorCode, FailureMessage, RequestMethod,
    TransceiveError,
};
pub use storage::{Preferences, StorageError};
pub use transceiver::{DataListener, DataTransceiver};
pub use transport::{RawResponse, Transport, TransportError, TransportHandle};
