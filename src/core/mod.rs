pub mod error;
pub mod operation;

pub use error::{BridgeError, Result};
pub use operation::{ChannelRole, KeyField, OperationKind};
