use std::time::Duration;

use thiserror::Error;

use super::OperationKind;
use crate::gate::InitializationState;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Plugin not initialized (state: {0})")]
    NotInitialized(InitializationState),

    #[error("Invalid argument: {0}")]
    Validation(String),

    #[error("Failed to {operation}: {message}")]
    Platform {
        operation: OperationKind,
        message: String,
    },

    #[error("Failed to parse {operation} payload: {message}")]
    Deserialization {
        operation: OperationKind,
        message: String,
    },

    #[error("Host rejected {operation} call: {message}")]
    HostCall {
        operation: OperationKind,
        message: String,
    },

    #[error("Initialization timed out after {0:?}")]
    InitializationTimeout(Duration),

    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Request to {operation} timed out after {timeout:?}")]
    RequestTimeout {
        operation: OperationKind,
        timeout: Duration,
    },

    #[error("Request to {0} was dropped before it settled")]
    Abandoned(OperationKind),

    #[error("Lock error: {0}")]
    LockError(String),
}

impl BridgeError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub(crate) fn deserialization(operation: OperationKind, err: impl std::fmt::Display) -> Self {
        Self::Deserialization {
            operation,
            message: err.to_string(),
        }
    }

    /// Message reported by the platform, if this error came from an error channel
    pub fn platform_message(&self) -> Option<&str> {
        match self {
            Self::Platform { message, .. } => Some(message),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;

impl<T> From<std::sync::PoisonError<T>> for BridgeError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::LockError(err.to_string())
    }
}
