//! UseCase layer error definitions.

use thiserror::Error;

use crate::domain::{StoreError, ValueObjectError};

/// Outbound message rejected locally, before any network call
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error("Message cannot exceed {max} characters (got {actual})")]
    MessageTooLong { max: usize, actual: usize },
}

impl From<ValueObjectError> for ValidationError {
    fn from(error: ValueObjectError) -> Self {
        match error {
            ValueObjectError::MessageBodyTooLong { max, actual } => {
                Self::MessageTooLong { max, actual }
            }
            _ => Self::EmptyMessage,
        }
    }
}

/// Errors of the chat controller's outbound actions
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ChatError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("No room is open")]
    NoActiveRoom,

    #[error("Message could not be shown: {0}")]
    Store(#[from] StoreError),
}
