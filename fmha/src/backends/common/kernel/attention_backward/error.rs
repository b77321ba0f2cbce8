use thiserror::Error;

use crate::backends::common::AllocError;

/// A launch request violates a precondition. Raised before any engine call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid argument '{arg}': {reason}")]
pub struct RequestError {
    pub arg: &'static str,
    pub reason: String,
}

impl RequestError {
    pub fn new(
        arg: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            arg,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AttentionBackwardError<E: std::error::Error + 'static> {
    #[error("{engine} does not support this problem")]
    UnsupportedConfiguration {
        engine: String,
    },
    #[error("Unable to allocate workspace: {0}")]
    ResourceExhaustion(#[from] AllocError),
    #[error(transparent)]
    InvalidArgument(#[from] RequestError),
    #[error("Engine error: {0}")]
    Engine(#[source] E),
}

impl<E: std::error::Error + 'static> AttentionBackwardError<E> {
    pub fn is_unsupported(&self) -> bool {
        matches!(self, AttentionBackwardError::UnsupportedConfiguration { .. })
    }
}
