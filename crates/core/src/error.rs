use std::error::Error as StdError;

use debt_chat_model::{ErrorKind, ModelProviderError};

/// A failure reported by the chat backend.
#[derive(Debug, thiserror::Error)]
#[error("{kind}: {source}")]
pub struct BackendError {
    kind: ErrorKind,
    #[source]
    source: Box<dyn StdError + Send + Sync>,
}

impl BackendError {
    /// Wraps an error returned by a model provider.
    #[inline]
    pub fn from_provider<E: ModelProviderError>(err: E) -> Self {
        Self {
            kind: err.kind(),
            source: Box::new(err),
        }
    }

    /// Creates an error from a plain message.
    #[inline]
    pub fn new<S: Into<String>>(kind: ErrorKind, message: S) -> Self {
        let message: String = message.into();
        Self {
            kind,
            source: message.into(),
        }
    }

    /// Returns the kind of this error.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// Errors surfaced by the [`crate::Orchestrator`].
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The backend failed to produce a response.
    #[error(transparent)]
    Backend(#[from] BackendError),
    /// The caller cancelled the request before it completed.
    #[error("the request was cancelled")]
    Cancelled,
}
