use thiserror::Error;

use crate::queue::QueueError;

/// A port call failed. The `Transient`/`Permanent` split is what the
/// substrate's retry logic keys off: transient failures go back on the
/// queue with backoff, permanent ones are logged and dropped.
#[derive(Debug, Error)]
pub enum PortError {
    #[error("transient port failure: {0}")]
    Transient(String),
    #[error("permanent port failure: {0}")]
    Permanent(String),
}

impl PortError {
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// Errors raised while a processor evaluates a job payload.
#[derive(Debug, Error)]
pub enum ProcessorError {
    #[error("invalid job payload: {0}")]
    InvalidPayload(String),
    #[error(transparent)]
    Port(#[from] PortError),
    #[error(transparent)]
    Queue(#[from] QueueError),
}

impl ProcessorError {
    /// Whether retrying the same job later could plausibly succeed. A
    /// malformed payload will never deserialize differently on retry, so
    /// it's permanent; a queue-substrate hiccup is worth retrying; a port
    /// call defers to its own `Transient`/`Permanent` classification.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::InvalidPayload(_) => false,
            Self::Port(err) => err.is_transient(),
            Self::Queue(_) => true,
        }
    }
}
