//! Error types for datagen-core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum EmitError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// A required builder field was never set
    #[error("missing required configuration: {0}")]
    MissingConfig(&'static str),

    /// The producer failed; the run was aborted
    #[error("producer failed: {0}")]
    Producer(#[from] ProducerError),

    /// Internal contract violation inside the loop
    #[error("internal error: {0}")]
    Internal(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl EmitError {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a missing-field error
    pub fn missing_config(field: &'static str) -> Self {
        Self::MissingConfig(field)
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether this error came from the producer
    pub fn is_producer(&self) -> bool {
        matches!(self, Self::Producer(_))
    }
}

/// Result type alias
pub type EmitResult<T> = std::result::Result<T, EmitError>;

/// Errors raised by a [`Producer`](crate::traits::Producer). Always fatal to the run.
#[derive(Error, Debug)]
pub enum ProducerError {
    /// The source has nothing more to give
    #[error("producer exhausted")]
    Exhausted,

    /// Item generation failed
    #[error("failed to generate data: {0}")]
    Generation(String),

    /// Any other failure, boxed
    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl ProducerError {
    /// Create a generation error
    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation(message.into())
    }
}

/// Errors raised by a [`Consumer`](crate::traits::Consumer). Logged and swallowed by the loop.
#[derive(Error, Debug)]
pub enum ConsumerError {
    /// The downstream side is gone
    #[error("consumer closed")]
    Closed,

    /// Delivery failed
    #[error("delivery failed: {0}")]
    Delivery(String),

    /// IO error while writing the item
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error while encoding the item
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ConsumerError {
    /// Create a delivery error
    pub fn delivery(message: impl Into<String>) -> Self {
        Self::Delivery(message.into())
    }
}
