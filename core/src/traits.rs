//! Core traits for producers, consumers and emitted items
//!
//! The emission loop is generic over what it emits. It only needs to pull an
//! item, measure it and push it somewhere; everything else belongs to the
//! caller. Closures implement [`Producer`] and [`Consumer`] directly, so most
//! callers never name a type.

use crate::error::{ConsumerError, ProducerError};

// ============================================================================
// Emitted items
// ============================================================================

/// An item the loop can account for in throughput statistics
pub trait Emitted {
    /// Observed size in bytes
    fn byte_size(&self) -> u64;
}

impl Emitted for String {
    fn byte_size(&self) -> u64 {
        self.len() as u64
    }
}

impl Emitted for &'static str {
    fn byte_size(&self) -> u64 {
        self.len() as u64
    }
}

impl Emitted for Vec<u8> {
    fn byte_size(&self) -> u64 {
        self.len() as u64
    }
}

impl<T: Emitted> Emitted for Box<T> {
    fn byte_size(&self) -> u64 {
        (**self).byte_size()
    }
}

// ============================================================================
// Producer Trait
// ============================================================================

/// Pull side of the loop: yields one item per call
///
/// Calls are synchronous and may block. Any error aborts the run.
pub trait Producer<T>: Send {
    /// Produce the next item
    fn produce(&mut self) -> Result<T, ProducerError>;
}

impl<T, F> Producer<T> for F
where
    F: FnMut() -> Result<T, ProducerError> + Send,
{
    fn produce(&mut self) -> Result<T, ProducerError> {
        self()
    }
}

// ============================================================================
// Consumer Trait
// ============================================================================

/// Push side of the loop: takes ownership of one item per call
///
/// Errors are logged by the loop and never stop it.
pub trait Consumer<T>: Send {
    /// Deliver an item downstream
    fn accept(&mut self, item: T) -> Result<(), ConsumerError>;
}

impl<T, F> Consumer<T> for F
where
    F: FnMut(T) -> Result<(), ConsumerError> + Send,
{
    fn accept(&mut self, item: T) -> Result<(), ConsumerError> {
        self(item)
    }
}
