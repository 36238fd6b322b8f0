//! Crate-wide error types.

use thiserror::Error;

pub type ConveyorResult<T> = Result<T, ConveyorError>;

/// Errors surfaced by pipeline construction and orchestration.
///
/// Runtime progress never raises: once a pipeline is validly constructed it
/// either runs to completion or keeps polling. Everything that can go wrong
/// is caught at the configuration boundary or in lifecycle misuse.
#[derive(Debug, Error)]
pub enum ConveyorError {
    /// Rejected configuration, raised before any worker is spawned.
    #[error("configuration error: {0}")]
    Config(String),

    /// Operation not valid for the current lifecycle state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Unexpected internal failure (e.g. a worker task panicked).
    #[error("internal error: {0}")]
    Internal(String),
}
