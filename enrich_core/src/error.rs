use thiserror::Error;

/// Runtime errors raised by the enrichment strategies.
///
/// `Copy` and allocation-free so they can be returned from the control loop.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EnrichError {
    #[error("history length must be in [1, {max}], got {requested}")]
    InvalidCapacity { requested: i64, max: usize },
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("invalid table: {0}")]
    InvalidTable(&'static str),
    #[error("invalid config: {0}")]
    InvalidConfig(&'static str),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
