//! Error types for the entry pool
//!
//! Only caller contract violations are errors. Exhaustion and a closed pool
//! are reported through `None`/`false` return values.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    #[error("Entry already enabled")]
    EntryAlreadyEnabled,

    #[error("Cannot release an already released entry")]
    EntryAlreadyReleased,
}

pub type PoolResult<T> = Result<T, PoolError>;
