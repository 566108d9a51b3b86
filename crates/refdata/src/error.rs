//! Crate-level error taxonomy.

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum RefDataError {
    /// The store failed or rejected an operation mid-flush.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A machine observation failed validation at add time.
    #[error("invalid machine fact: {reason} (name {name:?}, timestamp {timestamp})")]
    InvalidMachine {
        name: String,
        timestamp: i64,
        reason: &'static str,
    },
}
