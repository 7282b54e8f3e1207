// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use std::collections::TryReserveError;

/// Represents errors that can occur in the cuckoo table
#[derive(Debug)]
pub enum Error {
    /// Caller bug, such as an empty key or an out-of-range configuration value
    InvalidArgument(&'static str),

    /// The bucket arrays could not be allocated
    Allocation(TryReserveError),

    /// The key is already present (only reported when lookup-on-insert is enabled)
    AlreadyExists,

    /// No placement could be found within the configured relocation depth
    ///
    /// The table is left unmodified.
    Full,

    /// The key is not present
    NotFound,

    /// Statistics and dumps require the `metrics` feature
    Unsupported,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CuckooTableError: {self:?}")
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Allocation(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TryReserveError> for Error {
    fn from(value: TryReserveError) -> Self {
        Self::Allocation(value)
    }
}

/// Cuckoo table result
pub type Result<T> = std::result::Result<T, Error>;
