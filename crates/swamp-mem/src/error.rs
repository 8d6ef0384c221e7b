//! Error types for `swamp-mem` arena allocation.

use std::fmt;

/// Errors that can occur while allocating from or addressing an arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The allocator ran out of backing memory for the arena.
    OutOfMemory,

    /// An allocation would have advanced the bump cursor past the arena's
    /// fixed capacity.
    ArenaExhausted {
        /// The requested allocation size in bytes, alignment padding included.
        requested: usize,
        /// The number of bytes left in the arena before this request.
        available: usize,
    },

    /// The requested alignment was not a power of two.
    InvalidAlignment {
        /// The offending alignment value.
        alignment: usize,
    },

    /// An offset or offset+size range fell outside the arena's bounds.
    OutOfBounds {
        /// The offset that was requested.
        offset: usize,
        /// The size of the arena being addressed.
        len: usize,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::OutOfMemory => write!(f, "out of memory"),
            Error::ArenaExhausted {
                requested,
                available,
            } => write!(
                f,
                "arena exhausted: requested {requested} bytes, {available} available"
            ),
            Error::InvalidAlignment { alignment } => {
                write!(f, "invalid alignment: {alignment} is not a power of two")
            }
            Error::OutOfBounds { offset, len } => {
                write!(f, "offset {offset} out of bounds for region of length {len}")
            }
        }
    }
}

impl std::error::Error for Error {}

/// Result type for `swamp-mem` operations.
pub type Result<T> = std::result::Result<T, Error>;
