use std::{fmt, io};
use thiserror::Error;

/// Unified error type for all tensorize operations.
///
/// Errors propagate upward through the call stack with the `?` operator. The
/// CLI converts them to user-facing messages at the top level; library code
/// can match on specific variants.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during file or disk operations.
    ///
    /// Wraps standard library I/O errors: opening inputs, writing the
    /// coordinate or key files, spilling external-sort runs, or persisting
    /// the merged output.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Malformed record in a delimited input source.
    ///
    /// The wrapped `csv::Error` includes the record and line position of the
    /// failure, so the message names the offending line. A malformed record
    /// aborts the whole build; per-value conversion problems are handled
    /// separately as non-fatal transform failures.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid build configuration.
    ///
    /// Raised before any scanning begins: a required field missing from a
    /// source's header, zero configured modes, an unknown mode referenced
    /// when setting a sort or type policy, or more than one values field.
    #[error("configuration error: {0}")]
    Config(String),

    /// Index-map operation called out of lifecycle order.
    ///
    /// The index map moves through collecting, pruning, and finalized states;
    /// a lookup before `build_map`, or an `add` after it, is rejected with
    /// this variant rather than silently misbehaving. Looking up a key that
    /// was pruned is *not* an error; it is an ordinary `None`.
    #[error("lifecycle error: {0}")]
    Lifecycle(String),

    /// Unparseable coordinate or value token in a coordinate file.
    ///
    /// Raised by the duplicate merger when a line of the tensor file does not
    /// have the expected `i1 .. iN value` shape or a value cannot be read as
    /// a numeric literal. The original file is left untouched.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Internal error indicating a bug or unexpected state.
    ///
    /// This should never occur during normal operation; it indicates a
    /// violated invariant in tensorize itself.
    #[error("an internal operation failed: {0}")]
    Internal(String),
}

impl Error {
    /// Create an [`Error::InvalidData`] from any displayable error.
    #[inline]
    pub fn invalid_data<E: fmt::Display>(err: E) -> Self {
        Error::InvalidData(err.to_string())
    }
}
