//! Error types and result definitions for the tensorize toolkit.
//!
//! This crate provides a unified error type ([`Error`]) and result type alias
//! ([`Result<T>`]) used throughout all tensorize crates. Every operation that
//! can fail returns `Result<T>`, where the error variant says what went wrong
//! and at which stage of the build.
//!
//! # Error Categories
//!
//! - **I/O errors** ([`Error::Io`]): file access, temporary files, output
//!   writing.
//! - **CSV errors** ([`Error::Csv`]): malformed records in an input source;
//!   the wrapped error carries the offending record and line position.
//! - **Configuration errors** ([`Error::Config`]): problems detected before
//!   any scanning begins (missing fields, zero modes, unknown mode names).
//! - **Lifecycle errors** ([`Error::Lifecycle`]): index-map operations called
//!   out of order (e.g. a lookup before the dense mapping was built).
//! - **Data errors** ([`Error::InvalidData`]): coordinate or value tokens
//!   that cannot be parsed during the duplicate merge.
//! - **Internal errors** ([`Error::Internal`]): bugs or unexpected states.

pub mod error;
pub mod result;

pub use error::Error;
pub use result::Result;
