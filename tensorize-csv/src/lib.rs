//! Delimited-file row sources for the tensorize toolkit.
//!
//! A [`CsvSource`] wraps one delimited text file and presents the contract
//! the tensor builder consumes: an ordered header (real field names, or
//! positional `"1".."N"` names when the file has none), case-insensitive
//! field-to-column resolution, the active delimiter, and a *restartable*
//! lazy row sequence — every call to [`CsvSource::rows`] re-opens the file,
//! because the builder deliberately scans each input three times instead of
//! buffering arbitrarily large data in memory.
//!
//! Delimiter and header presence are sniffed from a bounded sample of the
//! file unless overridden through [`CsvOptions`].

pub mod sniff;
pub mod source;

pub use source::{CsvSource, Rows};

/// Overrides and tunables for opening a delimited file.
#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field delimiter; `None` sniffs it from a sample of the file.
    pub delimiter: Option<u8>,
    /// Whether the first row is a header; `None` sniffs it.
    pub has_header: Option<bool>,
    /// Maximum number of lines sampled for sniffing.
    pub sample_lines: usize,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: None,
            has_header: None,
            sample_lines: 100,
        }
    }
}
