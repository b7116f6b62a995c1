use std::fs::File;
use std::path::{Path, PathBuf};

use tensorize_result::{Error, Result};

use crate::sniff;
use crate::CsvOptions;

/// One delimited input file with a resolved dialect.
///
/// Opening a source sniffs (or takes overrides for) the delimiter and header
/// presence, and captures the header row. The source itself holds no open
/// file handle: [`rows`](CsvSource::rows) opens a fresh reader each time, so
/// the same source can be scanned any number of times with identical
/// results as long as the underlying file is unchanged.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    delimiter: u8,
    has_header: bool,
    header: Vec<String>,
}

impl CsvSource {
    /// Open a delimited file, sniffing whatever `options` leaves unspecified.
    pub fn open(path: impl AsRef<Path>, options: &CsvOptions) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let sample = sniff::sample_lines(&path, options.sample_lines)?;
        if sample.iter().all(|line| line.is_empty()) {
            return Err(Error::Config(format!(
                "input file '{}' is empty",
                path.display()
            )));
        }

        let detected = sniff::detect_delimiter(&sample);
        let delimiter = match options.delimiter {
            Some(delim) => {
                if delim != detected {
                    tracing::info!(
                        file = %path.display(),
                        detected = %char::from(detected),
                        using = %char::from(delim),
                        "overriding detected delimiter"
                    );
                }
                delim
            }
            None => detected,
        };
        let has_header = options
            .has_header
            .unwrap_or_else(|| sniff::detect_header(&sample, delimiter));

        let first = first_record(&path, delimiter)?;
        let header = if has_header {
            first
        } else {
            // Positional names for headerless files.
            (1..=first.len()).map(|i| i.to_string()).collect()
        };

        Ok(Self {
            path,
            delimiter,
            has_header,
            header,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The active field delimiter.
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    pub fn has_header(&self) -> bool {
        self.has_header
    }

    /// Ordered field names (positional `"1".."N"` when headerless).
    pub fn header(&self) -> &[String] {
        &self.header
    }

    pub fn num_columns(&self) -> usize {
        self.header.len()
    }

    /// Resolve a field identifier to a 0-based column.
    ///
    /// Matches header names case-insensitively first; an identifier that
    /// matches no name but parses as a 1-based ordinal within the column
    /// count resolves positionally.
    pub fn column(&self, field: &str) -> Option<usize> {
        if let Some(position) = self
            .header
            .iter()
            .position(|name| name.eq_ignore_ascii_case(field))
        {
            return Some(position);
        }
        field
            .parse::<usize>()
            .ok()
            .filter(|&ordinal| ordinal >= 1 && ordinal <= self.header.len())
            .map(|ordinal| ordinal - 1)
    }

    /// Start a fresh scan over the data rows.
    ///
    /// Re-opens the file; the header row (if any) is consumed before the
    /// first yielded record. A syntactically malformed record mid-stream is
    /// fatal and the error names the offending line.
    pub fn rows(&self) -> Result<Rows> {
        let reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(false)
            .flexible(false)
            .from_path(&self.path)
            .map_err(Error::from)?;
        let mut records = reader.into_records();
        if self.has_header {
            if let Some(first) = records.next() {
                first?;
            }
        }
        Ok(Rows { records })
    }
}

fn first_record(path: &Path, delimiter: u8) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_path(path)?;
    let mut record = csv::StringRecord::new();
    if !reader.read_record(&mut record)? {
        return Err(Error::Config(format!(
            "input file '{}' has no records",
            path.display()
        )));
    }
    Ok(record.iter().map(|field| field.to_string()).collect())
}

/// Lazy scan over a source's data rows.
pub struct Rows {
    records: csv::StringRecordsIntoIter<File>,
}

impl Iterator for Rows {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        Some(
            record
                .map(|rec| rec.iter().map(|field| field.to_string()).collect())
                .map_err(Error::from),
        )
    }
}
