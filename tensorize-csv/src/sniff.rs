//! Dialect sniffing over a bounded sample of the file.
//!
//! Heuristics only; both results can be overridden through
//! [`crate::CsvOptions`]. The sample is never larger than
//! `CsvOptions::sample_lines` lines, so sniffing stays cheap on arbitrarily
//! large inputs.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tensorize_result::Result;

/// Delimiters considered by the sniffer, in tie-break preference order.
const CANDIDATE_DELIMITERS: &[u8] = b",\t;| ";

/// Read up to `max_lines` lines for sniffing.
pub fn sample_lines(path: &Path, max_lines: usize) -> Result<Vec<String>> {
    let reader = BufReader::new(File::open(path)?);
    let mut sample = Vec::new();
    for line in reader.lines().take(max_lines) {
        sample.push(line?);
    }
    Ok(sample)
}

/// Pick the candidate delimiter that appears a consistent, non-zero number
/// of times per sampled line, preferring the candidate with the higher
/// per-line count. Falls back to a comma.
pub fn detect_delimiter(sample: &[String]) -> u8 {
    let mut best: Option<(u8, usize)> = None;
    for &candidate in CANDIDATE_DELIMITERS {
        let mut counts = sample
            .iter()
            .filter(|line| !line.is_empty())
            .map(|line| split_fields(line, candidate).len() - 1);
        let first = match counts.next() {
            Some(count) if count > 0 => count,
            _ => continue,
        };
        if counts.all(|count| count == first) {
            match best {
                Some((_, best_count)) if best_count >= first => {}
                _ => best = Some((candidate, first)),
            }
        }
    }
    best.map(|(delim, _)| delim).unwrap_or(b',')
}

/// Guess whether the first sampled line is a header: it contains no numeric
/// field while at least one later line does. Files whose columns are all
/// text defeat this heuristic; callers that know better pass the override.
pub fn detect_header(sample: &[String], delimiter: u8) -> bool {
    let mut lines = sample.iter().filter(|line| !line.is_empty());
    let first = match lines.next() {
        Some(line) => line,
        None => return false,
    };
    let first_numeric = split_fields(first, delimiter)
        .iter()
        .any(|field| field.trim().parse::<f64>().is_ok());
    if first_numeric {
        return false;
    }
    lines.any(|line| {
        split_fields(line, delimiter)
            .iter()
            .any(|field| field.trim().parse::<f64>().is_ok())
    })
}

/// Quote-aware single-line field splitter used by the sniffer. Double
/// quotes escape the delimiter; `""` inside a quoted field is a literal
/// quote.
pub(crate) fn split_fields<'a>(line: &'a str, delim: u8) -> Vec<&'a str> {
    let mut parts = Vec::new();
    let mut in_quotes = false;
    let mut start = 0usize;
    let bytes = line.as_bytes();
    let mut i = 0usize;
    while i < bytes.len() {
        let b = bytes[i];
        if b == b'"' {
            if in_quotes && i + 1 < bytes.len() && bytes[i + 1] == b'"' {
                i += 2;
                continue;
            }
            in_quotes = !in_quotes;
        } else if b == delim && !in_quotes {
            parts.push(&line[start..i]);
            start = i + 1;
        }
        i += 1;
    }
    parts.push(&line[start..]);
    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn detects_comma_and_tab() {
        assert_eq!(detect_delimiter(&lines(&["a,b,c", "1,2,3"])), b',');
        assert_eq!(detect_delimiter(&lines(&["a\tb", "1\t2"])), b'\t');
    }

    #[test]
    fn inconsistent_candidates_lose() {
        // Commas vary per line, pipes are consistent.
        assert_eq!(detect_delimiter(&lines(&["a|b,c", "1|2"])), b'|');
    }

    #[test]
    fn quoted_delimiters_do_not_count() {
        let sample = lines(&["\"a,b\",c", "\"d,e\",f"]);
        assert_eq!(detect_delimiter(&sample), b',');
        assert_eq!(split_fields("\"a,b\",c", b',').len(), 2);
    }

    #[test]
    fn header_detected_when_only_first_line_is_textual() {
        assert!(detect_header(&lines(&["user,score", "alice,3"]), b','));
        assert!(!detect_header(&lines(&["1,2", "3,4"]), b','));
        assert!(!detect_header(&lines(&["user,item", "alice,apples"]), b','));
    }
}
