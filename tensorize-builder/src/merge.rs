use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::Path;
use std::sync::Arc;

use tempfile::NamedTempFile;
use tensorize_index::key::display_float;
use tensorize_result::{Error, Result};

/// A caller-supplied reduction over the values of one duplicate group.
pub type CustomReduce = Arc<dyn Fn(&[f64]) -> f64 + Send + Sync>;

/// How duplicate coordinate tuples are consolidated.
#[derive(Clone, Default)]
pub enum MergePolicy {
    /// Leave duplicates in place (the merge step is skipped entirely).
    None,
    #[default]
    Sum,
    Min,
    Max,
    /// Arithmetic mean of the duplicate values.
    Mean,
    /// Number of duplicates, ignoring their values.
    Count,
    /// Caller-supplied reduction.
    Custom(CustomReduce),
}

impl std::fmt::Debug for MergePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MergePolicy::None => f.write_str("None"),
            MergePolicy::Sum => f.write_str("Sum"),
            MergePolicy::Min => f.write_str("Min"),
            MergePolicy::Max => f.write_str("Max"),
            MergePolicy::Mean => f.write_str("Mean"),
            MergePolicy::Count => f.write_str("Count"),
            MergePolicy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl MergePolicy {
    pub fn is_none(&self) -> bool {
        matches!(self, MergePolicy::None)
    }

    /// Reduce one duplicate group. `values` is never empty.
    fn reduce(&self, values: &[f64]) -> f64 {
        match self {
            MergePolicy::None => values[0],
            MergePolicy::Sum => values.iter().sum(),
            MergePolicy::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            MergePolicy::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            MergePolicy::Mean => values.iter().sum::<f64>() / values.len() as f64,
            MergePolicy::Count => values.len() as f64,
            MergePolicy::Custom(func) => func(values),
        }
    }
}

/// Tunables for the external sort.
#[derive(Debug, Clone)]
pub struct MergeOptions {
    /// Maximum number of coordinate lines held in memory per sorted run.
    pub chunk_lines: usize,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            chunk_lines: 1_000_000,
        }
    }
}

/// One parsed coordinate line: the coordinate columns and the value token.
#[derive(Debug, Clone)]
struct Entry {
    coords: Vec<u64>,
    value: String,
}

/// Heap element for the k-way run merge. Field order gives coordinate-major
/// ordering with the run index as a deterministic tie-break.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
struct RunHead {
    coords: Vec<u64>,
    run: usize,
    value: String,
}

/// Consolidate duplicate coordinate tuples in `path`.
///
/// The file is externally sorted by its coordinate columns: lines are read
/// in bounded chunks (`options.chunk_lines`), each chunk is sorted in memory
/// and spilled as a run into a temporary directory, and the runs are k-way
/// merged into an intermediate sorted file. A single left-to-right scan of
/// the sorted data then groups consecutive lines with identical coordinates,
/// parses their values as numeric literals, applies `policy`, and writes one
/// line per group.
///
/// The result is staged in a temporary file beside `path` and atomically
/// renamed over it only on full success. On any failure the original file is
/// untouched and every temporary is removed; the intermediate sorted data
/// never outlives the call either way.
pub fn merge_duplicates(
    path: &Path,
    num_modes: usize,
    policy: &MergePolicy,
    options: &MergeOptions,
) -> Result<()> {
    if policy.is_none() {
        return Ok(());
    }
    if num_modes == 0 {
        return Err(Error::Config(
            "cannot merge a tensor with zero modes".into(),
        ));
    }
    if options.chunk_lines == 0 {
        return Err(Error::Config("merge chunk size must be non-zero".into()));
    }

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    // Spill directory for sorted runs; removed on drop, success or failure.
    let spill = tempfile::Builder::new()
        .prefix(".tensorize-merge-")
        .tempdir_in(dir)?;

    let runs = write_sorted_runs(path, num_modes, options.chunk_lines, spill.path())?;
    let sorted = merge_runs(&runs, spill.path())?;

    // Stage the reduced output beside the target so the final rename is
    // atomic on the same filesystem.
    let mut staged = NamedTempFile::new_in(dir)?;
    {
        let mut out = BufWriter::new(staged.as_file_mut());
        reduce_sorted(&sorted, policy, &mut out)?;
        out.flush()?;
    }
    staged
        .persist(path)
        .map_err(|err| Error::Io(err.error))?;

    tracing::debug!(file = %path.display(), runs = runs.len(), "duplicate merge complete");
    Ok(())
}

fn parse_line(line: &str, num_modes: usize, line_no: u64) -> Result<Entry> {
    let mut tokens = line.split_whitespace();
    let mut coords = Vec::with_capacity(num_modes);
    for _ in 0..num_modes {
        let token = tokens.next().ok_or_else(|| {
            Error::InvalidData(format!(
                "line {line_no}: expected {num_modes} coordinates, got '{line}'"
            ))
        })?;
        let coord = token.parse::<u64>().map_err(|_| {
            Error::InvalidData(format!("line {line_no}: bad coordinate '{token}'"))
        })?;
        coords.push(coord);
    }
    let value = tokens
        .next()
        .ok_or_else(|| {
            Error::InvalidData(format!("line {line_no}: missing value token in '{line}'"))
        })?
        .to_string();
    if tokens.next().is_some() {
        return Err(Error::InvalidData(format!(
            "line {line_no}: trailing tokens after the value in '{line}'"
        )));
    }
    Ok(Entry { coords, value })
}

fn write_entry<W: Write>(out: &mut W, coords: &[u64], value: &str) -> Result<()> {
    for coord in coords {
        write!(out, "{coord} ")?;
    }
    writeln!(out, "{value}")?;
    Ok(())
}

/// Phase 1: split the unsorted file into sorted runs of at most
/// `chunk_lines` lines each.
fn write_sorted_runs(
    path: &Path,
    num_modes: usize,
    chunk_lines: usize,
    spill: &Path,
) -> Result<Vec<std::path::PathBuf>> {
    let reader = BufReader::new(File::open(path)?);
    let mut runs = Vec::new();
    let mut chunk: Vec<Entry> = Vec::with_capacity(chunk_lines.min(1 << 16));
    let mut line_no = 0u64;

    let flush_chunk = |chunk: &mut Vec<Entry>, runs: &mut Vec<std::path::PathBuf>| -> Result<()> {
        if chunk.is_empty() {
            return Ok(());
        }
        chunk.sort_unstable_by(|a, b| a.coords.cmp(&b.coords));
        let run_path = spill.join(format!("run-{}", runs.len()));
        let mut out = BufWriter::new(File::create(&run_path)?);
        for entry in chunk.drain(..) {
            write_entry(&mut out, &entry.coords, &entry.value)?;
        }
        out.flush()?;
        runs.push(run_path);
        Ok(())
    };

    for line in reader.lines() {
        let line = line?;
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        chunk.push(parse_line(&line, num_modes, line_no)?);
        if chunk.len() >= chunk_lines {
            flush_chunk(&mut chunk, &mut runs)?;
        }
    }
    flush_chunk(&mut chunk, &mut runs)?;
    Ok(runs)
}

/// Phase 2: k-way merge the sorted runs into one intermediate sorted file.
fn merge_runs(runs: &[std::path::PathBuf], spill: &Path) -> Result<std::path::PathBuf> {
    let sorted_path = spill.join("sorted");
    let mut out = BufWriter::new(File::create(&sorted_path)?);

    let mut readers: Vec<Lines<BufReader<File>>> = Vec::with_capacity(runs.len());
    for run in runs {
        readers.push(BufReader::new(File::open(run)?).lines());
    }

    let mut heap: BinaryHeap<Reverse<RunHead>> = BinaryHeap::with_capacity(readers.len());
    for (run, reader) in readers.iter_mut().enumerate() {
        if let Some(head) = next_head(reader, run)? {
            heap.push(Reverse(head));
        }
    }

    while let Some(Reverse(head)) = heap.pop() {
        write_entry(&mut out, &head.coords, &head.value)?;
        if let Some(next) = next_head(&mut readers[head.run], head.run)? {
            heap.push(Reverse(next));
        }
    }
    out.flush()?;
    Ok(sorted_path)
}

/// Pull the next line of a run. Run files were written by us, so a line is
/// split on the last space rather than re-validated.
fn next_head(reader: &mut Lines<BufReader<File>>, run: usize) -> Result<Option<RunHead>> {
    let line = match reader.next() {
        Some(line) => line?,
        None => return Ok(None),
    };
    let (coord_part, value) = line.rsplit_once(' ').ok_or_else(|| {
        Error::Internal(format!("malformed spill line in run {run}: '{line}'"))
    })?;
    let coords = coord_part
        .split_whitespace()
        .map(|token| {
            token
                .parse::<u64>()
                .map_err(|_| Error::Internal(format!("malformed spill coordinate '{token}'")))
        })
        .collect::<Result<Vec<u64>>>()?;
    Ok(Some(RunHead {
        coords,
        run,
        value: value.to_string(),
    }))
}

/// Phase 3: single ordered scan of the sorted file, reducing each group of
/// identical coordinates to one line.
fn reduce_sorted<W: Write>(sorted: &Path, policy: &MergePolicy, out: &mut W) -> Result<()> {
    let reader = BufReader::new(File::open(sorted)?);
    let mut group_coords: Option<Vec<u64>> = None;
    let mut group_values: Vec<f64> = Vec::new();

    let emit = |coords: &[u64], values: &mut Vec<f64>, out: &mut W| -> Result<()> {
        let reduced = policy.reduce(values);
        values.clear();
        write_entry(out, coords, &display_float(reduced))
    };

    for line in reader.lines() {
        let line = line?;
        let (coord_part, value) = line.rsplit_once(' ').ok_or_else(|| {
            Error::Internal(format!("malformed sorted line '{line}'"))
        })?;
        let value = value.trim().parse::<f64>().map_err(|_| {
            Error::InvalidData(format!("value '{value}' is not a numeric literal"))
        })?;
        let coords = coord_part
            .split_whitespace()
            .map(|token| {
                token
                    .parse::<u64>()
                    .map_err(|_| Error::Internal(format!("malformed sorted coordinate '{token}'")))
            })
            .collect::<Result<Vec<u64>>>()?;

        match group_coords.take() {
            Some(current) if current == coords => {
                group_coords = Some(current);
                group_values.push(value);
            }
            Some(current) => {
                emit(&current, &mut group_values, out)?;
                group_coords = Some(coords);
                group_values.push(value);
            }
            None => {
                group_coords = Some(coords);
                group_values.push(value);
            }
        }
    }
    if let Some(coords) = group_coords {
        emit(&coords, &mut group_values, out)?;
    }
    Ok(())
}
