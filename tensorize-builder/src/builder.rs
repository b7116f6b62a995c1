use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use tensorize_csv::CsvSource;
use tensorize_index::IndexMap;
use tensorize_result::{Error, Result};

use crate::config::TensorConfig;
use crate::merge::merge_duplicates;

/// Counters reported by a completed build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSummary {
    /// Data rows scanned per pass across all inputs.
    pub rows_read: u64,
    /// Rows retracted by the pruning pass.
    pub rows_pruned: u64,
    /// Coordinate tuples written (pre-merge).
    pub rows_emitted: u64,
    /// Surviving unique keys per mode, in mode order.
    pub mode_sizes: Vec<u64>,
}

/// Per-source column bindings, resolved once before any pass.
struct SourceBinding {
    source: CsvSource,
    mode_columns: Vec<usize>,
    value_column: Option<usize>,
}

/// Build the coordinate tensor described by `config`.
///
/// Scans every input three times:
///
/// 1. **count** — feed every mode's raw column value into its index map;
/// 2. **prune** — any row whose key in some mode has a count of zero (a
///    transform failure, or a key already retracted earlier in this pass)
///    has *all* of its modes' counts decremented, so no mode keeps a
///    partially-alive key for an excluded row. This is a single pass, not a
///    fixed-point closure: retractions are visible to later rows in the
///    scan but earlier rows are never re-examined;
/// 3. **emit** — finalize every index map, then write one `i1 .. iN value`
///    line per surviving row, in encounter order.
///
/// Afterwards each mode's key listing is written next to the output as
/// `mode-<N>-<field>.map`, and the configured merge policy (if any) is
/// applied to the output file.
pub fn build_tensor(config: &TensorConfig) -> Result<BuildSummary> {
    if config.num_modes() == 0 {
        return Err(Error::Config("tensor has no modes configured".into()));
    }
    if config.inputs().is_empty() {
        return Err(Error::Config("no input files configured".into()));
    }

    let mut maps: Vec<IndexMap> = config
        .modes()
        .iter()
        .map(|mode| IndexMap::new(&mode.field, mode.transform.clone(), mode.sort))
        .collect();

    // Open all sources and resolve every column up front so configuration
    // problems surface before any counting happens.
    let bindings = resolve_bindings(config)?;

    let mut summary = BuildSummary::default();

    // Pass 1: count keys.
    for binding in &bindings {
        tracing::debug!(file = %binding.source.path().display(), "counting keys");
        for row in binding.source.rows()? {
            let row = row?;
            for (map, &col) in maps.iter_mut().zip(&binding.mode_columns) {
                map.add(&row[col])?;
            }
            summary.rows_read += 1;
        }
    }
    tracing::info!(rows = summary.rows_read, "counting pass complete");

    // Pass 2: retract rows that died in any mode.
    for binding in &bindings {
        for row in binding.source.rows()? {
            let row = row?;
            let dead = maps
                .iter()
                .zip(&binding.mode_columns)
                .any(|(map, &col)| map.get_count(&row[col]) <= 0);
            if dead {
                for (map, &col) in maps.iter_mut().zip(&binding.mode_columns) {
                    map.sub(&row[col])?;
                }
                summary.rows_pruned += 1;
            }
        }
    }
    tracing::info!(pruned = summary.rows_pruned, "pruning pass complete");

    // Pass 3: finalize mappings and emit coordinate tuples.
    for map in &mut maps {
        map.build_map()?;
    }
    summary.mode_sizes = maps.iter().map(|map| map.len() as u64).collect();

    let mut out = BufWriter::new(File::create(config.output())?);
    let mut indices: Vec<u64> = vec![0; maps.len()];
    for binding in &bindings {
        'rows: for row in binding.source.rows()? {
            let row = row?;
            for (slot, (map, &col)) in indices
                .iter_mut()
                .zip(maps.iter().zip(&binding.mode_columns))
            {
                match map.index_of(&row[col])? {
                    Some(index) => *slot = index,
                    // Pruned in some mode: drop the whole row.
                    None => continue 'rows,
                }
            }
            for index in &indices {
                write!(out, "{index} ")?;
            }
            match binding.value_column {
                Some(col) => writeln!(out, "{}", row[col])?,
                None => writeln!(out, "1")?,
            }
            summary.rows_emitted += 1;
        }
    }
    out.flush()?;
    tracing::info!(
        emitted = summary.rows_emitted,
        dims = ?summary.mode_sizes,
        "emit pass complete"
    );

    write_key_files(config, &maps)?;

    if !config.merge().is_none() {
        merge_duplicates(
            config.output(),
            config.num_modes(),
            config.merge(),
            config.merge_options(),
        )?;
    }

    Ok(summary)
}

fn resolve_bindings(config: &TensorConfig) -> Result<Vec<SourceBinding>> {
    let options = config.csv_options();
    let mut bindings = Vec::with_capacity(config.inputs().len());
    for input in config.inputs() {
        let source = CsvSource::open(input, &options)?;
        let mut mode_columns = Vec::with_capacity(config.num_modes());
        for mode in config.modes() {
            let col = source.column(&mode.field).ok_or_else(|| {
                Error::Config(format!(
                    "field '{}' not found in '{}' (header: [{}])",
                    mode.field,
                    input.display(),
                    source.header().join(", ")
                ))
            })?;
            mode_columns.push(col);
        }
        let value_column = match config.values() {
            Some(field) => Some(source.column(field).ok_or_else(|| {
                Error::Config(format!(
                    "values field '{}' not found in '{}'",
                    field,
                    input.display()
                ))
            })?),
            None => None,
        };
        bindings.push(SourceBinding {
            source,
            mode_columns,
            value_column,
        });
    }
    Ok(bindings)
}

/// Write each mode's inverse key listing as `mode-<N>-<field>.map` next to
/// the output file, where N is the 1-based mode position.
fn write_key_files(config: &TensorConfig, maps: &[IndexMap]) -> Result<()> {
    let dir = config
        .output()
        .parent()
        .map(PathBuf::from)
        .unwrap_or_default();
    for (position, map) in maps.iter().enumerate() {
        let path = dir.join(format!("mode-{}-{}.map", position + 1, map.name()));
        let mut out = BufWriter::new(File::create(&path)?);
        map.write(&mut out)?;
        out.flush()?;
    }
    Ok(())
}
