use std::path::{Path, PathBuf};

use tensorize_csv::CsvOptions;
use tensorize_index::{KeyTransform, SortPolicy};
use tensorize_result::{Error, Result};

use crate::merge::{MergeOptions, MergePolicy};

/// One configured tensor dimension.
///
/// Modes are ordered; their position in [`TensorConfig`] defines the
/// coordinate-column order of the output file.
#[derive(Debug, Clone)]
pub struct ModeSpec {
    /// Source field identifier: a header name or a 1-based ordinal.
    pub field: String,
    /// How raw field values become typed keys.
    pub transform: KeyTransform,
    /// Ordering policy for the mode's dense mapping.
    pub sort: SortPolicy,
}

/// Intermediate representation of user configuration.
///
/// Any front-end (the CLI, or a library caller) constructs one of these and
/// hands it to [`crate::build_tensor`]. Field identifiers in the setters are
/// matched case-insensitively; referencing a mode that was never added is a
/// configuration error.
#[derive(Debug, Clone)]
pub struct TensorConfig {
    inputs: Vec<PathBuf>,
    output: PathBuf,
    delimiter: Option<u8>,
    has_header: Option<bool>,
    modes: Vec<ModeSpec>,
    values: Option<String>,
    merge: MergePolicy,
    merge_options: MergeOptions,
}

impl TensorConfig {
    pub fn new(inputs: Vec<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            inputs,
            output: output.into(),
            delimiter: None,
            has_header: None,
            modes: Vec::new(),
            values: None,
            merge: MergePolicy::Sum,
            merge_options: MergeOptions::default(),
        }
    }

    pub fn add_input(&mut self, input: impl Into<PathBuf>) {
        self.inputs.push(input.into());
    }

    pub fn inputs(&self) -> &[PathBuf] {
        &self.inputs
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Override the sniffed field delimiter for all inputs.
    pub fn set_delimiter(&mut self, delimiter: u8) {
        self.delimiter = Some(delimiter);
    }

    /// Override header detection for all inputs.
    pub fn set_header(&mut self, has_header: bool) {
        self.has_header = Some(has_header);
    }

    /// Append a mode sourced from `field`, with the default transform
    /// (identity) and ordering (lexicographic).
    pub fn add_mode(&mut self, field: impl Into<String>) {
        self.modes.push(ModeSpec {
            field: field.into(),
            transform: KeyTransform::default(),
            sort: SortPolicy::default(),
        });
    }

    /// Append a fully specified mode.
    pub fn add_mode_with(
        &mut self,
        field: impl Into<String>,
        transform: KeyTransform,
        sort: SortPolicy,
    ) {
        self.modes.push(ModeSpec {
            field: field.into(),
            transform,
            sort,
        });
    }

    /// Set the ordering policy of the mode sourced from `field`.
    pub fn set_mode_sort(&mut self, field: &str, sort: SortPolicy) -> Result<()> {
        self.mode_mut(field)?.sort = sort;
        Ok(())
    }

    /// Set the key transform of the mode sourced from `field`.
    pub fn set_mode_transform(&mut self, field: &str, transform: KeyTransform) -> Result<()> {
        self.mode_mut(field)?.transform = transform;
        Ok(())
    }

    /// The mode sourced from `field`, if configured (case-insensitive).
    pub fn mode(&self, field: &str) -> Option<&ModeSpec> {
        self.modes
            .iter()
            .find(|mode| mode.field.eq_ignore_ascii_case(field))
    }

    pub fn modes(&self) -> &[ModeSpec] {
        &self.modes
    }

    pub fn num_modes(&self) -> usize {
        self.modes.len()
    }

    /// Use `field` as the tensor values; without one the tensor is binary.
    pub fn set_values(&mut self, field: impl Into<String>) {
        self.values = Some(field.into());
    }

    pub fn values(&self) -> Option<&str> {
        self.values.as_deref()
    }

    /// Reduction applied to duplicate coordinate tuples after emission.
    /// Defaults to [`MergePolicy::Sum`]; [`MergePolicy::None`] disables the
    /// merge step entirely.
    pub fn set_merge(&mut self, policy: MergePolicy) {
        self.merge = policy;
    }

    pub fn merge(&self) -> &MergePolicy {
        &self.merge
    }

    pub fn set_merge_options(&mut self, options: MergeOptions) {
        self.merge_options = options;
    }

    pub fn merge_options(&self) -> &MergeOptions {
        &self.merge_options
    }

    /// Options for opening the input sources.
    pub fn csv_options(&self) -> CsvOptions {
        CsvOptions {
            delimiter: self.delimiter,
            has_header: self.has_header,
            ..CsvOptions::default()
        }
    }

    fn mode_mut(&mut self, field: &str) -> Result<&mut ModeSpec> {
        self.modes
            .iter_mut()
            .find(|mode| mode.field.eq_ignore_ascii_case(field))
            .ok_or_else(|| Error::Config(format!("field '{field}' is not a configured mode")))
    }
}
