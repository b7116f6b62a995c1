//! tensorize: sparse coordinate tensors from delimited tabular files.
//!
//! This crate is the primary entrypoint for the tensorize toolkit. It
//! re-exports the high-level build API and supporting types from the
//! underlying `tensorize-*` crates, providing a unified surface for users.
//!
//! # Quick Start
//!
//! ```no_run
//! use tensorize::{build_tensor, MergePolicy, TensorConfig};
//!
//! let mut config = TensorConfig::new(vec!["ratings.csv".into()], "ratings.tns");
//! config.add_mode("user");
//! config.add_mode("item");
//! config.set_values("rating");
//! config.set_merge(MergePolicy::Sum);
//! let summary = build_tensor(&config).unwrap();
//! println!("emitted {} non-zeros", summary.rows_emitted);
//! ```
//!
//! # Architecture
//!
//! tensorize is organized as a layered workspace:
//!
//! - **Row sources** (`tensorize-csv`): delimited files with sniffed or
//!   overridden dialects, restartable row scans.
//! - **Index maps** (`tensorize-index`): per-mode key counting, pruning,
//!   and dense 1-based coordinate assignment.
//! - **Building** (`tensorize-builder`): the three-pass orchestration, key
//!   files, and the out-of-core duplicate merge.
//! - **Results** (`tensorize-result`): the unified error type.

pub use tensorize_builder::{
    build_tensor, merge_duplicates, BuildSummary, MergeOptions, MergePolicy, ModeSpec,
    TensorConfig,
};
pub use tensorize_csv::{CsvOptions, CsvSource};
pub use tensorize_index::{DatePart, IndexMap, KeyTransform, SortPolicy, TypedKey};
pub use tensorize_result::{Error, Result};
