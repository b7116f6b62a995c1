//! Three-pass tensor construction and duplicate merging.
//!
//! [`build_tensor`] drives the whole pipeline: it scans every configured
//! input three times — count keys into per-mode index maps, prune rows whose
//! key died in any mode, then emit coordinate tuples through the finalized
//! dense mappings — and writes the coordinate file plus one key-listing file
//! per mode. [`merge_duplicates`] optionally consolidates coordinate tuples
//! that share the same coordinates, using a bounded-memory external sort so
//! the coordinate file never has to fit in memory.
//!
//! Everything is single-threaded and synchronous by design: the three passes
//! must observe the inputs in the same order and content, and pruning must
//! strictly happen after counting and before the dense mappings are built.

pub mod builder;
pub mod config;
pub mod merge;

pub use builder::{build_tensor, BuildSummary};
pub use config::{ModeSpec, TensorConfig};
pub use merge::{merge_duplicates, MergeOptions, MergePolicy};
