//! Per-mode key indexing for the tensorize toolkit.
//!
//! Each tensor mode owns one [`IndexMap`]: it counts occurrences of
//! (transformed) keys while the input sources are scanned, supports symmetric
//! retraction during the pruning pass, and finally compiles the surviving
//! keys into a dense, gap-free mapping onto `1..=U` under the mode's ordering
//! policy.
//!
//! Keys are compared by their *transformed* value, not the raw field text, so
//! `"007"` and `"7"` collide under the integer transform. The set of
//! transforms is a closed enumeration ([`KeyTransform`]) with a
//! caller-supplied strategy escape hatch; no runtime code evaluation is
//! involved.

pub mod key;
pub mod map;
pub mod transform;

pub use key::TypedKey;
pub use map::{IndexMap, SortPolicy};
pub use transform::{DatePart, KeyTransform};
