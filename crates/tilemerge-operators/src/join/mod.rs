//! Sort-merge join over two sorted tile streams.
//!
//! Layering, leaf first:
//! - `group`: finds the run of equal-key rows starting at a cursor.
//! - `assemble`: concatenated output schema and position lists.
//! - `merge`: walks both inputs group by group and emits matches.
//! - `executor`: pulls tile pairs from the children and retries empty pairs.

pub mod assemble;
pub mod executor;
pub mod group;
pub mod merge;

pub use assemble::OutputAssembler;
pub use executor::{JoinStats, MergeJoinExecutor};
pub use group::{advance, GroupCursor};
pub use merge::{MergeDriver, PassStats};
