#![forbid(unsafe_code)]
//! tilemerge-exec: drives a join tree to completion and emits a RunManifest.
//!
//! Execution is single-threaded and pull-based: the engine keeps pulling the
//! root operator until it reports end of stream, taking ownership of every
//! tile it produces.

pub mod runtime;

pub use runtime::{drain, Engine, ExecError, RunReport};
