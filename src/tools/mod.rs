//! The tools module provides the helpers around the compression engine.
//!
//! The tools are:
//! - cli: Command line interface for pahuff.
//! - freq_count: Frequency mining, the first pass over the input.
//! - options: Engine configuration and the separator set.
//! - pattern_table: Bounded pattern counter used by every context.
//! - progress: Periodic progress reporting for long operations.
//!
pub mod cli;
pub mod freq_count;
pub mod options;
pub mod pattern_table;
pub mod progress;
