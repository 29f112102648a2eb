//! The compression module holds both directions of the pahuff format.
//!
//! Compression happens in the following steps:
//! - Frequency mining: cut the input into words at separator bytes and count, for every byte
//!   that starts a word, the patterns that follow it.
//! - Tree building: a super-tree over the word-starting bytes (contexts), and a sub-tree over
//!   each context's patterns.
//! - Header: write the frequency tables so the trees can be rebuilt.
//! - Encoding: a second pass over the input writes each word as its context code followed by
//!   the longest pattern codes that fit.
//!
//! Decompression reads the header, rebuilds the same trees, and walks them bit by bit, switching
//! between the super-tree and the current context's sub-tree.
//!

pub mod compress;
pub mod decompress;
pub mod header;
