//! pahuff: a pattern-aware, two-layer Huffman compressor.
//!
//! Version 0.1.0
//!
//! Instead of one flat code over single bytes, pahuff codes a word as the code of the byte that
//! starts it (its context) followed by codes for the rest of the word, taken from a table that
//! belongs to that context. Text where the same word stems keep coming back compresses well.
//!
//! Basic library usage:
//!
//! ```no_run
//! use std::fs::File;
//! use pahuff::{compress, decompress, Config, Progress};
//!
//! let input = File::open("test.txt").unwrap();
//! let output = File::create("test.txt.pah").unwrap();
//! compress(input, output, &Config::default(), &mut Progress::none()).unwrap();
//!
//! let input = File::open("test.txt.pah").unwrap();
//! let output = File::create("test.out").unwrap();
//! decompress(input, output, &mut Progress::none()).unwrap();
//! ```
//!
pub mod bitstream;
pub mod compression;
pub mod error;
pub mod huffman_coding;
pub mod tools;

pub use compression::compress::{compress, compress_with_dictionary, CompressStats};
pub use compression::decompress::{decompress, DecompressStats};
pub use error::{PahuffError, Result};
pub use huffman_coding::huffman::Dictionary;
pub use tools::freq_count::mine;
pub use tools::options::{Config, Separators};
pub use tools::progress::Progress;
