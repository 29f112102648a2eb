//! Error type shared by the compression and decompression paths.
//!
//! Only fatal conditions live here. A body that runs out of bits before the recorded
//! source length is reached is not an error: the decoder returns what it has and sets
//! `DecompressStats::truncated`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PahuffError {
    /// Mining found nothing to build a dictionary from.
    #[error("input is empty, nothing to compress")]
    EmptyInput,

    /// The encoder met a byte its dictionary has no code for.
    #[error("dictionary has no code for byte {byte:#04x}")]
    DictionaryMismatch { byte: u8 },

    /// The encoder consumed a different number of bytes than the dictionary was mined from.
    #[error("dictionary was mined from {expected} bytes but the input holds {actual}")]
    LengthMismatch { expected: u64, actual: u64 },

    /// The header could not be parsed.
    #[error("corrupt header: {0}")]
    HeaderCorrupt(String),

    /// Configuration values outside their allowed range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PahuffError>;

impl PahuffError {
    /// Convenience constructor used by the header reader.
    pub fn corrupt<S: Into<String>>(msg: S) -> Self {
        PahuffError::HeaderCorrupt(msg.into())
    }
}
