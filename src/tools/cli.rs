//! Command line interface for pahuff, built on the clap crate.
//!
//! ```text
//! pahuff [-v...] [-q] compress <input> <output> [-l N] [-a N] [-s STR] [--show-codes]
//! pahuff [-v...] [-q] decompress <input> <output>
//! ```
//!
//! Stage information is shown by default. Each -v adds detail; -q shows errors only.

use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

use super::options::{Config, Separators, MAX_PATTERN_AMOUNT, MAX_PATTERN_LENGTH};
use crate::error::{PahuffError, Result};

/// Command Line Interpretation - uses external CLAP crate.
#[derive(Parser, Debug)]
#[clap(
    version,
    about = "A pattern-aware two-layer Huffman compressor",
    long_about = "
    Every word is coded in two steps: a code for the byte that starts it, then codes for the
    rest of the word taken from a table owned by that starting byte. Words are cut at
    separator bytes (by default space, tab, newline and . , ; ! ?).

    Works best on natural language text."
)]
pub struct Args {
    /// Sets verbosity. -v adds debugging detail, -vv traces every code
    #[clap(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only report errors
    #[clap(short = 'q', long = "quiet", global = true)]
    pub quiet: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(clap::Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Compress a file
    Compress(CompressArgs),
    /// Restore a file written by compress
    Decompress(DecompressArgs),
}

#[derive(clap::Args, Debug, Clone, PartialEq, Eq)]
pub struct CompressArgs {
    /// File to compress
    pub input: PathBuf,

    /// Where to write the compressed data
    pub output: PathBuf,

    /// Longest pattern kept in a context table
    #[clap(short = 'l', long, default_value_t = MAX_PATTERN_LENGTH)]
    pub max_pattern_length: usize,

    /// Most patterns kept per context table (at least 256)
    #[clap(short = 'a', long, default_value_t = MAX_PATTERN_AMOUNT)]
    pub max_pattern_amount: usize,

    /// Bytes that end a word. Accepts the escapes \t \n \r \s (space) and \\
    #[clap(short = 's', long)]
    pub separators: Option<String>,

    /// Print every context and pattern code after compressing
    #[clap(long)]
    pub show_codes: bool,
}

impl CompressArgs {
    /// Turn the options into a validated engine config.
    pub fn config(&self) -> Result<Config> {
        let separators = match &self.separators {
            Some(s) => Separators::new(&parse_separators(s)?),
            None => Separators::default(),
        };
        let config = Config {
            max_pattern_length: self.max_pattern_length,
            max_pattern_amount: self.max_pattern_amount,
            separators,
        };
        config.validate()?;
        Ok(config)
    }
}

#[derive(clap::Args, Debug, Clone, PartialEq, Eq)]
pub struct DecompressArgs {
    /// File written by compress
    pub input: PathBuf,

    /// Where to write the restored data
    pub output: PathBuf,
}

impl Args {
    /// Log level chosen by -q and -v.
    pub fn level(&self) -> LevelFilter {
        if self.quiet {
            return LevelFilter::Error;
        }
        match self.verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Parse the command line and set the log level from it.
pub fn args_init() -> Args {
    let args = Args::parse();
    log::set_max_level(args.level());
    args
}

/// Expand the escapes allowed in a separator list.
pub fn parse_separators(text: &str) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(text.len());
    let mut bytes = text.bytes();
    while let Some(b) = bytes.next() {
        if b != b'\\' {
            out.push(b);
            continue;
        }
        match bytes.next() {
            Some(b't') => out.push(b'\t'),
            Some(b'n') => out.push(b'\n'),
            Some(b'r') => out.push(b'\r'),
            Some(b's') => out.push(b' '),
            Some(b'\\') => out.push(b'\\'),
            Some(other) => {
                return Err(PahuffError::InvalidConfig(format!(
                    "unknown escape \\{} in separators",
                    other as char
                )))
            }
            None => {
                return Err(PahuffError::InvalidConfig(
                    "separators end with a lone backslash".to_string(),
                ))
            }
        }
    }
    Ok(out)
}
