//! Frequency mining: the first pass over the input.
//!
//! The input is cut into words at separator bytes. The first byte of each word names its
//! context; every substring of the rest of the word (up to the maximum pattern length) is
//! counted in that context's table. The separator ending a word is counted in the same table,
//! and each separator is also counted as a one-byte word of its own so it always has a
//! context to fall back on.

use std::io::{ErrorKind, Read};

use log::{debug, info};

use crate::error::{PahuffError, Result};
use crate::huffman_coding::huffman::{ContextMap, Dictionary};
use crate::huffman_coding::node::ContextNode;
use crate::tools::options::Config;
use crate::tools::progress::Progress;

/// Size of the read buffer used by mine().
const READ_CHUNK: usize = 64 * 1024;

#[derive(Debug)]
pub struct FrequencyMiner<'c> {
    config: &'c Config,
    contexts: ContextMap,
    /// Word being collected.
    word: Vec<u8>,
    /// Bytes fed so far.
    seen: u64,
}

impl<'c> FrequencyMiner<'c> {
    pub fn new(config: &'c Config) -> Self {
        Self {
            config,
            contexts: ContextMap::default(),
            word: Vec::with_capacity(64),
            seen: 0,
        }
    }

    /// Feed the next piece of input. Words may span calls.
    pub fn feed(&mut self, data: &[u8]) {
        self.seen += data.len() as u64;
        for &byte in data {
            if self.config.separators.is_separator(byte) {
                if !self.word.is_empty() {
                    let word = std::mem::take(&mut self.word);
                    // The separator is remembered as a follower of this context.
                    self.register_word(&word).patterns.add(&[byte]);
                    self.word = word;
                    self.word.clear();
                }
                self.register_word(&[byte]);
            } else {
                self.word.push(byte);
            }
        }
    }

    /// Count one word: bump its context and collect the patterns after the first byte.
    pub fn register_word(&mut self, word: &[u8]) -> &mut ContextNode {
        let max_len = self.config.max_pattern_length;
        let amount = self.config.max_pattern_amount;
        let ctx = self
            .contexts
            .entry(word[0])
            .or_insert_with(|| ContextNode::new(word[0], max_len, amount));
        ctx.frequency += 1;

        // Longest pattern first at each start point.
        for start in 1..word.len() {
            let max_end = (word.len() - 1).min(start + max_len - 1);
            for end in (start..=max_end).rev() {
                ctx.patterns.add(&word[start..=end]);
            }
        }
        ctx
    }

    /// Flush the last word and hand the tables over as an unbuilt dictionary.
    pub fn finish(mut self) -> Result<Dictionary> {
        if !self.word.is_empty() {
            let word = std::mem::take(&mut self.word);
            self.register_word(&word);
        }
        if self.contexts.is_empty() {
            return Err(PahuffError::EmptyInput);
        }

        let dropped: u64 = self.contexts.values().map(|c| c.patterns.dropped()).sum();
        if dropped > 0 {
            debug!("{} patterns turned away by full context tables", dropped);
        }

        Ok(Dictionary::new(
            self.contexts,
            self.config.separators.clone(),
            self.seen,
            self.config.max_pattern_length,
        ))
    }
}

/// Run the miner over a whole stream.
pub fn mine<R: Read>(
    mut reader: R,
    config: &Config,
    progress: &mut Progress<'_>,
) -> Result<Dictionary> {
    config.validate()?;
    let mut miner = FrequencyMiner::new(config);
    let mut buf = vec![0_u8; READ_CHUNK];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        miner.feed(&buf[..n]);
        progress.advance(n as u64);
    }
    let dict = miner.finish()?;
    info!(
        "Mined {} bytes: {} contexts, {} patterns",
        dict.source_len(),
        dict.contexts().len(),
        dict.pattern_count()
    );
    Ok(dict)
}
