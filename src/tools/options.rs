//! Engine configuration. Passed by reference into the miner, the tree builder and the encoder,
//! so several configurations can be used side by side in one process.

use std::fmt::{Debug, Formatter};

use crate::error::{PahuffError, Result};

/// Default word separators: space, newline, tab and common punctuation.
pub const DEFAULT_SEPARATORS: &[u8] = b" \n\t.,;!?";
/// Longest pattern kept in a context's table.
pub const MAX_PATTERN_LENGTH: usize = 6;
/// Most patterns kept in a context's table.
pub const MAX_PATTERN_AMOUNT: usize = 2500;

/// Set of bytes that end a word. Membership is a table lookup.
#[derive(Clone, PartialEq, Eq)]
pub struct Separators {
    map: [bool; 256],
}

impl Separators {
    pub fn new(bytes: &[u8]) -> Self {
        let mut map = [false; 256];
        bytes.iter().for_each(|&b| map[b as usize] = true);
        Self { map }
    }

    #[inline(always)]
    pub fn is_separator(&self, byte: u8) -> bool {
        self.map[byte as usize]
    }

    /// Separator bytes in ascending order.
    pub fn bytes(&self) -> Vec<u8> {
        (0..=255_u8).filter(|&b| self.map[b as usize]).collect()
    }

    pub fn len(&self) -> usize {
        self.map.iter().filter(|&&b| b).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Separators {
    fn default() -> Self {
        Self::new(DEFAULT_SEPARATORS)
    }
}

impl Debug for Separators {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "Separators({:?})", String::from_utf8_lossy(&self.bytes()))
    }
}

/// Limits and alphabet used while mining and encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Longest pattern (in bytes) stored in a context table
    pub max_pattern_length: usize,
    /// Capacity of each context table
    pub max_pattern_amount: usize,
    /// Bytes that delimit words
    pub separators: Separators,
}

impl Config {
    pub fn new() -> Self {
        Self {
            max_pattern_length: MAX_PATTERN_LENGTH,
            max_pattern_amount: MAX_PATTERN_AMOUNT,
            separators: Separators::default(),
        }
    }

    /// Check the limits. Every single byte must fit in a table next to at least one longer
    /// pattern, and pattern lengths are stored in a byte.
    pub fn validate(&self) -> Result<()> {
        if !(1..=255).contains(&self.max_pattern_length) {
            return Err(PahuffError::InvalidConfig(format!(
                "max pattern length must be 1..=255, got {}",
                self.max_pattern_length
            )));
        }
        if self.max_pattern_amount < 256 {
            return Err(PahuffError::InvalidConfig(format!(
                "max pattern amount must be at least 256, got {}",
                self.max_pattern_amount
            )));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn default_separators_test() {
        let seps = Separators::default();
        for b in b" \t\n.,;!?" {
            assert!(seps.is_separator(*b));
        }
        assert!(!seps.is_separator(b'a'));
        assert!(!seps.is_separator(b'-'));
        assert_eq!(seps.len(), 8);
        assert_eq!(seps.bytes(), b"\t\n !,.;?".to_vec());
    }

    #[test]
    fn validate_test() {
        assert!(Config::default().validate().is_ok());

        let mut cfg = Config::default();
        cfg.max_pattern_length = 0;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.max_pattern_amount = 100;
        assert!(cfg.validate().is_err());

        let mut cfg = Config::default();
        cfg.max_pattern_amount = 256;
        cfg.max_pattern_length = 255;
        assert!(cfg.validate().is_ok());
    }
}
