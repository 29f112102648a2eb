//! Bounded pattern -> frequency table kept by every context.
//!
//! The table holds at most `capacity` entries. Once full, a new multi-byte pattern replaces the
//! least frequent multi-byte entry found in a small sample of the table and inherits its count
//! plus one (an approximate Space-Saving scheme). Single bytes are never evicted, so every word
//! can always be encoded a byte at a time.

use rustc_hash::FxHashMap;

/// How many entries are looked at when choosing an eviction victim.
pub const EVICTION_SAMPLE: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatternTable {
    entries: FxHashMap<Vec<u8>, u64>,
    /// Longest pattern accepted.
    max_length: usize,
    /// Most entries held.
    capacity: usize,
    /// Patterns turned away because no victim could be found.
    dropped: u64,
}

impl PatternTable {
    pub fn new(max_length: usize, capacity: usize) -> Self {
        Self {
            entries: FxHashMap::default(),
            max_length,
            capacity,
            dropped: 0,
        }
    }

    /// Rebuild a table from stored counts, bypassing the admission policy. Used when reading a
    /// header, where the counts must come back exactly as they were written.
    pub fn from_entries(entries: FxHashMap<Vec<u8>, u64>, max_length: usize) -> Self {
        let capacity = entries.len();
        Self {
            entries,
            max_length,
            capacity,
            dropped: 0,
        }
    }

    /// Count one occurrence of `pattern`.
    pub fn add(&mut self, pattern: &[u8]) {
        if pattern.is_empty() || pattern.len() > self.max_length {
            return;
        }
        if let Some(count) = self.entries.get_mut(pattern) {
            *count += 1;
            return;
        }

        if pattern.len() == 1 {
            // Make room by dropping the weakest longer pattern. A table made only of single
            // bytes still admits the new byte.
            if self.entries.len() >= self.capacity {
                if let Some((victim, _)) = self.find_victim(usize::MAX) {
                    self.entries.remove(&victim);
                }
            }
            self.entries.insert(pattern.to_vec(), 1);
            return;
        }

        if self.entries.len() < self.capacity {
            self.entries.insert(pattern.to_vec(), 1);
            return;
        }

        match self.find_victim(EVICTION_SAMPLE) {
            Some((victim, count)) => {
                self.entries.remove(&victim);
                self.entries.insert(pattern.to_vec(), count + 1);
            }
            None => self.dropped += 1,
        }
    }

    /// Look at up to `sample` entries and return the least frequent multi-byte one.
    /// Stops early on a count of 1, since nothing can be lower.
    fn find_victim(&self, sample: usize) -> Option<(Vec<u8>, u64)> {
        let mut victim: Option<(&Vec<u8>, u64)> = None;
        for (key, &count) in self.entries.iter().take(sample) {
            if key.len() == 1 {
                continue;
            }
            if victim.map_or(true, |(_, min)| count < min) {
                victim = Some((key, count));
                if count == 1 {
                    break;
                }
            }
        }
        victim.map(|(key, count)| (key.clone(), count))
    }

    pub fn get(&self, pattern: &[u8]) -> Option<u64> {
        self.entries.get(pattern).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Vec<u8>, &u64)> {
        self.entries.iter()
    }

    /// Entries in ascending byte-string order. Tree building and the header both rely on this
    /// order being the same on both sides of the stream.
    pub fn sorted(&self) -> Vec<(&[u8], u64)> {
        let mut list: Vec<(&[u8], u64)> = self
            .entries
            .iter()
            .map(|(k, &v)| (k.as_slice(), v))
            .collect();
        list.sort_unstable_by(|a, b| a.0.cmp(b.0));
        list
    }
}
