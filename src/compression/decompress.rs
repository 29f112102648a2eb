use std::io::{BufReader, BufWriter, Read, Write};

use log::{debug, info, trace, warn};

use super::header::read_header;
use crate::bitstream::bitreader::BitReader;
use crate::error::{PahuffError, Result};
use crate::huffman_coding::huffman::Dictionary;
use crate::huffman_coding::node::{ContextNode, Node, NodeData};
use crate::tools::progress::Progress;

/// What a decompression run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DecompressStats {
    pub output_bytes: u64,
    /// The body ran out of bits before the recorded length was reached. Whatever was decoded
    /// up to that point has been written.
    pub truncated: bool,
}

/// Decompress a stream written by compress(). Progress is measured against the length
/// recorded in the header.
pub fn decompress<R: Read, W: Write>(
    input: R,
    output: W,
    progress: &mut Progress<'_>,
) -> Result<DecompressStats> {
    let mut input = BufReader::new(input);

    info!("Stage 1: reading header");
    let mut dict = read_header(&mut input)?;

    info!("Stage 2: rebuilding Huffman trees");
    dict.rebuild();
    progress.set_total(dict.source_len());

    info!("Stage 3: decoding");
    let mut out = BufWriter::new(output);
    let stats = Decoder::new(&dict).decode(&mut BitReader::new(input), &mut out, progress)?;
    out.flush()?;
    progress.finish();

    info!("Decompressed {} bytes", stats.output_bytes);
    Ok(stats)
}

/// Walks the trees bit by bit. Words are read from the super-tree; once a context has been
/// read, the rest of the word (and the separator ending it) comes from that context's
/// sub-tree.
pub struct Decoder<'d> {
    dict: &'d Dictionary,
}

impl<'d> Decoder<'d> {
    pub fn new(dict: &'d Dictionary) -> Self {
        Self { dict }
    }

    /// Decode until the recorded length has been written or the bits run out.
    pub fn decode<R: Read, W: Write>(
        &self,
        reader: &mut BitReader<R>,
        out: &mut W,
        progress: &mut Progress<'_>,
    ) -> Result<DecompressStats> {
        let dict = self.dict;
        let root = dict
            .root()
            .ok_or_else(|| PahuffError::corrupt("no contexts to decode with"))?;
        let target = dict.source_len();
        let mut written = 0_u64;
        let mut current: Option<&ContextNode> = None;

        while written < target {
            let tree = current.and_then(|c| c.sub_tree()).unwrap_or(root);
            let leaf = match walk(tree, reader)? {
                Some(leaf) => leaf,
                None => {
                    warn!(
                        "Compressed data ended early at {}: {} of {} bytes recovered",
                        reader.loc(),
                        written,
                        target
                    );
                    return Ok(DecompressStats {
                        output_bytes: written,
                        truncated: true,
                    });
                }
            };

            let emitted: &[u8] = match &leaf.node_data {
                NodeData::Context(symbol) => {
                    current = if dict.separators().is_separator(*symbol) {
                        None
                    } else {
                        dict.context(*symbol)
                    };
                    std::slice::from_ref(symbol)
                }
                NodeData::Pattern(pattern) => {
                    // A one-byte separator pattern closes the word.
                    if pattern.len() == 1 && dict.separators().is_separator(pattern[0]) {
                        current = None;
                    }
                    pattern
                }
                NodeData::Kids(_, _) => unreachable!("walk() stops at leaves"),
            };
            if written + emitted.len() as u64 > target {
                return Err(PahuffError::corrupt("body decodes past the recorded length"));
            }
            trace!("{} {:?}", reader.loc(), String::from_utf8_lossy(emitted));
            out.write_all(emitted)?;
            written += emitted.len() as u64;
            progress.advance(emitted.len() as u64);
        }

        debug!(
            "Read {} body bytes for {} output bytes",
            reader.bytes_consumed(),
            written
        );
        Ok(DecompressStats {
            output_bytes: written,
            truncated: false,
        })
    }
}

/// Follow bits from `tree` down to a leaf. A tree that is a lone leaf consumes no bits.
/// Returns None if the data ends first.
fn walk<'t, R: Read>(tree: &'t Node, reader: &mut BitReader<R>) -> Result<Option<&'t Node>> {
    let mut node = tree;
    while !node.is_leaf() {
        let bit = match reader.bit()? {
            Some(bit) => bit,
            None => return Ok(None),
        };
        node = match node.child(bit) {
            Some(child) => child,
            None => return Err(PahuffError::corrupt("walked off the tree")),
        };
    }
    Ok(Some(node))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::compression::compress::compress;
    use crate::tools::options::{Config, Separators};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::io::Cursor;

    fn squash(data: &[u8], config: &Config) -> Vec<u8> {
        let mut out = vec![];
        compress(
            Cursor::new(data.to_vec()),
            &mut out,
            config,
            &mut Progress::none(),
        )
        .unwrap();
        out
    }

    fn round_trip(data: &[u8], config: &Config) {
        let packed = squash(data, config);
        let mut out = vec![];
        let stats = decompress(packed.as_slice(), &mut out, &mut Progress::none()).unwrap();
        assert!(!stats.truncated);
        assert_eq!(stats.output_bytes as usize, data.len());
        assert_eq!(out, data);
    }

    #[test]
    fn sentence_test() {
        round_trip(b"the cat sat. the dog ran.", &Config::default());
    }

    #[test]
    fn single_byte_test() {
        let packed = squash(b"x", &Config::default());
        // One context with an empty code: nothing but the header.
        let mut out = vec![];
        decompress(packed.as_slice(), &mut out, &mut Progress::none()).unwrap();
        assert_eq!(out, b"x");
    }

    #[test]
    fn separators_only_test() {
        round_trip(b"   ", &Config::default());
        round_trip(b"\n\n.\t", &Config::default());
    }

    #[test]
    fn no_separators_test() {
        round_trip(b"hello", &Config::default());
        round_trip(b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaa", &Config::default());
    }

    #[test]
    fn edges_test() {
        round_trip(b" leading and trailing ", &Config::default());
        round_trip(b"double  spaces..and,,marks!?", &Config::default());
        round_trip(b"a", &Config::default());
        round_trip(b"a.", &Config::default());
        round_trip(b".a", &Config::default());
    }

    #[test]
    fn prose_test() {
        let text = "It was the best of times, it was the worst of times, it was the age of \
                    wisdom, it was the age of foolishness, it was the epoch of belief, it was \
                    the epoch of incredulity, it was the season of Light, it was the season of \
                    Darkness, it was the spring of hope, it was the winter of despair.\n";
        let data = text.repeat(100);
        round_trip(data.as_bytes(), &Config::default());
        // Repetitive prose should shrink.
        assert!(squash(data.as_bytes(), &Config::default()).len() < data.len() * 3 / 4);
    }

    #[test]
    fn random_words_test() {
        let mut rng = StdRng::seed_from_u64(7);
        let alphabet = b"abcdefgh .,\n";
        let data: Vec<u8> = (0..20_000)
            .map(|_| alphabet[rng.random_range(0..alphabet.len())])
            .collect();
        round_trip(&data, &Config::default());
    }

    #[test]
    fn random_binary_test() {
        let mut rng = StdRng::seed_from_u64(42);
        for len in [1, 2, 17, 4096] {
            let data: Vec<u8> = (0..len).map(|_| rng.random::<u8>()).collect();
            round_trip(&data, &Config::default());
        }
    }

    #[test]
    fn small_tables_test() {
        // Tables fill up fast and evict; the encoder has to work with what is left.
        let config = Config {
            max_pattern_length: 3,
            max_pattern_amount: 256,
            separators: Separators::new(b" "),
        };
        let mut rng = StdRng::seed_from_u64(3);
        let mut data = Vec::new();
        for _ in 0..3000 {
            let len = rng.random_range(1..12);
            data.push(b'w');
            data.extend((0..len).map(|_| rng.random_range(b'a'..=b'z')));
            data.push(b' ');
        }
        round_trip(&data, &config);
    }

    #[test]
    fn no_separator_set_test() {
        let config = Config {
            max_pattern_length: 4,
            max_pattern_amount: 300,
            separators: Separators::new(b""),
        };
        round_trip(b"one long word with no breaks at all", &config);
    }

    #[test]
    fn truncated_body_test() {
        let data = b"the cat sat. the dog ran.";
        let packed = squash(data, &Config::default());
        let mut out = vec![];
        let stats = decompress(
            &packed[..packed.len() - 1],
            &mut out,
            &mut Progress::none(),
        )
        .unwrap();
        assert!(stats.truncated);
        assert!(out.len() < data.len());
        assert!(data.starts_with(&out));
        assert_eq!(stats.output_bytes as usize, out.len());
    }

    #[test]
    fn corrupt_header_test() {
        let mut out = vec![];
        let result = decompress(&b"garbage in"[..], &mut out, &mut Progress::none());
        assert!(matches!(result, Err(PahuffError::HeaderCorrupt(_))));
        let result = decompress(&b""[..], &mut out, &mut Progress::none());
        assert!(matches!(result, Err(PahuffError::HeaderCorrupt(_))));
        assert!(out.is_empty());
    }

    #[test]
    fn progress_test() {
        let data = "abc def ghi. ".repeat(4000);
        let packed = squash(data.as_bytes(), &Config::default());
        let mut seen = vec![];
        {
            let mut progress = Progress::new(0, |p| seen.push(p));
            let mut out = vec![];
            decompress(packed.as_slice(), &mut out, &mut progress).unwrap();
        }
        assert!(seen.len() > 3);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*seen.last().unwrap(), 100.0);
    }
}
