use std::io::{BufWriter, ErrorKind, Read, Seek, SeekFrom, Write};

use log::{debug, info, trace, warn};

use super::header::write_header;
use crate::bitstream::bitwriter::BitWriter;
use crate::error::{PahuffError, Result};
use crate::huffman_coding::huffman::Dictionary;
use crate::huffman_coding::node::ContextNode;
use crate::tools::freq_count::mine;
use crate::tools::options::Config;
use crate::tools::progress::Progress;

/// Size of the read buffer used while encoding.
const READ_CHUNK: usize = 64 * 1024;

/// What a compression run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompressStats {
    pub input_bytes: u64,
    pub header_bytes: u64,
    /// Header plus body.
    pub output_bytes: u64,
    pub contexts: usize,
    pub patterns: usize,
    /// Bytes the greedy matcher could not find any code for. Always 0 with a dictionary mined
    /// from the same input.
    pub skipped_bytes: u64,
}

/// Compress `input` into `output`: mine, build the trees, write the header, then encode the
/// body. The input is read twice, so it must be seekable. Its length is used as the size hint
/// for progress: mining reports 0-50%, encoding 50-100%.
pub fn compress<R: Read + Seek, W: Write>(
    mut input: R,
    output: W,
    config: &Config,
    progress: &mut Progress<'_>,
) -> Result<CompressStats> {
    let size = input.seek(SeekFrom::End(0))?;
    input.seek(SeekFrom::Start(0))?;
    progress.set_total(size * 2);

    info!("Stage 1: analyzing {} bytes", size);
    let mut dict = mine(&mut input, config, progress)?;

    info!("Stage 2: building Huffman trees");
    dict.build();

    info!("Stage 3: encoding");
    input.seek(SeekFrom::Start(0))?;
    let stats = compress_with_dictionary(&dict, input, output, progress)?;
    progress.finish();
    Ok(stats)
}

/// Encode `input` with a dictionary built earlier. The dictionary must have been mined from
/// this same input, since the header records its tables and length.
pub fn compress_with_dictionary<R: Read, W: Write>(
    dict: &Dictionary,
    input: R,
    mut output: W,
    progress: &mut Progress<'_>,
) -> Result<CompressStats> {
    let header_bytes = write_header(&mut output, dict)?;

    let mut bw = BitWriter::new(BufWriter::new(output));
    let mut encoder = Encoder::new(dict);
    let input_bytes = encoder.encode(input, &mut bw, progress)?;
    bw.flush()?;

    if input_bytes != dict.source_len() {
        return Err(PahuffError::LengthMismatch {
            expected: dict.source_len(),
            actual: input_bytes,
        });
    }

    let stats = CompressStats {
        input_bytes,
        header_bytes,
        output_bytes: header_bytes + bw.bytes_written(),
        contexts: dict.contexts().len(),
        patterns: dict.pattern_count(),
        skipped_bytes: encoder.skipped,
    };
    info!(
        "Compressed {} bytes into {} ({} header, {} body)",
        stats.input_bytes,
        stats.output_bytes,
        stats.header_bytes,
        bw.bytes_written()
    );
    Ok(stats)
}

/// Writes the body of a compressed stream: each word as its context code followed by pattern
/// codes from that context, each separator as a code from the preceding word's context when
/// possible.
pub struct Encoder<'d> {
    dict: &'d Dictionary,
    /// Bytes dropped by the greedy matcher.
    skipped: u64,
}

impl<'d> Encoder<'d> {
    pub fn new(dict: &'d Dictionary) -> Self {
        Self { dict, skipped: 0 }
    }

    /// Encode the whole stream. Returns the number of bytes read.
    pub fn encode<R: Read, W: Write>(
        &mut self,
        mut input: R,
        bw: &mut BitWriter<W>,
        progress: &mut Progress<'_>,
    ) -> Result<u64> {
        let dict = self.dict;
        let separators = dict.separators();
        let mut word: Vec<u8> = Vec::with_capacity(64);
        let mut buf = vec![0_u8; READ_CHUNK];
        let mut total = 0_u64;

        loop {
            let n = match input.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            for &byte in &buf[..n] {
                if separators.is_separator(byte) {
                    let previous = if word.is_empty() {
                        None
                    } else {
                        let ctx = self.encode_word(&word, bw)?;
                        word.clear();
                        Some(ctx)
                    };
                    self.encode_separator(byte, previous, bw)?;
                } else {
                    word.push(byte);
                }
            }
            total += n as u64;
            progress.advance(n as u64);
        }
        if !word.is_empty() {
            self.encode_word(&word, bw)?;
        }

        if self.skipped > 0 {
            warn!("{} bytes had no code and were skipped", self.skipped);
        }
        debug!("Encoded {} bytes", total);
        Ok(total)
    }

    /// Write a word's context code, then its remaining bytes as patterns. Returns the context.
    fn encode_word<W: Write>(
        &mut self,
        word: &[u8],
        bw: &mut BitWriter<W>,
    ) -> Result<&'d ContextNode> {
        let dict = self.dict;
        let ctx = dict
            .context(word[0])
            .ok_or(PahuffError::DictionaryMismatch { byte: word[0] })?;
        let code = ctx
            .code
            .as_deref()
            .ok_or(PahuffError::DictionaryMismatch { byte: word[0] })?;
        bw.write_bits(code)?;
        if word.len() > 1 {
            self.greedy_match(ctx, &word[1..], bw)?;
        }
        Ok(ctx)
    }

    /// Encode a separator. A preceding word's context is used when it has a code for the
    /// separator; a context without a sub-tree falls back to the separator's own context,
    /// which is what the decoder reads next in that case.
    fn encode_separator<W: Write>(
        &self,
        sep: u8,
        previous: Option<&ContextNode>,
        bw: &mut BitWriter<W>,
    ) -> Result<()> {
        if let Some(ctx) = previous {
            if let Some(code) = ctx.sub_code(&[sep]) {
                return Ok(bw.write_bits(code)?);
            }
            if ctx.sub_tree().is_some() {
                // The decoder will be reading this context's tree, so the global code
                // would be misread.
                return Err(PahuffError::DictionaryMismatch { byte: sep });
            }
        }
        let code = self
            .dict
            .context(sep)
            .and_then(|c| c.code.as_deref())
            .ok_or(PahuffError::DictionaryMismatch { byte: sep })?;
        Ok(bw.write_bits(code)?)
    }

    /// Greedy longest-match over the context's patterns. At each position try the longest
    /// candidate first, down to a single byte.
    fn greedy_match<W: Write>(
        &mut self,
        ctx: &ContextNode,
        rest: &[u8],
        bw: &mut BitWriter<W>,
    ) -> Result<()> {
        let max_len = self.dict.max_pattern_length();
        let mut start = 0;
        'outer: while start < rest.len() {
            let longest = rest.len().min(start + max_len);
            for end in (start + 1..=longest).rev() {
                if let Some(code) = ctx.sub_code(&rest[start..end]) {
                    trace!(
                        "{:?} -> {}",
                        String::from_utf8_lossy(&rest[start..end]),
                        code
                    );
                    bw.write_bits(code)?;
                    start = end;
                    continue 'outer;
                }
            }
            // Only reachable with a dictionary built from other data.
            self.skipped += 1;
            start += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::compression::header::read_header;
    use std::io::Cursor;

    fn built(text: &str) -> Dictionary {
        let mut dict = mine(text.as_bytes(), &Config::default(), &mut Progress::none()).unwrap();
        dict.build();
        dict
    }

    /// Encode a body only and return its bits as a '0'/'1' string.
    fn body_bits(dict: &Dictionary, text: &str) -> String {
        let mut bw = BitWriter::new(Vec::new());
        Encoder::new(dict)
            .encode(text.as_bytes(), &mut bw, &mut Progress::none())
            .unwrap();
        let pending = bw.pending_bits() as usize;
        let written = bw.bytes_written() as usize;
        let bytes = bw.finish().unwrap();
        let mut bits: String = bytes.iter().map(|b| format!("{:08b}", b)).collect();
        bits.truncate(written * 8 + pending);
        bits
    }

    #[test]
    fn greedy_prefers_longest_test() {
        let text = "xhello xhello xhell";
        let dict = built(text);
        let x = dict.context(b'x').unwrap();
        let expected = format!(
            "{}{}",
            x.code.as_deref().unwrap(),
            x.sub_code(b"hello").unwrap()
        );
        assert_eq!(body_bits(&dict, "xhello"), expected);
    }

    #[test]
    fn separator_uses_word_context_test() {
        let dict = built("ab. ab.");
        let a = dict.context(b'a').unwrap();
        let expected = format!(
            "{}{}{}",
            a.code.as_deref().unwrap(),
            a.sub_code(b"b").unwrap(),
            a.sub_code(b".").unwrap(),
        );
        assert_eq!(body_bits(&dict, "ab."), expected);
    }

    #[test]
    fn leading_separator_uses_global_code_test() {
        let dict = built(" a a");
        let space = dict.context(b' ').unwrap().code.clone().unwrap();
        let a = dict.context(b'a').unwrap().code.clone().unwrap();
        assert_eq!(body_bits(&dict, " a"), format!("{}{}", space, a));
    }

    #[test]
    fn mismatch_test() {
        let dict = built("abc abc");
        let mut bw = BitWriter::new(Vec::new());
        let result = Encoder::new(&dict).encode("zzz".as_bytes(), &mut bw, &mut Progress::none());
        assert!(matches!(
            result,
            Err(PahuffError::DictionaryMismatch { byte: b'z' })
        ));
    }

    #[test]
    fn skipped_bytes_test() {
        // 'q' never follows 'a' in the mined data.
        let dict = built("ab ab");
        let mut out = vec![];
        let stats =
            compress_with_dictionary(&dict, "aq ab".as_bytes(), &mut out, &mut Progress::none())
                .unwrap();
        // Same length as the mined text, so the run itself succeeds and reports the skip.
        assert_eq!(stats.skipped_bytes, 1);
        assert_eq!(stats.input_bytes, 5);
    }

    #[test]
    fn length_mismatch_test() {
        let dict = built("ab ab");
        let mut out = vec![];
        let result =
            compress_with_dictionary(&dict, "ab".as_bytes(), &mut out, &mut Progress::none());
        assert!(matches!(
            result,
            Err(PahuffError::LengthMismatch {
                expected: 5,
                actual: 2
            })
        ));
    }

    #[test]
    fn compress_writes_header_test() {
        let mut out = vec![];
        let stats = compress(
            Cursor::new(b"the cat sat. the dog ran.".to_vec()),
            &mut out,
            &Config::default(),
            &mut Progress::none(),
        )
        .unwrap();
        assert_eq!(stats.input_bytes, 25);
        assert_eq!(stats.output_bytes as usize, out.len());
        assert_eq!(stats.contexts, 7);
        assert_eq!(stats.skipped_bytes, 0);
        let dict = read_header(&mut out.as_slice()).unwrap();
        assert_eq!(dict.source_len(), 25);
    }

    #[test]
    fn empty_input_writes_nothing_test() {
        let mut out = vec![];
        let result = compress(
            Cursor::new(Vec::new()),
            &mut out,
            &Config::default(),
            &mut Progress::none(),
        );
        assert!(matches!(result, Err(PahuffError::EmptyInput)));
        assert!(out.is_empty());
    }

    #[test]
    fn progress_test() {
        let text = "lorem ipsum dolor sit amet. ".repeat(2000);
        let mut seen = vec![];
        {
            let mut progress = Progress::new(0, |p| seen.push(p));
            let mut out = vec![];
            compress(
                Cursor::new(text.into_bytes()),
                &mut out,
                &Config::default(),
                &mut progress,
            )
            .unwrap();
        }
        assert!(seen.len() > 2);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(*seen.last().unwrap(), 100.0);
        // Mining alone never passes the halfway mark.
        assert!(seen[0] <= 50.0);
    }
}
