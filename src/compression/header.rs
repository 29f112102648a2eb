//! Header codec. The header carries the frequency tables the trees are built from, the
//! separator set, and the length of the original data.
//!
//! Layout (integers marked varint are unsigned LEB128):
//!
//! ```text
//! "PAH"           magic
//! u8              format version
//! varint          source length in bytes
//! varint          max pattern length used while mining
//! varint n, n*u8  separators
//! varint          context count
//! per context, ascending byte:
//!     u8          context byte
//!     varint      frequency
//!     varint      pattern count
//!     per pattern, ascending byte string:
//!         varint  length
//!         bytes   pattern
//!         varint  frequency
//! ```
//!
//! Contexts and patterns are written in sorted order, so a reader can reject duplicates by
//! checking that every key is strictly greater than the one before it.

use std::io::{self, ErrorKind, Read, Write};

use log::{debug, info};
use rustc_hash::FxHashMap;

use crate::error::{PahuffError, Result};
use crate::huffman_coding::huffman::{ContextMap, Dictionary};
use crate::huffman_coding::node::ContextNode;
use crate::tools::options::Separators;
use crate::tools::pattern_table::PatternTable;

pub const MAGIC: &[u8; 3] = b"PAH";
pub const FORMAT_VERSION: u8 = 1;
/// Longest legal varint for a u64.
const MAX_VARINT_LEN: usize = 10;

/// Append a u64 as LEB128.
pub fn put_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7f) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// Read one byte, turning a short read into a header error.
fn get_u8<R: Read>(reader: &mut R) -> Result<u8> {
    let mut byte = [0_u8; 1];
    read_exact(reader, &mut byte)?;
    Ok(byte[0])
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        ErrorKind::UnexpectedEof => PahuffError::corrupt("header ends early"),
        _ => PahuffError::Io(e),
    })
}

/// Read a LEB128 u64.
pub fn get_varint<R: Read>(reader: &mut R) -> Result<u64> {
    let mut result = 0_u64;
    for i in 0..MAX_VARINT_LEN {
        let byte = get_u8(reader)?;
        let shift = 7 * i as u32;
        let bits = (byte & 0x7f) as u64;
        if shift == 63 && bits > 1 {
            return Err(PahuffError::corrupt("varint overflows u64"));
        }
        result |= bits << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
    }
    Err(PahuffError::corrupt("varint too long"))
}

fn checked_total(total: u64, count: u64) -> Result<u64> {
    total
        .checked_add(count)
        .ok_or_else(|| PahuffError::corrupt("frequency total overflows"))
}

/// Serialize the dictionary's tables. Returns the header size in bytes.
pub fn write_header<W: Write>(writer: &mut W, dict: &Dictionary) -> io::Result<u64> {
    let mut buf: Vec<u8> = Vec::with_capacity(4096);
    buf.extend_from_slice(MAGIC);
    buf.push(FORMAT_VERSION);
    put_varint(&mut buf, dict.source_len());
    put_varint(&mut buf, dict.max_pattern_length() as u64);

    let seps = dict.separators().bytes();
    put_varint(&mut buf, seps.len() as u64);
    buf.extend_from_slice(&seps);

    let contexts = dict.sorted_contexts();
    put_varint(&mut buf, contexts.len() as u64);
    for ctx in contexts {
        buf.push(ctx.symbol);
        put_varint(&mut buf, ctx.frequency);
        let patterns = ctx.patterns.sorted();
        put_varint(&mut buf, patterns.len() as u64);
        for (pattern, count) in patterns {
            put_varint(&mut buf, pattern.len() as u64);
            buf.extend_from_slice(pattern);
            put_varint(&mut buf, count);
        }
    }

    writer.write_all(&buf)?;
    debug!("Header is {} bytes", buf.len());
    Ok(buf.len() as u64)
}

/// Parse a header back into an unbuilt dictionary.
pub fn read_header<R: Read>(reader: &mut R) -> Result<Dictionary> {
    let mut magic = [0_u8; 3];
    read_exact(reader, &mut magic)?;
    if &magic != MAGIC {
        return Err(PahuffError::corrupt("not a pahuff stream (bad magic)"));
    }
    let version = get_u8(reader)?;
    if version != FORMAT_VERSION {
        return Err(PahuffError::corrupt(format!(
            "unsupported format version {}",
            version
        )));
    }

    let source_len = get_varint(reader)?;
    if source_len == 0 {
        return Err(PahuffError::corrupt("source length is zero"));
    }
    let max_len = get_varint(reader)?;
    if !(1..=255).contains(&max_len) {
        return Err(PahuffError::corrupt(format!(
            "max pattern length {} out of range",
            max_len
        )));
    }
    let max_len = max_len as usize;

    let sep_count = get_varint(reader)?;
    if sep_count > 256 {
        return Err(PahuffError::corrupt("too many separators"));
    }
    let mut seps = vec![0_u8; sep_count as usize];
    read_exact(reader, &mut seps)?;

    let ctx_count = get_varint(reader)?;
    if !(1..=256).contains(&ctx_count) {
        return Err(PahuffError::corrupt(format!(
            "context count {} out of range",
            ctx_count
        )));
    }

    let mut contexts = ContextMap::default();
    let mut last_symbol: Option<u8> = None;
    // Tree weights are sums of these counts and must stay within a u64.
    let mut context_total = 0_u64;
    for _ in 0..ctx_count {
        let symbol = get_u8(reader)?;
        if last_symbol.map_or(false, |last| symbol <= last) {
            return Err(PahuffError::corrupt("contexts out of order"));
        }
        last_symbol = Some(symbol);

        let frequency = get_varint(reader)?;
        if frequency == 0 {
            return Err(PahuffError::corrupt("context with zero frequency"));
        }
        context_total = checked_total(context_total, frequency)?;

        let pattern_count = get_varint(reader)?;
        let mut entries: FxHashMap<Vec<u8>, u64> = FxHashMap::default();
        let mut last_pattern: Vec<u8> = Vec::new();
        let mut pattern_total = 0_u64;
        for _ in 0..pattern_count {
            let len = get_varint(reader)?;
            if len == 0 || len > max_len as u64 {
                return Err(PahuffError::corrupt(format!(
                    "pattern length {} out of range",
                    len
                )));
            }
            let mut pattern = vec![0_u8; len as usize];
            read_exact(reader, &mut pattern)?;
            if !entries.is_empty() && pattern <= last_pattern {
                return Err(PahuffError::corrupt("patterns out of order"));
            }
            let count = get_varint(reader)?;
            if count == 0 {
                return Err(PahuffError::corrupt("pattern with zero frequency"));
            }
            pattern_total = checked_total(pattern_total, count)?;
            last_pattern.clone_from(&pattern);
            entries.insert(pattern, count);
        }

        contexts.insert(
            symbol,
            ContextNode::with_table(
                symbol,
                frequency,
                PatternTable::from_entries(entries, max_len),
            ),
        );
    }

    info!(
        "Header read: {} contexts, {} source bytes",
        contexts.len(),
        source_len
    );
    Ok(Dictionary::new(
        contexts,
        Separators::new(&seps),
        source_len,
        max_len,
    ))
}
