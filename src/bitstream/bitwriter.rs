use std::io::{self, Write};

/// Writes a bitstream for output. Bits are packed most significant first, and whole bytes are
/// passed to the sink as soon as they are complete.
#[derive(Debug)]
pub struct BitWriter<W: Write> {
    /// Handle to the output stream.
    writer: W,
    /// Private queue holding bits that are waiting to be put out as a byte.
    queue: u8,
    /// Count of valid bits in the queue (0-7 between writes).
    q_bits: u8,
    /// Count of bytes handed to the sink so far.
    written: u64,
}

impl<W: Write> BitWriter<W> {
    /// Create a new BitWriter on top of any sink.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            queue: 0,
            q_bits: 0,
            written: 0,
        }
    }

    /// Put a single bit on the stream. Only the lowest bit of `bit` is used.
    pub fn write_bit(&mut self, bit: u8) -> io::Result<()> {
        self.queue = (self.queue << 1) | (bit & 1);
        self.q_bits += 1;
        if self.q_bits == 8 {
            self.push_queue()?;
        }
        Ok(())
    }

    /// Put a code held as a string of '0' and '1' characters on the stream, left to right.
    /// Any character other than '1' is written as a zero bit.
    pub fn write_bits(&mut self, code: &str) -> io::Result<()> {
        for c in code.bytes() {
            self.write_bit((c == b'1') as u8)?;
        }
        Ok(())
    }

    /// Internal write of a full queue to the sink.
    fn push_queue(&mut self) -> io::Result<()> {
        self.writer.write_all(&[self.queue])?;
        self.written += 1;
        self.queue = 0;
        self.q_bits = 0;
        Ok(())
    }

    /// Flushes the remaining bits (1-7) from the queue, padding with 0s in the least
    /// significant bits, then flushes the sink. Flush MUST be called before the output is
    /// used or the last partial byte will be lost.
    pub fn flush(&mut self) -> io::Result<()> {
        if self.q_bits > 0 {
            self.queue <<= 8 - self.q_bits;
            self.push_queue()?;
        }
        self.writer.flush()
    }

    /// Flush and hand back the sink.
    pub fn finish(mut self) -> io::Result<W> {
        self.flush()?;
        Ok(self.writer)
    }

    /// Bytes handed to the sink so far (not counting bits still queued).
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Bits waiting in the queue.
    pub fn pending_bits(&self) -> u8 {
        self.q_bits
    }
}
