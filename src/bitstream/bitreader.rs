//! BitReader: reads the packed body of a compressed stream one bit at a time.
//!
//! NOTE: This module can read from any I/O source that supports the read() call. Wrap unbuffered
//! sources (files, sockets) in a BufReader, since bytes are pulled one at a time.
//!

use std::io::{self, ErrorKind, Read};

/// Reads a bitstream most significant bit first.
#[derive(Debug)]
pub struct BitReader<R> {
    /// Last byte pulled from the source.
    current: u8,
    /// Bits of `current` not yet handed out.
    remaining: u8,
    /// Count of bytes pulled from the source.
    consumed: u64,
    source: R,
}

impl<R: Read> BitReader<R> {
    pub fn new(source: R) -> Self {
        Self {
            current: 0,
            remaining: 0,
            consumed: 0,
            source,
        }
    }

    /// Pull the next byte from the source. Returns false if there is no more data.
    fn have_data(&mut self) -> io::Result<bool> {
        let mut byte = [0_u8; 1];
        loop {
            match self.source.read(&mut byte) {
                Ok(0) => return Ok(false),
                Ok(_) => {
                    self.current = byte[0];
                    self.remaining = 8;
                    self.consumed += 1;
                    return Ok(true);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Return the next bit (1 or 0), or None if there is no more data to read.
    pub fn bit(&mut self) -> io::Result<Option<u8>> {
        if self.remaining == 0 && !self.have_data()? {
            return Ok(None);
        }
        self.remaining -= 1;
        Ok(Some((self.current >> self.remaining) & 1))
    }

    /// Return Some(true) if the next bit is 1, Some(false) if 0, or None at the end of the data.
    pub fn bool_bit(&mut self) -> io::Result<Option<bool>> {
        Ok(self.bit()?.map(|bit| bit == 1))
    }

    /// Bytes pulled from the source so far.
    pub fn bytes_consumed(&self) -> u64 {
        self.consumed
    }

    /// Debugging function. Report current position as [byte.bit].
    pub fn loc(&self) -> String {
        format!("[{}.{}]", self.consumed, (8 - self.remaining) % 8)
    }
}
