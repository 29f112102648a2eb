//! The bitstream module forms the I/O subsystem for the pattern-aware Huffman coder.
//!
//! Huffman codes are variable-length bit strings, but files are read and written a byte at a time.
//! BitWriter collects bits into bytes (most significant bit first) and BitReader hands them back
//! one bit at a time in the same order.
//!
//! Both ends are generic over std::io so the engine can run against files, sockets or in-memory
//! buffers. The final byte of a stream is padded with zero bits; the decoder uses the source
//! length recorded in the header to know where the real data ends.
//!
pub mod bitreader;
pub mod bitwriter;
