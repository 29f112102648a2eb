//! The huffman module builds the two-layer tree and the codes used by the encoder and decoder.
//!
//! The upper layer is an ordinary Huffman tree whose leaves are contexts (bytes that start a
//! word), weighted by how many words they started. Each context owns a lower tree over the
//! patterns seen after it. Both layers are built the same way: push every leaf into a min-heap,
//! then merge the two lightest nodes until one is left.
//!
//! Ties are broken by pattern length and then by creation order, and leaves are always pushed in
//! sorted order. This makes the trees a pure function of the frequency tables, which is what
//! lets the decoder rebuild them from the header.
//!

pub mod huffman;
pub mod node;
pub mod priority_queue;
