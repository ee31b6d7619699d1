//! # Bitmap Compression
//!
//! `bitmap_compression` is a safe, pure-Rust codec for the fixed-size word
//! bitmaps a database engine keeps for sets of integers. Bitmaps are stored as a
//! 16-bit header followed by either run-length coded 32-bit blocks or, when that
//! would not fit, the raw blocks themselves.
//!
//! ## Format
//!
//! ```text
//! bit 0      compression type (0 = NONE, 1 = DEFAULT)
//! bits 1-3   reserved, zero
//! bits 4-15  block count (0-4095)
//! bits 16..  body
//! ```
//!
//! A DEFAULT body is a sequence of 2-bit flags: `00` an all-zero block, `01` an
//! all-one block, `11` a literal 32-bit block, `10` followed by an 8-bit count
//! `c` repeating the previous block `c + 1` times.
//!
//! ## Example
//!
//! ```rust
//! use bitmap_compression::{CompressionType, compress, decompress};
//!
//! // Sparse bitmap: one set bit, a run of empty words, then a full word.
//! let mut bitmap = vec![0u32; 64];
//! bitmap[0] = 1 << 5;
//! bitmap[63] = u32::MAX;
//!
//! let mut encoded = Vec::new();
//! compress(CompressionType::Default, &bitmap, &mut encoded).expect("compression failed");
//! assert!(encoded.len() < 12);
//!
//! let mut decoded = vec![0u32; 64];
//! let len = decompress(&encoded, &mut decoded).expect("decompression failed");
//! assert_eq!(&decoded[..len], &bitmap[..]);
//! ```

#![no_std]
#![forbid(unsafe_code)]

extern crate alloc;

pub mod bitstream;
pub mod codec;
pub mod compress;
pub mod decompress;
pub mod error;
pub mod header;
pub mod layout;

use alloc::vec::Vec;

pub use codec::BitmapCodec;
pub use compress::max_compressed_len;
pub use decompress::DecompressState;
pub use error::{BitstreamError, CompressionError, DecompressionError};
pub use header::{CompressionType, MAX_BLOCK_COUNT};
pub use layout::{ByteOrder, WordLayout, WordWidth};

/// Encodes plain 32-bit bitmap words and appends the stream to `output`.
///
/// Returns the number of bytes appended. Use [`BitmapCodec`] for 64-bit word
/// layouts or the narrow word hint.
///
/// # Errors
/// Fails if `words` holds more than [`MAX_BLOCK_COUNT`] blocks.
pub fn compress(
    compression_type: CompressionType,
    words: &[u32],
    output: &mut Vec<u8>,
) -> Result<usize, CompressionError> {
    BitmapCodec::new(WordLayout::NARROW).compress(compression_type, words, false, output)
}

/// Decodes a stream of plain 32-bit bitmap words into `output`.
///
/// Returns the number of words written.
///
/// # Errors
/// Fails on a malformed header, a block count larger than `output`, or a
/// corrupt body.
pub fn decompress(input: &[u8], output: &mut [u32]) -> Result<usize, DecompressionError> {
    let mut state = DecompressState::new(input)?;
    BitmapCodec::new(WordLayout::NARROW).decompress(&mut state, false, output)
}
