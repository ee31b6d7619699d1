use alloc::vec::Vec;

use crate::compress::{compress_into, max_compressed_len};
use crate::decompress::DecompressState;
use crate::error::{CompressionError, DecompressionError};
use crate::header::{CompressionType, MAX_BLOCK_COUNT};
use crate::layout::WordLayout;

/// Bitmap encoder/decoder bound to one [`WordLayout`].
///
/// Build one per process (usually with [`BitmapCodec::native`]) and share it;
/// it holds no state between calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BitmapCodec {
    layout: WordLayout,
}

impl BitmapCodec {
    #[must_use]
    pub const fn new(layout: WordLayout) -> Self {
        Self { layout }
    }

    /// Codec for bitmaps laid out in this host's native word width and order.
    #[must_use]
    pub const fn native() -> Self {
        Self::new(WordLayout::native())
    }

    #[must_use]
    pub const fn layout(&self) -> WordLayout {
        self.layout
    }

    /// Encodes `words` into the caller's buffer and returns the bytes used.
    ///
    /// `output` must be at least [`max_compressed_len`] of the on-disk block
    /// count. A DEFAULT body that would not fit is stored as NONE instead.
    ///
    /// # Errors
    /// Fails on a block count over the header limit, an undersized buffer, an
    /// odd number of halves under a wide layout, or a non-zero high half with
    /// `narrow_hint` set.
    pub fn compress_into(
        &self,
        compression_type: CompressionType,
        words: &[u32],
        narrow_hint: bool,
        output: &mut [u8],
    ) -> Result<usize, CompressionError> {
        compress_into(&self.layout, compression_type, words, narrow_hint, output)
    }

    /// Encodes `words` and appends the stream to `output`.
    ///
    /// # Errors
    /// See [`BitmapCodec::compress_into`]. On error `output` is left as it was.
    pub fn compress(
        &self,
        compression_type: CompressionType,
        words: &[u32],
        narrow_hint: bool,
        output: &mut Vec<u8>,
    ) -> Result<usize, CompressionError> {
        let blocks = self.layout.disk_block_count(words.len(), narrow_hint)?;
        if blocks > MAX_BLOCK_COUNT {
            return Err(CompressionError::TooManyBlocks(blocks));
        }
        let start = output.len();
        output.resize(start + max_compressed_len(blocks), 0);

        match self.compress_into(compression_type, words, narrow_hint, &mut output[start..]) {
            Ok(len) => {
                output.truncate(start + len);
                Ok(len)
            }
            Err(err) => {
                output.truncate(start);
                Err(err)
            }
        }
    }

    /// Decodes a parsed stream into `output` and returns the number of 32-bit
    /// halves written. `narrow_hint` must match the value used to encode.
    ///
    /// # Errors
    /// Fails if the block count exceeds `output`, or on any sign of a corrupt
    /// body (truncation, a leading repeat marker, an unfinished repeat run), or
    /// if `state` was already decoded. A truncated body stays visible through
    /// [`DecompressState::has_error`].
    pub fn decompress(
        &self,
        state: &mut DecompressState<'_>,
        narrow_hint: bool,
        output: &mut [u32],
    ) -> Result<usize, DecompressionError> {
        state.decompress(&self.layout, narrow_hint, output)
    }

    /// Decodes `input` and appends the bitmap to `output`.
    ///
    /// # Errors
    /// See [`BitmapCodec::decompress`]. On error `output` is left as it was.
    pub fn decompress_to_vec(
        &self,
        input: &[u8],
        narrow_hint: bool,
        output: &mut Vec<u32>,
    ) -> Result<usize, DecompressionError> {
        let mut state = DecompressState::new(input)?;
        let len = self.layout.memory_len(state.block_count(), narrow_hint)?;
        let start = output.len();
        output.resize(start + len, 0);

        match self.decompress(&mut state, narrow_hint, &mut output[start..]) {
            Ok(written) => Ok(written),
            Err(err) => {
                output.truncate(start);
                Err(err)
            }
        }
    }
}
