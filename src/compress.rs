use crate::bitstream::BitWriter;
use crate::error::{BitstreamError, CompressionError};
use crate::header::{CompressionType, HEADER_BITS, HEADER_BYTES, Header, MAX_BLOCK_COUNT};
use crate::layout::{DiskWords, WordLayout};

type Result<T> = core::result::Result<T, CompressionError>;
type BitResult<T> = core::result::Result<T, BitstreamError>;

/// Width of a block flag.
pub(crate) const FLAG_BITS: u32 = 2;

/// Width of a literal block following a RAW flag.
pub(crate) const WORD_BITS: u32 = 32;

/// Width of the count field following an RLE flag.
pub(crate) const REPEAT_COUNT_BITS: u32 = 8;

/// Bytes per block in the uncompressed body.
const WORD_BYTES: usize = 4;

/// Most repeats one RLE marker can carry (count field stores `repeats - 1`).
const MAX_PENDING_REPEATS: u16 = 1 << REPEAT_COUNT_BITS;

/// Up to this many repeats of a ZERO/ONE block are cheaper re-emitted as
/// 2-bit flags than as a 10-bit RLE marker.
const LITERAL_REPEAT_LIMIT: u16 = 4;

/// Two-bit code prefixed to every coded block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub(crate) enum Flag {
    Zero = 0b00,
    One = 0b01,
    Rle = 0b10,
    Raw = 0b11,
}

impl Flag {
    /// Head code for a block. Never yields [`Flag::Rle`].
    #[inline]
    const fn classify(word: u32) -> Self {
        match word {
            0 => Self::Zero,
            u32::MAX => Self::One,
            _ => Self::Raw,
        }
    }

    #[inline]
    pub(crate) const fn from_bits(bits: u32) -> Self {
        match bits & 0b11 {
            0b00 => Self::Zero,
            0b01 => Self::One,
            0b10 => Self::Rle,
            _ => Self::Raw,
        }
    }
}

/// Guaranteed-fit output size for `block_count` blocks: the header plus the
/// uncompressed body.
#[inline]
#[must_use]
pub const fn max_compressed_len(block_count: usize) -> usize {
    HEADER_BYTES + block_count * WORD_BYTES
}

/// Run-length state folded over the block sequence.
///
/// Each distinct block is emitted immediately as a head code; following
/// identical blocks only bump `pending` until the run breaks or the count field
/// would overflow, at which point [`BlockEncoder::flush`] writes the tail.
#[derive(Debug, Clone, Copy)]
struct BlockEncoder {
    last_word: u32,
    last_flag: Flag,
    pending: u16,
    is_first: bool,
}

impl BlockEncoder {
    const fn new() -> Self {
        Self {
            last_word: 0,
            last_flag: Flag::Zero,
            pending: 0,
            is_first: true,
        }
    }

    /// Folds one block into the encoder.
    fn push(mut self, word: u32, writer: &mut BitWriter<'_>) -> BitResult<Self> {
        if !self.is_first && word == self.last_word && self.pending < MAX_PENDING_REPEATS {
            self.pending += 1;
            return Ok(self);
        }

        self = self.flush(writer)?;
        self.is_first = false;

        let flag = Flag::classify(word);
        writer.put(flag as u32, FLAG_BITS)?;
        if flag == Flag::Raw {
            writer.put(word, WORD_BITS)?;
        }

        self.last_word = word;
        self.last_flag = flag;
        Ok(self)
    }

    /// Writes the pending repeat tail, if any.
    fn flush(mut self, writer: &mut BitWriter<'_>) -> BitResult<Self> {
        if self.pending == 0 {
            return Ok(self);
        }

        if self.last_flag == Flag::Raw || self.pending > LITERAL_REPEAT_LIMIT {
            writer.put(Flag::Rle as u32, FLAG_BITS)?;
            writer.put(u32::from(self.pending - 1), REPEAT_COUNT_BITS)?;
        } else {
            for _ in 0..self.pending {
                writer.put(self.last_flag as u32, FLAG_BITS)?;
            }
        }

        self.pending = 0;
        Ok(self)
    }
}

/// Run-length encodes `words` at the writer's cursor.
fn encode_blocks<I>(words: I, writer: &mut BitWriter<'_>) -> BitResult<()>
where
    I: IntoIterator<Item = u32>,
{
    words
        .into_iter()
        .try_fold(BlockEncoder::new(), |encoder, word| encoder.push(word, writer))?
        .flush(writer)?;
    Ok(())
}

/// Writes a DEFAULT stream. An overflow here is recoverable by the caller.
fn write_default(blocks: DiskWords<'_>, output: &mut [u8]) -> BitResult<usize> {
    let mut writer = BitWriter::new(output);
    Header::new(CompressionType::Default, blocks.block_count()).write(&mut writer)?;
    encode_blocks(blocks, &mut writer)?;
    Ok(writer.len())
}

/// Writes a NONE stream: header followed by raw little-endian blocks.
fn write_none(blocks: DiskWords<'_>, output: &mut [u8]) -> Result<usize> {
    let block_count = blocks.block_count();
    let mut writer = BitWriter::new(output);
    Header::new(CompressionType::None, block_count).write(&mut writer)?;

    let body = writer.aligned_data(HEADER_BITS)?;
    for (chunk, word) in body.chunks_exact_mut(WORD_BYTES).zip(blocks) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }

    Ok(max_compressed_len(block_count))
}

/// Encodes `words` into `output`, returning the number of bytes used.
///
/// `output` must hold at least [`max_compressed_len`] bytes for the on-disk
/// block count; it is zero-filled before writing. A DEFAULT request whose body
/// does not fit is transparently re-encoded as NONE, so the returned stream's
/// header reflects the type actually used.
pub(crate) fn compress_into(
    layout: &WordLayout,
    compression_type: CompressionType,
    words: &[u32],
    narrow_hint: bool,
    output: &mut [u8],
) -> Result<usize> {
    let blocks = layout.disk_words(words, narrow_hint)?;
    let block_count = blocks.block_count();

    if block_count > MAX_BLOCK_COUNT {
        return Err(CompressionError::TooManyBlocks(block_count));
    }

    let required = max_compressed_len(block_count);
    if output.len() < required {
        return Err(CompressionError::InsufficientCapacity {
            capacity: output.len(),
            required,
        });
    }

    output.fill(0);

    match compression_type {
        CompressionType::None => write_none(blocks, output),
        CompressionType::Default => match write_default(blocks.clone(), output) {
            Ok(len) => {
                tracing::trace!(block_count, len, "bitmap run-length encoded");
                Ok(len)
            }
            Err(BitstreamError::Overflow) => {
                tracing::debug!(
                    block_count,
                    capacity = output.len(),
                    "run-length body does not fit, storing bitmap uncompressed"
                );
                output.fill(0);
                write_none(blocks, output)
            }
            Err(err) => Err(err.into()),
        },
    }
}
