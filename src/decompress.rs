use crate::bitstream::BitReader;
use crate::compress::{FLAG_BITS, Flag, REPEAT_COUNT_BITS, WORD_BITS};
use crate::error::DecompressionError;
use crate::header::{CompressionType, HEADER_BITS, Header};
use crate::layout::WordLayout;

type Result<T> = core::result::Result<T, DecompressionError>;

/// Bytes per block in the uncompressed body.
const WORD_BYTES: usize = 4;

/// A parsed stream, ready for exactly one decode.
///
/// Created by [`DecompressState::new`], which reads only the header, so the
/// block count and compression type can be inspected (e.g. to size the output)
/// before the body is touched. The state outlives the decode so that
/// [`DecompressState::has_error`] still reports a truncated body afterwards.
pub struct DecompressState<'a> {
    reader: BitReader<'a>,
    header: Header,
    consumed: bool,
}

impl<'a> DecompressState<'a> {
    /// Parses the 16-bit header at the start of `input`.
    pub fn new(input: &'a [u8]) -> Result<Self> {
        let mut reader = BitReader::new(input);
        let header = Header::read(&mut reader).map_err(|_| DecompressionError::UnexpectedEof)?;

        if header.reserved != 0 {
            return Err(DecompressionError::InvalidHeader);
        }

        tracing::trace!(
            compression_type = ?header.compression_type,
            block_count = header.block_count,
            input_len = input.len(),
            "bitmap header decoded"
        );

        Ok(Self {
            reader,
            header,
            consumed: false,
        })
    }

    /// Number of on-disk 32-bit blocks in the stream.
    #[inline]
    pub const fn block_count(&self) -> usize {
        self.header.block_count
    }

    #[inline]
    pub const fn compression_type(&self) -> CompressionType {
        self.header.compression_type
    }

    /// Whether the underlying reader ran out of input, either in the header or
    /// while decoding the body.
    #[inline]
    pub const fn has_error(&self) -> bool {
        self.reader.has_error()
    }

    /// Whether [`DecompressState::decompress`] has already been called.
    #[inline]
    pub const fn is_consumed(&self) -> bool {
        self.consumed
    }

    /// Reader position in bits. Always [`HEADER_BITS`] before decoding.
    #[inline]
    pub const fn bit_offset(&self) -> usize {
        self.reader.offset()
    }

    /// Decodes the body into `output`, which is indexed as the in-memory
    /// 32-bit view described by `layout`. Returns the number of halves written.
    ///
    /// A state decodes once; later calls fail with
    /// [`DecompressionError::AlreadyDecoded`].
    pub(crate) fn decompress(
        &mut self,
        layout: &WordLayout,
        narrow_hint: bool,
        output: &mut [u32],
    ) -> Result<usize> {
        if self.consumed {
            return Err(DecompressionError::AlreadyDecoded);
        }
        self.consumed = true;
        debug_assert_eq!(self.reader.offset(), HEADER_BITS);

        let block_count = self.header.block_count;
        let len = layout.memory_len(block_count, narrow_hint)?;
        if len > output.len() {
            return Err(DecompressionError::BlockCountExceedsCapacity {
                block_count,
                capacity: output.len(),
            });
        }

        // Halves omitted under the narrow hint are implied zero.
        let output = &mut output[..len];
        output.fill(0);
        let sink = |block: usize, word: u32| {
            output[layout.memory_index(block, narrow_hint)] = word;
        };

        match self.header.compression_type {
            CompressionType::None => decompress_none(&mut self.reader, block_count, sink)?,
            CompressionType::Default => decompress_default(&mut self.reader, block_count, sink)?,
        }

        Ok(len)
    }
}

/// Decoder position between blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    /// Next block starts with a flag.
    ReadingFlag,
    /// Replaying the last block `remaining` more times.
    InRun { remaining: u32 },
}

#[inline]
fn read(reader: &mut BitReader<'_>, bits: u32) -> Result<u32> {
    reader.get(bits).map_err(|_| DecompressionError::InputTooShort)
}

/// Replays the ZERO/ONE/RAW/RLE block codes.
fn decompress_default<F>(reader: &mut BitReader<'_>, block_count: usize, mut sink: F) -> Result<()>
where
    F: FnMut(usize, u32),
{
    let mut state = DecodeState::ReadingFlag;
    let mut last_word = 0u32;

    for block in 0..block_count {
        let word = match state {
            DecodeState::ReadingFlag => match Flag::from_bits(read(reader, FLAG_BITS)?) {
                Flag::Zero => 0,
                Flag::One => u32::MAX,
                Flag::Raw => read(reader, WORD_BITS)?,
                Flag::Rle => {
                    if block == 0 {
                        tracing::warn!("bitmap stream opens with a repeat marker");
                        return Err(DecompressionError::RepeatWithoutPrevious);
                    }
                    let count = read(reader, REPEAT_COUNT_BITS)?;
                    if count > 0 {
                        state = DecodeState::InRun { remaining: count };
                    }
                    last_word
                }
            },
            DecodeState::InRun { remaining } => {
                state = if remaining > 1 {
                    DecodeState::InRun {
                        remaining: remaining - 1,
                    }
                } else {
                    DecodeState::ReadingFlag
                };
                last_word
            }
        };

        sink(block, word);
        last_word = word;
    }

    if let DecodeState::InRun { remaining } = state {
        tracing::warn!(block_count, remaining, "bitmap stream ends inside a repeat run");
        return Err(DecompressionError::TrailingRepeat { remaining });
    }

    Ok(())
}

/// Copies raw little-endian blocks from the byte-aligned body.
fn decompress_none<F>(reader: &mut BitReader<'_>, block_count: usize, mut sink: F) -> Result<()>
where
    F: FnMut(usize, u32),
{
    let body = reader
        .aligned_data(HEADER_BITS)
        .map_err(|_| DecompressionError::InputTooShort)?;

    // Advance past the body so a short input is recorded on the reader.
    let body_bits = block_count * WORD_BYTES * 8;
    reader
        .skip(body_bits as u32)
        .map_err(|_| DecompressionError::InputTooShort)?;

    for (block, chunk) in body.chunks_exact(WORD_BYTES).take(block_count).enumerate() {
        sink(block, u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitstream::BitWriter;
    use alloc::vec;
    use alloc::vec::Vec;

    /// Builds a DEFAULT stream from raw `(value, bits)` fields after the header.
    fn stream(block_count: usize, fields: &[(u32, u32)]) -> Vec<u8> {
        let mut buf = vec![0u8; 64];
        let mut writer = BitWriter::new(&mut buf);
        Header::new(CompressionType::Default, block_count)
            .write(&mut writer)
            .unwrap();
        for &(value, bits) in fields {
            writer.put(value, bits).unwrap();
        }
        let len = writer.len();
        buf.truncate(len);
        buf
    }

    fn decode(input: &[u8], capacity: usize) -> Result<Vec<u32>> {
        let mut state = DecompressState::new(input)?;
        let mut out = vec![0xDEAD_BEEF; capacity];
        let len = state.decompress(&WordLayout::NARROW, false, &mut out)?;
        out.truncate(len);
        Ok(out)
    }

    #[test]
    fn test_flags_decode() {
        let input = stream(4, &[(0b00, 2), (0b01, 2), (0b11, 2), (42, 32), (0b00, 2)]);
        assert_eq!(decode(&input, 4), Ok(vec![0, u32::MAX, 42, 0]));
    }

    #[test]
    fn test_marker_covers_count_plus_one() {
        let input = stream(5, &[(0b11, 2), (7, 32), (0b10, 2), (3, 8)]);
        assert_eq!(decode(&input, 5), Ok(vec![7; 5]));
    }

    #[test]
    fn test_zero_count_marker_repeats_once() {
        let input = stream(3, &[(0b01, 2), (0b10, 2), (0, 8), (0b00, 2)]);
        assert_eq!(decode(&input, 3), Ok(vec![u32::MAX, u32::MAX, 0]));
    }

    #[test]
    fn test_marker_without_previous_block() {
        let input = stream(2, &[(0b10, 2), (1, 8)]);
        assert_eq!(
            decode(&input, 2),
            Err(DecompressionError::RepeatWithoutPrevious)
        );
    }

    #[test]
    fn test_trailing_repeat_rejected() {
        // Marker promises 4 copies but the header stops after 2 of them.
        let input = stream(3, &[(0b00, 2), (0b10, 2), (3, 8)]);
        assert_eq!(
            decode(&input, 3),
            Err(DecompressionError::TrailingRepeat { remaining: 2 })
        );
    }

    #[test]
    fn test_truncated_body() {
        let input = stream(3, &[(0b11, 2), (1, 32), (0b11, 2)]);
        assert_eq!(decode(&input, 3), Err(DecompressionError::InputTooShort));
    }

    #[test]
    fn test_capacity_checked_before_decoding() {
        let input = stream(3, &[]);
        assert_eq!(
            decode(&input, 2),
            Err(DecompressionError::BlockCountExceedsCapacity {
                block_count: 3,
                capacity: 2
            })
        );
    }

    #[test]
    fn test_reserved_bits_rejected() {
        assert_eq!(
            DecompressState::new(&[0b0100_0000, 0x00]).err(),
            Some(DecompressionError::InvalidHeader)
        );
    }

    #[test]
    fn test_header_too_short() {
        assert_eq!(
            DecompressState::new(&[0x80]).err(),
            Some(DecompressionError::UnexpectedEof)
        );
    }

    #[test]
    fn test_state_accessors() {
        let input = stream(12, &[]);
        let state = DecompressState::new(&input).unwrap();
        assert_eq!(state.block_count(), 12);
        assert_eq!(state.compression_type(), CompressionType::Default);
        assert_eq!(state.bit_offset(), HEADER_BITS);
        assert!(!state.has_error());
    }

    #[test]
    fn test_none_body_short() {
        let input = [0x00, 0x02, 1, 0, 0, 0, 2, 0];
        assert_eq!(decode(&input, 2), Err(DecompressionError::InputTooShort));
    }

    #[test]
    fn test_truncated_body_sets_error_flag() {
        let input = stream(2, &[(0b11, 2), (0x1234_5678, 32), (0b11, 2)]);
        let mut state = DecompressState::new(&input).unwrap();
        assert!(!state.has_error());

        let mut out = [0u32; 2];
        assert_eq!(
            state.decompress(&WordLayout::NARROW, false, &mut out),
            Err(DecompressionError::InputTooShort)
        );
        assert!(state.has_error());
    }

    #[test]
    fn test_short_none_body_sets_error_flag() {
        let input = [0x00, 0x02, 1, 0, 0, 0, 2, 0];
        let mut state = DecompressState::new(&input).unwrap();
        let mut out = [0u32; 2];
        assert_eq!(
            state.decompress(&WordLayout::NARROW, false, &mut out),
            Err(DecompressionError::InputTooShort)
        );
        assert!(state.has_error());
    }

    #[test]
    fn test_clean_decode_leaves_error_flag_clear() {
        let input = stream(2, &[(0b01, 2), (0b00, 2)]);
        let mut state = DecompressState::new(&input).unwrap();
        let mut out = [0u32; 2];
        assert_eq!(state.decompress(&WordLayout::NARROW, false, &mut out), Ok(2));
        assert!(!state.has_error());
        assert!(state.is_consumed());
    }

    #[test]
    fn test_second_decode_rejected() {
        let input = stream(1, &[(0b01, 2)]);
        let mut state = DecompressState::new(&input).unwrap();
        let mut out = [0u32; 1];
        state.decompress(&WordLayout::NARROW, false, &mut out).unwrap();
        assert_eq!(
            state.decompress(&WordLayout::NARROW, false, &mut out),
            Err(DecompressionError::AlreadyDecoded)
        );
    }
}
