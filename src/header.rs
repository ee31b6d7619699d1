use crate::bitstream::{BitReader, BitWriter};
use crate::error::{BitstreamError, CompressionError};

// --- Layout ---
//
// bit 0      : compression type
// bits 1-3   : reserved, zero
// bits 4-15  : block count

const TYPE_BITS: u32 = 1;
const RESERVED_BITS: u32 = 3;
const BLOCK_COUNT_BITS: u32 = 12;

/// Width of the header in bits. The body always starts at this offset.
pub const HEADER_BITS: usize = (TYPE_BITS + RESERVED_BITS + BLOCK_COUNT_BITS) as usize;

/// Width of the header in bytes.
pub const HEADER_BYTES: usize = HEADER_BITS / 8;

/// Largest block count the 12-bit header field can carry.
pub const MAX_BLOCK_COUNT: usize = (1 << BLOCK_COUNT_BITS) - 1;

/// Body encoding selected by the header's type bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompressionType {
    /// Raw 32-bit words, byte-aligned after the header.
    None = 0,
    /// Bit-packed ZERO/ONE/RAW/RLE coded blocks.
    Default = 1,
}

impl TryFrom<u32> for CompressionType {
    type Error = CompressionError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::None),
            1 => Ok(Self::Default),
            other => Err(CompressionError::InvalidCompressionType(other)),
        }
    }
}

/// Parsed form of the 16-bit stream preamble.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub compression_type: CompressionType,
    pub block_count: usize,
    /// Value found in the reserved field. Always zero for streams we write.
    pub reserved: u32,
}

impl Header {
    pub const fn new(compression_type: CompressionType, block_count: usize) -> Self {
        Self {
            compression_type,
            block_count,
            reserved: 0,
        }
    }

    /// Writes the header at the writer's cursor, which must be at bit 0.
    pub fn write(&self, writer: &mut BitWriter<'_>) -> Result<(), BitstreamError> {
        debug_assert_eq!(writer.offset(), 0);
        debug_assert!(self.block_count <= MAX_BLOCK_COUNT);

        writer.put(self.compression_type as u32, TYPE_BITS)?;
        writer.put(0, RESERVED_BITS)?;
        writer.put(self.block_count as u32, BLOCK_COUNT_BITS)?;

        debug_assert_eq!(writer.offset(), HEADER_BITS);
        Ok(())
    }

    /// Reads a header from the start of the stream.
    pub fn read(reader: &mut BitReader<'_>) -> Result<Self, BitstreamError> {
        let compression_type = if reader.get(TYPE_BITS)? == 0 {
            CompressionType::None
        } else {
            CompressionType::Default
        };
        let reserved = reader.get(RESERVED_BITS)?;
        let block_count = reader.get(BLOCK_COUNT_BITS)? as usize;

        Ok(Self {
            compression_type,
            block_count,
            reserved,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let mut buf = [0u8; 2];
        let mut writer = BitWriter::new(&mut buf);
        Header::new(CompressionType::Default, 0x123)
            .write(&mut writer)
            .unwrap();
        assert_eq!(writer.offset(), HEADER_BITS);
        assert_eq!(buf, [0x81, 0x23]);
    }

    #[test]
    fn test_header_read_back() {
        let buf = [0x0F, 0xFF];
        let mut reader = BitReader::new(&buf);
        let header = Header::read(&mut reader).unwrap();
        assert_eq!(reader.offset(), 16);
        assert_eq!(header, Header::new(CompressionType::None, MAX_BLOCK_COUNT));
    }

    #[test]
    fn test_header_reserved_bits_reported() {
        let buf = [0b1101_0000, 0x05];
        let mut reader = BitReader::new(&buf);
        let header = Header::read(&mut reader).unwrap();
        assert_eq!(header.compression_type, CompressionType::Default);
        assert_eq!(header.reserved, 0b101);
        assert_eq!(header.block_count, 5);
    }

    #[test]
    fn test_header_needs_two_bytes() {
        let mut buf = [0u8; 1];
        let mut writer = BitWriter::new(&mut buf);
        assert_eq!(
            Header::new(CompressionType::None, 1).write(&mut writer),
            Err(BitstreamError::Overflow)
        );

        let mut reader = BitReader::new(&[0x80]);
        assert_eq!(Header::read(&mut reader), Err(BitstreamError::Exhausted));
    }

    #[test]
    fn test_compression_type_from_raw() {
        assert_eq!(CompressionType::try_from(0), Ok(CompressionType::None));
        assert_eq!(CompressionType::try_from(1), Ok(CompressionType::Default));
        assert_eq!(
            CompressionType::try_from(7),
            Err(CompressionError::InvalidCompressionType(7))
        );
    }
}
